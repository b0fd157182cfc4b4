//! Council research gateway client
//!
//! An authenticated client for a JSON-RPC tool-invocation gateway fronting a
//! research-generation backend.
//!
//! # Features
//!
//! - **OAuth 2.0 / OIDC login**: Authorization Code flow via the system
//!   browser, with PKCE or a server-side token-exchange proxy
//! - **Session management**: persisted tokens, lazy expiry checks, refresh,
//!   logout-on-401
//! - **Gateway RPC**: JSON-RPC 2.0 calls with bearer auth and deterministic
//!   unwrapping of nested tool-result envelopes
//! - **Research tools**: typed council and DxO payloads

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod research;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}

//! OAuth 2.0 / OIDC authentication
//!
//! Implements the Authorization Code flow against an OIDC-compatible
//! provider:
//! - anti-CSRF state and PKCE (RFC 7636) generation
//! - browser-based authorization with a loopback redirect listener
//! - token exchange (direct with PKCE, or via a secret-holding proxy)
//! - token persistence, refresh, and logout

mod callback;
mod pkce;
mod session;
mod store;

pub use callback::{CallbackParams, RedirectListener};
pub use pkce::{challenge_s256, generate_pkce, generate_state};
pub use session::SessionManager;
pub use store::{SessionStore, StoredTokens, now_millis};

//! Configuration management

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Identity provider configuration
    pub auth: AuthConfig,
    /// Gateway endpoint configuration
    pub gateway: GatewayConfig,
    /// Local session storage configuration
    pub storage: StorageConfig,
}

/// How the authorization code is exchanged for tokens.
///
/// Exactly one strategy is active per configuration; the two must not be
/// mixed against the same provider registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStrategy {
    /// Exchange directly against the provider token endpoint using PKCE.
    /// No client secret involved.
    #[default]
    Direct,
    /// Exchange via a backend proxy that holds the client secret
    /// (`POST {code, redirect_uri}` as JSON). No PKCE.
    Proxy,
}

/// Identity provider (OIDC Authorization Code flow) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Provider authorization endpoint (browser redirect target)
    pub authorization_endpoint: String,

    /// Provider token endpoint (code and refresh-token grants)
    pub token_endpoint: String,

    /// Backend token-exchange proxy endpoint, required when
    /// `exchange = "proxy"`
    pub token_proxy_url: Option<String>,

    /// Token exchange strategy
    pub exchange: ExchangeStrategy,

    /// OAuth client ID
    pub client_id: String,

    /// Requested scopes
    pub scopes: Vec<String>,

    /// Loopback port for the redirect listener (0 = ephemeral)
    pub redirect_port: u16,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            authorization_endpoint: String::new(),
            token_endpoint: String::new(),
            token_proxy_url: None,
            exchange: ExchangeStrategy::Direct,
            client_id: String::new(),
            scopes: default_scopes(),
            redirect_port: 0,
        }
    }
}

fn default_scopes() -> Vec<String> {
    vec![
        "openid".to_string(),
        "profile".to_string(),
        "email".to_string(),
    ]
}

/// Gateway endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Gateway URL accepting JSON-RPC POSTs
    pub url: String,

    /// Tool namespace prefix (tools are named `<namespace>___<operation>`)
    pub tool_namespace: String,

    /// Request timeout for gateway calls
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            tool_namespace: "research".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Local session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the session file (default: `~/.council-cli`)
    pub dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the session storage directory
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(".council-cli"))
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist, cannot be parsed,
    /// or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Merge environment variables (COUNCIL_ prefix)
        figment = figment.merge(Env::prefixed("COUNCIL_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    fn validate(&self) -> Result<()> {
        if self.auth.client_id.is_empty() {
            return Err(Error::Config("auth.client_id is required".to_string()));
        }
        if self.auth.authorization_endpoint.is_empty() {
            return Err(Error::Config(
                "auth.authorization_endpoint is required".to_string(),
            ));
        }
        match self.auth.exchange {
            ExchangeStrategy::Direct => {
                if self.auth.token_endpoint.is_empty() {
                    return Err(Error::Config(
                        "auth.token_endpoint is required for direct exchange".to_string(),
                    ));
                }
            }
            ExchangeStrategy::Proxy => {
                if self.auth.token_proxy_url.is_none() {
                    return Err(Error::Config(
                        "auth.token_proxy_url is required for proxy exchange".to_string(),
                    ));
                }
            }
        }
        if self.gateway.url.is_empty() {
            return Err(Error::Config("gateway.url is required".to_string()));
        }
        Ok(())
    }
}

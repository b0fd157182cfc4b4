//! Error types for the council client

use thiserror::Error;

/// Result type alias for the council client
pub type Result<T> = std::result::Result<T, Error>;

/// Council client errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The identity provider rejected or aborted the login flow
    #[error("Provider error: {0}")]
    Provider(String),

    /// Authorization callback arrived without a code parameter
    #[error("Authorization callback is missing the code parameter")]
    MissingCode,

    /// Callback state did not match the pending login state
    #[error("State mismatch on authorization callback")]
    CsrfMismatch,

    /// Authorization code could not be exchanged for tokens
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// Refresh failed or no refresh token is stored
    #[error("Token refresh failed: {0}")]
    Refresh(String),

    /// Gateway rejected the bearer token; the local session has been cleared
    #[error("Session expired: gateway rejected the access token")]
    SessionExpired,

    /// Gateway returned a non-success HTTP status (status 408 = client-side
    /// timeout, status 0 = no response received)
    #[error("Gateway HTTP {status}: {body}")]
    GatewayHttp {
        /// HTTP status code
        status: u16,
        /// Response body (or transport error description)
        body: String,
    },

    /// Gateway returned a JSON-RPC error envelope
    #[error("Gateway RPC error {code}: {message}")]
    GatewayRpc {
        /// JSON-RPC error code
        code: i64,
        /// JSON-RPC error message
        message: String,
    },

    /// Tool response envelope text could not be parsed as JSON
    #[error("Malformed tool response: {0}")]
    MalformedToolResponse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the remedy for this error is a fresh login rather than a retry.
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expired_requires_reauth() {
        assert!(Error::SessionExpired.requires_reauth());
        assert!(
            !Error::GatewayHttp {
                status: 500,
                body: "boom".to_string(),
            }
            .requires_reauth()
        );
        assert!(
            !Error::GatewayRpc {
                code: -32601,
                message: "Method not found".to_string(),
            }
            .requires_reauth()
        );
    }

    #[test]
    fn error_messages_name_the_failure() {
        let e = Error::GatewayHttp {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(e.to_string(), "Gateway HTTP 502: bad gateway");

        let e = Error::GatewayRpc {
            code: -32000,
            message: "backend down".to_string(),
        };
        assert_eq!(e.to_string(), "Gateway RPC error -32000: backend down");
    }
}

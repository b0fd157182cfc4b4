//! Auth session manager
//!
//! Owns the OAuth Authorization Code flow end-to-end: login redirect,
//! callback validation, token exchange, refresh, logout, and authentication
//! status. All token mutation goes through this type; the gateway client only
//! ever triggers a full `logout` when the gateway rejects a token.

use parking_lot::RwLock;
use subtle::ConstantTimeEq;
use tracing::{info, warn};
use url::Url;

use super::callback::{CallbackParams, RedirectListener};
use super::pkce;
use super::store::{SessionStore, StoredTokens};
use crate::config::{AuthConfig, ExchangeStrategy};
use crate::{Error, Result};

/// Ephemeral state for one in-flight login attempt.
///
/// Created at login initiation, consumed exactly once by the next callback
/// (success or failure). Never persisted.
#[derive(Debug)]
struct PendingLogin {
    state: String,
    verifier: Option<String>,
    redirect_uri: String,
}

/// Token endpoint response (provider or proxy; both use the same keys)
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Manages the authentication session for the running application
pub struct SessionManager {
    http: reqwest::Client,
    config: AuthConfig,
    store: SessionStore,
    tokens: RwLock<Option<StoredTokens>>,
    pending: RwLock<Option<PendingLogin>>,
}

impl SessionManager {
    /// Create a session manager, loading any persisted tokens
    #[must_use]
    pub fn new(http: reqwest::Client, config: AuthConfig, store: SessionStore) -> Self {
        let tokens = store.load();
        Self {
            http,
            config,
            store,
            tokens: RwLock::new(tokens),
            pending: RwLock::new(None),
        }
    }

    /// Whether a non-expired access token is present.
    ///
    /// Local expiry check only; no network call.
    pub fn is_authenticated(&self) -> bool {
        self.tokens
            .read()
            .as_ref()
            .is_some_and(StoredTokens::is_valid)
    }

    /// The stored access token, without a freshness check
    pub fn access_token(&self) -> Option<String> {
        self.tokens.read().as_ref().map(|t| t.access_token.clone())
    }

    /// Milliseconds until the access token expires, if it has not already
    pub fn expires_in_millis(&self) -> Option<u64> {
        self.tokens
            .read()
            .as_ref()
            .and_then(StoredTokens::millis_until_expiry)
    }

    /// Start a login attempt: generate state (and a PKCE pair for direct
    /// exchange), record them as pending, and build the authorization URL.
    ///
    /// A previous unconsumed pending login is overwritten; an abandoned
    /// redirect simply goes stale until the next attempt.
    pub fn begin_login(&self, redirect_uri: &str) -> Result<Url> {
        let state = pkce::generate_state();
        let pkce_pair = match self.config.exchange {
            ExchangeStrategy::Direct => Some(pkce::generate_pkce()),
            ExchangeStrategy::Proxy => None,
        };

        let mut auth_url = Url::parse(&self.config.authorization_endpoint)
            .map_err(|e| Error::Config(format!("Invalid authorization endpoint: {e}")))?;

        {
            let mut query = auth_url.query_pairs_mut();
            query.append_pair("response_type", "code");
            query.append_pair("client_id", &self.config.client_id);
            query.append_pair("redirect_uri", redirect_uri);
            query.append_pair("scope", &self.config.scopes.join(" "));
            query.append_pair("state", &state);
            if let Some((_, ref challenge)) = pkce_pair {
                query.append_pair("code_challenge", challenge);
                query.append_pair("code_challenge_method", "S256");
            }
        }

        *self.pending.write() = Some(PendingLogin {
            state,
            verifier: pkce_pair.map(|(verifier, _)| verifier),
            redirect_uri: redirect_uri.to_string(),
        });

        Ok(auth_url)
    }

    /// Run the full browser login flow: loopback listener, browser redirect,
    /// callback validation, token exchange. Returns the new access token.
    pub async fn login(&self) -> Result<String> {
        let listener = RedirectListener::bind(self.config.redirect_port).await?;
        let auth_url = self.begin_login(&listener.redirect_uri)?;

        info!(url = %auth_url, "Opening browser for login");
        if let Err(e) = open::that(auth_url.as_str()) {
            warn!(error = %e, "Failed to open browser automatically");
            println!("\nPlease sign in by visiting:\n{auth_url}\n");
        }

        let params = listener.wait().await?;
        self.handle_callback(params).await
    }

    /// Validate a provider redirect and exchange its code for tokens.
    ///
    /// The pending state/verifier are consumed up front, so any outcome
    /// (including failure) clears them; a replayed callback fails the state
    /// check. Returns the new access token.
    pub async fn handle_callback(&self, params: CallbackParams) -> Result<String> {
        // Consume the pending login whatever happens next
        let pending = self.pending.write().take();

        if let Some(error) = params.error {
            let message = match params.error_description {
                Some(description) => format!("{error}: {description}"),
                None => error,
            };
            return Err(Error::Provider(message));
        }

        let code = params.code.ok_or(Error::MissingCode)?;

        let Some(pending) = pending else {
            // No login in flight; an unsolicited callback is never trusted
            return Err(Error::CsrfMismatch);
        };
        let returned_state = params.state.unwrap_or_default();
        if !constant_time_eq(&returned_state, &pending.state) {
            return Err(Error::CsrfMismatch);
        }

        let response = match self.config.exchange {
            ExchangeStrategy::Direct => self.exchange_code_direct(&code, &pending).await?,
            ExchangeStrategy::Proxy => self.exchange_code_proxy(&code, &pending).await?,
        };

        let tokens = StoredTokens::from_response(
            response.access_token,
            response.refresh_token,
            response.expires_in,
        );
        let access_token = tokens.access_token.clone();
        self.install(tokens)?;

        info!("Login complete");
        Ok(access_token)
    }

    /// Exchange the stored refresh token for a new token pair
    pub async fn refresh_access_token(&self) -> Result<String> {
        let refresh_token = self
            .tokens
            .read()
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .ok_or_else(|| Error::Refresh("no refresh token stored".to_string()))?;

        if self.config.token_endpoint.is_empty() {
            return Err(Error::Refresh(
                "no token endpoint configured".to_string(),
            ));
        }

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", self.config.client_id.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Refresh(format!("refresh request failed: {e}")))?;

        let token_response = read_token_response(response, Error::Refresh).await?;

        // Providers may omit the refresh token on rotation; keep the old one
        let tokens = StoredTokens::from_response(
            token_response.access_token,
            token_response.refresh_token.or(Some(refresh_token)),
            token_response.expires_in,
        );
        let access_token = tokens.access_token.clone();
        self.install(tokens)?;

        info!("Access token refreshed");
        Ok(access_token)
    }

    /// Clear all session state, local-only and idempotent
    pub fn logout(&self) {
        *self.pending.write() = None;
        *self.tokens.write() = None;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
    }

    async fn exchange_code_direct(
        &self,
        code: &str,
        pending: &PendingLogin,
    ) -> Result<TokenResponse> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", pending.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
        ];
        if let Some(ref verifier) = pending.verifier {
            params.push(("code_verifier", verifier.as_str()));
        }

        let response = self
            .http
            .post(&self.config.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::TokenExchange(format!("token request failed: {e}")))?;

        read_token_response(response, Error::TokenExchange).await
    }

    async fn exchange_code_proxy(
        &self,
        code: &str,
        pending: &PendingLogin,
    ) -> Result<TokenResponse> {
        let proxy_url = self
            .config
            .token_proxy_url
            .as_ref()
            .ok_or_else(|| Error::Config("token_proxy_url not configured".to_string()))?;

        let body = serde_json::json!({
            "code": code,
            "redirect_uri": pending.redirect_uri,
        });

        let response = self
            .http
            .post(proxy_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::TokenExchange(format!("proxy request failed: {e}")))?;

        read_token_response(response, Error::TokenExchange).await
    }

    fn install(&self, tokens: StoredTokens) -> Result<()> {
        self.store.save(&tokens)?;
        *self.tokens.write() = Some(tokens);
        Ok(())
    }
}

async fn read_token_response(
    response: reqwest::Response,
    wrap: fn(String) -> Error,
) -> Result<TokenResponse> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(wrap(format!("HTTP {status} - {body}")));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| wrap(format!("invalid token response: {e}")))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

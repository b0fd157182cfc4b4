//! Loopback redirect listener
//!
//! A minimal HTTP server that receives the provider's redirect after the user
//! authorizes in the browser. It captures the raw query parameters and hands
//! them back to the session manager; all validation (CSRF state, error
//! handling) happens there, not here.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{Error, Result};

/// Raw OAuth callback query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code
    pub code: Option<String>,

    /// State parameter (CSRF protection)
    pub state: Option<String>,

    /// Error code reported by the provider
    pub error: Option<String>,

    /// Error description reported by the provider
    pub error_description: Option<String>,
}

struct ListenerState {
    tx: tokio::sync::Mutex<Option<oneshot::Sender<CallbackParams>>>,
}

/// A running loopback listener awaiting one redirect
pub struct RedirectListener {
    /// Redirect URI registered for this login attempt
    pub redirect_uri: String,
    rx: oneshot::Receiver<CallbackParams>,
    server: JoinHandle<()>,
}

impl RedirectListener {
    /// Bind the listener on `127.0.0.1:<port>` (0 picks an ephemeral port)
    pub async fn bind(port: u16) -> Result<Self> {
        let addr: SocketAddr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Internal(format!("Failed to bind redirect listener: {e}")))?;

        let actual_addr = listener
            .local_addr()
            .map_err(|e| Error::Internal(format!("Failed to get listener address: {e}")))?;

        let redirect_uri = format!("http://127.0.0.1:{}/callback", actual_addr.port());
        info!(url = %redirect_uri, "Redirect listener ready");

        let (tx, rx) = oneshot::channel();
        let state = Arc::new(ListenerState {
            tx: tokio::sync::Mutex::new(Some(tx)),
        });

        let app = Router::new()
            .route("/callback", get(handle_redirect))
            .with_state(state);

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                debug!(error = %e, "Redirect listener stopped");
            }
        });

        Ok(Self {
            redirect_uri,
            rx,
            server,
        })
    }

    /// Wait for the provider redirect and return its raw query parameters
    pub async fn wait(self) -> Result<CallbackParams> {
        let params = self
            .rx
            .await
            .map_err(|_| Error::Internal("Redirect listener closed unexpectedly".to_string()));

        // One redirect is all we need
        self.server.abort();
        params
    }
}

async fn handle_redirect(
    State(state): State<Arc<ListenerState>>,
    Query(params): Query<CallbackParams>,
) -> impl IntoResponse {
    debug!(
        has_code = params.code.is_some(),
        has_state = params.state.is_some(),
        error = params.error.as_deref(),
        "Received authorization redirect"
    );

    // The page shown here is cosmetic; the session manager decides the real
    // outcome after validating state and exchanging the code.
    let page = if let Some(ref error) = params.error {
        let description = params
            .error_description
            .clone()
            .unwrap_or_else(|| "The provider aborted the login".to_string());
        error_page(error, &description)
    } else if params.code.is_none() {
        error_page("missing_code", "Authorization code not provided")
    } else {
        success_page()
    };

    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(params);
    }

    Html(page)
}

fn success_page() -> String {
    r"<!DOCTYPE html>
<html>
<head><title>Login Complete</title></head>
<body style='font-family: sans-serif; text-align: center; padding-top: 4rem;'>
    <h1>&#10003; Login complete</h1>
    <p>You can close this window and return to the terminal.</p>
</body>
</html>"
        .to_string()
}

fn error_page(error: &str, description: &str) -> String {
    format!(
        r"<!DOCTYPE html>
<html>
<head><title>Login Failed</title></head>
<body style='font-family: sans-serif; text-align: center; padding-top: 4rem;'>
    <h1>&#10007; Login failed</h1>
    <p>{description}</p>
    <p><code>{error}</code></p>
</body>
</html>"
    )
}

//! Authenticated JSON-RPC gateway client
//!
//! Wraps calls to the tool-invocation gateway: attaches the bearer token,
//! maps HTTP 401 to a local session clear plus `SessionExpired`, surfaces
//! other HTTP and JSON-RPC failures as typed errors, and unwraps nested
//! tool-call envelopes. It never initiates a login; re-authentication is the
//! caller's decision.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::protocol::{
    JsonRpcRequest, JsonRpcResponse, RequestId, Tool, ToolPayload, ToolsListResult,
    unwrap_tool_result,
};
use crate::auth::{SessionManager, now_millis};
use crate::config::GatewayConfig;
use crate::{Error, Result};

/// Health probe outcome; `health_check` never fails
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall status
    pub status: HealthStatus,
    /// Tool count when healthy, error message otherwise
    pub detail: String,
}

/// Health status values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Gateway answered `tools/list`
    Healthy,
    /// Any failure, auth included
    Error,
}

/// Client for the JSON-RPC tool gateway
pub struct GatewayClient {
    http: reqwest::Client,
    url: String,
    namespace: String,
    session: Arc<SessionManager>,
    seq: AtomicU64,
}

impl GatewayClient {
    /// Create a gateway client
    pub fn new(config: &GatewayConfig, session: Arc<SessionManager>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: config.url.clone(),
            namespace: config.tool_namespace.clone(),
            session,
            seq: AtomicU64::new(1),
        })
    }

    /// Fully-qualified tool name for an operation in the configured namespace
    #[must_use]
    pub fn tool_name(&self, operation: &str) -> String {
        format!("{}___{operation}", self.namespace)
    }

    /// Request IDs are method + timestamp; the sequence keeps overlapping
    /// calls unique within one millisecond.
    fn next_id(&self, method: &str) -> RequestId {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        RequestId::String(format!("{method}-{}-{seq}", now_millis()))
    }

    /// Issue a JSON-RPC call and return its `result` member.
    ///
    /// Requires an access token in the session; an absent token fails with
    /// `SessionExpired` without touching the network. An HTTP 401 clears the
    /// session (logout-equivalent) and fails the same way; neither case is
    /// retried here.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let Some(token) = self.session.access_token() else {
            return Err(Error::SessionExpired);
        };

        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: self.next_id(method),
            method: method.to_string(),
            params: Some(params),
        };

        debug!(method = %request.method, id = %request.id, "Gateway call");

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::GatewayHttp {
                        status: 408,
                        body: "gateway request timed out".to_string(),
                    }
                } else {
                    Error::GatewayHttp {
                        status: 0,
                        body: format!("gateway request failed: {e}"),
                    }
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!("Gateway rejected the access token; clearing session");
            self.session.logout();
            return Err(Error::SessionExpired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GatewayHttp {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: JsonRpcResponse = response.json().await.map_err(|e| Error::GatewayHttp {
            status: status.as_u16(),
            body: format!("invalid JSON-RPC response: {e}"),
        })?;

        if let Some(error) = envelope.error {
            return Err(Error::GatewayRpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(envelope.result.unwrap_or(Value::Null))
    }

    /// Fetch the gateway's tool catalog
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let result = self.call("tools/list", Value::Object(serde_json::Map::new())).await?;
        let listing: ToolsListResult = serde_json::from_value(result)?;
        Ok(listing.tools)
    }

    /// Invoke a tool and unwrap its nested result envelope
    pub async fn invoke_tool(&self, tool: &str, arguments: Value) -> Result<Value> {
        let result = self
            .call(
                "tools/call",
                serde_json::json!({
                    "name": tool,
                    "arguments": arguments,
                }),
            )
            .await?;

        unwrap_tool_result(result).map(ToolPayload::into_value)
    }

    /// Best-effort liveness probe; reports a status instead of failing
    pub async fn health_check(&self) -> HealthReport {
        match self.list_tools().await {
            Ok(tools) => HealthReport {
                status: HealthStatus::Healthy,
                detail: format!("{} tools available", tools.len()),
            },
            Err(e) => HealthReport {
                status: HealthStatus::Error,
                detail: e.to_string(),
            },
        }
    }
}

//! JSON-RPC gateway client
//!
//! Authenticated calls to the tool-invocation gateway: JSON-RPC 2.0 over
//! HTTP POST with bearer auth, typed failure taxonomy, and deterministic
//! unwrapping of the gateway's nested tool-result envelope.

mod client;
mod protocol;

pub use client::{GatewayClient, HealthReport, HealthStatus};
pub use protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId, Tool, ToolPayload, ToolsListResult,
    unwrap_tool_result,
};

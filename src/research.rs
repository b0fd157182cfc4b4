//! Typed payloads for the research tools exposed by the gateway
//!
//! The agent backend owns these shapes; deserialization is deliberately
//! lenient (defaults everywhere, unknown fields ignored) so backend-side
//! additions do not break the client.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::Result;
use crate::gateway::GatewayClient;

/// Council tool operation name (namespaced by the gateway client)
pub const COUNCIL_OPERATION: &str = "invokeCouncil";

/// DxO tool operation name (namespaced by the gateway client)
pub const DXO_OPERATION: &str = "invokeDxO";

/// One council member's Stage 1 response
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MemberResponse {
    /// Member identifier (e.g. "Member 1")
    pub member_id: String,
    /// Response text
    pub content: String,
}

/// A ranking entry from the council's voting stage
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RankingEntry {
    /// Label of the ranked response (e.g. "Response A")
    pub response_label: String,
    /// Member the response belongs to
    pub member_id: String,
    /// Mean rank position across voters
    pub average_position: f64,
    /// Number of votes received
    pub vote_count: u64,
}

/// The chairman's Stage 3 synthesis
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Synthesis {
    /// Synthesis text
    pub content: String,
}

/// Council result metadata
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CouncilMetadata {
    /// Generation timestamp, backend-formatted
    pub timestamp: String,
    /// Aggregate rankings across all voters
    pub aggregate_rankings: Vec<RankingEntry>,
}

/// Full council run result
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CouncilResult {
    /// The question that was asked
    pub question: String,
    /// Stage 1: independent member responses
    pub stage1: Vec<MemberResponse>,
    /// Stage 2: per-voter rankings
    pub stage2: Vec<RankingEntry>,
    /// Stage 3: chairman synthesis
    pub stage3: Synthesis,
    /// Run metadata
    pub metadata: CouncilMetadata,
}

/// One step of the DxO workflow
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkflowStep {
    /// Role that produced this step
    pub role: String,
    /// Step output text
    pub output: String,
}

/// DxO result metadata
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DxoMetadata {
    /// Generation timestamp, backend-formatted
    pub timestamp: String,
}

/// Full DxO run result
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DxoResult {
    /// The question that was asked
    pub question: String,
    /// Ordered workflow steps
    pub workflow: Vec<WorkflowStep>,
    /// Run metadata
    pub metadata: DxoMetadata,
}

/// Run the council on a question and return its structured result
pub async fn invoke_council(client: &GatewayClient, question: &str) -> Result<CouncilResult> {
    let payload = client
        .invoke_tool(
            &client.tool_name(COUNCIL_OPERATION),
            json!({ "question": question }),
        )
        .await?;
    Ok(serde_json::from_value(payload)?)
}

/// Run the DxO workflow on a question and return its structured result
pub async fn invoke_dxo(client: &GatewayClient, question: &str) -> Result<DxoResult> {
    let payload = client
        .invoke_tool(
            &client.tool_name(DXO_OPERATION),
            json!({ "question": question }),
        )
        .await?;
    Ok(serde_json::from_value(payload)?)
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::DocumentReference;
use super::query::AgentLabel;
use super::usage::{AgentUsage, TokenUsageRecord};

/// Follow-up the caller may take, emitted instead of (or beside) an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedAction {
    pub title: String,
    pub description: String,
    pub action_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
}

/// Suggestion types understood by the UI.
pub mod suggestion_type {
    pub const ERP_ACTION: &str = "erp-action";
    pub const RAG_EXECUTE: &str = "rag-execute";
    pub const SUPPORT_DOC: &str = "support-doc";
}

/// SQL produced by the query agent together with the safety verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSql {
    pub query: String,
    pub explanation: String,
    pub is_safe: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
}

/// What an agent hands back to the orchestrator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentResult {
    pub text: String,
    pub suggested_actions: Vec<SuggestedAction>,
    pub usage: AgentUsage,
    pub sql: Option<GeneratedSql>,
    pub sources: Vec<DocumentReference>,
    pub result: Option<Value>,
}

impl AgentResult {
    pub fn text(text: impl Into<String>, usage: AgentUsage) -> Self {
        Self {
            text: text.into(),
            usage,
            ..Self::default()
        }
    }
}

/// Unified payload returned for every request, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResponse {
    pub success: bool,
    pub response: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_used: Option<AgentLabel>,

    #[serde(default)]
    pub suggested_actions: Vec<SuggestedAction>,

    pub token_usage: TokenUsageRecord,
    pub tokens_remaining: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<GeneratedSql>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<DocumentReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl AssistantResponse {
    pub fn completed(
        agent: AgentLabel,
        outcome: AgentResult,
        token_usage: TokenUsageRecord,
        tokens_remaining: i64,
    ) -> Self {
        Self {
            success: true,
            response: outcome.text,
            agent_used: Some(agent),
            suggested_actions: outcome.suggested_actions,
            token_usage,
            tokens_remaining,
            error: None,
            sql: outcome.sql,
            sources: outcome.sources,
            result: outcome.result,
        }
    }

    pub fn failed(
        agent: Option<AgentLabel>,
        error: impl Into<String>,
        token_usage: TokenUsageRecord,
        tokens_remaining: i64,
    ) -> Self {
        Self {
            success: false,
            response: String::new(),
            agent_used: agent,
            suggested_actions: Vec::new(),
            token_usage,
            tokens_remaining,
            error: Some(error.into()),
            sql: None,
            sources: Vec::new(),
            result: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_payload_shape() {
        let response = AssistantResponse::failed(
            Some(AgentLabel::Rag),
            "boom",
            TokenUsageRecord::classified(12),
            500,
        );
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["success"], false);
        assert_eq!(json["agentUsed"], "rag");
        assert_eq!(json["error"], "boom");
        assert_eq!(json["tokenUsage"]["totalInQuery"], 12);
        assert!(json.get("sql").is_none());
    }
}

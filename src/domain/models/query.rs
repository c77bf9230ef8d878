//! Request-side models: the incoming query, its conversation context, the
//! agent label the classifier resolves, and the explicit per-request context.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single natural-language request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(rename = "query")]
    pub text: String,

    #[serde(rename = "clientId")]
    pub tenant_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_context: Option<ConversationContext>,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tenant_id: tenant_id.into(),
            module: None,
            conversation_context: None,
        }
    }

    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: ConversationContext) -> Self {
        self.conversation_context = Some(context);
        self
    }

    /// Selected-data pairs from the conversation context, if any.
    pub fn selected_data(&self) -> Option<&BTreeMap<String, String>> {
        self.conversation_context
            .as_ref()
            .map(|c| &c.selected_data)
            .filter(|d| !d.is_empty())
    }
}

/// UI-side context supplied with a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    #[serde(default)]
    pub history: Vec<HistoryMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_screen: Option<String>,

    #[serde(default)]
    pub selected_data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}

/// The strategy a query is routed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentLabel {
    /// Database query generation
    Rag,
    /// Documentation support
    #[default]
    Support,
    /// Operational action execution
    Erp,
}

impl AgentLabel {
    /// Fallback priority when the classifier output is not valid JSON.
    pub const FALLBACK_ORDER: [Self; 3] = [Self::Rag, Self::Support, Self::Erp];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rag => "rag",
            Self::Support => "support",
            Self::Erp => "erp",
        }
    }

    /// Whether a full response for this label may be memoized.
    pub const fn is_cacheable(self) -> bool {
        matches!(self, Self::Rag | Self::Support)
    }
}

impl fmt::Display for AgentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rag" => Ok(Self::Rag),
            "support" => Ok(Self::Support),
            "erp" => Ok(Self::Erp),
            other => Err(format!("unknown agent label: {other}")),
        }
    }
}

/// Explicit request-scoped values threaded through every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub api_key: String,
    pub tenant_id: String,
    /// Balance reported by the upstream gate before this request ran
    pub remaining_balance: i64,
    pub request_id: Uuid,
}

impl RequestContext {
    pub fn new(api_key: impl Into<String>, tenant_id: impl Into<String>, remaining_balance: i64) -> Self {
        Self {
            api_key: api_key.into(),
            tenant_id: tenant_id.into(),
            remaining_balance,
            request_id: Uuid::new_v4(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing_is_case_insensitive() {
        assert_eq!("RAG".parse::<AgentLabel>(), Ok(AgentLabel::Rag));
        assert_eq!(" erp ".parse::<AgentLabel>(), Ok(AgentLabel::Erp));
        assert!("sales".parse::<AgentLabel>().is_err());
    }

    #[test]
    fn test_only_read_only_agents_are_cacheable() {
        assert!(AgentLabel::Rag.is_cacheable());
        assert!(AgentLabel::Support.is_cacheable());
        assert!(!AgentLabel::Erp.is_cacheable());
    }

    #[test]
    fn test_request_wire_names() {
        let json = r#"{"query":"hi","clientId":"acme","conversationContext":{"currentScreen":"orders","selectedData":{"orderId":"42"}}}"#;
        let request: QueryRequest = serde_json::from_str(json).expect("request should parse");
        assert_eq!(request.tenant_id, "acme");
        assert!(request.module.is_none());
        assert_eq!(
            request.selected_data().and_then(|d| d.get("orderId")).map(String::as_str),
            Some("42")
        );
    }
}

//! Routes a query to one of the three agents with a single completion call.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::domain::errors::AssistantResult;
use crate::domain::models::{AgentLabel, ClassifierConfig, ConversationContext, QueryRequest};
use crate::domain::ports::{CompletionProvider, CompletionRequest};

/// How the label was obtained from the model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentResolution {
    /// Valid `{"agent": ...}` JSON with a known label
    Parsed,
    /// Output was not JSON; a label name was found in the raw text
    Fallback,
    /// Nothing usable; routed to support
    Defaulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub label: AgentLabel,
    pub resolution: IntentResolution,
    /// Total tokens of the classifier call, recorded even on fallback
    pub tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ClassifierReply {
    #[serde(default)]
    agent: Option<String>,
}

const AGENT_MENU: &str = "\
You are the router of an ERP assistant. Decide which agent must answer the user's request.

Agents:
- rag: questions that need data from the ERP database (sales, orders, customers, stock, invoices, totals, reports).
- support: questions about how to use the software, procedures, configuration, documentation, error messages.
- erp: requests to perform an operation in the ERP (create, modify, send, approve or cancel something).

Answer only with JSON in the form {\"agent\": \"rag\"} using one of: rag, support, erp.";

pub struct IntentClassifier {
    completion: Arc<dyn CompletionProvider>,
    config: ClassifierConfig,
}

impl IntentClassifier {
    pub fn new(completion: Arc<dyn CompletionProvider>, config: ClassifierConfig) -> Self {
        Self { completion, config }
    }

    /// Classify the query. Fails only when the completion call itself fails.
    #[instrument(skip(self, request), fields(tenant_id = %request.tenant_id))]
    pub async fn classify(&self, request: &QueryRequest) -> AssistantResult<Classification> {
        let system = self.system_prompt(request.conversation_context.as_ref());
        let response = self
            .completion
            .complete(CompletionRequest::prompt(system, &request.text, self.config.params()))
            .await?;

        let (label, resolution) = resolve_label(&response.text);
        if resolution != IntentResolution::Parsed {
            warn!(raw = %response.text, resolution = ?resolution, "classifier output not parsed");
        }
        debug!(agent = %label, tokens = response.usage.total_tokens, "intent classified");

        Ok(Classification {
            label,
            resolution,
            tokens: response.usage.total_tokens,
        })
    }

    fn system_prompt(&self, context: Option<&ConversationContext>) -> String {
        let mut prompt = AGENT_MENU.to_string();
        let Some(context) = context else {
            return prompt;
        };

        let skip = context.history.len().saturating_sub(self.config.history_turns);
        let recent = &context.history[skip..];
        if !recent.is_empty() {
            prompt.push_str("\n\nRecent conversation:");
            for message in recent {
                let _ = write!(prompt, "\n{}: {}", message.role, message.content);
            }
        }

        if let Some(screen) = context.current_screen.as_deref().filter(|s| !s.is_empty()) {
            let _ = write!(prompt, "\n\nCurrent screen: {screen}");
        }

        if !context.selected_data.is_empty() {
            prompt.push_str("\n\nSelected data:");
            for (key, value) in &context.selected_data {
                let _ = write!(prompt, "\n{key}: {value}");
            }
        }

        prompt
    }
}

/// Turn raw classifier output into a label.
///
/// Strict JSON first. Only when the text is not JSON at all, the label
/// names are searched case-insensitively in priority order rag, support,
/// erp. Anything else resolves to support.
pub fn resolve_label(raw: &str) -> (AgentLabel, IntentResolution) {
    match serde_json::from_str::<ClassifierReply>(raw.trim()) {
        Ok(reply) => reply
            .agent
            .and_then(|agent| agent.parse().ok())
            .map_or((AgentLabel::Support, IntentResolution::Defaulted), |label| {
                (label, IntentResolution::Parsed)
            }),
        Err(_) => {
            let lowered = raw.to_lowercase();
            AgentLabel::FALLBACK_ORDER
                .into_iter()
                .find(|label| lowered.contains(label.as_str()))
                .map_or((AgentLabel::Support, IntentResolution::Defaulted), |label| {
                    (label, IntentResolution::Fallback)
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::HistoryMessage;

    #[test]
    fn test_strict_json() {
        assert_eq!(
            resolve_label(r#"{"agent": "erp"}"#),
            (AgentLabel::Erp, IntentResolution::Parsed)
        );
        assert_eq!(
            resolve_label(" {\"agent\":\"RAG\"}\n"),
            (AgentLabel::Rag, IntentResolution::Parsed)
        );
    }

    #[test]
    fn test_fallback_priority() {
        assert_eq!(
            resolve_label("I would pick erp, or maybe support"),
            (AgentLabel::Support, IntentResolution::Fallback)
        );
        assert_eq!(
            resolve_label("Agent: RAG"),
            (AgentLabel::Rag, IntentResolution::Fallback)
        );
    }

    #[test]
    fn test_valid_json_with_unknown_label_defaults() {
        assert_eq!(
            resolve_label(r#"{"agent": "sales"}"#),
            (AgentLabel::Support, IntentResolution::Defaulted)
        );
        assert_eq!(
            resolve_label(r#"{"route": "erp"}"#),
            (AgentLabel::Support, IntentResolution::Defaulted)
        );
    }

    #[test]
    fn test_garbage_defaults_to_support() {
        assert_eq!(
            resolve_label("¯\\_(ツ)_/¯"),
            (AgentLabel::Support, IntentResolution::Defaulted)
        );
        assert_eq!(resolve_label("").0, AgentLabel::Support);
    }

    struct Unused;

    #[async_trait::async_trait]
    impl CompletionProvider for Unused {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> AssistantResult<crate::domain::ports::CompletionResponse> {
            unreachable!("prompt tests never call the provider")
        }
    }

    #[test]
    fn test_prompt_keeps_last_turns_only() {
        let classifier = IntentClassifier::new(Arc::new(Unused), ClassifierConfig::default());
        let context = ConversationContext {
            history: (0..8)
                .map(|i| HistoryMessage {
                    role: "user".into(),
                    content: format!("turn-{i}"),
                })
                .collect(),
            current_screen: Some("Ordini".into()),
            selected_data: [("orderId".to_string(), "42".to_string())].into(),
        };

        let prompt = classifier.system_prompt(Some(&context));
        assert!(!prompt.contains("turn-2"));
        assert!(prompt.contains("turn-3"));
        assert!(prompt.contains("turn-7"));
        assert!(prompt.contains("Current screen: Ordini"));
        assert!(prompt.contains("orderId: 42"));
    }
}

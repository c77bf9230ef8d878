//! Picks an action from the menu and extracts its parameters from the query.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::domain::errors::AssistantResult;
use crate::domain::models::{ActionDefinition, CallParams, QueryRequest, TokenUsage};
use crate::domain::ports::{CompletionProvider, CompletionRequest};

/// Action name the planner emits when nothing on the menu fits.
pub const UNKNOWN_ACTION: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionPlan {
    pub action: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ActionPlan {
    pub fn unknown() -> Self {
        Self {
            action: UNKNOWN_ACTION.to_string(),
            parameters: Map::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.action.trim().is_empty() || self.action.eq_ignore_ascii_case(UNKNOWN_ACTION)
    }
}

/// Parse `{"action": ..., "parameters": {...}}`; anything else is `unknown`.
pub fn parse_plan(raw: &str) -> ActionPlan {
    serde_json::from_str::<ActionPlan>(raw.trim()).unwrap_or_else(|err| {
        warn!(error = %err, "action plan is not valid JSON");
        ActionPlan::unknown()
    })
}

pub struct ActionPlanner {
    completion: Arc<dyn CompletionProvider>,
    params: CallParams,
}

impl ActionPlanner {
    pub fn new(completion: Arc<dyn CompletionProvider>, params: CallParams) -> Self {
        Self { completion, params }
    }

    #[instrument(skip(self, request, menu), fields(menu = menu.len()))]
    pub async fn plan(
        &self,
        request: &QueryRequest,
        menu: &[ActionDefinition],
    ) -> AssistantResult<(ActionPlan, TokenUsage)> {
        let response = self
            .completion
            .complete(CompletionRequest::prompt(
                system_prompt(request, menu),
                &request.text,
                self.params,
            ))
            .await?;

        let plan = parse_plan(&response.text);
        debug!(action = %plan.action, parameters = plan.parameters.len(), "action planned");
        Ok((plan, response.usage))
    }
}

fn system_prompt(request: &QueryRequest, menu: &[ActionDefinition]) -> String {
    let mut prompt = String::from(
        "You turn user requests into ERP operations. Choose the single action below that \
         fulfils the request and extract its parameters from the request and the selected data.\n\nAvailable actions:",
    );

    for action in menu {
        let _ = write!(prompt, "\n\n- {}: {}", action.name, action.description);
        for param in &action.parameters {
            let _ = write!(prompt, "\n  - {} ({})", param.name, param.data_type);
            if !param.description.is_empty() {
                let _ = write!(prompt, ": {}", param.description);
            }
            if param.required {
                prompt.push_str(" [REQUIRED]");
            }
        }
    }

    if let Some(selected) = request.selected_data() {
        prompt.push_str("\n\nSelected data:");
        for (key, value) in selected {
            let _ = write!(prompt, "\n{key}: {value}");
        }
    }

    let _ = write!(
        prompt,
        "\n\nAnswer only with JSON: {{\"action\": \"<name>\", \"parameters\": {{...}}}}. \
         If no action fits, use \"{UNKNOWN_ACTION}\"."
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ConversationContext, DataType, ParameterSpec};
    use serde_json::json;

    #[test]
    fn test_parse_plan() {
        let plan = parse_plan(r#"{"action": "CreaOrdine", "parameters": {"quantity": 3}}"#);
        assert_eq!(plan.action, "CreaOrdine");
        assert_eq!(plan.parameters.get("quantity"), Some(&json!(3)));
        assert!(!plan.is_unknown());
    }

    #[test]
    fn test_unparseable_plan_is_unknown() {
        assert!(parse_plan("I think you want CreaOrdine").is_unknown());
        assert!(parse_plan(r#"{"action": "UNKNOWN"}"#).is_unknown());
    }

    #[test]
    fn test_prompt_lists_parameters_and_selection() {
        let mut action: ActionDefinition = serde_json::from_value(json!({
            "id": "a1", "clientId": "common", "name": "CreaOrdine",
            "description": "Create a sales order", "functionName": "Erp.Orders.Create"
        }))
        .expect("definition");
        action.parameters = vec![ParameterSpec::new("quantity", DataType::Int).required()];

        let request = QueryRequest::new("ordina 3 pezzi", "acme").with_context(ConversationContext {
            selected_data: [("customerId".to_string(), "C42".to_string())].into(),
            ..ConversationContext::default()
        });

        let prompt = system_prompt(&request, &[action]);
        assert!(prompt.contains("- CreaOrdine: Create a sales order"));
        assert!(prompt.contains("quantity (int) [REQUIRED]"));
        assert!(prompt.contains("customerId: C42"));
    }
}

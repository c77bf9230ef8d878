//! Executes ERP operations on the user's behalf.
//!
//! Actions flagged `requires_confirmation` are never dispatched from a
//! query; they come back as an `erp-action` suggestion and run only through
//! [`ErpAgent::execute_confirmed`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::action_executor::{prepare_partial, to_json_map, ActionExecutor, SuppliedParameters};
use super::action_planner::ActionPlanner;
use super::action_resolver::ActionResolver;
use super::agents::AgentHandler;
use crate::domain::errors::{AssistantError, AssistantResult};
use crate::domain::models::{
    suggestion_type, ActionDefinition, AgentResult, AgentUsage, QueryRequest, RequestContext,
    SuggestedAction,
};

pub struct ErpAgent {
    resolver: Arc<ActionResolver>,
    planner: ActionPlanner,
    executor: Arc<ActionExecutor>,
}

impl ErpAgent {
    pub fn new(resolver: Arc<ActionResolver>, planner: ActionPlanner, executor: Arc<ActionExecutor>) -> Self {
        Self {
            resolver,
            planner,
            executor,
        }
    }

    /// Run a named action with caller-confirmed parameters.
    ///
    /// Issues no completion call and is not billed.
    #[instrument(skip(self, parameters))]
    pub async fn execute_confirmed(
        &self,
        tenant_id: &str,
        name: &str,
        parameters: &SuppliedParameters,
    ) -> AssistantResult<Value> {
        let action = self
            .resolver
            .find_by_name(tenant_id, name)
            .await?
            .ok_or_else(|| AssistantError::ActionNotFound(name.to_string()))?;

        Ok(self.executor.execute(tenant_id, &action, parameters).await?)
    }

    fn confirmation(action: &ActionDefinition, parameters: &SuppliedParameters, usage: AgentUsage) -> AgentResult {
        match prepare_partial(action, parameters) {
            Ok((coerced, missing)) => AgentResult {
                text: if missing.is_empty() {
                    format!("The action '{}' requires your confirmation before it runs.", action.name)
                } else {
                    format!(
                        "The action '{}' requires your confirmation before it runs. Missing required parameters: {}.",
                        action.name,
                        missing.join(", ")
                    )
                },
                suggested_actions: vec![SuggestedAction {
                    title: action.name.clone(),
                    description: action.description.clone(),
                    action_type: suggestion_type::ERP_ACTION.to_string(),
                    action_id: Some(action.name.clone()),
                    parameters: Some(to_json_map(&coerced)),
                }],
                usage,
                ..AgentResult::default()
            },
            Err(err) => {
                warn!(action = %action.name, error = %err, "confirmation parameters rejected");
                AgentResult::text(format!("The action '{}' cannot be prepared: {err}", action.name), usage)
            }
        }
    }
}

#[async_trait]
impl AgentHandler for ErpAgent {
    #[instrument(skip(self, request, context), fields(tenant_id = %context.tenant_id))]
    async fn handle(&self, request: &QueryRequest, context: &RequestContext) -> AssistantResult<AgentResult> {
        let tenant_id = request.tenant_id.as_str();
        let menu = self
            .resolver
            .menu(tenant_id, request.module.as_deref(), &request.text)
            .await?;
        let usage = AgentUsage::default().with_embedding(menu.embedding_tokens);

        if menu.actions.is_empty() {
            return Ok(AgentResult::text(
                "No ERP operation is available for this request.",
                usage,
            ));
        }

        let (plan, completion) = self.planner.plan(request, &menu.actions).await?;
        let usage = usage.with_completion(completion);

        if plan.is_unknown() {
            return Ok(AgentResult::text(
                "I could not match your request to an available ERP operation.",
                usage,
            ));
        }

        let Some(action) = self.resolver.find_by_name(tenant_id, &plan.action).await? else {
            warn!(action = %plan.action, "planned action does not exist");
            return Ok(AgentResult::text(
                format!("The action '{}' does not exist.", plan.action),
                usage,
            ));
        };

        if action.requires_confirmation {
            info!(action = %action.name, "action awaits confirmation");
            return Ok(Self::confirmation(&action, &plan.parameters, usage));
        }

        match self.executor.execute(tenant_id, &action, &plan.parameters).await {
            Ok(value) => Ok(AgentResult {
                text: format!("The action '{}' completed successfully.", action.name),
                usage,
                result: Some(value),
                ..AgentResult::default()
            }),
            Err(err) => Ok(AgentResult::text(
                format!("The action '{}' failed: {err}", action.name),
                usage,
            )),
        }
    }
}

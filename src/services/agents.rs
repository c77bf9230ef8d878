//! Closed dispatch over the three answering strategies.

use async_trait::async_trait;

use super::erp_agent::ErpAgent;
use super::sql_agent::SqlAgent;
use super::support_agent::SupportAgent;
use crate::domain::errors::AssistantResult;
use crate::domain::models::{AgentLabel, AgentResult, QueryRequest, RequestContext};

/// Shared capability of every agent.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    async fn handle(&self, request: &QueryRequest, context: &RequestContext) -> AssistantResult<AgentResult>;
}

pub struct Agents {
    pub rag: SqlAgent,
    pub support: SupportAgent,
    pub erp: ErpAgent,
}

impl Agents {
    pub fn new(rag: SqlAgent, support: SupportAgent, erp: ErpAgent) -> Self {
        Self { rag, support, erp }
    }

    pub fn for_label(&self, label: AgentLabel) -> &dyn AgentHandler {
        match label {
            AgentLabel::Rag => &self.rag,
            AgentLabel::Support => &self.support,
            AgentLabel::Erp => &self.erp,
        }
    }

    pub async fn handle(
        &self,
        label: AgentLabel,
        request: &QueryRequest,
        context: &RequestContext,
    ) -> AssistantResult<AgentResult> {
        self.for_label(label).handle(request, context).await
    }
}

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::agents::AgentHandler;
use super::context_retriever::ContextRetriever;
use crate::domain::errors::AssistantResult;
use crate::domain::models::{
    suggestion_type, AgentResult, AgentUsage, CallParams, QueryRequest, RequestContext,
    RetrievedDocument, SuggestedAction,
};
use crate::domain::ports::{CompletionProvider, CompletionRequest};

/// Answers how-to questions from retrieved support documentation.
pub struct SupportAgent {
    completion: Arc<dyn CompletionProvider>,
    retriever: Arc<ContextRetriever>,
    params: CallParams,
}

impl SupportAgent {
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        retriever: Arc<ContextRetriever>,
        params: CallParams,
    ) -> Self {
        Self {
            completion,
            retriever,
            params,
        }
    }

    fn system_prompt(documents: &[RetrievedDocument]) -> String {
        let mut prompt = String::from(
            "You are the support assistant of an ERP product. Answer the user's question \
             using only the documentation below. If the documentation does not cover the \
             question, say so and suggest contacting support.",
        );
        if documents.is_empty() {
            prompt.push_str("\n\nNo documentation was found for this question.");
        }
        for doc in documents {
            let _ = write!(prompt, "\n\n### {}\n{}", doc.title, doc.content);
        }
        prompt
    }
}

fn document_suggestion(doc: &RetrievedDocument) -> SuggestedAction {
    let mut parameters = Map::new();
    parameters.insert("documentId".to_string(), Value::String(doc.id.clone()));
    SuggestedAction {
        title: format!("Open \"{}\"", doc.title),
        description: "Read the full documentation page".to_string(),
        action_type: suggestion_type::SUPPORT_DOC.to_string(),
        action_id: Some(doc.id.clone()),
        parameters: Some(parameters),
    }
}

#[async_trait]
impl AgentHandler for SupportAgent {
    #[instrument(skip(self, request, context), fields(tenant_id = %context.tenant_id))]
    async fn handle(&self, request: &QueryRequest, context: &RequestContext) -> AssistantResult<AgentResult> {
        let retrieval = self
            .retriever
            .support_documents(&request.text, &request.tenant_id, request.module.as_deref())
            .await?;

        let response = self
            .completion
            .complete(CompletionRequest::prompt(
                Self::system_prompt(&retrieval.documents),
                &request.text,
                self.params,
            ))
            .await?;
        debug!(documents = retrieval.documents.len(), "support answer generated");

        Ok(AgentResult {
            text: response.text,
            suggested_actions: retrieval.documents.first().map(document_suggestion).into_iter().collect(),
            usage: AgentUsage::default()
                .with_embedding(retrieval.embedding_tokens)
                .with_completion(response.usage),
            sources: retrieval.documents.iter().map(RetrievedDocument::reference).collect(),
            sql: None,
            result: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_points_at_document() {
        let doc = RetrievedDocument {
            id: "kb-7".into(),
            title: "Posting invoices".into(),
            content: "...".into(),
            kind: "guide".into(),
            module: None,
        };
        let suggestion = document_suggestion(&doc);
        assert_eq!(suggestion.action_type, "support-doc");
        assert_eq!(suggestion.action_id.as_deref(), Some("kb-7"));
    }

    #[test]
    fn test_prompt_mentions_missing_docs() {
        assert!(SupportAgent::system_prompt(&[]).contains("No documentation was found"));
    }
}

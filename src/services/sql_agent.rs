//! Grounded SQL generation behind the read-only safety gate.

use std::fmt::Write as _;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use super::agents::AgentHandler;
use super::context_retriever::ContextRetriever;
use super::query_guard::{self, SafetyVerdict, REJECTED_PLACEHOLDER};
use crate::domain::errors::AssistantResult;
use crate::domain::models::{
    suggestion_type, AgentResult, AgentUsage, CallParams, GeneratedSql, QueryRequest,
    RequestContext, RetrievedDocument, SuggestedAction,
};
use crate::domain::ports::{CompletionProvider, CompletionRequest};

static SQL_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```sql\s*(.*?)```").expect("valid regex")
});
static SELECT_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(select\b.*?)(?:;|\z)").expect("valid regex")
});

/// Where the query text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlSource {
    Json,
    FencedBlock,
    SelectSpan,
    /// Nothing recognizable; the raw model text is used as the query
    RawText,
}

#[derive(Debug, Deserialize)]
struct SqlReply {
    sql_query: String,
    #[serde(default)]
    explanation: String,
}

/// Extract `(query, explanation, source)` from model output.
pub fn extract_sql(raw: &str) -> (String, String, SqlSource) {
    if let Ok(reply) = serde_json::from_str::<SqlReply>(raw.trim()) {
        return (reply.sql_query.trim().to_string(), reply.explanation, SqlSource::Json);
    }
    if let Some(caps) = SQL_FENCE.captures(raw) {
        return (caps[1].trim().to_string(), String::new(), SqlSource::FencedBlock);
    }
    if let Some(caps) = SELECT_SPAN.captures(raw) {
        return (caps[1].trim().to_string(), String::new(), SqlSource::SelectSpan);
    }
    (raw.trim().to_string(), String::new(), SqlSource::RawText)
}

/// Gate a candidate query. Rejected text is replaced by the placeholder.
pub fn gate(query: String, explanation: String) -> GeneratedSql {
    match query_guard::check(&query) {
        SafetyVerdict::Safe => GeneratedSql {
            query,
            explanation,
            is_safe: true,
            rejection: None,
        },
        SafetyVerdict::Unsafe(reason) => {
            warn!(reason = %reason, "generated SQL rejected");
            GeneratedSql {
                query: REJECTED_PLACEHOLDER.to_string(),
                explanation,
                is_safe: false,
                rejection: Some(reason.to_string()),
            }
        }
    }
}

pub struct SqlAgent {
    completion: Arc<dyn CompletionProvider>,
    retriever: Arc<ContextRetriever>,
    params: CallParams,
}

impl SqlAgent {
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
            "You are an expert SQL assistant for an ERP database. Write one read-only \
             SELECT statement that answers the user's question, using only the tables, \
             columns and rules described below.\n\nDatabase documentation:",
        );
        for doc in documents {
            let _ = write!(prompt, "\n\n### {} ({})\n{}", doc.title, doc.kind, doc.content);
        }
        prompt.push_str(
            "\n\nRules:\n- Only SELECT statements. Never modify data.\n- A single statement.\n\
             \nAnswer only with JSON: {\"sql_query\": \"...\", \"explanation\": \"...\"}",
        );
        prompt
    }
}

#[async_trait]
impl AgentHandler for SqlAgent {
    #[instrument(skip(self, request, context), fields(tenant_id = %context.tenant_id))]
    async fn handle(&self, request: &QueryRequest, context: &RequestContext) -> AssistantResult<AgentResult> {
        let retrieval = self
            .retriever
            .schema_documents(&request.text, &request.tenant_id, request.module.as_deref())
            .await?;

        let response = self
            .completion
            .complete(CompletionRequest::prompt(
                Self::system_prompt(&retrieval.documents),
                &request.text,
                self.params,
            ))
            .await?;

        let (query, explanation, source) = extract_sql(&response.text);
        if source != SqlSource::Json {
            warn!(source = ?source, "SQL reply was not valid JSON");
        }
        let sql = gate(query, explanation);
        info!(is_safe = sql.is_safe, documents = retrieval.documents.len(), "SQL generated");

        let text = if sql.is_safe {
            sql.explanation.clone()
        } else {
            format!(
                "The generated query was not executed because it {}.",
                sql.rejection.as_deref().unwrap_or("was rejected")
            )
        };

        let mut suggested_actions = Vec::new();
        if sql.is_safe {
            let mut parameters = Map::new();
            parameters.insert("sqlQuery".to_string(), Value::String(sql.query.clone()));
            parameters.insert("clientId".to_string(), Value::String(request.tenant_id.clone()));
            suggested_actions.push(SuggestedAction {
                title: "Run query".to_string(),
                description: "Execute the generated query and show the results".to_string(),
                action_type: suggestion_type::RAG_EXECUTE.to_string(),
                action_id: None,
                parameters: Some(parameters),
            });
        }

        Ok(AgentResult {
            text,
            suggested_actions,
            usage: AgentUsage::default()
                .with_embedding(retrieval.embedding_tokens)
                .with_completion(response.usage),
            sources: retrieval.documents.iter().map(RetrievedDocument::reference).collect(),
            sql: Some(sql),
            result: None,
        })
    }
}

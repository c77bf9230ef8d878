//! Request pipeline: authorize, classify, consult the cache, run the agent,
//! settle tokens and shape the unified response.
//!
//! Every fatal error is converted into a failure response here, carrying the
//! token usage known at the time of failure. Nothing is retried.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::action_executor::ActionExecutor;
use super::action_planner::ActionPlanner;
use super::action_resolver::ActionResolver;
use super::agents::Agents;
use super::context_retriever::ContextRetriever;
use super::erp_agent::ErpAgent;
use super::intent_classifier::IntentClassifier;
use super::operation_registry::OperationRegistry;
use super::result_cache::ResultCache;
use super::sql_agent::SqlAgent;
use super::support_agent::SupportAgent;
use super::token_ledger::TokenLedger;
use crate::adapters::cache::MokaResponseCache;
use crate::domain::errors::{AssistantError, AssistantResult};
use crate::domain::models::{AssistantResponse, Config, QueryRequest, RequestContext, TokenUsageRecord};
use crate::domain::ports::{
    BillingService, CompletionProvider, DocumentSearch, EmbeddingProvider, ResponseCache,
};
use crate::infrastructure::billing::BillingClient;
use crate::infrastructure::openai::OpenAiClient;
use crate::infrastructure::search::SearchClient;
use crate::infrastructure::HttpClientError;

/// External collaborators the pipeline runs against.
#[derive(Clone)]
pub struct Providers {
    pub completion: Arc<dyn CompletionProvider>,
    pub embedding: Arc<dyn EmbeddingProvider>,
    pub search: Arc<dyn DocumentSearch>,
    pub billing: Arc<dyn BillingService>,
    pub cache: Arc<dyn ResponseCache>,
}

impl Providers {
    /// HTTP clients and the in-process cache, as configured.
    pub fn from_config(config: &Config) -> AssistantResult<Self> {
        let configuration = |err: HttpClientError| {
            AssistantError::Configuration(err.to_string())
        };

        Ok(Self {
            completion: Arc::new(OpenAiClient::new(config.completion.clone(), "completion").map_err(configuration)?),
            embedding: Arc::new(OpenAiClient::new(config.embedding.clone(), "embedding").map_err(configuration)?),
            search: Arc::new(SearchClient::new(config.search.clone()).map_err(configuration)?),
            billing: Arc::new(BillingClient::new(&config.billing).map_err(configuration)?),
            cache: Arc::new(MokaResponseCache::new(&config.cache)),
        })
    }
}

pub struct Orchestrator {
    classifier: IntentClassifier,
    agents: Agents,
    actions: Arc<ActionResolver>,
    ledger: TokenLedger,
    cache: ResultCache,
    bill_cache_hits: bool,
}

impl Orchestrator {
    pub fn new(config: &Config, providers: Providers, registry: Arc<OperationRegistry>) -> Self {
        let retriever = Arc::new(ContextRetriever::new(
            providers.embedding.clone(),
            providers.search.clone(),
            config.retrieval.clone(),
        ));
        let actions = Arc::new(ActionResolver::new(
            providers.embedding.clone(),
            providers.search.clone(),
            config.retrieval.clone(),
        ));
        let executor = Arc::new(ActionExecutor::new(registry, config.erp.clone()));

        let agents = Agents::new(
            SqlAgent::new(providers.completion.clone(), retriever.clone(), config.generation.sql),
            SupportAgent::new(providers.completion.clone(), retriever, config.generation.support),
            ErpAgent::new(
                actions.clone(),
                ActionPlanner::new(providers.completion.clone(), config.generation.action),
                executor,
            ),
        );

        Self {
            classifier: IntentClassifier::new(providers.completion, config.classifier.clone()),
            agents,
            actions,
            ledger: TokenLedger::new(providers.billing),
            cache: ResultCache::new(providers.cache, config.cache.enabled),
            bill_cache_hits: config.cache.bill_cache_hits,
        }
    }

    pub fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    pub fn actions(&self) -> &ActionResolver {
        &self.actions
    }

    pub fn erp(&self) -> &ErpAgent {
        &self.agents.erp
    }

    /// Run one query end to end. Always produces a response.
    #[instrument(skip(self, request, context), fields(tenant_id = %context.tenant_id, request_id = %context.request_id))]
    pub async fn process(&self, request: &QueryRequest, context: &RequestContext) -> AssistantResponse {
        if let Err(err) = self.ledger.authorize(context) {
            return AssistantResponse::failed(
                None,
                err.to_string(),
                TokenUsageRecord::default(),
                context.remaining_balance,
            );
        }

        let classification = match self.classifier.classify(request).await {
            Ok(classification) => classification,
            Err(err) => {
                warn!(error = %err, "intent classification failed");
                return AssistantResponse::failed(
                    None,
                    err.to_string(),
                    TokenUsageRecord::default(),
                    context.remaining_balance,
                );
            }
        };
        let label = classification.label;
        let usage = TokenUsageRecord::classified(classification.tokens);
        info!(agent = %label, resolution = ?classification.resolution, tokens = classification.tokens, "intent resolved");

        if let Some(cached) = self.cache.get(label, request).await {
            if self.bill_cache_hits {
                if let Err(err) = self.ledger.settle(context, request, usage.total_in_query).await {
                    return AssistantResponse::failed(Some(label), err.to_string(), usage, context.remaining_balance);
                }
            }
            info!(agent = %label, "served from cache");
            return cached;
        }

        match self.agents.handle(label, request, context).await {
            Ok(outcome) => {
                let usage = usage.with_agent(outcome.usage);
                match self.ledger.settle(context, request, usage.total_in_query).await {
                    Ok(remaining) => {
                        let response = AssistantResponse::completed(label, outcome, usage, remaining);
                        self.cache.put(label, request, &response).await;
                        response
                    }
                    Err(err) => {
                        warn!(agent = %label, error = %err, "answer discarded: debit failed");
                        AssistantResponse::failed(Some(label), err.to_string(), usage, context.remaining_balance)
                    }
                }
            }
            Err(err) => {
                warn!(agent = %label, error = %err, "agent failed");
                let remaining = self
                    .ledger
                    .settle_classifier_only(context, request, classification.tokens)
                    .await
                    .unwrap_or(context.remaining_balance);
                AssistantResponse::failed(Some(label), err.to_string(), usage, remaining)
            }
        }
    }

    /// Open a context from the billing balance, then run the query.
    pub async fn process_with_key(&self, request: &QueryRequest, api_key: &str) -> AssistantResponse {
        match self.ledger.open_context(api_key, &request.tenant_id).await {
            Ok(context) => self.process(request, &context).await,
            Err(err) => AssistantResponse::failed(
                None,
                err.to_string(),
                TokenUsageRecord::default(),
                0,
            ),
        }
    }
}

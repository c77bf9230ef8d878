//! Common test utilities for integration tests
//!
//! In-memory fakes for every external collaborator of the pipeline, plus
//! helpers to wire an [`Orchestrator`] against them.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use erp_copilot::adapters::cache::MokaResponseCache;
use erp_copilot::domain::errors::{AssistantError, AssistantResult};
use erp_copilot::domain::models::{Config, RequestContext, TokenUsage};
use erp_copilot::domain::ports::{
    BalanceSnapshot, BillingService, CompletionProvider, CompletionRequest, CompletionResponse,
    DebitReceipt, DebitRequest, DocumentSearch, Embedding, EmbeddingProvider, SearchHit,
    SearchIndex, SearchQuery,
};
use erp_copilot::services::{OperationRegistry, Orchestrator, Providers};
use serde_json::Value;

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Completion provider replaying scripted replies in order.
///
/// An exhausted script fails like a provider outage.
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<(String, TokenUsage)>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(replies: &[(&str, u32, u32)]) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .iter()
                    .map(|(text, input, output)| ((*text).to_string(), TokenUsage::new(*input, *output)))
                    .collect(),
            ),
            requests: Mutex::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().expect("lock").len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> AssistantResult<CompletionResponse> {
        self.requests.lock().expect("lock").push(request);
        let (text, usage) = self
            .replies
            .lock()
            .expect("lock")
            .pop_front()
            .ok_or_else(|| AssistantError::provider("completion", "service unavailable"))?;
        Ok(CompletionResponse { text, usage })
    }
}

/// Embedding provider returning a fixed vector.
pub struct FixedEmbedding {
    pub tokens: u32,
    calls: AtomicUsize,
}

impl FixedEmbedding {
    pub fn new(tokens: u32) -> Self {
        Self {
            tokens,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FixedEmbedding {
    async fn embed(&self, _text: &str) -> AssistantResult<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Embedding {
            vector: vec![0.1, 0.2, 0.3],
            tokens: self.tokens,
        })
    }
}

/// Search service holding documents per index, returned in insertion order
/// with descending scores. Filters are recorded, not evaluated.
#[derive(Default)]
pub struct InMemorySearch {
    documents: Mutex<HashMap<SearchIndex, Vec<Value>>>,
    queries: Mutex<Vec<(SearchIndex, SearchQuery)>>,
}

impl InMemorySearch {
    pub fn with(self, index: SearchIndex, documents: Vec<Value>) -> Self {
        self.documents.lock().expect("lock").insert(index, documents);
        self
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().expect("lock").len()
    }

    pub fn queries(&self) -> Vec<(SearchIndex, SearchQuery)> {
        self.queries.lock().expect("lock").clone()
    }
}

#[async_trait]
impl DocumentSearch for InMemorySearch {
    async fn search(&self, index: SearchIndex, query: SearchQuery) -> AssistantResult<Vec<SearchHit>> {
        self.queries.lock().expect("lock").push((index, query));
        let documents = self
            .documents
            .lock()
            .expect("lock")
            .get(&index)
            .cloned()
            .unwrap_or_default();
        #[allow(clippy::cast_precision_loss)]
        let hits = documents
            .into_iter()
            .enumerate()
            .map(|(i, document)| SearchHit {
                score: 1.0 - i as f64 * 0.1,
                document,
            })
            .collect();
        Ok(hits)
    }
}

/// Billing service recording every debit.
pub struct RecordingBilling {
    balance: Mutex<i64>,
    fail_debits: bool,
    debits: Mutex<Vec<DebitRequest>>,
    balance_reads: AtomicUsize,
}

impl RecordingBilling {
    pub fn new(balance: i64) -> Self {
        Self {
            balance: Mutex::new(balance),
            fail_debits: false,
            debits: Mutex::default(),
            balance_reads: AtomicUsize::new(0),
        }
    }

    pub fn failing(balance: i64) -> Self {
        Self {
            fail_debits: true,
            ..Self::new(balance)
        }
    }

    pub fn debits(&self) -> Vec<DebitRequest> {
        self.debits.lock().expect("lock").clone()
    }

    pub fn calls(&self) -> usize {
        self.debits.lock().expect("lock").len() + self.balance_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BillingService for RecordingBilling {
    async fn debit(&self, request: DebitRequest) -> AssistantResult<DebitReceipt> {
        let tokens = i64::from(request.tokens_used);
        self.debits.lock().expect("lock").push(request);
        if self.fail_debits {
            return Err(AssistantError::BillingDebitFailure("HTTP 500".to_string()));
        }
        let mut balance = self.balance.lock().expect("lock");
        *balance -= tokens;
        Ok(DebitReceipt {
            tokens_remaining: *balance,
            last_updated: None,
            transaction_id: Some("tx-1".to_string()),
        })
    }

    async fn balance(&self, api_key: &str) -> AssistantResult<BalanceSnapshot> {
        self.balance_reads.fetch_add(1, Ordering::SeqCst);
        Ok(BalanceSnapshot {
            api_key: api_key.to_string(),
            tenant_id: "acme".to_string(),
            company_name: "ACME S.p.A.".to_string(),
            tokens_remaining: *self.balance.lock().expect("lock"),
            last_updated: None,
            transaction_count: 0,
            last_week_usage: 0,
        })
    }
}

/// The fakes behind one orchestrator, kept for assertions.
pub struct Harness {
    pub completion: Arc<ScriptedCompletion>,
    pub embedding: Arc<FixedEmbedding>,
    pub search: Arc<InMemorySearch>,
    pub billing: Arc<RecordingBilling>,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new(
        completion: ScriptedCompletion,
        search: InMemorySearch,
        billing: RecordingBilling,
        registry: OperationRegistry,
    ) -> Self {
        Self::with_config(&Config::default(), completion, search, billing, registry)
    }

    pub fn with_config(
        config: &Config,
        completion: ScriptedCompletion,
        search: InMemorySearch,
        billing: RecordingBilling,
        registry: OperationRegistry,
    ) -> Self {
        let completion = Arc::new(completion);
        let embedding = Arc::new(FixedEmbedding::new(8));
        let search = Arc::new(search);
        let billing = Arc::new(billing);

        let providers = Providers {
            completion: completion.clone(),
            embedding: embedding.clone(),
            search: search.clone(),
            billing: billing.clone(),
            cache: Arc::new(MokaResponseCache::with_lifetimes(
                100,
                Duration::from_secs(86_400),
                Duration::from_secs(3_600),
            )),
        };

        Self {
            orchestrator: Orchestrator::new(config, providers, Arc::new(registry)),
            completion,
            embedding,
            search,
            billing,
        }
    }
}

pub fn context(remaining_balance: i64) -> RequestContext {
    RequestContext::new("test-api-key", "acme", remaining_balance)
}

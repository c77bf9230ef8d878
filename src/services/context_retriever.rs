//! Tenant- and module-scoped grounding document lookup.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::domain::errors::AssistantResult;
use crate::domain::models::{RetrievalConfig, RetrievedDocument};
use crate::domain::ports::{
    DocumentSearch, EmbeddingProvider, SearchHit, SearchIndex, SearchQuery, VectorQuery,
};
use crate::infrastructure::search::filter;

/// Vector field holding document embeddings.
pub const CONTENT_VECTOR_FIELD: &str = "contentVector";

/// Documents plus the embedding tokens spent finding them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Retrieval {
    pub documents: Vec<RetrievedDocument>,
    pub embedding_tokens: u32,
}

pub struct ContextRetriever {
    embedding: Arc<dyn EmbeddingProvider>,
    search: Arc<dyn DocumentSearch>,
    config: RetrievalConfig,
}

impl ContextRetriever {
    pub fn new(
        embedding: Arc<dyn EmbeddingProvider>,
        search: Arc<dyn DocumentSearch>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedding,
            search,
            config,
        }
    }

    /// Schema, business-rule and query-example documents for SQL grounding.
    pub async fn schema_documents(
        &self,
        query: &str,
        tenant_id: &str,
        module: Option<&str>,
    ) -> AssistantResult<Retrieval> {
        self.retrieve(SearchIndex::Schema, query, tenant_id, module, self.config.schema_top)
            .await
    }

    /// Support documentation for Q&A grounding.
    pub async fn support_documents(
        &self,
        query: &str,
        tenant_id: &str,
        module: Option<&str>,
    ) -> AssistantResult<Retrieval> {
        self.retrieve(SearchIndex::Support, query, tenant_id, module, self.config.support_top)
            .await
    }

    /// Embed the query and run a filtered vector query against `index`.
    ///
    /// Results are ordered by service score, ties kept in service order.
    #[instrument(skip(self, query))]
    pub async fn retrieve(
        &self,
        index: SearchIndex,
        query: &str,
        tenant_id: &str,
        module: Option<&str>,
        top: usize,
    ) -> AssistantResult<Retrieval> {
        let embedding = self.embedding.embed(query).await?;

        let search = SearchQuery {
            filter: Some(filter::scoped(tenant_id, module)),
            text: None,
            vector: Some(VectorQuery {
                vector: embedding.vector,
                k: self.config.knn.max(top),
                field: CONTENT_VECTOR_FIELD.to_string(),
            }),
            top,
            select: Vec::new(),
            order_by: None,
        };

        let hits = self.search.search(index, search).await?;
        let documents = rank(hits, top);
        debug!(documents = documents.len(), "grounding documents retrieved");

        Ok(Retrieval {
            documents,
            embedding_tokens: embedding.tokens,
        })
    }
}

/// Stable sort by descending score, then decode and cap at `top`.
fn rank(mut hits: Vec<SearchHit>, top: usize) -> Vec<RetrievedDocument> {
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    hits.into_iter()
        .filter_map(|hit| match serde_json::from_value::<RetrievedDocument>(hit.document) {
            Ok(doc) => Some(doc),
            Err(err) => {
                warn!(error = %err, "skipping malformed search hit");
                None
            }
        })
        .take(top)
        .collect()
}

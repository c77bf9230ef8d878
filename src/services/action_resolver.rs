//! Read-only lookup of action definitions in the action index.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::context_retriever::CONTENT_VECTOR_FIELD;
use crate::domain::errors::AssistantResult;
use crate::domain::models::{ActionDefinition, RetrievalConfig};
use crate::domain::ports::{
    DocumentSearch, EmbeddingProvider, SearchHit, SearchIndex, SearchQuery, VectorQuery,
};
use crate::infrastructure::search::filter;

/// Upper bound for filter-only listings.
pub const LIST_LIMIT: usize = 1000;

/// Candidate actions for a query plus the embedding tokens spent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionMenu {
    pub actions: Vec<ActionDefinition>,
    pub embedding_tokens: u32,
}

pub struct ActionResolver {
    embedding: Arc<dyn EmbeddingProvider>,
    search: Arc<dyn DocumentSearch>,
    config: RetrievalConfig,
}

impl ActionResolver {
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

    /// Exact-name lookup in the tenant's scope.
    ///
    /// A tenant's own definition shadows a shared one with the same name.
    #[instrument(skip(self))]
    pub async fn find_by_name(&self, tenant_id: &str, name: &str) -> AssistantResult<Option<ActionDefinition>> {
        let query = SearchQuery {
            filter: Some(format!(
                "{} and {}",
                filter::tenant_scope(tenant_id),
                filter::eq("name", name)
            )),
            top: 2,
            ..SearchQuery::default()
        };

        let mut candidates: Vec<_> = decode(self.search.search(SearchIndex::Actions, query).await?)
            .into_iter()
            .filter(|a| a.name == name && a.visible_to(tenant_id))
            .collect();
        candidates.sort_by_key(|a| a.tenant_id != tenant_id);
        Ok(candidates.into_iter().next())
    }

    /// Hybrid (text + vector) search used for the planning menu and user search.
    #[instrument(skip(self, text))]
    pub async fn search(
        &self,
        tenant_id: &str,
        module: Option<&str>,
        text: &str,
        top: usize,
    ) -> AssistantResult<ActionMenu> {
        let embedding = self.embedding.embed(text).await?;
        let query = SearchQuery {
            filter: Some(filter::scoped(tenant_id, module)),
            text: Some(text.to_string()),
            vector: Some(VectorQuery {
                vector: embedding.vector,
                k: self.config.knn,
                field: CONTENT_VECTOR_FIELD.to_string(),
            }),
            top,
            ..SearchQuery::default()
        };

        let actions = decode(self.search.search(SearchIndex::Actions, query).await?);
        debug!(actions = actions.len(), "action menu built");
        Ok(ActionMenu {
            actions,
            embedding_tokens: embedding.tokens,
        })
    }

    /// Menu for the planning step, sized by configuration.
    pub async fn menu(&self, tenant_id: &str, module: Option<&str>, text: &str) -> AssistantResult<ActionMenu> {
        self.search(tenant_id, module, text, self.config.action_top)
            .await
    }

    /// Filter-only listing ordered by name.
    #[instrument(skip(self))]
    pub async fn list(&self, tenant_id: &str, module: Option<&str>) -> AssistantResult<Vec<ActionDefinition>> {
        let query = SearchQuery {
            filter: Some(filter::scoped(tenant_id, module)),
            top: LIST_LIMIT,
            order_by: Some("name asc".to_string()),
            ..SearchQuery::default()
        };
        Ok(decode(self.search.search(SearchIndex::Actions, query).await?))
    }

    /// Lookup by id; definitions owned by another tenant are not returned.
    #[instrument(skip(self))]
    pub async fn get(&self, tenant_id: &str, id: &str) -> AssistantResult<Option<ActionDefinition>> {
        let query = SearchQuery {
            filter: Some(filter::eq("id", id)),
            top: 1,
            ..SearchQuery::default()
        };
        Ok(decode(self.search.search(SearchIndex::Actions, query).await?)
            .into_iter()
            .find(|a| a.id == id && a.visible_to(tenant_id)))
    }
}

/// Decode hits, dropping malformed definitions and ones with duplicate
/// parameter names.
fn decode(hits: Vec<SearchHit>) -> Vec<ActionDefinition> {
    hits.into_iter()
        .filter_map(|hit| match serde_json::from_value::<ActionDefinition>(hit.document) {
            Ok(action) if action.has_unique_parameters() => Some(action),
            Ok(action) => {
                warn!(action = %action.name, "skipping action with duplicate parameter names");
                None
            }
            Err(err) => {
                warn!(error = %err, "skipping malformed action definition");
                None
            }
        })
        .collect()
}

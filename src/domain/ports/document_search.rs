use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::AssistantResult;

/// Which index a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchIndex {
    Schema,
    Support,
    Actions,
}

/// A k-nearest-neighbour clause against a vector field.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorQuery {
    pub vector: Vec<f32>,
    pub k: usize,
    pub field: String,
}

/// Filtered, optionally hybrid, search request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchQuery {
    /// OData-style filter expression
    pub filter: Option<String>,
    /// Free-text part; `None` searches everything
    pub text: Option<String>,
    pub vector: Option<VectorQuery>,
    pub top: usize,
    /// Projected fields; empty projects every retrievable field
    pub select: Vec<String>,
    pub order_by: Option<String>,
}

/// One ranked hit, as returned by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub score: f64,
    pub document: Value,
}

/// Document/vector search service. Ranking is the service's job.
#[async_trait]
pub trait DocumentSearch: Send + Sync {
    async fn search(&self, index: SearchIndex, query: SearchQuery) -> AssistantResult<Vec<SearchHit>>;
}

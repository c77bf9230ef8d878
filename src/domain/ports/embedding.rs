//! Embedding provider port.
//!
//! The core never computes vectors itself; it asks the provider and forwards
//! the result to the search service.

use async_trait::async_trait;

use crate::domain::errors::AssistantResult;

/// A query embedding and the tokens it cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub tokens: u32,
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> AssistantResult<Embedding>;
}

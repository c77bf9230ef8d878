//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that infrastructure adapters implement:
//! - CompletionProvider: chat completions
//! - EmbeddingProvider: query embeddings
//! - DocumentSearch: filtered vector/hybrid search over documents and actions
//! - BillingService: token debits and balance reads
//! - ResponseCache: memoized responses
//!
//! The services layer only depends on these contracts.

pub mod billing;
pub mod completion;
pub mod document_search;
pub mod embedding;
pub mod response_cache;

pub use billing::{BalanceSnapshot, BillingService, DebitReceipt, DebitRequest};
pub use completion::{ChatMessage, CompletionProvider, CompletionRequest, CompletionResponse};
pub use document_search::{DocumentSearch, SearchHit, SearchIndex, SearchQuery, VectorQuery};
pub use embedding::{Embedding, EmbeddingProvider};
pub use response_cache::ResponseCache;

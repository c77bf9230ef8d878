//! Infrastructure layer module
//!
//! External integrations and ambient concerns:
//! - OpenAI-compatible completion and embedding client
//! - Document/vector search client
//! - Billing/license service client
//! - Configuration management
//! - Logging infrastructure
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod billing;
pub mod config;
pub mod http_error;
pub mod logging;
pub mod openai;
pub mod search;

pub use http_error::HttpClientError;

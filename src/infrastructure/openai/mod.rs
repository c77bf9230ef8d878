//! OpenAI-compatible completion and embedding provider.

pub mod client;
pub mod types;

pub use client::OpenAiClient;

//! Document/vector search service adapter and filter helpers.

pub mod client;
pub mod filter;

pub use client::SearchClient;

//! Cache adapters.

pub mod moka_response_cache;

pub use moka_response_cache::MokaResponseCache;

//! Memoization of complete responses for the read-only agents.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::domain::models::{AgentLabel, AssistantResponse, QueryRequest};
use crate::domain::ports::ResponseCache;
use crate::infrastructure::search::filter::ALL_MODULES;

/// Trim, lower-case and collapse runs of whitespace.
pub fn normalize_query(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `{agent}:{tenant}:{module|all}:{sha256 of the normalized query}`
pub fn cache_key(agent: AgentLabel, request: &QueryRequest) -> String {
    let module = request
        .module
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(ALL_MODULES);
    let digest = Sha256::digest(normalize_query(&request.text).as_bytes());
    format!(
        "{agent}:{}:{module}:{}",
        request.tenant_id,
        URL_SAFE_NO_PAD.encode(digest)
    )
}

pub struct ResultCache {
    store: Arc<dyn ResponseCache>,
    enabled: bool,
}

impl ResultCache {
    pub fn new(store: Arc<dyn ResponseCache>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    /// Stored response for this request, unmodified.
    pub async fn get(&self, agent: AgentLabel, request: &QueryRequest) -> Option<AssistantResponse> {
        if !self.enabled || !agent.is_cacheable() {
            return None;
        }
        let key = cache_key(agent, request);
        let payload = self.store.get(&key).await?;
        match serde_json::from_str(&payload) {
            Ok(response) => {
                debug!(%key, "cache hit");
                Some(response)
            }
            Err(err) => {
                warn!(%key, error = %err, "discarding unreadable cache entry");
                None
            }
        }
    }

    pub async fn put(&self, agent: AgentLabel, request: &QueryRequest, response: &AssistantResponse) {
        if !self.enabled || !agent.is_cacheable() || !response.success {
            return;
        }
        let key = cache_key(agent, request);
        match serde_json::to_string(response) {
            Ok(payload) => self.store.put(&key, payload).await,
            Err(err) => warn!(%key, error = %err, "response not cached"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::MokaResponseCache;
    use crate::domain::models::{AgentResult, AgentUsage, TokenUsageRecord};
    use std::time::Duration;

    fn cache(enabled: bool) -> ResultCache {
        ResultCache::new(
            Arc::new(MokaResponseCache::with_lifetimes(
                100,
                Duration::from_secs(60),
                Duration::from_secs(60),
            )),
            enabled,
        )
    }

    fn response() -> AssistantResponse {
        AssistantResponse::completed(
            AgentLabel::Support,
            AgentResult::text("Open the Invoices screen.", AgentUsage::default()),
            TokenUsageRecord::classified(10),
            990,
        )
    }

    #[test]
    fn test_normalization_ignores_case_and_spacing() {
        assert_eq!(normalize_query("  Quante   VENDITE\tho fatto? "), "quante vendite ho fatto?");
        let a = QueryRequest::new("Quante vendite?", "acme");
        let b = QueryRequest::new("  quante   vendite? ", "acme");
        assert_eq!(cache_key(AgentLabel::Rag, &a), cache_key(AgentLabel::Rag, &b));
    }

    #[test]
    fn test_key_separates_tenant_module_and_agent() {
        let base = QueryRequest::new("q", "acme");
        let key = cache_key(AgentLabel::Rag, &base);
        assert!(key.starts_with("rag:acme:all:"));
        assert_ne!(key, cache_key(AgentLabel::Rag, &QueryRequest::new("q", "globex")));
        assert_ne!(key, cache_key(AgentLabel::Rag, &base.clone().with_module("sales")));
        assert_ne!(key, cache_key(AgentLabel::Support, &base));
    }

    #[tokio::test]
    async fn test_round_trip_returns_identical_payload() {
        let cache = cache(true);
        let request = QueryRequest::new("how do I post an invoice?", "acme");
        cache.put(AgentLabel::Support, &request, &response()).await;
        assert_eq!(cache.get(AgentLabel::Support, &request).await, Some(response()));
    }

    #[tokio::test]
    async fn test_erp_and_disabled_cache_never_store() {
        let request = QueryRequest::new("crea ordine", "acme");
        let enabled = cache(true);
        enabled.put(AgentLabel::Erp, &request, &response()).await;
        assert_eq!(enabled.get(AgentLabel::Erp, &request).await, None);

        let disabled = cache(false);
        disabled.put(AgentLabel::Support, &request, &response()).await;
        assert_eq!(disabled.get(AgentLabel::Support, &request).await, None);
    }
}

use async_trait::async_trait;

/// Store for serialized responses.
///
/// Writes racing on one key are last-writer-wins. Expiry policy belongs to
/// the implementation.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn put(&self, key: &str, payload: String);
}

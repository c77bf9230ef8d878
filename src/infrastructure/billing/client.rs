use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Url};
use tracing::{debug, instrument, warn};

use crate::domain::errors::{AssistantError, AssistantResult};
use crate::domain::models::BillingConfig;
use crate::domain::ports::{BalanceSnapshot, BillingService, DebitReceipt, DebitRequest};
use crate::infrastructure::http_error::HttpClientError;
use crate::infrastructure::logging::scrub;

const PROVIDER: &str = "billing";

/// Client for the license service that owns per-tenant token balances.
///
/// The tenant API key is part of the URL path and is also sent in the
/// `ApiKey` header.
pub struct BillingClient {
    http_client: ReqwestClient,
    base_url: Url,
}

impl BillingClient {
    pub fn new(config: &BillingConfig) -> Result<Self, HttpClientError> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| HttpClientError::InvalidRequest(format!("invalid billing base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(HttpClientError::InvalidRequest(format!(
                "billing base URL cannot carry a path: {}",
                config.base_url
            )));
        }
        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// `{base}/{operation}/{api_key}`, with the key percent-encoded as one segment.
    fn url(&self, operation: &str, api_key: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(operation).push(api_key);
        }
        url
    }

    async fn send_debit(&self, request: &DebitRequest) -> Result<DebitReceipt, HttpClientError> {
        let response = self
            .http_client
            .post(self.url("updateTokenAI", &request.api_key))
            .header("ApiKey", &request.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HttpClientError::from_response(response).await);
        }
        Ok(response.json().await?)
    }

    async fn fetch_balance(&self, api_key: &str) -> Result<BalanceSnapshot, HttpClientError> {
        let response = self
            .http_client
            .get(self.url("getTokenBalance", api_key))
            .header("ApiKey", api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HttpClientError::from_response(response).await);
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl BillingService for BillingClient {
    #[instrument(skip(self, request), fields(tokens = request.tokens_used, prompt_type = %request.prompt_type))]
    async fn debit(&self, request: DebitRequest) -> AssistantResult<DebitReceipt> {
        match self.send_debit(&request).await {
            Ok(receipt) => {
                debug!(remaining = receipt.tokens_remaining, "debit acknowledged");
                Ok(receipt)
            }
            Err(err) => {
                let message = scrub(&err.to_string());
                warn!(error = %message, "debit rejected");
                Err(AssistantError::BillingDebitFailure(message))
            }
        }
    }

    #[instrument(skip(self, api_key))]
    async fn balance(&self, api_key: &str) -> AssistantResult<BalanceSnapshot> {
        self.fetch_balance(api_key)
            .await
            .map_err(|e| e.into_provider_error(PROVIDER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_last_path_segment() {
        let client = BillingClient::new(&BillingConfig {
            base_url: "https://license.example.com/api/".into(),
            timeout_secs: 5,
        })
        .expect("client");
        assert_eq!(
            client.url("updateTokenAI", "K-1").as_str(),
            "https://license.example.com/api/updateTokenAI/K-1"
        );
    }

    #[test]
    fn test_key_is_encoded_as_single_segment() {
        let client = BillingClient::new(&BillingConfig {
            base_url: "https://license.example.com/api".into(),
            timeout_secs: 5,
        })
        .expect("client");
        let url = client.url("getTokenBalance", "a/b?c#d");
        assert_eq!(
            url.as_str(),
            "https://license.example.com/api/getTokenBalance/a%2Fb%3Fc%23d"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.path_segments().map(Iterator::count), Some(3));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = BillingClient::new(&BillingConfig {
            base_url: "not a url".into(),
            timeout_secs: 5,
        });
        assert!(matches!(result, Err(HttpClientError::InvalidRequest(_))));
    }
}

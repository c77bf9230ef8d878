use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient, RequestBuilder};
use tracing::{debug, instrument};

use super::types::{ChatCompletionBody, ChatCompletionReply, EmbeddingsBody, EmbeddingsReply};
use crate::domain::errors::{AssistantError, AssistantResult};
use crate::domain::models::{ProviderConfig, TokenUsage};
use crate::domain::ports::{
    CompletionProvider, CompletionRequest, CompletionResponse, Embedding, EmbeddingProvider,
};
use crate::infrastructure::http_error::HttpClientError;

/// HTTP client for an OpenAI-compatible provider.
///
/// Two URL layouts are supported:
/// - plain: `{base_url}/chat/completions`, `{base_url}/embeddings`, bearer auth
/// - Azure: `{base_url}/openai/deployments/{model}/...?api-version=`, `api-key` header
///
/// No retries: a failed call surfaces as a provider error.
pub struct OpenAiClient {
    http_client: ReqwestClient,
    config: ProviderConfig,
    provider: &'static str,
}

impl OpenAiClient {
    pub fn new(config: ProviderConfig, provider: &'static str) -> Result<Self, HttpClientError> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .tcp_nodelay(true)
            .build()?;

        debug!(
            provider,
            base_url = %config.base_url,
            model = %config.model,
            azure = config.api_version.is_some(),
            "initialized OpenAI-compatible client"
        );

        Ok(Self {
            http_client,
            config,
            provider,
        })
    }

    fn is_azure(&self) -> bool {
        self.config.api_version.is_some()
    }

    fn endpoint(&self, operation: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        match &self.config.api_version {
            Some(version) => format!(
                "{base}/openai/deployments/{}/{operation}?api-version={version}",
                self.config.model
            ),
            None => format!("{base}/{operation}"),
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.is_azure() {
            builder.header("api-key", &self.config.api_key)
        } else {
            builder.bearer_auth(&self.config.api_key)
        }
    }

    fn model_field(&self) -> Option<&str> {
        (!self.is_azure()).then_some(self.config.model.as_str())
    }

    async fn post<B, R>(&self, operation: &str, body: &B) -> Result<R, HttpClientError>
    where
        B: serde::Serialize + Sync,
        R: serde::de::DeserializeOwned + Send,
    {
        let url = self.endpoint(operation);
        debug!(provider = self.provider, operation, "POST");

        let response = self
            .authorize(self.http_client.post(&url))
            .header(header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HttpClientError::from_response(response).await);
        }

        Ok(response.json().await?)
    }

    fn fail(&self, err: HttpClientError) -> AssistantError {
        err.into_provider_error(self.provider)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    #[instrument(skip(self, request), fields(max_tokens = request.max_tokens))]
    async fn complete(&self, request: CompletionRequest) -> AssistantResult<CompletionResponse> {
        let body = ChatCompletionBody {
            model: self.model_field(),
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let reply: ChatCompletionReply = self
            .post("chat/completions", &body)
            .await
            .map_err(|e| self.fail(e))?;

        let text = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| self.fail(HttpClientError::MalformedResponse("no choices returned".into())))?;

        let usage = TokenUsage {
            input_tokens: reply.usage.prompt_tokens,
            output_tokens: reply.usage.completion_tokens,
            total_tokens: reply.usage.total_tokens,
        };
        debug!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "completion succeeded"
        );

        Ok(CompletionResponse { text, usage })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> AssistantResult<Embedding> {
        let body = EmbeddingsBody {
            model: self.model_field(),
            input: text,
        };

        let reply: EmbeddingsReply = self
            .post("embeddings", &body)
            .await
            .map_err(|e| self.fail(e))?;

        let tokens = reply.usage.total_tokens.max(reply.usage.prompt_tokens);
        let mut data = reply.data;
        data.sort_by_key(|d| d.index);

        let vector = data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| self.fail(HttpClientError::MalformedResponse("empty embedding response".into())))?;

        Ok(Embedding { vector, tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_version: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            base_url: "https://example.openai.azure.com/".to_string(),
            api_key: "key".to_string(),
            model: "gpt-4o".to_string(),
            api_version: api_version.map(str::to_string),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_plain_endpoint_layout() {
        let client = OpenAiClient::new(config(None), "completion").expect("client");
        assert_eq!(
            client.endpoint("chat/completions"),
            "https://example.openai.azure.com/chat/completions"
        );
        assert_eq!(client.model_field(), Some("gpt-4o"));
    }

    #[test]
    fn test_azure_endpoint_layout() {
        let client = OpenAiClient::new(config(Some("2024-02-01")), "completion").expect("client");
        assert_eq!(
            client.endpoint("embeddings"),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/embeddings?api-version=2024-02-01"
        );
        assert_eq!(client.model_field(), None);
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::domain::errors::AssistantResult;
use crate::domain::models::SearchConfig;
use crate::domain::ports::{DocumentSearch, SearchHit, SearchIndex, SearchQuery};
use crate::infrastructure::http_error::HttpClientError;

const PROVIDER: &str = "search";
const SCORE_FIELD: &str = "@search.score";

/// Client for an Azure AI Search compatible REST endpoint.
pub struct SearchClient {
    http_client: ReqwestClient,
    config: SearchConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody<'a> {
    search: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
    top: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    select: Option<String>,
    #[serde(rename = "orderby", skip_serializing_if = "Option::is_none")]
    order_by: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    vector_queries: Vec<VectorClause<'a>>,
}

#[derive(Debug, Serialize)]
struct VectorClause<'a> {
    kind: &'static str,
    vector: &'a [f32],
    k: usize,
    fields: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchReply {
    #[serde(default)]
    value: Vec<Map<String, Value>>,
}

impl SearchClient {
    pub fn new(config: SearchConfig) -> Result<Self, HttpClientError> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http_client,
            config,
        })
    }

    fn index_name(&self, index: SearchIndex) -> &str {
        match index {
            SearchIndex::Schema => &self.config.schema_index,
            SearchIndex::Support => &self.config.support_index,
            SearchIndex::Actions => &self.config.action_index,
        }
    }

    fn endpoint(&self, index: SearchIndex) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.index_name(index),
            self.config.api_version
        )
    }

    async fn send(&self, index: SearchIndex, query: &SearchQuery) -> Result<SearchReply, HttpClientError> {
        let body = SearchBody {
            search: query.text.as_deref().unwrap_or("*"),
            filter: query.filter.as_deref(),
            top: query.top,
            select: (!query.select.is_empty()).then(|| query.select.join(",")),
            order_by: query.order_by.as_deref(),
            vector_queries: query
                .vector
                .iter()
                .map(|v| VectorClause {
                    kind: "vector",
                    vector: &v.vector,
                    k: v.k,
                    fields: &v.field,
                })
                .collect(),
        };

        let response = self
            .http_client
            .post(self.endpoint(index))
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HttpClientError::from_response(response).await);
        }

        Ok(response.json().await?)
    }
}

/// Split the service score from the projected fields.
fn into_hit(mut fields: Map<String, Value>) -> SearchHit {
    let score = fields
        .get(SCORE_FIELD)
        .and_then(Value::as_f64)
        .unwrap_or_default();
    fields.retain(|key, _| !key.starts_with("@search."));
    SearchHit {
        score,
        document: Value::Object(fields),
    }
}

#[async_trait]
impl DocumentSearch for SearchClient {
    #[instrument(skip(self, query), fields(index = ?index, top = query.top))]
    async fn search(&self, index: SearchIndex, query: SearchQuery) -> AssistantResult<Vec<SearchHit>> {
        let reply = self
            .send(index, &query)
            .await
            .map_err(|e| e.into_provider_error(PROVIDER))?;

        debug!(hits = reply.value.len(), "search completed");
        Ok(reply.value.into_iter().map(into_hit).collect())
    }
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Main configuration structure for the ERP copilot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Chat completion provider
    #[serde(default)]
    pub completion: ProviderConfig,

    /// Embedding provider
    #[serde(default = "ProviderConfig::embedding_default")]
    pub embedding: ProviderConfig,

    /// Document/vector search service
    #[serde(default)]
    pub search: SearchConfig,

    /// External billing/license service
    #[serde(default)]
    pub billing: BillingConfig,

    /// Response cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Intent classifier call parameters
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Per-agent generation parameters
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Grounding document counts
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// ERP connection strings by tenant
    #[serde(default)]
    pub erp: ErpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            completion: ProviderConfig::default(),
            embedding: ProviderConfig::embedding_default(),
            search: SearchConfig::default(),
            billing: BillingConfig::default(),
            cache: CacheConfig::default(),
            classifier: ClassifierConfig::default(),
            generation: GenerationConfig::default(),
            retrieval: RetrievalConfig::default(),
            erp: ErpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Connection settings for an OpenAI-compatible provider.
///
/// When `api_version` is set the Azure deployment URL layout and `api-key`
/// header are used; otherwise requests go to `{base_url}/chat/completions`
/// or `{base_url}/embeddings` with bearer auth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderConfig {
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Model name, or deployment name in Azure layout
    #[serde(default = "default_completion_model")]
    pub model: String,

    #[serde(default)]
    pub api_version: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_completion_model() -> String {
    "gpt-4o".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            api_key: String::new(),
            model: default_completion_model(),
            api_version: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    fn embedding_default() -> Self {
        Self {
            model: default_embedding_model(),
            ..Self::default()
        }
    }
}

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchConfig {
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_search_api_version")]
    pub api_version: String,

    /// Index holding schema, business-rule and query-example documents
    #[serde(default = "default_schema_index")]
    pub schema_index: String,

    /// Index holding support documentation
    #[serde(default = "default_support_index")]
    pub support_index: String,

    /// Index holding action definitions
    #[serde(default = "default_action_index")]
    pub action_index: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_search_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_search_api_version() -> String {
    "2023-11-01".to_string()
}

fn default_schema_index() -> String {
    "erp-schema".to_string()
}

fn default_support_index() -> String {
    "erp-support".to_string()
}

fn default_action_index() -> String {
    "erp-actions".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            api_key: String::new(),
            api_version: default_search_api_version(),
            schema_index: default_schema_index(),
            support_index: default_support_index(),
            action_index: default_action_index(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Billing/license service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BillingConfig {
    #[serde(default = "default_billing_base_url")]
    pub base_url: String,

    #[serde(default = "default_billing_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_billing_base_url() -> String {
    "http://localhost:8090/api".to_string()
}

const fn default_billing_timeout_secs() -> u64 {
    15
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            base_url: default_billing_base_url(),
            timeout_secs: default_billing_timeout_secs(),
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Absolute expiry in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Sliding renewal window in seconds
    #[serde(default = "default_idle_secs")]
    pub idle_secs: u64,

    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,

    /// Bill classifier tokens when a response is served from cache
    #[serde(default)]
    pub bill_cache_hits: bool,
}

const fn default_true() -> bool {
    true
}

const fn default_ttl_secs() -> u64 {
    86_400
}

const fn default_idle_secs() -> u64 {
    3_600
}

const fn default_cache_capacity() -> u64 {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_ttl_secs(),
            idle_secs: default_idle_secs(),
            max_capacity: default_cache_capacity(),
            bill_cache_hits: false,
        }
    }
}

/// Completion call parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CallParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CallParams {
    pub const fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

/// Intent classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClassifierConfig {
    #[serde(default = "default_classifier_temperature")]
    pub temperature: f32,

    #[serde(default = "default_classifier_max_tokens")]
    pub max_tokens: u32,

    /// Number of most recent conversation turns included in the prompt
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

const fn default_classifier_temperature() -> f32 {
    0.1
}

const fn default_classifier_max_tokens() -> u32 {
    100
}

const fn default_history_turns() -> usize {
    5
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            temperature: default_classifier_temperature(),
            max_tokens: default_classifier_max_tokens(),
            history_turns: default_history_turns(),
        }
    }
}

impl ClassifierConfig {
    pub const fn params(&self) -> CallParams {
        CallParams::new(self.temperature, self.max_tokens)
    }
}

/// Generation parameters per agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    #[serde(default = "default_sql_params")]
    pub sql: CallParams,

    #[serde(default = "default_support_params")]
    pub support: CallParams,

    #[serde(default = "default_action_params")]
    pub action: CallParams,
}

const fn default_sql_params() -> CallParams {
    CallParams::new(0.1, 1000)
}

const fn default_support_params() -> CallParams {
    CallParams::new(0.3, 1000)
}

const fn default_action_params() -> CallParams {
    CallParams::new(0.1, 500)
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            sql: default_sql_params(),
            support: default_support_params(),
            action: default_action_params(),
        }
    }
}

/// How many grounding documents each agent retrieves
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetrievalConfig {
    #[serde(default = "default_schema_top")]
    pub schema_top: usize,

    #[serde(default = "default_support_top")]
    pub support_top: usize,

    #[serde(default = "default_action_top")]
    pub action_top: usize,

    /// Nearest neighbours requested from the vector query
    #[serde(default = "default_knn")]
    pub knn: usize,
}

const fn default_schema_top() -> usize {
    3
}

const fn default_support_top() -> usize {
    5
}

const fn default_action_top() -> usize {
    5
}

const fn default_knn() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            schema_top: default_schema_top(),
            support_top: default_support_top(),
            action_top: default_action_top(),
            knn: default_knn(),
        }
    }
}

/// ERP connection configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ErpConfig {
    /// Connection string used when a tenant has no dedicated entry
    #[serde(default)]
    pub default_connection: String,

    /// Tenant id to connection string
    #[serde(default)]
    pub connections: HashMap<String, String>,
}

impl ErpConfig {
    pub fn connection_for(&self, tenant_id: &str) -> &str {
        self.connections
            .get(tenant_id)
            .map_or(self.default_connection.as_str(), String::as_str)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rotated log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation policy: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

pub mod action;
pub mod config;
pub mod document;
pub mod param_value;
pub mod query;
pub mod response;
pub mod usage;

pub use action::{ActionDefinition, ParameterSpec, TargetReference, COMMON_TENANT};
pub use config::{
    BillingConfig, CacheConfig, CallParams, ClassifierConfig, Config, ErpConfig,
    GenerationConfig, LoggingConfig, ProviderConfig, RetrievalConfig, SearchConfig,
};
pub use document::{DocumentReference, RetrievedDocument};
pub use param_value::{DataType, ParamValue};
pub use query::{AgentLabel, ConversationContext, HistoryMessage, QueryRequest, RequestContext};
pub use response::{suggestion_type, AgentResult, AssistantResponse, GeneratedSql, SuggestedAction};
pub use usage::{AgentUsage, TokenUsage, TokenUsageRecord};

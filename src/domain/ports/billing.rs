use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::AssistantResult;

/// Debit sent to the billing/license service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitRequest {
    pub api_key: String,
    pub tokens_used: u32,
    pub module: String,
    pub prompt_type: String,
    pub query_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitReceipt {
    pub tokens_remaining: i64,

    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,

    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Out-of-band balance read used by the upstream gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    #[serde(default)]
    pub api_key: String,

    #[serde(default, rename = "clienteId")]
    pub tenant_id: String,

    #[serde(default, rename = "ragioneSociale")]
    pub company_name: String,

    pub tokens_remaining: i64,

    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,

    #[serde(default)]
    pub transaction_count: u64,

    #[serde(default)]
    pub last_week_usage: i64,
}

/// External billing/license service.
///
/// A debit that the service does not acknowledge with a success status is
/// returned as [`crate::domain::AssistantError::BillingDebitFailure`].
#[async_trait]
pub trait BillingService: Send + Sync {
    async fn debit(&self, request: DebitRequest) -> AssistantResult<DebitReceipt>;

    async fn balance(&self, api_key: &str) -> AssistantResult<BalanceSnapshot>;
}

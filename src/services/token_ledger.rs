//! Per-tenant token metering reconciled with the external billing service.
//!
//! The primary debit after a successful agent run is fatal on failure. The
//! classifier-only debit on the error path is best-effort and only logged.
//! The two paths are intentionally asymmetric.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::domain::errors::{AssistantError, AssistantResult};
use crate::domain::models::{QueryRequest, RequestContext};
use crate::domain::ports::{BalanceSnapshot, BillingService, DebitRequest};
use crate::infrastructure::search::filter::ALL_MODULES;

/// Prompt type tag of the primary debit.
pub const QUERY_PROMPT_TYPE: &str = "Assistant Query";

/// Prompt type tag of the classifier-only debit.
pub const INTENT_PROMPT_TYPE: &str = "Assistant Intent Detection";

pub struct TokenLedger {
    billing: Arc<dyn BillingService>,
}

impl TokenLedger {
    pub fn new(billing: Arc<dyn BillingService>) -> Self {
        Self { billing }
    }

    pub async fn balance(&self, api_key: &str) -> AssistantResult<BalanceSnapshot> {
        self.billing.balance(api_key).await
    }

    /// Build the request context from an out-of-band balance read.
    #[instrument(skip(self, api_key))]
    pub async fn open_context(&self, api_key: &str, tenant_id: &str) -> AssistantResult<RequestContext> {
        let snapshot = self.balance(api_key).await?;
        debug!(remaining = snapshot.tokens_remaining, "balance read");
        Ok(RequestContext::new(api_key, tenant_id, snapshot.tokens_remaining))
    }

    /// Refuse the request before any paid call when the balance is spent.
    pub fn authorize(&self, context: &RequestContext) -> AssistantResult<()> {
        if context.remaining_balance <= 0 {
            warn!(
                tenant_id = %context.tenant_id,
                remaining = context.remaining_balance,
                "request refused: token balance exhausted"
            );
            return Err(AssistantError::AuthorizationExhausted {
                remaining: context.remaining_balance,
            });
        }
        Ok(())
    }

    /// Debit the whole request. Returns the balance after the debit.
    #[instrument(skip(self, context, request), fields(tenant_id = %context.tenant_id))]
    pub async fn settle(&self, context: &RequestContext, request: &QueryRequest, tokens: u32) -> AssistantResult<i64> {
        if tokens == 0 {
            debug!("nothing to debit");
            return Ok(context.remaining_balance);
        }

        let receipt = self
            .billing
            .debit(debit_request(context, request, tokens, QUERY_PROMPT_TYPE))
            .await
            .map_err(|err| match err {
                AssistantError::BillingDebitFailure(_) => err,
                other => AssistantError::BillingDebitFailure(other.to_string()),
            })?;

        info!(tokens, remaining = receipt.tokens_remaining, "tokens debited");
        Ok(receipt.tokens_remaining)
    }

    /// Debit only the classifier tokens after a failed request. Never fails.
    #[instrument(skip(self, context, request), fields(tenant_id = %context.tenant_id))]
    pub async fn settle_classifier_only(
        &self,
        context: &RequestContext,
        request: &QueryRequest,
        tokens: u32,
    ) -> Option<i64> {
        if tokens == 0 {
            return None;
        }

        match self
            .billing
            .debit(debit_request(context, request, tokens, INTENT_PROMPT_TYPE))
            .await
        {
            Ok(receipt) => {
                info!(tokens, remaining = receipt.tokens_remaining, "classifier tokens debited");
                Some(receipt.tokens_remaining)
            }
            Err(err) => {
                error!(tokens, error = %err, "classifier token debit failed");
                None
            }
        }
    }
}

fn debit_request(context: &RequestContext, request: &QueryRequest, tokens: u32, prompt_type: &str) -> DebitRequest {
    DebitRequest {
        api_key: context.api_key.clone(),
        tokens_used: tokens,
        module: request
            .module
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| ALL_MODULES.to_string()),
        prompt_type: prompt_type.to_string(),
        query_text: request.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::DebitReceipt;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        debits: Mutex<Vec<DebitRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl BillingService for Recorder {
        async fn debit(&self, request: DebitRequest) -> AssistantResult<DebitReceipt> {
            self.debits.lock().expect("lock").push(request);
            if self.fail {
                return Err(AssistantError::provider("billing", "503"));
            }
            Ok(DebitReceipt {
                tokens_remaining: 900,
                last_updated: None,
                transaction_id: None,
            })
        }

        async fn balance(&self, api_key: &str) -> AssistantResult<BalanceSnapshot> {
            Ok(BalanceSnapshot {
                api_key: api_key.to_string(),
                tenant_id: "acme".into(),
                company_name: "ACME".into(),
                tokens_remaining: 1000,
                last_updated: None,
                transaction_count: 0,
                last_week_usage: 0,
            })
        }
    }

    fn request() -> QueryRequest {
        QueryRequest::new("quante vendite?", "acme")
    }

    #[test]
    fn test_authorize_refuses_spent_balance() {
        let ledger = TokenLedger::new(Arc::new(Recorder::default()));
        assert!(ledger.authorize(&RequestContext::new("k", "acme", 1)).is_ok());
        assert!(matches!(
            ledger.authorize(&RequestContext::new("k", "acme", 0)),
            Err(AssistantError::AuthorizationExhausted { remaining: 0 })
        ));
        assert!(ledger.authorize(&RequestContext::new("k", "acme", -5)).is_err());
    }

    #[tokio::test]
    async fn test_settle_tags_primary_debit() {
        let billing = Arc::new(Recorder::default());
        let ledger = TokenLedger::new(billing.clone());
        let remaining = ledger
            .settle(&RequestContext::new("k", "acme", 1000), &request(), 100)
            .await
            .expect("debit");
        assert_eq!(remaining, 900);

        let debits = billing.debits.lock().expect("lock");
        assert_eq!(debits[0].prompt_type, QUERY_PROMPT_TYPE);
        assert_eq!(debits[0].module, "all");
        assert_eq!(debits[0].tokens_used, 100);
    }

    #[tokio::test]
    async fn test_zero_token_settle_skips_billing() {
        let billing = Arc::new(Recorder::default());
        let ledger = TokenLedger::new(billing.clone());
        let remaining = ledger
            .settle(&RequestContext::new("k", "acme", 321), &request(), 0)
            .await
            .expect("no debit");
        assert_eq!(remaining, 321);
        assert!(billing.debits.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_primary_failure_is_fatal_secondary_is_not() {
        let billing = Arc::new(Recorder {
            fail: true,
            ..Recorder::default()
        });
        let ledger = TokenLedger::new(billing.clone());
        let context = RequestContext::new("k", "acme", 1000);

        assert!(matches!(
            ledger.settle(&context, &request(), 50).await,
            Err(AssistantError::BillingDebitFailure(_))
        ));
        assert_eq!(ledger.settle_classifier_only(&context, &request(), 50).await, None);

        let debits = billing.debits.lock().expect("lock");
        assert_eq!(debits[1].prompt_type, INTENT_PROMPT_TYPE);
    }

    #[tokio::test]
    async fn test_open_context_uses_balance() {
        let ledger = TokenLedger::new(Arc::new(Recorder::default()));
        let context = ledger.open_context("k", "acme").await.expect("context");
        assert_eq!(context.remaining_balance, 1000);
        assert_eq!(context.tenant_id, "acme");
    }
}

//! `balance`: out-of-band token balance read.

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::ports::BalanceSnapshot;
use crate::services::Orchestrator;

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct BalanceOutput(pub BalanceSnapshot);

impl CommandOutput for BalanceOutput {
    fn to_human(&self) -> String {
        let snapshot = &self.0;
        let remaining = if snapshot.tokens_remaining > 0 {
            style(snapshot.tokens_remaining).green().bold()
        } else {
            style(snapshot.tokens_remaining).red().bold()
        };

        let mut lines = vec![
            format!("Client:            {} ({})", snapshot.company_name, snapshot.tenant_id),
            format!("Tokens remaining:  {remaining}"),
            format!("Used last week:    {}", snapshot.last_week_usage),
            format!("Transactions:      {}", snapshot.transaction_count),
        ];
        if let Some(updated) = snapshot.last_updated {
            lines.push(format!("Last updated:      {}", updated.format("%Y-%m-%d %H:%M:%S UTC")));
        }
        lines.join("\n")
    }
}

pub async fn execute(orchestrator: &Orchestrator, api_key: &str, json: bool) -> Result<()> {
    let snapshot = orchestrator
        .ledger()
        .balance(api_key)
        .await
        .context("Failed to read token balance")?;
    output(&BalanceOutput(snapshot), json);
    Ok(())
}

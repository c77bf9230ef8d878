//! `query`: the full assistant pipeline.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use console::style;

use crate::cli::output::progress::{create_spinner, ProgressBarExt};
use crate::cli::output::table::{source_table, suggestion_table};
use crate::domain::models::{AssistantResponse, ConversationContext, QueryRequest};
use crate::services::Orchestrator;

pub struct QueryArgs {
    pub text: String,
    pub tenant: String,
    pub api_key: String,
    pub module: Option<String>,
    pub screen: Option<String>,
    pub selected: Vec<(String, String)>,
}

impl QueryArgs {
    fn request(self) -> QueryRequest {
        let mut request = QueryRequest::new(self.text, self.tenant);
        if let Some(module) = self.module {
            request = request.with_module(module);
        }
        if self.screen.is_some() || !self.selected.is_empty() {
            request = request.with_context(ConversationContext {
                current_screen: self.screen,
                selected_data: self.selected.into_iter().collect::<BTreeMap<_, _>>(),
                ..ConversationContext::default()
            });
        }
        request
    }
}

pub async fn execute(orchestrator: &Orchestrator, args: QueryArgs, json: bool) -> Result<()> {
    let api_key = args.api_key.clone();
    let request = args.request();

    let spinner = create_spinner("Thinking...", json);
    let response = orchestrator.process_with_key(&request, &api_key).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if !response.success {
        spinner.finish_error("Request failed");
        bail!(response.error.unwrap_or_else(|| "request failed".to_string()));
    }
    spinner.finish_success(format!(
        "Answered by {}",
        response.agent_used.map_or("-", |a| a.as_str())
    ));
    print_human(&response)?;
    Ok(())
}

fn print_human(response: &AssistantResponse) -> Result<()> {
    println!("\n{}", response.response);

    if let Some(sql) = &response.sql {
        let verdict = if sql.is_safe {
            style("safe").green()
        } else {
            style("rejected").red()
        };
        println!("\n{} ({verdict})\n{}", style("SQL").bold(), sql.query);
    }

    if let Some(result) = &response.result {
        println!("\n{}\n{}", style("Result").bold(), serde_json::to_string_pretty(result)?);
    }

    if !response.suggested_actions.is_empty() {
        println!("\n{}\n{}", style("Suggested actions").bold(), suggestion_table(&response.suggested_actions));
    }

    if !response.sources.is_empty() {
        println!("\n{}\n{}", style("Sources").bold(), source_table(&response.sources));
    }

    let usage = &response.token_usage;
    println!(
        "\n{}",
        style(format!(
            "tokens: {} (classifier {}, embedding {}, input {}, output {}), remaining {}",
            usage.total_in_query,
            usage.classifier_tokens,
            usage.embedding_tokens,
            usage.agent_input_tokens,
            usage.agent_output_tokens,
            response.tokens_remaining
        ))
        .dim()
    );
    Ok(())
}

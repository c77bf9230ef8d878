//! `actions`: list, search, show and run action definitions.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::output::progress::{create_spinner, ProgressBarExt};
use crate::cli::output::table::{action_table, render_list};
use crate::cli::output::{output, CommandOutput};
use crate::cli::types::ActionCommands;
use crate::domain::models::ActionDefinition;
use crate::services::Orchestrator;

#[derive(Debug, Serialize)]
pub struct ActionListOutput {
    pub actions: Vec<ActionDefinition>,
    pub total: usize,
}

impl CommandOutput for ActionListOutput {
    fn to_human(&self) -> String {
        render_list("action", &action_table(&self.actions), self.total)
    }
}

#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub action: String,
    pub result: Value,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let result = serde_json::to_string_pretty(&self.result).unwrap_or_else(|_| self.result.to_string());
        format!("Action '{}' executed.\n{result}", self.action)
    }
}

fn parse_params(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw).context("Parameters are not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("Parameters must be a JSON object, got {other}")),
    }
}

pub async fn execute(orchestrator: &Orchestrator, command: ActionCommands, json: bool) -> Result<()> {
    match command {
        ActionCommands::List { tenant, module } => {
            let actions = orchestrator
                .actions()
                .list(&tenant, module.as_deref())
                .await
                .context("Failed to list actions")?;
            let total = actions.len();
            output(&ActionListOutput { actions, total }, json);
        }
        ActionCommands::Search {
            text,
            tenant,
            module,
            top,
        } => {
            let menu = orchestrator
                .actions()
                .search(&tenant, module.as_deref(), &text, top)
                .await
                .context("Failed to search actions")?;
            let total = menu.actions.len();
            output(
                &ActionListOutput {
                    actions: menu.actions,
                    total,
                },
                json,
            );
        }
        ActionCommands::Show { id, tenant } => {
            let action = orchestrator
                .actions()
                .get(&tenant, &id)
                .await
                .context("Failed to look up action")?
                .ok_or_else(|| anyhow!("Action not found: {id}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&action)?);
            } else {
                println!("{}", action_table(std::slice::from_ref(&action)));
                if !action.description.is_empty() {
                    println!("\n{}", action.description);
                }
            }
        }
        ActionCommands::Run { name, tenant, params } => {
            let parameters = parse_params(&params)?;
            let spinner = create_spinner(format!("Running {name}..."), json);
            match orchestrator.erp().execute_confirmed(&tenant, &name, &parameters).await {
                Ok(result) => {
                    spinner.finish_success("Done");
                    output(&RunOutput { action: name, result }, json);
                }
                Err(err) => {
                    spinner.finish_error("Failed");
                    return Err(err).with_context(|| format!("Action '{name}' was not executed"));
                }
            }
        }
    }
    Ok(())
}

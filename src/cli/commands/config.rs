//! `config show`: the effective configuration after all layers merge.

use anyhow::Result;

use crate::cli::types::ConfigCommands;
use crate::domain::models::Config;

const MASK: &str = "********";

fn mask(value: &mut String) {
    if !value.is_empty() {
        MASK.clone_into(value);
    }
}

/// Copy of the configuration with keys and connection strings hidden.
pub fn masked(config: &Config) -> Config {
    let mut config = config.clone();
    mask(&mut config.completion.api_key);
    mask(&mut config.embedding.api_key);
    mask(&mut config.search.api_key);
    mask(&mut config.erp.default_connection);
    config.erp.connections.values_mut().for_each(mask);
    config
}

pub fn execute(config: &Config, command: &ConfigCommands, json: bool) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = masked(config);
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", serde_yaml::to_string(&config)?);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_are_masked() {
        let mut config = Config::default();
        config.completion.api_key = "sk-live-123".into();
        config.erp.connections.insert("acme".into(), "Server=db;Password=x".into());

        let shown = masked(&config);
        assert_eq!(shown.completion.api_key, MASK);
        assert_eq!(shown.embedding.api_key, "");
        assert_eq!(shown.erp.connections["acme"], MASK);
        assert_eq!(config.completion.api_key, "sk-live-123");
    }
}

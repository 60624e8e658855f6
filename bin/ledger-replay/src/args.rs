use std::path::PathBuf;

use argh::FromArgs;
use toml::value::Table;

use crate::errors::ConfigError;

#[derive(Debug, Clone, FromArgs)]
#[argh(description = "Replays a block of operations against a genesis snapshot")]
pub struct Args {
    #[argh(option, short = 'c', description = "path to configuration")]
    pub config: PathBuf,

    /// JSON list of states the block runs against.
    #[argh(option, short = 'g', description = "genesis states (JSON)")]
    pub genesis: PathBuf,

    /// JSON object with the block height and its operations.
    #[argh(option, short = 'b', description = "block to replay (JSON)")]
    pub block: PathBuf,

    /// Item worker count that will override the one in the config toml.
    #[argh(option, description = "item check workers")]
    pub item_workers: Option<usize>,

    /// Other generic overrides to the config toml.
    /// Will be used, for example, as `-o params.suffrage_threshold=100 -o logging.filter=debug`
    #[argh(option, short = 'o', description = "generic config overrides")]
    pub overrides: Vec<String>,
}

impl Args {
    /// Get strings of overrides gathered from args.
    pub fn get_overrides(&self) -> Vec<String> {
        let mut overrides = self.overrides.clone();
        if let Some(n) = self.item_workers {
            overrides.push(format!("exec.item_workers={n}"));
        }
        overrides
    }
}

type Override = (String, toml::Value);

/// Splits an override at the first '=' into its dotted key path and value.
pub fn parse_override(override_str: &str) -> Result<Override, ConfigError> {
    let (key, value_str) = override_str
        .split_once('=')
        .ok_or(ConfigError::InvalidOverride(override_str.to_string()))?;
    Ok((key.to_string(), parse_value(value_str)))
}

/// Sets `value` at the dotted `path` inside `table`.  Intermediate tables
/// must already exist.
pub fn apply_override(
    path: &str,
    value: toml::Value,
    table: &mut Table,
) -> Result<(), ConfigError> {
    match path.split_once('.') {
        None => {
            table.insert(path.to_string(), value);
            Ok(())
        }
        Some((key, rest)) => {
            if let Some(t) = table.get_mut(key).and_then(|v| v.as_table_mut()) {
                apply_override(rest, value, t)
            } else if table.contains_key(key) {
                Err(ConfigError::TraverseNonTableAt(key.to_string()))
            } else {
                Err(ConfigError::MissingKey(key.to_string()))
            }
        }
    }
}

/// Tries `i64`, then `bool`, and falls back to a string.
fn parse_value(str_value: &str) -> toml::Value {
    str_value
        .parse::<i64>()
        .map(toml::Value::Integer)
        .or_else(|_| str_value.parse::<bool>().map(toml::Value::Boolean))
        .unwrap_or_else(|_| toml::Value::String(str_value.to_string()))
}

#[cfg(test)]
mod test {
    use ledger_config::{Config, ExecConfig, LoggingConfig};
    use ledger_primitives::prelude::*;

    use super::*;

    fn get_config() -> Config {
        Config {
            params: ExecParams::new(NetworkId::new("mitum")),
            exec: ExecConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    fn args(overrides: &[&str], item_workers: Option<usize>) -> Args {
        Args {
            config: "config_path".into(),
            genesis: "genesis.json".into(),
            block: "block.json".into(),
            item_workers,
            overrides: overrides.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_apply_override() {
        let config = get_config();
        let mut toml = toml::Value::try_from(&config).unwrap();
        let table = toml.as_table_mut().unwrap();
        let args = args(
            &[
                "params.suffrage_threshold=100",
                "logging.whoami=replay-b",
                "logging.filter=debug",
            ],
            Some(1),
        );

        for (path, val) in args.get_overrides().iter().map(|o| parse_override(o).unwrap()) {
            apply_override(&path, val, table).unwrap();
        }

        let new_config: Config = toml.try_into().unwrap();
        assert_eq!(new_config.params.suffrage_threshold, 100);
        assert_eq!(new_config.exec.item_workers, 1);
        assert_eq!(new_config.logging.whoami, "replay-b");
        assert_eq!(new_config.logging.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_bad_overrides() {
        let config = get_config();
        let mut toml = toml::Value::try_from(&config).unwrap();
        let table = toml.as_table_mut().unwrap();

        assert!(matches!(
            parse_override("params.network_id"),
            Err(ConfigError::InvalidOverride(_))
        ));

        let (path, val) = parse_override("nope.x=1").unwrap();
        assert!(matches!(
            apply_override(&path, val, table),
            Err(ConfigError::MissingKey(k)) if k == "nope"
        ));

        let (path, val) = parse_override("params.network_id.x=1").unwrap();
        assert!(matches!(
            apply_override(&path, val, table),
            Err(ConfigError::TraverseNonTableAt(k)) if k == "network_id"
        ));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("12"), toml::Value::Integer(12));
        assert_eq!(parse_value("false"), toml::Value::Boolean(false));
        assert_eq!(parse_value("mitum"), toml::Value::String("mitum".into()));
    }
}

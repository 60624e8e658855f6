use ledger_primitives::prelude::*;
use serde::{Deserialize, Serialize};

/// Default value for `item_workers` in [`ExecConfig`].
const DEFAULT_ITEM_WORKERS: usize = 4;

/// Default value for `whoami` in [`LoggingConfig`].
const DEFAULT_WHOAMI: &str = "ledger-replay";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Threads used to check the independent items of one operation.  One
    /// means checking inline.
    #[serde(default = "default_item_workers")]
    pub item_workers: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            item_workers: DEFAULT_ITEM_WORKERS,
        }
    }
}

fn default_item_workers() -> usize {
    DEFAULT_ITEM_WORKERS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_whoami")]
    pub whoami: String,

    /// Filter directive used when `RUST_LOG` isn't set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            whoami: default_whoami(),
            filter: None,
        }
    }
}

fn default_whoami() -> String {
    DEFAULT_WHOAMI.to_owned()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub params: ExecParams,

    #[serde(default)]
    pub exec: ExecConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

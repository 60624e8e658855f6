use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing `=` in an override string.
    #[error("invalid override: '{0}'")]
    InvalidOverride(String),

    #[error("expected table at '{0}'")]
    TraverseNonTableAt(String),

    #[error("missing key: '{0}'")]
    MissingKey(String),

    #[error("config is not a table")]
    NotTable,
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("read {0:?}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("parse config: {0}")]
    ConfigToml(#[from] toml::de::Error),

    #[error("parse {0:?}: {1}")]
    Json(PathBuf, serde_json::Error),

    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

use std::env;

use tracing::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const SVC_LABEL_ENVVAR: &str = "LEDGER_SVC_LABEL";

/// Directive used when `RUST_LOG` isn't set.
pub const DEFAULT_FILTER: &str = "info";

#[derive(Clone, Debug)]
pub struct LoggerConfig {
    whoami: String,
    filter: String,
}

impl LoggerConfig {
    /// Creates a new instance with whoami set and the default filter.
    pub fn new(whoami: String) -> Self {
        Self {
            whoami,
            filter: DEFAULT_FILTER.to_owned(),
        }
    }

    pub fn with_base_name(s: &str) -> Self {
        Self::new(get_whoami_string(s))
    }

    /// Sets the directive used when `RUST_LOG` isn't set.
    pub fn set_filter(&mut self, filter: String) {
        self.filter = filter;
    }

    pub fn whoami(&self) -> &str {
        &self.whoami
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter))
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::with_base_name("(ledger-service)")
    }
}

/// Initializes the logging subsystem with the provided config.
pub fn init(config: LoggerConfig) {
    // Stderr logging.
    let stdout_sub = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(config.env_filter());

    tracing_subscriber::registry().with(stdout_sub).init();

    info!(whoami = %config.whoami, "logging started");
}

/// Shuts down the logging subsystem.
pub fn finalize() {
    info!("shutting down logging");
}

/// Gets the service label from the standard envvar, which should be included
/// in the whoami string.
pub fn get_service_label_from_env() -> Option<String> {
    env::var(SVC_LABEL_ENVVAR).ok()
}

/// Computes a standard whoami string.
pub fn get_whoami_string(base: &str) -> String {
    match get_service_label_from_env() {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}

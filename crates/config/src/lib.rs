//! Configuration for the ledger binaries.

mod config;

pub use config::*;

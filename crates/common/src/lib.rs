//! Reusable utils for the binaries, such as initializing the tracing
//! framework and reading env overrides.

pub mod env;
pub mod logging;

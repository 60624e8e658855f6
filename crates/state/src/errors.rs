use ledger_primitives::prelude::*;
use thiserror::Error;

use crate::{key::StateKey, merger::MergerKind};

/// Failures reading the host's state snapshot.
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    #[error("state backend: {0}")]
    Backend(String),

    #[error("corrupt state record at {0}")]
    Corrupt(StateKey),
}

/// Merging failures.  These indicate a bug in whoever produced the merge
/// values, never a user error.
#[derive(Debug, Clone, Error)]
pub enum MergeError {
    #[error("key {0} merged with {1:?} and {2:?}")]
    MixedMergers(StateKey, MergerKind, MergerKind),

    #[error("merger {1:?} for {0} can't apply {2}")]
    UnexpectedOp(StateKey, MergerKind, &'static str),

    #[error("existing value at {0} has unexpected type {1}")]
    UnexpectedValue(StateKey, &'static str),

    #[error("merge at {0} requires an existing value")]
    MissingBase(StateKey),

    #[error("balance at {key} would go negative ({have} - {deduct})")]
    Underflow { key: StateKey, have: Big, deduct: Big },

    #[error("merge at {0} produced no value")]
    Empty(StateKey),

    #[error("reading base state: {0}")]
    Access(#[from] AccessError),
}

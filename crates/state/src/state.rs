use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{key::StateKey, value::StateValue};

/// Versioned record in the host's store.
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct State {
    key: StateKey,
    value: StateValue,

    /// Height at which the record was last written.
    height: Height,

    /// Hashes of the facts that produced this version.
    #[serde(default)]
    operations: Vec<Buf32>,
}

impl State {
    pub fn new(key: StateKey, value: StateValue, height: Height, operations: Vec<Buf32>) -> Self {
        Self {
            key,
            value,
            height,
            operations,
        }
    }

    pub fn key(&self) -> &StateKey {
        &self.key
    }

    pub fn value(&self) -> &StateValue {
        &self.value
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn operations(&self) -> &[Buf32] {
        &self.operations
    }

    pub fn into_value(self) -> StateValue {
        self.value
    }

    pub fn hash(&self) -> Buf32 {
        ledger_primitives::hash::compute_borsh_hash(self)
    }
}

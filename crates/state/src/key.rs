//! Deterministic state key derivation.
//!
//! The string layout is persisted by running chains and must not change.

use std::fmt;

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;
use serde::{Deserialize, Serialize};

const BALANCE_PREFIX: &str = "balance:";
const ACCOUNT_PREFIX: &str = "account:";
const DESIGN_PREFIX: &str = "design:";
const CONTRACT_ACCOUNT_PREFIX: &str = "contractaccount:";
const SUFFRAGE_KEY: &str = "suffrage";
const SUFFRAGE_CANDIDATE_KEY: &str = "suffragecandidate";

/// What a key refers to, recovered from its prefix.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StateKeyKind {
    Balance,
    Account,
    Design,
    ContractAccount,
    Suffrage,
    SuffrageCandidate,
}

#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    pub fn balance(addr: &Address, cid: &CurrencyId) -> Self {
        Self(format!("{BALANCE_PREFIX}{addr}:{cid}"))
    }

    pub fn account(addr: &Address) -> Self {
        Self(format!("{ACCOUNT_PREFIX}{addr}"))
    }

    pub fn design(cid: &CurrencyId) -> Self {
        Self(format!("{DESIGN_PREFIX}{cid}"))
    }

    pub fn contract_account(addr: &Address) -> Self {
        Self(format!("{CONTRACT_ACCOUNT_PREFIX}{addr}"))
    }

    pub fn suffrage() -> Self {
        Self(SUFFRAGE_KEY.to_owned())
    }

    pub fn suffrage_candidate() -> Self {
        Self(SUFFRAGE_CANDIDATE_KEY.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> Option<StateKeyKind> {
        let s = self.0.as_str();
        if s == SUFFRAGE_KEY {
            Some(StateKeyKind::Suffrage)
        } else if s == SUFFRAGE_CANDIDATE_KEY {
            Some(StateKeyKind::SuffrageCandidate)
        } else if s.starts_with(BALANCE_PREFIX) {
            Some(StateKeyKind::Balance)
        } else if s.starts_with(ACCOUNT_PREFIX) {
            Some(StateKeyKind::Account)
        } else if s.starts_with(DESIGN_PREFIX) {
            Some(StateKeyKind::Design)
        } else if s.starts_with(CONTRACT_ACCOUNT_PREFIX) {
            Some(StateKeyKind::ContractAccount)
        } else {
            None
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

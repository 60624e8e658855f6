use ledger_primitives::{errors::KeysError, prelude::*};
use thiserror::Error;

use crate::kind::OperationKind;

/// Reasons a fact is malformed on its own.
#[derive(Debug, Clone, Error)]
pub enum FactError {
    #[error("fact hash mismatch (expected {expected:?}, found {found:?})")]
    HashMismatch { expected: Buf32, found: Buf32 },

    #[error("empty token")]
    EmptyToken,

    #[error("token too long ({0} bytes)")]
    TokenTooLong(usize),

    #[error("{0:?} fact has no items")]
    NoItems(OperationKind),

    #[error("{0:?} fact has too many items (max {1}, got {2})")]
    TooManyItems(OperationKind, usize, usize),

    #[error("item has too many amounts (max {0}, got {1})")]
    TooManyAmounts(usize, usize),

    #[error("item has no amounts")]
    NoAmounts,

    #[error("zero amount of {0}")]
    ZeroAmount(CurrencyId),

    #[error("duplicated currency {0} in item")]
    DuplicatedCurrency(CurrencyId),

    #[error("duplicated item for {0}")]
    DuplicatedItem(String),

    #[error("address {0} targets itself")]
    SelfTarget(Address),

    #[error("invalid address {0}")]
    InvalidAddress(Address),

    #[error("invalid currency id {0}")]
    InvalidCurrency(CurrencyId),

    #[error("invalid keys: {0}")]
    InvalidKeys(#[from] KeysError),

    #[error("invalid currency policy for {0}")]
    InvalidPolicy(CurrencyId),

    #[error("invalid public key {0:?}")]
    InvalidPublicKey(PublicKey),

    #[error("list too long (max {0}, got {1})")]
    ListTooLong(usize, usize),

    #[error("invalid window [{0}, {1}]")]
    InvalidWindow(Height, Height),
}

impl FactError {
    /// Whether the fact merely exceeds an item count limit.
    pub fn is_too_many_items(&self) -> bool {
        matches!(
            self,
            FactError::TooManyItems(..) | FactError::TooManyAmounts(..) | FactError::ListTooLong(..)
        )
    }
}

/// Reasons a signed operation is malformed on its own.
#[derive(Debug, Clone, Error)]
pub enum OperationError {
    #[error("fact: {0}")]
    Fact(#[from] FactError),

    #[error("operation carries no signatures")]
    NoSigns,

    #[error("invalid signature by {0:?}")]
    InvalidSign(PublicKey),

    #[error("duplicated signer {0:?}")]
    DuplicatedSigner(PublicKey),

    #[error("node operation sign without node address")]
    MissingNode,

    #[error("duplicated node {0} in signs")]
    DuplicatedNode(Address),

    #[error("unexpected node address on {0:?} operation")]
    UnexpectedNode(OperationKind),
}

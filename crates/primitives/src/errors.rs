//! Errors during parsing/handling/conversion of primitives.

use thiserror::Error;

/// Parsing errors for the primitive identifiers and quantities.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ParseError {
    #[error("expected {0} bytes, got {1}")]
    InvalidBufLen(usize, usize),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid big number: {0}")]
    InvalidBig(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid currency id: {0}")]
    InvalidCurrencyId(String),
}

/// Structural problems with a set of account keys.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum KeysError {
    #[error("empty keys")]
    Empty,

    #[error("too many keys (max {0}, got {1})")]
    TooMany(usize, usize),

    #[error("duplicated key {0}")]
    Duplicated(String),

    #[error("keys not in canonical order")]
    Unsorted,

    #[error("weight {0} out of range")]
    InvalidWeight(u8),

    #[error("threshold {0} out of range")]
    InvalidThreshold(u8),

    #[error("sum of weights {0} under threshold {1}")]
    WeightsUnderThreshold(u32, u8),

    #[error("invalid public key {0}")]
    InvalidPublicKey(String),
}

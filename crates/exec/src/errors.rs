//! The two error channels of operation processing.
//!
//! A [`ReasonError`] rejects one operation and is recorded against it.  An
//! [`ExecError`] means the node can't trust its own view of the block and the
//! host must abort it.  Processors return [`ProcError`] so both can be
//! propagated with `?`, the dispatcher splits them apart again.

use ledger_ops::{FactError, OperationError, OperationKind};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;
use thiserror::Error;

/// Expected per-operation rejections.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ReasonError {
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("no processor registered for {0}")]
    UnknownOperation(OperationKind),

    #[error("duplication found: {0}")]
    Duplicated(String),

    #[error("account {0} not found")]
    AccountNotFound(Address),

    #[error("account {0} already exists")]
    AccountExists(Address),

    #[error("balance of {0} in {1} already exists")]
    BalanceExists(Address, CurrencyId),

    #[error("currency {0} not found")]
    CurrencyNotFound(CurrencyId),

    #[error("currency {0} already exists")]
    CurrencyExists(CurrencyId),

    #[error("fee receiver {0} has no balance in {1}")]
    FeeReceiverNotFound(Address, CurrencyId),

    #[error("insufficient balance of {address} in {currency} (need {need}, have {have})")]
    InsufficientBalance {
        address: Address,
        currency: CurrencyId,
        need: Big,
        have: Big,
    },

    #[error("amount of {0} below new account minimum balance {1}")]
    BelowNewAccountMinBalance(CurrencyId, Big),

    #[error("{0} is a contract account")]
    ContractAccount(Address),

    #[error("{0} is not a contract account")]
    NotContractAccount(Address),

    #[error("{0} is not the owner of contract {1}")]
    NotOwner(Address, Address),

    #[error("contract account {0} is not active")]
    ContractInactive(Address),

    #[error("{0} targets itself")]
    SelfTarget(Address),

    #[error("account {0} already holds these keys")]
    SameKeys(Address),

    #[error("account {0} has nil keys")]
    NilKeys(Address),

    #[error("not enough signs for {0}")]
    NotEnoughSigns(Address),

    #[error("not enough valid node signs (got {got}, need {need})")]
    InvalidNodeSigns { got: usize, need: usize },

    #[error("too many items: {0}")]
    TooManyItems(String),

    #[error("{0} is not a suffrage member")]
    NotSuffrageMember(Address),

    #[error("{0} is already a suffrage member")]
    AlreadySuffrageMember(Address),

    #[error("suffrage candidate {0} not found")]
    CandidateNotFound(Address),

    #[error("suffrage candidate {0} already registered")]
    CandidateExists(Address),

    #[error("start height mismatch (expected {expected}, found {found})")]
    StartMismatch { expected: Height, found: Height },

    #[error("signer does not match the key recorded for {0}")]
    SignerMismatch(Address),

    #[error("{0} already leaves the suffrage in this block")]
    AlreadyWithdrawn(Address),

    #[error("height {0} outside expel window [{1}, {2}]")]
    OutsideExpelWindow(Height, Height, Height),
}

impl From<FactError> for ReasonError {
    fn from(e: FactError) -> Self {
        if e.is_too_many_items() {
            ReasonError::TooManyItems(e.to_string())
        } else {
            ReasonError::InvalidOperation(e.to_string())
        }
    }
}

impl From<OperationError> for ReasonError {
    fn from(e: OperationError) -> Self {
        match e {
            OperationError::Fact(fe) => fe.into(),
            e => ReasonError::InvalidOperation(e.to_string()),
        }
    }
}

/// Failures that must abort the whole block.
#[derive(Debug, Clone, Error)]
pub enum ExecError {
    #[error("state access: {0}")]
    Access(#[from] AccessError),

    #[error("state at {0} is not a {1}")]
    UnexpectedValue(StateKey, &'static str),

    #[error("merge: {0}")]
    Merge(#[from] MergeError),

    #[error("{0} operation routed to {1} processor")]
    MismatchedProcessor(OperationKind, OperationKind),

    #[error("processor for {0} registered twice")]
    DuplicateRegistration(OperationKind),

    #[error("pending balance at {0} overflowed")]
    BalanceOverflow(StateKey),

    #[error("processor pool: {0}")]
    Pool(String),

    #[error("item workers: {0}")]
    Workers(String),
}

/// Either kind of failure, inside processors.
#[derive(Debug, Clone, Error)]
pub enum ProcError {
    #[error("{0}")]
    Reason(#[from] ReasonError),

    #[error("fatal: {0}")]
    Fatal(#[from] ExecError),
}

impl From<AccessError> for ProcError {
    fn from(e: AccessError) -> Self {
        ProcError::Fatal(e.into())
    }
}

impl From<MergeError> for ProcError {
    fn from(e: MergeError) -> Self {
        ProcError::Fatal(e.into())
    }
}

pub type ProcResult<T> = Result<T, ProcError>;

/// Shorthand for rejecting with a reason.
pub(crate) fn reject<T>(reason: ReasonError) -> ProcResult<T> {
    Err(ProcError::Reason(reason))
}

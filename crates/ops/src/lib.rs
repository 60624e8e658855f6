//! Facts and the signed operations that carry them.
//!
//! Everything here is stateless: a fact can be checked for internal
//! consistency and an operation for well-formed signatures without looking
//! at any ledger state.

pub mod errors;
pub mod fact;
pub mod facts;
pub mod kind;
pub mod operation;

pub use errors::{FactError, OperationError};
pub use fact::{Fact, FactBody};
pub use kind::OperationKind;
pub use operation::{Operation, SignEntry};

/// Maximum number of items in CreateAccount, Transfer and
/// CreateContractAccount facts.
pub const MAX_ACCOUNT_ITEMS: usize = 100;

/// Maximum number of items in a Withdraw fact.
pub const MAX_WITHDRAW_ITEMS: usize = 1000;

/// Maximum number of items in a Mint fact.
pub const MAX_MINT_ITEMS: usize = 10;

/// Maximum number of amounts in a single item.
pub const MAX_AMOUNTS_PER_ITEM: usize = 10;

/// Maximum length of an operator, recipient or handler list.
pub const MAX_CONTRACT_LIST_LEN: usize = 10;

/// Maximum token length in bytes.
pub const MAX_TOKEN_LEN: usize = 100;

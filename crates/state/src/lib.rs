//! State records of the ledger and the machinery that folds per-operation
//! deltas into them.
//!
//! Nothing here performs I/O.  Reads go through a [`StateAccessor`] the host
//! provides, writes are expressed as [`StateMergeValue`]s that a
//! [`StateMergeSession`] resolves into one new record per key.

pub mod accessor;
pub mod account;
pub mod currency;
pub mod errors;
pub mod key;
pub mod merge_session;
pub mod merger;
pub mod state;
pub mod state_op;
pub mod suffrage;
pub mod value;

pub mod prelude;

pub use accessor::StateAccessor;
pub use merge_session::StateMergeSession;
pub use state_op::StateMergeValue;

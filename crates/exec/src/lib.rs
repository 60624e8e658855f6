//! Operation processing core: validates the operations of a block against a
//! state snapshot and turns the accepted ones into merged state changes.

pub mod block;
pub mod deltas;
pub mod dispatcher;
pub mod errors;
pub mod fee;
pub mod helpers;
pub mod pending;
pub mod pool;
pub mod processor;
pub mod processors;
pub mod registry;
pub mod session;

pub use block::{
    build_item_workers, process_block, process_block_with_pool, BlockOutput, OpOutcome, OpResult,
};
pub use dispatcher::{OperationProcessor, Outcome};
pub use errors::{ExecError, ProcError, ProcResult, ReasonError};
pub use processor::{ProcContext, Processor};
pub use registry::{ProcessorFactory, ProcessorRegistry};
pub use session::BlockSession;

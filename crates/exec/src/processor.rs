//! The interface every per-operation processor implements.

use ledger_ops::{Operation, OperationKind};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;
use rayon::{prelude::*, ThreadPool};

use crate::{
    errors::{ExecError, ProcError, ProcResult},
    session::SuffrageContext,
};

/// What a processor may see of the block besides the snapshot.
pub struct ProcContext<'a> {
    pub params: &'a ExecParams,
    pub height: Height,

    /// Pool for checking independent items of one operation concurrently.
    pub workers: Option<&'a ThreadPool>,

    pub suffrage: &'a mut SuffrageContext,
}

/// Validates and applies one kind of operation.
///
/// Instances are pooled and may carry scratch data between the check and the
/// result of a single call, `reset` must return them to their pristine state.
pub trait Processor: Send {
    fn kind(&self) -> OperationKind;

    /// Decides whether `op` can be included in the block.
    fn pre_process(
        &mut self,
        op: &Operation,
        ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<()>;

    /// Computes the state changes of an accepted `op`.  Repeats the checks
    /// that guard the result, since the snapshot is all it can rely on.
    fn process(
        &mut self,
        op: &Operation,
        ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<Vec<StateMergeValue>>;

    fn reset(&mut self);
}

pub(crate) fn mismatched(op: &Operation, expected: OperationKind) -> ProcError {
    ExecError::MismatchedProcessor(op.kind(), expected).into()
}

/// Runs `check` on every item, concurrently when workers are available.
/// Reports the first failure in item order either way.
pub(crate) fn check_items<T, F>(ctx: &ProcContext<'_>, items: &[T], check: F) -> ProcResult<()>
where
    T: Sync,
    F: Fn(&T) -> ProcResult<()> + Sync,
{
    match ctx.workers {
        Some(pool) if items.len() > 1 => {
            let results: Vec<ProcResult<()>> =
                pool.install(|| items.par_iter().map(&check).collect());
            results.into_iter().collect()
        }
        _ => items.iter().try_for_each(check),
    }
}

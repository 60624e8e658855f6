//! Runs a whole block of operations against a snapshot.

use ledger_ops::{Operation, OperationKind};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::*;

use crate::{
    dispatcher::{OperationProcessor, Outcome},
    errors::ExecError,
    pool::ProcessorPool,
    registry::ProcessorRegistry,
};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OpOutcome {
    Accepted,
    Rejected { reason: String },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OpResult {
    pub fact_hash: Buf32,
    pub kind: OperationKind,
    pub outcome: OpOutcome,
}

impl OpResult {
    pub fn is_accepted(&self) -> bool {
        self.outcome == OpOutcome::Accepted
    }
}

/// New states of a block and what happened to each operation, in block
/// order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockOutput {
    pub height: Height,
    pub states: Vec<State>,
    pub results: Vec<OpResult>,
}

impl BlockOutput {
    pub fn accepted(&self) -> usize {
        self.results.iter().filter(|r| r.is_accepted()).count()
    }
}

/// Builds the pool item checks run on.  A single worker means checking
/// inline.
pub fn build_item_workers(n: usize) -> Result<Option<ThreadPool>, ExecError> {
    if n <= 1 {
        return Ok(None);
    }

    ThreadPoolBuilder::new()
        .num_threads(n)
        .thread_name(|i| format!("ledger-item-{i}"))
        .build()
        .map(Some)
        .map_err(|e| ExecError::Workers(e.to_string()))
}

/// Pre-processes every operation in order, processes the accepted ones and
/// merges their changes.  Any fatal error aborts the block.
pub fn process_block(
    height: Height,
    ops: &[Operation],
    accessor: &dyn StateAccessor,
    params: &ExecParams,
    registry: &ProcessorRegistry,
    workers: Option<&ThreadPool>,
) -> Result<BlockOutput, ExecError> {
    let (out, _pool) = process_block_with_pool(
        height,
        ops,
        accessor,
        params,
        registry,
        workers,
        ProcessorPool::new(),
    )?;
    Ok(out)
}

/// Like [`process_block`], reusing and handing back a processor pool.
pub fn process_block_with_pool(
    height: Height,
    ops: &[Operation],
    accessor: &dyn StateAccessor,
    params: &ExecParams,
    registry: &ProcessorRegistry,
    workers: Option<&ThreadPool>,
    pool: ProcessorPool,
) -> Result<(BlockOutput, ProcessorPool), ExecError> {
    let mut dispatcher =
        OperationProcessor::with_pool(params.clone(), height, registry, workers, pool);

    let mut outcomes = Vec::with_capacity(ops.len());
    for op in ops {
        let o = match dispatcher.pre_process(op, accessor)? {
            Outcome::Accepted(()) => None,
            Outcome::Rejected(r) => Some(OpOutcome::Rejected {
                reason: r.to_string(),
            }),
        };
        outcomes.push(o);
    }

    let mut session = StateMergeSession::new(accessor, height);
    let mut results = Vec::with_capacity(ops.len());
    for (op, pre) in ops.iter().zip(outcomes) {
        let outcome = match pre {
            Some(rejected) => rejected,
            None => match dispatcher.process(op, accessor)? {
                Outcome::Accepted(values) => {
                    session.merge(*op.hash(), values)?;
                    OpOutcome::Accepted
                }
                Outcome::Rejected(r) => OpOutcome::Rejected {
                    reason: r.to_string(),
                },
            },
        };

        results.push(OpResult {
            fact_hash: *op.hash(),
            kind: op.kind(),
            outcome,
        });
    }

    let states = session.finish()?;
    let pool = dispatcher.close();

    let out = BlockOutput {
        height,
        states,
        results,
    };
    info!(
        %height,
        ops = ops.len(),
        accepted = out.accepted(),
        states = out.states.len(),
        "processed block"
    );

    Ok((out, pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_worker_runs_inline() {
        assert!(build_item_workers(1).unwrap().is_none());
        assert_eq!(
            build_item_workers(3)
                .unwrap()
                .unwrap()
                .current_num_threads(),
            3
        );
    }

    #[test]
    fn test_empty_block() {
        let acc = MemStateAccessor::new();
        let reg = ProcessorRegistry::with_defaults().unwrap();
        let params = ExecParams::new(NetworkId::new("mitum-test"));

        let out = process_block(7, &[], &acc, &params, &reg, None).unwrap();
        assert_eq!(out.height, 7);
        assert!(out.states.is_empty());
        assert!(out.results.is_empty());
    }

    #[test]
    fn test_result_json_shape() {
        let r = OpResult {
            fact_hash: Buf32::zero(),
            kind: OperationKind::Transfer,
            outcome: OpOutcome::Rejected {
                reason: "account x not found".to_owned(),
            },
        };

        let js = serde_json::to_value(&r).unwrap();
        assert_eq!(js["kind"], "transfer");
        assert_eq!(js["outcome"]["status"], "rejected");
        assert_eq!(js["outcome"]["reason"], "account x not found");
    }
}

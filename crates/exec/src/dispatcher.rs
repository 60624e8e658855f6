//! Routes operations to their processors for one block.
//!
//! The dispatcher owns the block's [`BlockSession`], so duplication entries
//! and suffrage claims can't outlive the block.  Each call checks out a
//! processor from the pool, runs it and checks it back in, whatever the
//! result.

use ledger_ops::Operation;
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;
use rayon::ThreadPool;
use tracing::*;

use crate::{
    errors::{ExecError, ProcError, ProcResult, ReasonError},
    pending::PendingView,
    pool::ProcessorPool,
    processor::ProcContext,
    registry::ProcessorRegistry,
    session::{BlockSession, DupKeys, SessionParts},
};

/// Result of an operation that didn't fail the block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome<T = ()> {
    Accepted(T),
    Rejected(ReasonError),
}

impl<T> Outcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }

    pub fn reason(&self) -> Option<&ReasonError> {
        match self {
            Outcome::Accepted(_) => None,
            Outcome::Rejected(r) => Some(r),
        }
    }
}

/// Splits a processor result back into the reason and fatal channels.
fn settle<T>(op: &Operation, phase: &str, res: ProcResult<T>) -> Result<Outcome<T>, ExecError> {
    match res {
        Ok(v) => {
            debug!(fact = %op.hash(), kind = %op.kind(), %phase, "operation accepted");
            Ok(Outcome::Accepted(v))
        }
        Err(ProcError::Reason(r)) => {
            warn!(fact = %op.hash(), kind = %op.kind(), %phase, reason = %r, "operation rejected");
            Ok(Outcome::Rejected(r))
        }
        Err(ProcError::Fatal(e)) => {
            error!(fact = %op.hash(), kind = %op.kind(), %phase, err = %e, "fatal operation error");
            Err(e)
        }
    }
}

pub struct OperationProcessor<'r> {
    session: BlockSession,
    pool: ProcessorPool,
    registry: &'r ProcessorRegistry,
    workers: Option<&'r ThreadPool>,
}

impl<'r> OperationProcessor<'r> {
    pub fn new(
        params: ExecParams,
        height: Height,
        registry: &'r ProcessorRegistry,
        workers: Option<&'r ThreadPool>,
    ) -> Self {
        Self::with_pool(params, height, registry, workers, ProcessorPool::new())
    }

    /// Like [`Self::new`], reusing the processors of a previous block.
    pub fn with_pool(
        params: ExecParams,
        height: Height,
        registry: &'r ProcessorRegistry,
        workers: Option<&'r ThreadPool>,
        pool: ProcessorPool,
    ) -> Self {
        Self {
            session: BlockSession::new(params, height),
            pool,
            registry,
            workers,
        }
    }

    pub fn session(&self) -> &BlockSession {
        &self.session
    }

    pub fn height(&self) -> Height {
        self.session.height()
    }

    /// Decides whether `op` may go into the block.  A fact already accepted
    /// in the block is turned away first, then the operation's own validity
    /// and signatures are checked, then the block's duplication entries,
    /// then the processor.
    pub fn pre_process(
        &mut self,
        op: &Operation,
        acc: &dyn StateAccessor,
    ) -> Result<Outcome, ExecError> {
        if let Err(r) = self.session.preprocessed().check_fact(op.hash()) {
            return settle(op, "pre_process", Err(r.into()));
        }

        if let Err(e) = op.is_valid(&self.session.params().network_id) {
            return settle(op, "pre_process", Err(ReasonError::from(e).into()));
        }

        self.run(op, acc, Phase::PreProcess).map(|o| match o {
            Outcome::Accepted(_) => Outcome::Accepted(()),
            Outcome::Rejected(r) => Outcome::Rejected(r),
        })
    }

    /// Computes the state changes of `op`, which must have been accepted by
    /// [`Self::pre_process`] in this block.  Balances are read with the
    /// changes of the operations processed before it applied.
    pub fn process(
        &mut self,
        op: &Operation,
        acc: &dyn StateAccessor,
    ) -> Result<Outcome<Vec<StateMergeValue>>, ExecError> {
        self.run(op, acc, Phase::Process)
    }

    fn run(
        &mut self,
        op: &Operation,
        acc: &dyn StateAccessor,
        phase: Phase,
    ) -> Result<Outcome<Vec<StateMergeValue>>, ExecError> {
        let res = self.try_run(op, acc, phase);
        settle(op, phase.name(), res)
    }

    fn try_run(
        &mut self,
        op: &Operation,
        acc: &dyn StateAccessor,
        phase: Phase,
    ) -> ProcResult<Vec<StateMergeValue>> {
        let kind = op.kind();
        let SessionParts {
            params,
            height,
            preprocessed,
            processed,
            suffrage,
            pending,
        } = self.session.parts_mut();
        let tracker = match phase {
            Phase::PreProcess => preprocessed,
            Phase::Process => processed,
        };
        tracker.check_fact(op.hash())?;

        let view = PendingView::new(acc, pending, height);
        let keys = DupKeys::for_operation(op, &view)?;
        tracker.check(&keys)?;

        let Some(mut p) = self.pool.checkout(kind, self.registry)? else {
            return Err(ReasonError::UnknownOperation(kind).into());
        };

        let mut ctx = ProcContext {
            params,
            height,
            workers: self.workers,
            suffrage,
        };
        let res = match phase {
            Phase::PreProcess => p.pre_process(op, &mut ctx, &view).map(|()| Vec::new()),
            Phase::Process => p.process(op, &mut ctx, &view),
        };
        self.pool.checkin(p);

        let values = res?;
        if phase == Phase::Process {
            pending.record(&values)?;
        }
        tracker.record(keys, *op.hash());
        Ok(values)
    }

    /// Ends the block, handing back the pool for the next one.
    pub fn close(self) -> ProcessorPool {
        trace!(height = self.session.height(), "closing block session");
        self.pool
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Phase {
    PreProcess,
    Process,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::PreProcess => "pre_process",
            Phase::Process => "process",
        }
    }
}

impl std::fmt::Debug for OperationProcessor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationProcessor")
            .field("session", &self.session)
            .field("pool", &self.pool)
            .field("workers", &self.workers.map(|w| w.current_num_threads()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use ledger_ops::{
        facts::{
            CreateAccountFact, CreateAccountItem, TransferFact, TransferItem,
            UpdateContractListFact,
        },
        FactBody, OperationKind,
    };
    use ledger_test_utils::{
        genesis::{fixed_fee_policy, GenesisBuilder},
        keys::{amount, currency, test_keys, TestAccount},
        ops::sign_op,
    };

    use super::*;

    fn params() -> ExecParams {
        ExecParams::new(NetworkId::new("mitum-test"))
    }

    fn setup() -> (MemStateAccessor, TestAccount, TestAccount) {
        let sender = TestAccount::new(1);
        let fee_recv = TestAccount::new(2);
        let acc = GenesisBuilder::new()
            .account(&sender.keys)
            .account(&fee_recv.keys)
            .currency(
                &currency("CUR"),
                &sender.address,
                1000,
                fixed_fee_policy(&fee_recv.address, 1),
            )
            .balance(&fee_recv.address, amount("CUR", 0))
            .build();
        (acc, sender, fee_recv)
    }

    fn create(sender: &TestAccount, key: u8) -> Operation {
        sign_op(
            &params().network_id,
            FactBody::CreateAccount(CreateAccountFact {
                sender: sender.address.clone(),
                items: vec![CreateAccountItem::new(test_keys(key), vec![amount("CUR", 10)])],
            }),
            &[&sender.secret],
        )
    }

    #[test]
    fn test_same_sender_rejected_in_block() {
        let (acc, sender, _) = setup();
        let reg = ProcessorRegistry::with_defaults().unwrap();
        let mut d = OperationProcessor::new(params(), 2, &reg, None);

        let first = create(&sender, 10);
        let second = create(&sender, 11);

        assert!(d.pre_process(&first, &acc).unwrap().is_accepted());
        assert!(matches!(
            d.pre_process(&second, &acc).unwrap(),
            Outcome::Rejected(ReasonError::Duplicated(_))
        ));

        assert!(d.process(&first, &acc).unwrap().is_accepted());
    }

    #[test]
    fn test_repeated_fact_rejected_in_both_phases() {
        let (acc, sender, _) = setup();
        let reg = ProcessorRegistry::with_defaults().unwrap();
        let mut d = OperationProcessor::new(params(), 2, &reg, None);

        let op = create(&sender, 10);
        assert!(d.pre_process(&op, &acc).unwrap().is_accepted());
        assert!(matches!(
            d.pre_process(&op, &acc).unwrap().reason(),
            Some(ReasonError::Duplicated(r)) if r.starts_with("fact")
        ));

        assert!(d.process(&op, &acc).unwrap().is_accepted());
        assert!(matches!(
            d.process(&op, &acc).unwrap(),
            Outcome::Rejected(ReasonError::Duplicated(_))
        ));
    }

    #[test]
    fn test_process_records_pending_balances() {
        let (acc, sender, fee_recv) = setup();
        let reg = ProcessorRegistry::with_defaults().unwrap();
        let mut d = OperationProcessor::new(params(), 2, &reg, None);

        let op = create(&sender, 10);
        assert!(d.pre_process(&op, &acc).unwrap().is_accepted());
        assert!(d.session().pending().is_empty());
        assert!(d.process(&op, &acc).unwrap().is_accepted());

        let view = PendingView::new(&acc, d.session().pending(), 2);
        let bal = |addr: &Address| {
            view.get_state(&StateKey::balance(addr, &currency("CUR")))
                .unwrap()
                .and_then(|s| s.value().as_balance().map(|a| a.big()))
        };
        assert_eq!(bal(&sender.address), Some(Big::from(1000 - 10 - 1)));
        assert_eq!(bal(&fee_recv.address), Some(Big::from(1)));
        assert_eq!(bal(&test_keys(10).address()), Some(Big::from(10)));
    }

    #[test]
    fn test_contract_list_sender_is_scoped() {
        let (acc, sender, fee_recv) = setup();
        let reg = ProcessorRegistry::with_defaults().unwrap();
        let mut d = OperationProcessor::new(params(), 2, &reg, None);

        let update = sign_op(
            &params().network_id,
            FactBody::UpdateOperator(UpdateContractListFact {
                sender: sender.address.clone(),
                contract: Address::new("vault0mca").unwrap(),
                currency: currency("CUR"),
                addresses: vec![fee_recv.address.clone()],
            }),
            &[&sender.secret],
        );
        let keys = DupKeys::for_operation(&update, &acc).unwrap();
        assert_eq!(keys.senders, vec![sender.address.clone()]);

        assert!(d.pre_process(&create(&sender, 10), &acc).unwrap().is_accepted());
        assert!(matches!(
            d.pre_process(&update, &acc).unwrap(),
            Outcome::Rejected(ReasonError::Duplicated(_))
        ));
    }

    #[test]
    fn test_new_address_collides_across_kinds() {
        let (acc, sender, fee_recv) = setup();
        let reg = ProcessorRegistry::with_defaults().unwrap();
        let mut d = OperationProcessor::new(params(), 2, &reg, None);

        // A transfer auto-creates the address, then a creation names it.
        let target = test_keys(10).address();
        let transfer = sign_op(
            &params().network_id,
            FactBody::Transfer(TransferFact {
                sender: sender.address.clone(),
                items: vec![TransferItem::new(target, vec![amount("CUR", 5)])],
            }),
            &[&sender.secret],
        );
        let create = create(&fee_recv, 10);

        assert!(d.pre_process(&transfer, &acc).unwrap().is_accepted());
        assert!(matches!(
            d.pre_process(&create, &acc).unwrap(),
            Outcome::Rejected(ReasonError::Duplicated(_))
        ));
    }

    #[test]
    fn test_invalid_signature_rejected_before_processor() {
        let (acc, sender, _) = setup();
        let reg = ProcessorRegistry::with_defaults().unwrap();
        let other = ExecParams::new(NetworkId::new("other"));
        let mut d = OperationProcessor::new(other, 2, &reg, None);

        let op = create(&sender, 10);
        assert!(matches!(
            d.pre_process(&op, &acc).unwrap(),
            Outcome::Rejected(ReasonError::InvalidOperation(_))
        ));
        assert!(d.session().preprocessed().is_empty());
    }

    #[test]
    fn test_unknown_operation() {
        let (acc, sender, _) = setup();
        let reg = ProcessorRegistry::new();
        let mut d = OperationProcessor::new(params(), 2, &reg, None);

        assert_eq!(
            d.pre_process(&create(&sender, 10), &acc).unwrap(),
            Outcome::Rejected(ReasonError::UnknownOperation(OperationKind::CreateAccount))
        );
    }

    #[test]
    fn test_fatal_access_error_aborts() {
        let (_, sender, _) = setup();
        let reg = ProcessorRegistry::with_defaults().unwrap();
        let mut d = OperationProcessor::new(params(), 2, &reg, None);

        let broken = |_: &StateKey| -> Result<Option<State>, AccessError> {
            Err(AccessError::Backend("disk gone".to_owned()))
        };
        assert!(matches!(
            d.pre_process(&create(&sender, 10), &broken),
            Err(ExecError::Access(_))
        ));
    }

    #[test]
    fn test_pool_survives_blocks() {
        let (acc, sender, _) = setup();
        let reg = ProcessorRegistry::with_defaults().unwrap();

        let mut d = OperationProcessor::new(params(), 2, &reg, None);
        assert!(d.pre_process(&create(&sender, 10), &acc).unwrap().is_accepted());
        let pool = d.close();
        assert_eq!(pool.created(), 1);

        // A fresh session doesn't remember the previous block's sender.
        let mut d = OperationProcessor::with_pool(params(), 3, &reg, None, pool);
        assert!(d.session().is_clean());
        assert!(d.pre_process(&create(&sender, 11), &acc).unwrap().is_accepted());
        assert_eq!(d.close().created(), 1);
    }
}

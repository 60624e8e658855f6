//! One processor per operation kind.

use ledger_ops::facts::CreateAccountItem;
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::{
    deltas::BalanceDeltas,
    errors::{reject, ProcResult, ReasonError},
    fee::RequiredFees,
    helpers::{check_not_exists_account, existing_design, get_balance},
};

pub mod contract_account;
pub mod contract_list;
pub mod create_account;
pub mod currency;
pub mod mint;
pub mod suffrage;
pub mod transfer;
pub mod update_key;
pub mod withdraw;

pub use contract_account::CreateContractAccountProcessor;
pub use contract_list::ContractListProcessor;
pub use create_account::CreateAccountProcessor;
pub use currency::{RegisterCurrencyProcessor, UpdateCurrencyProcessor};
pub use mint::MintProcessor;
pub use suffrage::{
    SuffrageCandidateProcessor, SuffrageDisjoinProcessor, SuffrageExpelProcessor,
    SuffrageJoinProcessor,
};
pub use transfer::TransferProcessor;
pub use update_key::UpdateKeyProcessor;
pub use withdraw::WithdrawProcessor;

/// Checks that the account an item creates doesn't exist yet and that each
/// funded amount meets the currency's new account minimum.
pub(crate) fn check_new_account_item(
    acc: &dyn StateAccessor,
    item: &CreateAccountItem,
) -> ProcResult<()> {
    let target = item.address();
    check_not_exists_account(acc, &target)?;

    for am in &item.amounts {
        let cid = am.currency();
        let min = existing_design(acc, cid)?.policy().new_account_min_balance();
        if am.big() < min {
            return reject(ReasonError::BelowNewAccountMinBalance(cid.clone(), min));
        }

        if get_balance(acc, &target, cid)?.is_some() {
            return reject(ReasonError::BalanceExists(target, cid.clone()));
        }
    }

    Ok(())
}

/// Moves every item's funding from `sender` to the new accounts and charges
/// the fees.
pub(crate) fn settle_new_accounts(
    sender: &Address,
    items: &[CreateAccountItem],
    required: &RequiredFees,
    acc: &dyn StateAccessor,
) -> ProcResult<Vec<StateMergeValue>> {
    let mut deltas = BalanceDeltas::new();
    for it in items {
        let target = it.address();
        for am in &it.amounts {
            deltas.credit(&target, am)?;
            deltas.debit(sender, am)?;
        }
    }

    for (cid, req) in required {
        deltas.pay_fee(sender, cid, req)?;
    }

    deltas.check_sufficient(acc)?;
    Ok(deltas.into_merge_values())
}

#[cfg(test)]
pub(crate) mod test_support {
    use ledger_ops::Operation;
    use ledger_primitives::prelude::*;
    use ledger_state::prelude::*;

    use crate::{
        errors::{ProcError, ProcResult, ReasonError},
        processor::{ProcContext, Processor},
        session::SuffrageContext,
    };

    pub fn params() -> ExecParams {
        ExecParams::new(NetworkId::new("mitum-test"))
    }

    /// Runs pre-process then process with a fresh context.
    pub fn run(
        p: &mut dyn Processor,
        op: &Operation,
        acc: &dyn StateAccessor,
        height: Height,
    ) -> ProcResult<Vec<StateMergeValue>> {
        let params = params();
        let mut suffrage = SuffrageContext::default();
        let mut ctx = ProcContext {
            params: &params,
            height,
            workers: None,
            suffrage: &mut suffrage,
        };

        p.pre_process(op, &mut ctx, acc)?;
        p.process(op, &mut ctx, acc)
    }

    /// Applies merge values on top of the snapshot.
    pub fn apply(acc: &MemStateAccessor, values: Vec<StateMergeValue>) -> MemStateAccessor {
        let mut sess = StateMergeSession::new(acc, 1);
        sess.merge(Buf32::zero(), values).unwrap();
        let mut out = acc.clone();
        out.apply(sess.finish().unwrap());
        out
    }

    pub fn balance(acc: &MemStateAccessor, addr: &Address, cid: &str) -> Option<Big> {
        let cid = CurrencyId::new(cid).unwrap();
        acc.get(&StateKey::balance(addr, &cid))
            .and_then(|s| s.value().as_balance().map(|a| a.big()))
    }

    pub fn reason(res: ProcResult<Vec<StateMergeValue>>) -> ReasonError {
        match res {
            Err(ProcError::Reason(r)) => r,
            other => panic!("expected a reason error, got {other:?}"),
        }
    }
}

//! Withdrawing from contract accounts into their owner.
//!
//! The sender's net change is computed from first principles: every
//! withdrawn amount is credited, every fee debited, and a sender that is
//! its own fee receiver gets the fee straight back.

use ledger_ops::{
    facts::{WithdrawFact, WithdrawItem},
    FactBody, Operation, OperationKind,
};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::{
    deltas::BalanceDeltas,
    errors::{reject, ProcResult, ReasonError},
    fee::calculate_items_fee,
    helpers::{check_not_contract_account, check_sign_by_state, existing_contract, existing_design},
    processor::{check_items, mismatched, ProcContext, Processor},
};

#[derive(Debug, Default, Eq, PartialEq)]
pub struct WithdrawProcessor {
    deltas: BalanceDeltas,
}

impl WithdrawProcessor {
    pub fn new_boxed() -> Box<dyn Processor> {
        Box::<Self>::default()
    }

    fn fact<'o>(&self, op: &'o Operation) -> ProcResult<&'o WithdrawFact> {
        match op.fact().body() {
            FactBody::Withdraw(f) => Ok(f),
            _ => Err(mismatched(op, self.kind())),
        }
    }

    fn check(
        &mut self,
        op: &Operation,
        ctx: &ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<()> {
        let fact = self.fact(op)?;

        check_not_contract_account(acc, &fact.sender)?;
        check_sign_by_state(acc, &fact.sender, op)?;
        check_items(ctx, &fact.items, |it| check_withdraw_item(acc, &fact.sender, it))?;

        let required = calculate_items_fee(acc, fact.items.iter().flat_map(|it| &it.amounts))?;

        let mut deltas = BalanceDeltas::new();
        for it in &fact.items {
            for am in &it.amounts {
                deltas.debit(&it.target, am)?;
                deltas.credit(&fact.sender, am)?;
            }
        }

        for (cid, req) in &required {
            deltas.pay_fee(&fact.sender, cid, req)?;
        }

        deltas.check_sufficient(acc)?;
        self.deltas = deltas;
        Ok(())
    }
}

fn check_withdraw_item(
    acc: &dyn StateAccessor,
    sender: &Address,
    item: &WithdrawItem,
) -> ProcResult<()> {
    let status = existing_contract(acc, &item.target)?;
    if !status.is_owner(sender) {
        return reject(ReasonError::NotOwner(sender.clone(), item.target.clone()));
    }

    if !status.is_active() {
        return reject(ReasonError::ContractInactive(item.target.clone()));
    }

    for am in &item.amounts {
        existing_design(acc, am.currency())?;
    }

    Ok(())
}

impl Processor for WithdrawProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::Withdraw
    }

    fn pre_process(
        &mut self,
        op: &Operation,
        ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<()> {
        self.check(op, ctx, acc)
    }

    fn process(
        &mut self,
        op: &Operation,
        ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<Vec<StateMergeValue>> {
        self.check(op, ctx, acc)?;
        Ok(std::mem::take(&mut self.deltas).into_merge_values())
    }

    fn reset(&mut self) {
        self.deltas = BalanceDeltas::new();
    }
}

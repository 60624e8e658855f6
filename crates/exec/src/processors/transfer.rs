use ledger_ops::{facts::TransferFact, FactBody, Operation, OperationKind};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::{
    deltas::BalanceDeltas,
    errors::ProcResult,
    fee::{calculate_items_fee, check_enough_balance, RequiredFees},
    helpers::{check_not_contract_account, check_sign_by_state, get_account},
    processor::{mismatched, ProcContext, Processor},
};

#[derive(Debug, Default, Eq, PartialEq)]
pub struct TransferProcessor {
    required: RequiredFees,

    /// Receivers that don't exist yet and get nil keys accounts.
    auto_created: Vec<Address>,
}

impl TransferProcessor {
    pub fn new_boxed() -> Box<dyn Processor> {
        Box::<Self>::default()
    }

    fn fact<'o>(&self, op: &'o Operation) -> ProcResult<&'o TransferFact> {
        match op.fact().body() {
            FactBody::Transfer(f) => Ok(f),
            _ => Err(mismatched(op, self.kind())),
        }
    }

    fn check(&mut self, op: &Operation, acc: &dyn StateAccessor) -> ProcResult<()> {
        let fact = self.fact(op)?;

        check_not_contract_account(acc, &fact.sender)?;
        check_sign_by_state(acc, &fact.sender, op)?;

        self.auto_created.clear();
        for it in &fact.items {
            if get_account(acc, &it.receiver)?.is_none() {
                self.auto_created.push(it.receiver.clone());
            }
        }

        self.required = calculate_items_fee(acc, fact.items.iter().flat_map(|it| &it.amounts))?;
        check_enough_balance(&fact.sender, &self.required, acc)?;
        Ok(())
    }
}

impl Processor for TransferProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::Transfer
    }

    fn pre_process(
        &mut self,
        op: &Operation,
        _ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<()> {
        self.check(op, acc)
    }

    fn process(
        &mut self,
        op: &Operation,
        _ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<Vec<StateMergeValue>> {
        self.check(op, acc)?;
        let fact = self.fact(op)?;

        let mut values: Vec<_> = self
            .auto_created
            .iter()
            .map(|a| StateMergeValue::new_account(Account::new_nil_keys(a.clone())))
            .collect();

        let mut deltas = BalanceDeltas::new();
        for it in &fact.items {
            for am in &it.amounts {
                deltas.credit(&it.receiver, am)?;
                deltas.debit(&fact.sender, am)?;
            }
        }

        for (cid, req) in &self.required {
            deltas.pay_fee(&fact.sender, cid, req)?;
        }

        deltas.check_sufficient(acc)?;
        values.extend(deltas.into_merge_values());
        Ok(values)
    }

    fn reset(&mut self) {
        self.required.clear();
        self.auto_created.clear();
    }
}

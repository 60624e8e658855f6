use std::collections::BTreeMap;

use ledger_ops::{facts::MintFact, FactBody, Operation, OperationKind};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::{
    errors::ProcResult,
    fee::checked_add,
    helpers::{check_node_signs, check_not_contract_account, existing_account, existing_design},
    processor::{mismatched, ProcContext, Processor},
};

/// Mints new supply to receivers.  Authorized by the suffrage alone, there's
/// no balance to check.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct MintProcessor {
    supply: BTreeMap<CurrencyId, Big>,
}

impl MintProcessor {
    pub fn new_boxed() -> Box<dyn Processor> {
        Box::<Self>::default()
    }

    fn fact<'o>(&self, op: &'o Operation) -> ProcResult<&'o MintFact> {
        match op.fact().body() {
            FactBody::Mint(f) => Ok(f),
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

        check_node_signs(acc, op, ctx.params)?;

        self.supply.clear();
        for it in &fact.items {
            let cid = it.amount.currency();
            existing_design(acc, cid)?;
            existing_account(acc, &it.receiver)?;
            check_not_contract_account(acc, &it.receiver)?;

            let total = self.supply.entry(cid.clone()).or_insert(Big::ZERO);
            *total = checked_add(*total, it.amount.big())?;
        }

        Ok(())
    }
}

impl Processor for MintProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::Mint
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
        let fact = self.fact(op)?;

        let mut values: Vec<_> = fact
            .items
            .iter()
            .map(|it| StateMergeValue::add_balance(&it.receiver, it.amount.clone()))
            .collect();
        values.extend(
            self.supply
                .iter()
                .map(|(cid, big)| StateMergeValue::add_supply(cid, *big)),
        );

        Ok(values)
    }

    fn reset(&mut self) {
        self.supply.clear();
    }
}

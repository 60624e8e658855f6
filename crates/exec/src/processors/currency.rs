//! Currency registration and policy updates, both authorized by the
//! suffrage.

use ledger_ops::{
    facts::{RegisterCurrencyFact, UpdateCurrencyFact},
    FactBody, Operation, OperationKind,
};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::{
    errors::{reject, ProcResult, ReasonError},
    helpers::{
        check_node_signs, existing_account, existing_design, get_account, get_balance, get_design,
    },
    processor::{mismatched, ProcContext, Processor},
};

/// Checks that the policy's fee receiver exists, returning it when it holds
/// no balance of `cid` yet and needs one seeded.
fn check_fee_receiver(
    acc: &dyn StateAccessor,
    cid: &CurrencyId,
    policy: &CurrencyPolicy,
) -> ProcResult<Option<Address>> {
    let Some(receiver) = policy.feeer().receiver() else {
        return Ok(None);
    };

    if get_account(acc, receiver)?.is_none() {
        return reject(ReasonError::FeeReceiverNotFound(receiver.clone(), cid.clone()));
    }
    if get_balance(acc, receiver, cid)?.is_some() {
        return Ok(None);
    }

    Ok(Some(receiver.clone()))
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct RegisterCurrencyProcessor {
    seed_receiver: Option<Address>,
}

impl RegisterCurrencyProcessor {
    pub fn new_boxed() -> Box<dyn Processor> {
        Box::<Self>::default()
    }

    fn fact<'o>(&self, op: &'o Operation) -> ProcResult<&'o RegisterCurrencyFact> {
        match op.fact().body() {
            FactBody::RegisterCurrency(f) => Ok(f),
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

        if get_design(acc, &fact.currency)?.is_some() {
            return reject(ReasonError::CurrencyExists(fact.currency.clone()));
        }

        existing_account(acc, &fact.genesis_account)?;

        self.seed_receiver = check_fee_receiver(acc, &fact.currency, &fact.policy)?
            .filter(|r| r != &fact.genesis_account);
        Ok(())
    }
}

impl Processor for RegisterCurrencyProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::RegisterCurrency
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

        let design = CurrencyDesign::new(
            fact.currency.clone(),
            fact.genesis_account.clone(),
            fact.policy.clone(),
            fact.initial_supply,
        );

        let mut values = vec![
            StateMergeValue::replace_design(design),
            StateMergeValue::add_balance(
                &fact.genesis_account,
                Amount::new(fact.currency.clone(), fact.initial_supply),
            ),
        ];

        if let Some(r) = &self.seed_receiver {
            values.push(StateMergeValue::add_balance(r, Amount::zero(fact.currency.clone())));
        }

        Ok(values)
    }

    fn reset(&mut self) {
        self.seed_receiver = None;
    }
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct UpdateCurrencyProcessor {
    seed_receiver: Option<Address>,
}

impl UpdateCurrencyProcessor {
    pub fn new_boxed() -> Box<dyn Processor> {
        Box::<Self>::default()
    }

    fn fact<'o>(&self, op: &'o Operation) -> ProcResult<&'o UpdateCurrencyFact> {
        match op.fact().body() {
            FactBody::UpdateCurrency(f) => Ok(f),
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
        existing_design(acc, &fact.currency)?;

        self.seed_receiver = check_fee_receiver(acc, &fact.currency, &fact.policy)?;
        Ok(())
    }
}

impl Processor for UpdateCurrencyProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::UpdateCurrency
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

        let mut values = vec![StateMergeValue::update_policy(
            &fact.currency,
            fact.policy.clone(),
        )];

        if let Some(r) = &self.seed_receiver {
            values.push(StateMergeValue::add_balance(r, Amount::zero(fact.currency.clone())));
        }

        Ok(values)
    }

    fn reset(&mut self) {
        self.seed_receiver = None;
    }
}

use ledger_ops::{facts::UpdateKeyFact, FactBody, Operation, OperationKind};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::{
    deltas::BalanceDeltas,
    errors::{reject, ProcResult, ReasonError},
    fee::{calculate_fee, check_enough_balance, FeeRequirement, RequiredFees},
    helpers::{check_not_contract_account, existing_account},
    processor::{mismatched, ProcContext, Processor},
};

#[derive(Debug, Default, Eq, PartialEq)]
pub struct UpdateKeyProcessor {
    account: Option<Account>,
    fee: Option<FeeRequirement>,
}

impl UpdateKeyProcessor {
    pub fn new_boxed() -> Box<dyn Processor> {
        Box::<Self>::default()
    }

    fn fact<'o>(&self, op: &'o Operation) -> ProcResult<&'o UpdateKeyFact> {
        match op.fact().body() {
            FactBody::UpdateKey(f) => Ok(f),
            _ => Err(mismatched(op, self.kind())),
        }
    }

    fn check(&mut self, op: &Operation, acc: &dyn StateAccessor) -> ProcResult<()> {
        let fact = self.fact(op)?;

        let account = existing_account(acc, &fact.target)?;
        check_not_contract_account(acc, &fact.target)?;

        let Some(current) = account.keys() else {
            return reject(ReasonError::NilKeys(fact.target.clone()));
        };

        if current == &fact.keys {
            return reject(ReasonError::SameKeys(fact.target.clone()));
        }

        if !current.is_satisfied_by(op.signers()) {
            return reject(ReasonError::NotEnoughSigns(fact.target.clone()));
        }

        let fee = calculate_fee(acc, &fact.currency, Big::ZERO)?;
        let required = RequiredFees::from([(fact.currency.clone(), fee.clone())]);
        check_enough_balance(&fact.target, &required, acc)?;

        self.account = Some(account);
        self.fee = Some(fee);
        Ok(())
    }
}

impl Processor for UpdateKeyProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::UpdateKey
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

        let (Some(account), Some(fee)) = (&self.account, &self.fee) else {
            return reject(ReasonError::AccountNotFound(fact.target.clone()));
        };

        let mut values = vec![StateMergeValue::new_account(account.with_keys(fact.keys.clone()))];

        let mut deltas = BalanceDeltas::new();
        deltas.pay_fee(&fact.target, &fact.currency, fee)?;
        deltas.check_sufficient(acc)?;
        values.extend(deltas.into_merge_values());

        Ok(values)
    }

    fn reset(&mut self) {
        self.account = None;
        self.fee = None;
    }
}

//! Operator, recipient and handler list updates.  The three share one
//! payload and one processor parameterized by the list it replaces.

use ledger_ops::{facts::UpdateContractListFact, FactBody, Operation, OperationKind};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::{
    deltas::BalanceDeltas,
    errors::{reject, ExecError, ProcResult, ReasonError},
    fee::{calculate_fee, check_enough_balance, FeeRequirement, RequiredFees},
    helpers::{
        check_not_contract_account, check_sign_by_state, existing_account, existing_contract,
    },
    processor::{check_items, mismatched, ProcContext, Processor},
};

#[derive(Debug, Eq, PartialEq)]
pub struct ContractListProcessor {
    kind: OperationKind,
    fee: Option<FeeRequirement>,
}

impl ContractListProcessor {
    /// Fails if `kind` isn't one of the contract list updates.
    pub fn new(kind: OperationKind) -> Result<Self, ExecError> {
        match kind {
            OperationKind::UpdateOperator
            | OperationKind::UpdateRecipient
            | OperationKind::UpdateHandler => Ok(Self { kind, fee: None }),
            _ => Err(ExecError::MismatchedProcessor(kind, OperationKind::UpdateOperator)),
        }
    }

    pub fn new_operators() -> Box<dyn Processor> {
        Box::new(Self {
            kind: OperationKind::UpdateOperator,
            fee: None,
        })
    }

    pub fn new_recipients() -> Box<dyn Processor> {
        Box::new(Self {
            kind: OperationKind::UpdateRecipient,
            fee: None,
        })
    }

    pub fn new_handlers() -> Box<dyn Processor> {
        Box::new(Self {
            kind: OperationKind::UpdateHandler,
            fee: None,
        })
    }

    fn fact<'o>(&self, op: &'o Operation) -> ProcResult<&'o UpdateContractListFact> {
        match (self.kind, op.fact().body()) {
            (OperationKind::UpdateOperator, FactBody::UpdateOperator(f))
            | (OperationKind::UpdateRecipient, FactBody::UpdateRecipient(f))
            | (OperationKind::UpdateHandler, FactBody::UpdateHandler(f)) => Ok(f),
            _ => Err(mismatched(op, self.kind)),
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

        let status = existing_contract(acc, &fact.contract)?;
        if !status.is_owner(&fact.sender) {
            return reject(ReasonError::NotOwner(
                fact.sender.clone(),
                fact.contract.clone(),
            ));
        }

        if !status.is_active() {
            return reject(ReasonError::ContractInactive(fact.contract.clone()));
        }

        check_items(ctx, &fact.addresses, |a| {
            existing_account(acc, a)?;
            check_not_contract_account(acc, a)
        })?;

        let fee = calculate_fee(acc, &fact.currency, Big::ZERO)?;
        let required = RequiredFees::from([(fact.currency.clone(), fee.clone())]);
        check_enough_balance(&fact.sender, &required, acc)?;

        self.fee = Some(fee);
        Ok(())
    }

    fn list_value(&self, fact: &UpdateContractListFact) -> StateMergeValue {
        let list = fact.addresses.clone();
        match self.kind {
            OperationKind::UpdateRecipient => StateMergeValue::set_recipients(&fact.contract, list),
            OperationKind::UpdateHandler => StateMergeValue::set_handlers(&fact.contract, list),
            _ => StateMergeValue::set_operators(&fact.contract, list),
        }
    }
}

impl Processor for ContractListProcessor {
    fn kind(&self) -> OperationKind {
        self.kind
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

        let mut values = vec![self.list_value(fact)];

        if let Some(fee) = &self.fee {
            let mut deltas = BalanceDeltas::new();
            deltas.pay_fee(&fact.sender, &fact.currency, fee)?;
            deltas.check_sufficient(acc)?;
            values.extend(deltas.into_merge_values());
        }

        Ok(values)
    }

    fn reset(&mut self) {
        self.fee = None;
    }
}

use ledger_ops::{facts::CreateAccountFact, FactBody, Operation, OperationKind};
use ledger_state::prelude::*;

use super::{check_new_account_item, settle_new_accounts};
use crate::{
    errors::ProcResult,
    fee::{calculate_items_fee, check_enough_balance, RequiredFees},
    helpers::{check_not_contract_account, check_sign_by_state},
    processor::{check_items, mismatched, ProcContext, Processor},
};

#[derive(Debug, Default, Eq, PartialEq)]
pub struct CreateAccountProcessor {
    required: RequiredFees,
}

impl CreateAccountProcessor {
    pub fn new_boxed() -> Box<dyn Processor> {
        Box::<Self>::default()
    }

    fn fact<'o>(&self, op: &'o Operation) -> ProcResult<&'o CreateAccountFact> {
        match op.fact().body() {
            FactBody::CreateAccount(f) => Ok(f),
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
        check_items(ctx, &fact.items, |it| check_new_account_item(acc, it))?;

        self.required = calculate_items_fee(acc, fact.items.iter().flat_map(|it| &it.amounts))?;
        check_enough_balance(&fact.sender, &self.required, acc)?;
        Ok(())
    }
}

impl Processor for CreateAccountProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::CreateAccount
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
            .map(|it| StateMergeValue::new_account(Account::from_keys(it.keys.clone())))
            .collect();
        values.extend(settle_new_accounts(
            &fact.sender,
            &fact.items,
            &self.required,
            acc,
        )?);

        Ok(values)
    }

    fn reset(&mut self) {
        self.required.clear();
    }
}

#[cfg(test)]
mod tests {
    use ledger_ops::facts::CreateAccountItem;
    use ledger_primitives::prelude::*;
    use ledger_test_utils::{
        genesis::GenesisBuilder,
        keys::{amount, currency, test_keys, TestAccount},
        ops::sign_op,
    };

    use super::*;
    use crate::{
        errors::ReasonError,
        processors::test_support::{apply, balance, params, reason, run},
    };

    fn setup(min_new: u64) -> (MemStateAccessor, TestAccount, TestAccount) {
        let sender = TestAccount::new(1);
        let fee_recv = TestAccount::new(2);
        let policy = CurrencyPolicy::new(
            Big::ZERO,
            Big::from(min_new),
            Feeer::Fixed {
                receiver: fee_recv.address.clone(),
                amount: Big::from(2),
            },
        );

        let acc = GenesisBuilder::new()
            .account(&sender.keys)
            .account(&fee_recv.keys)
            .currency(&currency("CUR"), &sender.address, 1000, policy)
            .balance(&fee_recv.address, amount("CUR", 0))
            .build();
        (acc, sender, fee_recv)
    }

    fn op(sender: &TestAccount, items: Vec<CreateAccountItem>) -> Operation {
        sign_op(
            &params().network_id,
            FactBody::CreateAccount(CreateAccountFact {
                sender: sender.address.clone(),
                items,
            }),
            &[&sender.secret],
        )
    }

    #[test]
    fn test_create_account() {
        let (acc, sender, fee_recv) = setup(0);
        let keys = test_keys(10);
        let op = op(&sender, vec![CreateAccountItem::new(keys.clone(), vec![amount("CUR", 100)])]);

        let mut p = CreateAccountProcessor::default();
        let values = run(&mut p, &op, &acc, 5).unwrap();
        let after = apply(&acc, values);

        let account = after
            .get(&StateKey::account(&keys.address()))
            .and_then(|s| s.value().as_account().cloned())
            .unwrap();
        assert_eq!(account.keys(), Some(&keys));
        assert_eq!(balance(&after, &keys.address(), "CUR"), Some(Big::from(100)));
        assert_eq!(balance(&after, &sender.address, "CUR"), Some(Big::from(898)));
        assert_eq!(balance(&after, &fee_recv.address, "CUR"), Some(Big::from(2)));
    }

    #[test]
    fn test_create_existing_account_rejected() {
        let (acc, sender, fee_recv) = setup(0);
        let op = op(
            &sender,
            vec![CreateAccountItem::new(fee_recv.keys.clone(), vec![amount("CUR", 1)])],
        );

        let mut p = CreateAccountProcessor::default();
        assert!(matches!(
            reason(run(&mut p, &op, &acc, 5)),
            ReasonError::AccountExists(_)
        ));
    }

    #[test]
    fn test_create_below_new_account_minimum() {
        let (acc, sender, _) = setup(50);
        let op = op(&sender, vec![CreateAccountItem::new(test_keys(10), vec![amount("CUR", 49)])]);

        let mut p = CreateAccountProcessor::default();
        assert!(matches!(
            reason(run(&mut p, &op, &acc, 5)),
            ReasonError::BelowNewAccountMinBalance(..)
        ));
    }

    #[test]
    fn test_create_insufficient_balance() {
        let (acc, sender, _) = setup(0);
        let op = op(
            &sender,
            vec![CreateAccountItem::new(test_keys(10), vec![amount("CUR", 999)])],
        );

        let mut p = CreateAccountProcessor::default();
        assert!(matches!(
            reason(run(&mut p, &op, &acc, 5)),
            ReasonError::InsufficientBalance { .. }
        ));
    }

    #[test]
    fn test_create_unsigned_by_sender() {
        let (acc, sender, _) = setup(0);
        let stranger = TestAccount::new(7);
        let op = sign_op(
            &params().network_id,
            FactBody::CreateAccount(CreateAccountFact {
                sender: sender.address.clone(),
                items: vec![CreateAccountItem::new(test_keys(10), vec![amount("CUR", 1)])],
            }),
            &[&stranger.secret],
        );

        let mut p = CreateAccountProcessor::default();
        assert!(matches!(
            reason(run(&mut p, &op, &acc, 5)),
            ReasonError::NotEnoughSigns(_)
        ));
    }

    #[test]
    fn test_reset_clears_scratch() {
        let (acc, sender, _) = setup(0);
        let op = op(&sender, vec![CreateAccountItem::new(test_keys(10), vec![amount("CUR", 1)])]);

        let mut p = CreateAccountProcessor::default();
        run(&mut p, &op, &acc, 5).unwrap();
        assert_ne!(p, CreateAccountProcessor::default());

        p.reset();
        assert_eq!(p, CreateAccountProcessor::default());
    }
}

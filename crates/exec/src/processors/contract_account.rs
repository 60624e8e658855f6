//! Creating contract accounts.  Contract accounts can't sign, they are
//! stored with nil keys and driven through their owner.

use ledger_ops::{facts::CreateContractAccountFact, FactBody, Operation, OperationKind};
use ledger_state::prelude::*;
use tracing::*;

use super::{check_new_account_item, settle_new_accounts};
use crate::{
    errors::ProcResult,
    fee::{calculate_items_fee, check_enough_balance, RequiredFees},
    helpers::{check_not_contract_account, check_sign_by_state},
    processor::{check_items, mismatched, ProcContext, Processor},
};

#[derive(Debug, Default, Eq, PartialEq)]
pub struct CreateContractAccountProcessor {
    required: RequiredFees,
}

impl CreateContractAccountProcessor {
    pub fn new_boxed() -> Box<dyn Processor> {
        Box::<Self>::default()
    }

    fn fact<'o>(&self, op: &'o Operation) -> ProcResult<&'o CreateContractAccountFact> {
        match op.fact().body() {
            FactBody::CreateContractAccount(f) => Ok(f),
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

        // Items are independent of each other, so they're checked on the
        // item workers.
        trace!(items = fact.items.len(), "checking contract account items");
        check_items(ctx, &fact.items, |it| check_new_account_item(acc, it))?;

        self.required = calculate_items_fee(acc, fact.items.iter().flat_map(|it| &it.amounts))?;
        check_enough_balance(&fact.sender, &self.required, acc)?;
        Ok(())
    }
}

impl Processor for CreateContractAccountProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::CreateContractAccount
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

        let mut values = Vec::with_capacity(fact.items.len() * 3);
        for it in &fact.items {
            let addr = it.address();
            values.push(StateMergeValue::new_account(Account::new_nil_keys(
                addr.clone(),
            )));
            values.push(StateMergeValue::new_contract_status(
                &addr,
                ContractAccountStatus::new(fact.sender.clone()),
            ));
        }

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
        genesis::{nil_fee_policy, GenesisBuilder},
        keys::{amount, currency, test_keys, TestAccount},
        ops::sign_op,
    };
    use rayon::ThreadPoolBuilder;

    use super::*;
    use crate::{
        errors::{ProcError, ReasonError},
        processors::test_support::{apply, balance, params, reason, run},
        session::SuffrageContext,
    };

    fn setup() -> (MemStateAccessor, TestAccount) {
        let owner = TestAccount::new(1);
        let acc = GenesisBuilder::new()
            .account(&owner.keys)
            .currency(&currency("CUR"), &owner.address, 1000, nil_fee_policy())
            .build();
        (acc, owner)
    }

    fn op(owner: &TestAccount, items: Vec<CreateAccountItem>) -> Operation {
        sign_op(
            &params().network_id,
            FactBody::CreateContractAccount(CreateContractAccountFact {
                sender: owner.address.clone(),
                items,
            }),
            &[&owner.secret],
        )
    }

    #[test]
    fn test_create_contract_account() {
        let (acc, owner) = setup();
        let keys = test_keys(20);
        let op = op(&owner, vec![CreateAccountItem::new(keys.clone(), vec![amount("CUR", 10)])]);

        let mut p = CreateContractAccountProcessor::default();
        let after = apply(&acc, run(&mut p, &op, &acc, 3).unwrap());

        let addr = keys.address();
        let account = after
            .get(&StateKey::account(&addr))
            .and_then(|s| s.value().as_account().cloned())
            .unwrap();
        assert!(account.is_nil_keys());

        let status = after
            .get(&StateKey::contract_account(&addr))
            .and_then(|s| s.value().as_contract_account().cloned())
            .unwrap();
        assert!(status.is_owner(&owner.address));
        assert!(status.is_active());
        assert_eq!(balance(&after, &addr, "CUR"), Some(Big::from(10)));
        assert_eq!(balance(&after, &owner.address, "CUR"), Some(Big::from(990)));
    }

    #[test]
    fn test_contract_cannot_create_contract() {
        let (acc, owner) = setup();
        let contract = TestAccount::new(5);
        let mut acc = acc;
        acc.apply(
            GenesisBuilder::new()
                .contract(&contract.address, &owner.address)
                .states()
                .to_vec(),
        );

        let op = sign_op(
            &params().network_id,
            FactBody::CreateContractAccount(CreateContractAccountFact {
                sender: contract.address.clone(),
                items: vec![CreateAccountItem::new(test_keys(20), vec![amount("CUR", 1)])],
            }),
            &[&contract.secret],
        );

        let mut p = CreateContractAccountProcessor::default();
        assert!(matches!(
            reason(run(&mut p, &op, &acc, 3)),
            ReasonError::ContractAccount(_)
        ));
    }

    #[test]
    fn test_items_checked_on_workers_report_first_failure() {
        let (acc, owner) = setup();
        let existing = TestAccount::new(30);
        let mut acc = acc;
        acc.apply(GenesisBuilder::new().account(&existing.keys).states().to_vec());

        // Item 2 fails on an existing account, item 3 on an unknown
        // currency.  The first in item order wins.
        let items = vec![
            CreateAccountItem::new(test_keys(21), vec![amount("CUR", 1)]),
            CreateAccountItem::new(test_keys(22), vec![amount("CUR", 1)]),
            CreateAccountItem::new(existing.keys.clone(), vec![amount("CUR", 1)]),
            CreateAccountItem::new(test_keys(23), vec![amount("NOPE", 1)]),
        ];
        let op = op(&owner, items);

        let pool = ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let p_ = params();
        let mut suffrage = SuffrageContext::default();
        let mut ctx = ProcContext {
            params: &p_,
            height: 3,
            workers: Some(&pool),
            suffrage: &mut suffrage,
        };

        let mut p = CreateContractAccountProcessor::default();
        let res = p.pre_process(&op, &mut ctx, &acc);
        assert!(matches!(
            res,
            Err(ProcError::Reason(ReasonError::AccountExists(_)))
        ));
    }
}

//! Contract account facts.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;
use serde::{Deserialize, Serialize};

use super::{
    check_address, check_address_list, check_amounts, check_currency, check_items, check_targets,
    currency::{check_create_items, CreateAccountItem},
};
use crate::{errors::FactError, kind::OperationKind, MAX_CONTRACT_LIST_LEN, MAX_WITHDRAW_ITEMS};

/// Creates contract accounts owned by `sender`.
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct CreateContractAccountFact {
    pub sender: Address,
    pub items: Vec<CreateAccountItem>,
}

impl CreateContractAccountFact {
    pub fn is_valid(&self) -> Result<(), FactError> {
        check_create_items(
            OperationKind::CreateContractAccount,
            &self.sender,
            &self.items,
        )
    }
}

/// Moves `amounts` out of the contract at `target`.
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct WithdrawItem {
    pub target: Address,
    pub amounts: Vec<Amount>,
}

impl WithdrawItem {
    pub fn new(target: Address, amounts: Vec<Amount>) -> Self {
        Self { target, amounts }
    }
}

#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct WithdrawFact {
    pub sender: Address,
    pub items: Vec<WithdrawItem>,
}

impl WithdrawFact {
    pub fn is_valid(&self) -> Result<(), FactError> {
        check_address(&self.sender)?;
        check_items(OperationKind::Withdraw, &self.items, MAX_WITHDRAW_ITEMS)?;

        for it in &self.items {
            check_amounts(&it.amounts)?;
        }

        check_targets(&self.sender, self.items.iter().map(|it| &it.target))
    }
}

/// Replaces one capability list of `contract`.  The same payload serves the
/// operator, recipient and handler updates.
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct UpdateContractListFact {
    pub sender: Address,
    pub contract: Address,
    pub currency: CurrencyId,
    pub addresses: Vec<Address>,
}

impl UpdateContractListFact {
    pub fn is_valid(&self) -> Result<(), FactError> {
        check_address(&self.sender)?;
        check_address(&self.contract)?;
        check_currency(&self.currency)?;

        if self.sender == self.contract {
            return Err(FactError::SelfTarget(self.contract.clone()));
        }

        check_address_list(&self.addresses, MAX_CONTRACT_LIST_LEN)?;

        if self.addresses.contains(&self.contract) {
            return Err(FactError::SelfTarget(self.contract.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ledger_test_utils::keys::amount;

    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    #[test]
    fn test_withdraw_item_limit() {
        let items: Vec<_> = (0..=MAX_WITHDRAW_ITEMS)
            .map(|i| WithdrawItem::new(addr(&format!("con{i:05}mca")), vec![amount("CUR", 1)]))
            .collect();
        let fact = WithdrawFact {
            sender: addr("owner0mca"),
            items,
        };
        assert!(matches!(
            fact.is_valid(),
            Err(FactError::TooManyItems(OperationKind::Withdraw, MAX_WITHDRAW_ITEMS, _))
        ));
    }

    #[test]
    fn test_contract_list_limits() {
        let mut fact = UpdateContractListFact {
            sender: addr("owner0mca"),
            contract: addr("con000mca"),
            currency: CurrencyId::new("CUR").unwrap(),
            addresses: (0..MAX_CONTRACT_LIST_LEN)
                .map(|i| addr(&format!("op{i:03}mca")))
                .collect(),
        };
        assert!(fact.is_valid().is_ok());

        fact.addresses.push(addr("op999mca"));
        assert!(fact.is_valid().unwrap_err().is_too_many_items());

        fact.addresses = vec![addr("op001mca"), addr("op001mca")];
        assert!(matches!(fact.is_valid(), Err(FactError::DuplicatedItem(_))));

        fact.addresses = vec![addr("con000mca")];
        assert!(matches!(fact.is_valid(), Err(FactError::SelfTarget(_))));
    }
}

//! Plain account and currency facts.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;
use ledger_state::currency::CurrencyPolicy;
use serde::{Deserialize, Serialize};

use super::{check_address, check_amounts, check_currency, check_items, check_targets};
use crate::{errors::FactError, kind::OperationKind, MAX_ACCOUNT_ITEMS, MAX_MINT_ITEMS};

/// New account controlled by `keys`, funded with `amounts`.  Also used for
/// contract accounts.
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
pub struct CreateAccountItem {
    pub keys: AccountKeys,
    pub amounts: Vec<Amount>,
}

impl CreateAccountItem {
    pub fn new(keys: AccountKeys, amounts: Vec<Amount>) -> Self {
        Self { keys, amounts }
    }

    /// Address of the account being created.
    pub fn address(&self) -> Address {
        self.keys.address()
    }
}

/// Shared checks of the account creating facts.
pub(crate) fn check_create_items(
    kind: OperationKind,
    sender: &Address,
    items: &[CreateAccountItem],
) -> Result<(), FactError> {
    check_address(sender)?;
    check_items(kind, items, MAX_ACCOUNT_ITEMS)?;

    for it in items {
        it.keys.check()?;
        check_amounts(&it.amounts)?;
    }

    let targets: Vec<Address> = items.iter().map(|it| it.address()).collect();
    check_targets(sender, &targets)
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
pub struct CreateAccountFact {
    pub sender: Address,
    pub items: Vec<CreateAccountItem>,
}

impl CreateAccountFact {
    pub fn is_valid(&self) -> Result<(), FactError> {
        check_create_items(OperationKind::CreateAccount, &self.sender, &self.items)
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
pub struct TransferItem {
    pub receiver: Address,
    pub amounts: Vec<Amount>,
}

impl TransferItem {
    pub fn new(receiver: Address, amounts: Vec<Amount>) -> Self {
        Self { receiver, amounts }
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
pub struct TransferFact {
    pub sender: Address,
    pub items: Vec<TransferItem>,
}

impl TransferFact {
    pub fn is_valid(&self) -> Result<(), FactError> {
        check_address(&self.sender)?;
        check_items(OperationKind::Transfer, &self.items, MAX_ACCOUNT_ITEMS)?;

        for it in &self.items {
            check_amounts(&it.amounts)?;
        }

        check_targets(&self.sender, self.items.iter().map(|it| &it.receiver))
    }
}

/// Replaces the keys of `target`.  The fee is charged in `currency`.
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
pub struct UpdateKeyFact {
    pub target: Address,
    pub keys: AccountKeys,
    pub currency: CurrencyId,
}

impl UpdateKeyFact {
    pub fn is_valid(&self) -> Result<(), FactError> {
        check_address(&self.target)?;
        check_currency(&self.currency)?;
        self.keys.check()?;
        Ok(())
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
pub struct MintItem {
    pub receiver: Address,
    pub amount: Amount,
}

impl MintItem {
    pub fn new(receiver: Address, amount: Amount) -> Self {
        Self { receiver, amount }
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
pub struct MintFact {
    pub items: Vec<MintItem>,
}

impl MintFact {
    pub fn is_valid(&self) -> Result<(), FactError> {
        check_items(OperationKind::Mint, &self.items, MAX_MINT_ITEMS)?;

        let mut seen = std::collections::BTreeSet::new();
        for it in &self.items {
            check_address(&it.receiver)?;
            check_amounts(std::slice::from_ref(&it.amount))?;

            if !seen.insert((&it.receiver, it.amount.currency())) {
                return Err(FactError::DuplicatedItem(format!(
                    "{}:{}",
                    it.receiver,
                    it.amount.currency()
                )));
            }
        }

        Ok(())
    }
}

/// Introduces a new currency, crediting `initial_supply` to the genesis
/// account.
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
pub struct RegisterCurrencyFact {
    pub currency: CurrencyId,
    pub genesis_account: Address,
    pub initial_supply: Big,
    pub policy: CurrencyPolicy,
}

impl RegisterCurrencyFact {
    pub fn is_valid(&self) -> Result<(), FactError> {
        check_currency(&self.currency)?;
        check_address(&self.genesis_account)?;

        if self.initial_supply.is_zero() {
            return Err(FactError::ZeroAmount(self.currency.clone()));
        }

        if !self.policy.is_valid() {
            return Err(FactError::InvalidPolicy(self.currency.clone()));
        }

        Ok(())
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
pub struct UpdateCurrencyFact {
    pub currency: CurrencyId,
    pub policy: CurrencyPolicy,
}

impl UpdateCurrencyFact {
    pub fn is_valid(&self) -> Result<(), FactError> {
        check_currency(&self.currency)?;

        if !self.policy.is_valid() {
            return Err(FactError::InvalidPolicy(self.currency.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ledger_test_utils::keys::{amount, test_keys};

    use super::*;
    use crate::MAX_AMOUNTS_PER_ITEM;

    fn sender() -> Address {
        Address::new("sender000mca").unwrap()
    }

    #[test]
    fn test_create_account_rejects_self_target() {
        let keys = test_keys(0);
        let fact = CreateAccountFact {
            sender: keys.address(),
            items: vec![CreateAccountItem::new(keys, vec![amount("CUR", 10)])],
        };
        assert!(matches!(fact.is_valid(), Err(FactError::SelfTarget(_))));
    }

    #[test]
    fn test_create_account_rejects_duplicated_targets() {
        let item = CreateAccountItem::new(test_keys(1), vec![amount("CUR", 10)]);
        let fact = CreateAccountFact {
            sender: sender(),
            items: vec![item.clone(), item],
        };
        assert!(matches!(fact.is_valid(), Err(FactError::DuplicatedItem(_))));
    }

    #[test]
    fn test_transfer_item_limits() {
        let items: Vec<_> = (0..=MAX_ACCOUNT_ITEMS)
            .map(|i| {
                TransferItem::new(
                    Address::new(format!("recv{i:04}mca")).unwrap(),
                    vec![amount("CUR", 1)],
                )
            })
            .collect();
        let fact = TransferFact {
            sender: sender(),
            items,
        };
        let err = fact.is_valid().unwrap_err();
        assert!(err.is_too_many_items());

        let amounts: Vec<_> = (0..=MAX_AMOUNTS_PER_ITEM)
            .map(|i| amount(&format!("CU{i:02}"), 1))
            .collect();
        let fact = TransferFact {
            sender: sender(),
            items: vec![TransferItem::new(Address::new("recv0mca").unwrap(), amounts)],
        };
        assert!(matches!(fact.is_valid(), Err(FactError::TooManyAmounts(..))));
    }

    #[test]
    fn test_transfer_rejects_zero_and_duplicated_currency() {
        let recv = Address::new("recv0mca").unwrap();
        let fact = TransferFact {
            sender: sender(),
            items: vec![TransferItem::new(recv.clone(), vec![amount("CUR", 0)])],
        };
        assert!(matches!(fact.is_valid(), Err(FactError::ZeroAmount(_))));

        let fact = TransferFact {
            sender: sender(),
            items: vec![TransferItem::new(
                recv,
                vec![amount("CUR", 1), amount("CUR", 2)],
            )],
        };
        assert!(matches!(
            fact.is_valid(),
            Err(FactError::DuplicatedCurrency(_))
        ));
    }

    #[test]
    fn test_mint_rejects_same_receiver_currency() {
        let recv = Address::new("recv0mca").unwrap();
        let fact = MintFact {
            items: vec![
                MintItem::new(recv.clone(), amount("CUR", 1)),
                MintItem::new(recv.clone(), amount("CUR", 2)),
            ],
        };
        assert!(fact.is_valid().is_err());

        let fact = MintFact {
            items: vec![
                MintItem::new(recv.clone(), amount("CUR", 1)),
                MintItem::new(recv, amount("DOL", 2)),
            ],
        };
        assert!(fact.is_valid().is_ok());
    }
}

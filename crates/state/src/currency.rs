//! Currency designs and the policies attached to them.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::{big::PPM_DENOMINATOR, prelude::*};
use serde::{Deserialize, Serialize};

/// Fee formula of a currency.
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
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Feeer {
    /// No fee is charged.
    Nil,

    /// The same fee for any amount.
    Fixed { receiver: Address, amount: Big },

    /// A fraction of the amount (in parts per million), clamped to
    /// `[min, max]`.
    Ratio {
        receiver: Address,
        ratio_ppm: u32,
        min: Big,
        max: Big,
    },
}

impl Feeer {
    /// Computes the fee charged for moving `amount`.
    pub fn fee(&self, amount: Big) -> Big {
        match self {
            Feeer::Nil => Big::ZERO,
            Feeer::Fixed { amount: fee, .. } => *fee,
            Feeer::Ratio {
                ratio_ppm,
                min,
                max,
                ..
            } => amount.mul_ppm(*ratio_ppm).clamp(*min, *max),
        }
    }

    /// Address credited with collected fees, if any.
    pub fn receiver(&self) -> Option<&Address> {
        match self {
            Feeer::Nil => None,
            Feeer::Fixed { receiver, .. } | Feeer::Ratio { receiver, .. } => Some(receiver),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Feeer::Nil => true,
            Feeer::Fixed { receiver, .. } => receiver.is_valid(),
            Feeer::Ratio {
                receiver,
                ratio_ppm,
                min,
                max,
            } => receiver.is_valid() && *ratio_ppm <= PPM_DENOMINATOR && min <= max,
        }
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
pub struct CurrencyPolicy {
    /// Balance a debited account has to keep after the debit.
    min_balance: Big,

    /// Minimum amount each currency must fund a newly created account with.
    new_account_min_balance: Big,

    feeer: Feeer,
}

impl CurrencyPolicy {
    pub fn new(min_balance: Big, new_account_min_balance: Big, feeer: Feeer) -> Self {
        Self {
            min_balance,
            new_account_min_balance,
            feeer,
        }
    }

    pub fn min_balance(&self) -> Big {
        self.min_balance
    }

    pub fn new_account_min_balance(&self) -> Big {
        self.new_account_min_balance
    }

    pub fn feeer(&self) -> &Feeer {
        &self.feeer
    }

    pub fn is_valid(&self) -> bool {
        self.feeer.is_valid()
    }
}

/// Registered currency.  Lives at `design:<currency>`.
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
pub struct CurrencyDesign {
    currency: CurrencyId,
    genesis_account: Address,
    policy: CurrencyPolicy,

    /// Total amount ever issued.
    total_supply: Big,
}

impl CurrencyDesign {
    pub fn new(
        currency: CurrencyId,
        genesis_account: Address,
        policy: CurrencyPolicy,
        total_supply: Big,
    ) -> Self {
        Self {
            currency,
            genesis_account,
            policy,
            total_supply,
        }
    }

    pub fn currency(&self) -> &CurrencyId {
        &self.currency
    }

    pub fn genesis_account(&self) -> &Address {
        &self.genesis_account
    }

    pub fn policy(&self) -> &CurrencyPolicy {
        &self.policy
    }

    pub fn total_supply(&self) -> Big {
        self.total_supply
    }

    pub fn set_policy(&mut self, policy: CurrencyPolicy) {
        self.policy = policy;
    }

    pub fn set_total_supply(&mut self, total_supply: Big) {
        self.total_supply = total_supply;
    }

    pub fn is_valid(&self) -> bool {
        self.currency.is_valid() && self.genesis_account.is_valid() && self.policy.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receiver() -> Address {
        Address::new("fee000mca").unwrap()
    }

    #[test]
    fn test_fixed_fee() {
        let f = Feeer::Fixed {
            receiver: receiver(),
            amount: Big::from(3),
        };
        assert_eq!(f.fee(Big::ZERO), Big::from(3));
        assert_eq!(f.fee(Big::from(1_000)), Big::from(3));
        assert_eq!(f.receiver(), Some(&receiver()));
    }

    #[test]
    fn test_ratio_fee_clamped() {
        let f = Feeer::Ratio {
            receiver: receiver(),
            ratio_ppm: 10_000,
            min: Big::from(2),
            max: Big::from(50),
        };
        assert_eq!(f.fee(Big::ZERO), Big::from(2));
        assert_eq!(f.fee(Big::from(1_000)), Big::from(10));
        assert_eq!(f.fee(Big::from(1_000_000)), Big::from(50));
    }

    #[test]
    fn test_nil_fee() {
        assert_eq!(Feeer::Nil.fee(Big::from(10)), Big::ZERO);
        assert_eq!(Feeer::Nil.receiver(), None);
    }

    #[test]
    fn test_ratio_validity() {
        let f = Feeer::Ratio {
            receiver: receiver(),
            ratio_ppm: 10,
            min: Big::from(5),
            max: Big::from(4),
        };
        assert!(!f.is_valid());
    }
}

use std::fmt;

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{big::Big, currency::CurrencyId};

/// A quantity of one currency.
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct Amount {
    currency: CurrencyId,
    big: Big,
}

impl Amount {
    pub fn new(currency: CurrencyId, big: Big) -> Self {
        Self { currency, big }
    }

    pub fn zero(currency: CurrencyId) -> Self {
        Self::new(currency, Big::ZERO)
    }

    pub fn currency(&self) -> &CurrencyId {
        &self.currency
    }

    pub fn big(&self) -> Big {
        self.big
    }

    /// Returns a copy with the quantity replaced.
    pub fn with_big(&self, big: Big) -> Self {
        Self::new(self.currency.clone(), big)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.big, self.currency)
    }
}

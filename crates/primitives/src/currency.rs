use std::fmt;

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

pub const MIN_CURRENCY_ID_LEN: usize = 3;
pub const MAX_CURRENCY_ID_LEN: usize = 10;

/// Identifier scoping balances, fees and amounts to one asset type.
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyId(String);

impl CurrencyId {
    pub fn new(s: impl Into<String>) -> Result<Self, ParseError> {
        let s = s.into();
        if !is_valid_currency_id(&s) {
            return Err(ParseError::InvalidCurrencyId(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rechecks the invariant, used after decoding from untrusted bytes.
    pub fn is_valid(&self) -> bool {
        is_valid_currency_id(&self.0)
    }
}

fn is_valid_currency_id(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() < MIN_CURRENCY_ID_LEN || b.len() > MAX_CURRENCY_ID_LEN {
        return false;
    }

    let edge = |c: u8| c.is_ascii_uppercase() || c.is_ascii_digit();
    let inner = |c: u8| edge(c) || matches!(c, b'_' | b'.' | b'!' | b'$' | b'*' | b'@');

    edge(b[0]) && edge(b[b.len() - 1]) && b.iter().all(|c| inner(*c))
}

impl TryFrom<String> for CurrencyId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CurrencyId> for String {
    fn from(value: CurrencyId) -> Self {
        value.0
    }
}

impl fmt::Display for CurrencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'a> Arbitrary<'a> for CurrencyId {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        const ALPHA: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let len = u.int_in_range(MIN_CURRENCY_ID_LEN..=MAX_CURRENCY_ID_LEN)?;
        let mut s = String::with_capacity(len);
        for _ in 0..len {
            s.push(*u.choose(ALPHA)? as char);
        }
        Ok(Self(s))
    }
}

use std::fmt;

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{errors::ParseError, hash};

/// Suffix every account address carries.
pub const ADDRESS_SUFFIX: &str = "mca";
pub const MIN_ADDRESS_BODY_LEN: usize = 3;
pub const MAX_ADDRESS_BODY_LEN: usize = 100;

/// Canonical identifier of an account or contract account.  Equality is
/// string equality on the canonical form.
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
pub struct Address(String);

impl Address {
    pub fn new(s: impl Into<String>) -> Result<Self, ParseError> {
        let s = s.into();
        if !is_valid_address(&s) {
            return Err(ParseError::InvalidAddress(s));
        }
        Ok(Self(s))
    }

    /// Derives an address from a hash-like commitment, used for addresses
    /// computed from account keys.
    pub fn from_commitment(commitment: &[u8]) -> Self {
        let h = hash::raw(commitment);
        Self(format!("{}{ADDRESS_SUFFIX}", hex::encode(&h.as_slice()[..20])))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        is_valid_address(&self.0)
    }
}

fn is_valid_address(s: &str) -> bool {
    let Some(body) = s.strip_suffix(ADDRESS_SUFFIX) else {
        return false;
    };

    (MIN_ADDRESS_BODY_LEN..=MAX_ADDRESS_BODY_LEN).contains(&body.len())
        && body
            .bytes()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

impl TryFrom<String> for Address {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'a> Arbitrary<'a> for Address {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let seed = <[u8; 16]>::arbitrary(u)?;
        Ok(Self::from_commitment(&seed))
    }
}

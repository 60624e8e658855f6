//! Non-negative arbitrary quantities.

use std::{
    fmt::{self, Display},
    io,
    str::FromStr,
};

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use ethnum::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ParseError;

/// Denominator for fee ratios expressed in parts per million.
pub const PPM_DENOMINATOR: u32 = 1_000_000;

/// A non-negative 256-bit quantity.
///
/// All arithmetic is checked so that a processor can turn an overflow into a
/// rejection instead of wrapping.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Big(U256);

impl Big {
    pub const ZERO: Big = Big(U256::ZERO);
    pub const ONE: Big = Big(U256::ONE);
    pub const MAX: Big = Big(U256::MAX);

    pub const fn new(v: u128) -> Self {
        Self(U256::new(v))
    }

    pub fn from_u64(v: u64) -> Self {
        Self(U256::from(v))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == U256::ZERO
    }

    pub fn checked_add(self, rhs: Big) -> Option<Big> {
        self.0.checked_add(rhs.0).map(Big)
    }

    pub fn checked_sub(self, rhs: Big) -> Option<Big> {
        self.0.checked_sub(rhs.0).map(Big)
    }

    pub fn saturating_sub(self, rhs: Big) -> Big {
        self.checked_sub(rhs).unwrap_or(Big::ZERO)
    }

    /// Computes `floor(self * ppm / 1_000_000)` without overflowing the
    /// intermediate product.
    pub fn mul_ppm(self, ppm: u32) -> Big {
        let denom = U256::from(PPM_DENOMINATOR);
        let ppm = U256::from(ppm);
        let whole = self.0 / denom;
        let rem = self.0 % denom;
        // `rem * ppm` stays well under 2^64, `whole * ppm` saturates only for
        // quantities no ledger can hold.
        let hi = whole.checked_mul(ppm).unwrap_or(U256::MAX);
        let lo = rem * ppm / denom;
        Big(hi.checked_add(lo).unwrap_or(U256::MAX))
    }

    pub fn to_le_bytes(&self) -> [u8; 32] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(buf: [u8; 32]) -> Self {
        Self(U256::from_le_bytes(buf))
    }
}

impl From<u64> for Big {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl Display for Big {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for Big {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidBig(s.to_owned()));
        }
        U256::from_str_radix(s, 10)
            .map(Big)
            .map_err(|_| ParseError::InvalidBig(s.to_owned()))
    }
}

impl BorshSerialize for Big {
    fn serialize<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_le_bytes())
    }
}

impl BorshDeserialize for Big {
    fn deserialize_reader<R: io::Read>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; 32];
        reader.read_exact(&mut buf)?;
        Ok(Self::from_le_bytes(buf))
    }
}

impl Serialize for Big {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Big {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl<'a> Arbitrary<'a> for Big {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        // Keep generated values far from the overflow boundary.
        Ok(Self::new(u64::arbitrary(u)? as u128))
    }
}

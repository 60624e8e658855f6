//! Validator set facts.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::{prelude::*, sig};
use serde::{Deserialize, Serialize};

use super::check_address;
use crate::errors::FactError;

/// Registers a node as a candidate for joining the suffrage.
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
pub struct SuffrageCandidateFact {
    pub address: Address,
    pub public_key: PublicKey,
}

impl SuffrageCandidateFact {
    pub fn is_valid(&self) -> Result<(), FactError> {
        check_address(&self.address)?;

        if !sig::is_valid_public_key(&self.public_key) {
            return Err(FactError::InvalidPublicKey(self.public_key));
        }

        Ok(())
    }
}

/// A registered candidate joins the suffrage.  `start` must name the height
/// the candidacy started at.
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
pub struct SuffrageJoinFact {
    pub candidate: Address,
    pub start: Height,
}

impl SuffrageJoinFact {
    pub fn is_valid(&self) -> Result<(), FactError> {
        check_address(&self.candidate)
    }
}

/// A member leaves the suffrage voluntarily.
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
pub struct SuffrageDisjoinFact {
    pub node: Address,
    pub start: Height,
}

impl SuffrageDisjoinFact {
    pub fn is_valid(&self) -> Result<(), FactError> {
        check_address(&self.node)
    }
}

/// The rest of the suffrage removes a member.  Only valid while the current
/// height is inside `[start, end]`.
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
pub struct SuffrageExpelFact {
    pub node: Address,
    pub start: Height,
    pub end: Height,
}

impl SuffrageExpelFact {
    pub fn is_valid(&self) -> Result<(), FactError> {
        check_address(&self.node)?;

        if self.start > self.end {
            return Err(FactError::InvalidWindow(self.start, self.end));
        }

        Ok(())
    }

    pub fn in_window(&self, height: Height) -> bool {
        (self.start..=self.end).contains(&height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expel_window() {
        let fact = SuffrageExpelFact {
            node: Address::new("node0mca").unwrap(),
            start: 10,
            end: 12,
        };
        assert!(fact.is_valid().is_ok());
        assert!(!fact.in_window(9));
        assert!(fact.in_window(10));
        assert!(fact.in_window(12));
        assert!(!fact.in_window(13));

        let bad = SuffrageExpelFact { start: 13, ..fact };
        assert!(matches!(bad.is_valid(), Err(FactError::InvalidWindow(13, 12))));
    }

    #[test]
    fn test_candidate_requires_valid_key() {
        let fact = SuffrageCandidateFact {
            address: Address::new("node0mca").unwrap(),
            public_key: Buf32::zero(),
        };
        assert!(matches!(
            fact.is_valid(),
            Err(FactError::InvalidPublicKey(_))
        ));
    }
}

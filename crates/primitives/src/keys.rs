//! Weighted key sets controlling accounts.

use std::collections::BTreeSet;

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{
    address::Address,
    buf::Buf32,
    errors::KeysError,
    hash,
    sig::{self, PublicKey},
};

pub const MAX_ACCOUNT_KEYS: usize = 10;
pub const MAX_WEIGHT: u8 = 100;

#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct AccountKey {
    key: PublicKey,
    weight: u8,
}

impl AccountKey {
    pub fn new(key: PublicKey, weight: u8) -> Self {
        Self { key, weight }
    }

    pub fn key(&self) -> &PublicKey {
        &self.key
    }

    pub fn weight(&self) -> u8 {
        self.weight
    }
}

/// Set of weighted keys plus the threshold a signer set must reach.
///
/// Keys are kept sorted by public key so that two sets with the same members
/// compare and hash equal.
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
pub struct AccountKeys {
    keys: Vec<AccountKey>,
    threshold: u8,
}

impl AccountKeys {
    pub fn new(mut keys: Vec<AccountKey>, threshold: u8) -> Result<Self, KeysError> {
        keys.sort_by(|a, b| a.key.cmp(&b.key));
        let ks = Self { keys, threshold };
        ks.check()?;
        Ok(ks)
    }

    pub fn keys(&self) -> &[AccountKey] {
        &self.keys
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Validates the structural rules, including the sort order a decoded
    /// instance might violate.
    pub fn check(&self) -> Result<(), KeysError> {
        if self.keys.is_empty() {
            return Err(KeysError::Empty);
        }

        if self.keys.len() > MAX_ACCOUNT_KEYS {
            return Err(KeysError::TooMany(MAX_ACCOUNT_KEYS, self.keys.len()));
        }

        if self.threshold == 0 || self.threshold > MAX_WEIGHT {
            return Err(KeysError::InvalidThreshold(self.threshold));
        }

        let mut seen = BTreeSet::new();
        let mut total = 0u32;
        for k in &self.keys {
            if k.weight == 0 || k.weight > MAX_WEIGHT {
                return Err(KeysError::InvalidWeight(k.weight));
            }

            if !seen.insert(k.key) {
                return Err(KeysError::Duplicated(format!("{:?}", k.key)));
            }

            if !sig::is_valid_public_key(&k.key) {
                return Err(KeysError::InvalidPublicKey(format!("{:?}", k.key)));
            }

            total += k.weight as u32;
        }

        if !self.keys.is_sorted_by(|a, b| a.key < b.key) {
            return Err(KeysError::Unsorted);
        }

        if total < self.threshold as u32 {
            return Err(KeysError::WeightsUnderThreshold(total, self.threshold));
        }

        Ok(())
    }

    pub fn hash(&self) -> Buf32 {
        hash::compute_borsh_hash(self)
    }

    /// Address of the account these keys control.
    pub fn address(&self) -> Address {
        Address::from_commitment(self.hash().as_slice())
    }

    pub fn get(&self, pk: &PublicKey) -> Option<&AccountKey> {
        self.keys
            .binary_search_by(|k| k.key.cmp(pk))
            .ok()
            .map(|i| &self.keys[i])
    }

    /// Sums the weight of the keys that appear among the signers.  Each key is
    /// counted once regardless of how often it signed.
    pub fn signed_weight<'a>(&self, signers: impl IntoIterator<Item = &'a PublicKey>) -> u32 {
        let signers: BTreeSet<&PublicKey> = signers.into_iter().collect();
        self.keys
            .iter()
            .filter(|k| signers.contains(&k.key))
            .map(|k| k.weight as u32)
            .sum()
    }

    pub fn is_satisfied_by<'a>(&self, signers: impl IntoIterator<Item = &'a PublicKey>) -> bool {
        self.signed_weight(signers) >= self.threshold as u32
    }
}

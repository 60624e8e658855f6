//! Deterministic keys and accounts so tests can refer to the same identities
//! across runs.

use ledger_primitives::{hash, prelude::*, sig};

/// Secret key number `i`.
pub fn test_secret(i: u8) -> Buf32 {
    hash::concat(&[b"ledger test secret", &[i]])
}

pub fn test_public_key(i: u8) -> PublicKey {
    sig::public_key_of(&test_secret(i)).expect("test: valid secret")
}

/// Single key keys with full weight.
pub fn test_keys(i: u8) -> AccountKeys {
    AccountKeys::new(vec![AccountKey::new(test_public_key(i), 100)], 100)
        .expect("test: valid keys")
}

pub fn amount(cid: &str, v: u64) -> Amount {
    Amount::new(currency(cid), Big::from(v))
}

pub fn currency(cid: &str) -> CurrencyId {
    CurrencyId::new(cid).expect("test: valid currency id")
}

/// An account controlled by the single key `i`.
#[derive(Clone, Debug)]
pub struct TestAccount {
    pub secret: Buf32,
    pub keys: AccountKeys,
    pub address: Address,
}

impl TestAccount {
    pub fn new(i: u8) -> Self {
        let keys = test_keys(i);
        Self {
            secret: test_secret(i),
            address: keys.address(),
            keys,
        }
    }

    /// Account controlled by several keys with the given weights.
    pub fn multi(idxs: &[(u8, u8)], threshold: u8) -> (Address, AccountKeys) {
        let keys = idxs
            .iter()
            .map(|(i, w)| AccountKey::new(test_public_key(*i), *w))
            .collect();
        let keys = AccountKeys::new(keys, threshold).expect("test: valid keys");
        (keys.address(), keys)
    }
}

/// A consensus node.  Node keys use a separate index range from account
/// keys.
#[derive(Clone, Debug)]
pub struct TestNode {
    pub secret: Buf32,
    pub public_key: PublicKey,
    pub address: Address,
}

impl TestNode {
    pub fn new(i: u8) -> Self {
        let secret = test_secret(i.wrapping_add(128));
        let public_key = sig::public_key_of(&secret).expect("test: valid secret");
        Self {
            secret,
            public_key,
            address: Address::new(format!("node{i:03}mca")).expect("test: valid address"),
        }
    }
}

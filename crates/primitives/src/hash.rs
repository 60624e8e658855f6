//! Common wrapper around whatever we choose our native hash function to be.

use borsh::BorshSerialize;
use digest::Digest;
use sha2::Sha256;

use crate::buf::Buf32;

/// Direct untagged hash.
pub fn raw(buf: &[u8]) -> Buf32 {
    Buf32::from(<[u8; 32]>::from(Sha256::digest(buf)))
}

/// Hashes the concatenation of several slices without allocating.
pub fn concat(parts: &[&[u8]]) -> Buf32 {
    let mut hasher = Sha256::new();
    for p in parts {
        hasher.update(p);
    }
    Buf32::from(<[u8; 32]>::from(hasher.finalize()))
}

/// Hashes the borsh encoding of a value.
pub fn compute_borsh_hash<T: BorshSerialize>(v: &T) -> Buf32 {
    let mut hasher = Sha256::new();
    v.serialize(&mut hasher).expect("hash: borsh into hasher");
    let arr: [u8; 32] = hasher.finalize().into();
    Buf32::from(arr)
}

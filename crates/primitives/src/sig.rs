//! Schnorr signing over secp256k1 x-only keys.

use secp256k1::{schnorr::Signature, Keypair, Message, SecretKey, XOnlyPublicKey, SECP256K1};

use crate::{
    buf::{Buf32, Buf64},
    hash,
    params::NetworkId,
};

/// X-only schnorr public key.
pub type PublicKey = Buf32;

/// Computes the digest that signers of a fact commit to.
pub fn sign_message(network_id: &NetworkId, fact_hash: &Buf32) -> Buf32 {
    hash::concat(&[network_id.as_bytes(), fact_hash.as_slice()])
}

/// Signs a message digest, returning `None` if the secret key is not a valid
/// scalar.
pub fn sign_schnorr_sig(msg: &Buf32, sk: &Buf32) -> Option<Buf64> {
    let sk = SecretKey::from_slice(sk.as_ref()).ok()?;
    let kp = Keypair::from_secret_key(SECP256K1, &sk);
    let msg = Message::from_digest((*msg).into());
    let sig = SECP256K1.sign_schnorr_no_aux_rand(&msg, &kp);
    Some(Buf64::from(sig.serialize()))
}

/// Derives the x-only public key of a secret key.
pub fn public_key_of(sk: &Buf32) -> Option<PublicKey> {
    let sk = SecretKey::from_slice(sk.as_ref()).ok()?;
    let kp = Keypair::from_secret_key(SECP256K1, &sk);
    Some(Buf32::from(kp.x_only_public_key().0.serialize()))
}

pub fn is_valid_public_key(pk: &PublicKey) -> bool {
    XOnlyPublicKey::from_slice(pk.as_ref()).is_ok()
}

pub fn verify_schnorr_sig(sig: &Buf64, msg: &Buf32, pk: &PublicKey) -> bool {
    let msg = match Message::from_digest_slice(msg.as_ref()) {
        Ok(msg) => msg,
        Err(_) => return false,
    };

    let pk = match XOnlyPublicKey::from_slice(pk.as_ref()) {
        Ok(pk) => pk,
        Err(_) => return false,
    };

    let sig = match Signature::from_slice(sig.as_ref()) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    SECP256K1.verify_schnorr(&sig, &msg, &pk).is_ok()
}

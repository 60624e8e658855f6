//! Builds signed operations.

use std::sync::atomic::{AtomicU64, Ordering};

use ledger_ops::{Fact, FactBody, Operation, SignEntry};
use ledger_primitives::prelude::*;

use crate::keys::TestNode;

static TOKEN_CTR: AtomicU64 = AtomicU64::new(0);

/// Fresh token, so that equal bodies still make distinct facts.
pub fn next_token() -> Vec<u8> {
    TOKEN_CTR.fetch_add(1, Ordering::Relaxed).to_be_bytes().to_vec()
}

/// Account operation signed by the given secret keys.
pub fn sign_op(network_id: &NetworkId, body: FactBody, secrets: &[&Buf32]) -> Operation {
    let fact = Fact::new(next_token(), body);
    let signs = secrets
        .iter()
        .map(|sk| SignEntry::sign(network_id, fact.hash(), sk, None).expect("test: sign"))
        .collect();
    Operation::new(fact, signs)
}

/// Node operation signed by the given nodes.
pub fn sign_node_op(network_id: &NetworkId, body: FactBody, nodes: &[&TestNode]) -> Operation {
    let fact = Fact::new(next_token(), body);
    let signs = nodes
        .iter()
        .map(|n| {
            SignEntry::sign(network_id, fact.hash(), &n.secret, Some(n.address.clone()))
                .expect("test: sign")
        })
        .collect();
    Operation::new(fact, signs)
}

//! Signed operations.

use std::collections::BTreeSet;

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::{prelude::*, sig};
use serde::{Deserialize, Serialize};

use crate::{errors::OperationError, fact::Fact, kind::OperationKind};

/// One signature over the fact.  Node operations name the node each
/// signature comes from.
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
pub struct SignEntry {
    pub signer: PublicKey,
    pub signature: Buf64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<Address>,
}

impl SignEntry {
    /// Signs `fact_hash` for `network_id` with the secret key `sk`.
    pub fn sign(
        network_id: &NetworkId,
        fact_hash: &Buf32,
        sk: &Buf32,
        node: Option<Address>,
    ) -> Option<Self> {
        let msg = sig::sign_message(network_id, fact_hash);
        Some(Self {
            signer: sig::public_key_of(sk)?,
            signature: sig::sign_schnorr_sig(&msg, sk)?,
            node,
        })
    }

    pub fn verify(&self, network_id: &NetworkId, fact_hash: &Buf32) -> bool {
        let msg = sig::sign_message(network_id, fact_hash);
        sig::verify_schnorr_sig(&self.signature, &msg, &self.signer)
    }
}

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
pub struct Operation {
    fact: Fact,
    signs: Vec<SignEntry>,
}

impl Operation {
    pub fn new(fact: Fact, signs: Vec<SignEntry>) -> Self {
        Self { fact, signs }
    }

    pub fn fact(&self) -> &Fact {
        &self.fact
    }

    pub fn signs(&self) -> &[SignEntry] {
        &self.signs
    }

    pub fn kind(&self) -> OperationKind {
        self.fact.kind()
    }

    /// Operations are identified by their fact.
    pub fn hash(&self) -> &Buf32 {
        self.fact.hash()
    }

    pub fn signers(&self) -> impl Iterator<Item = &PublicKey> + '_ {
        self.signs.iter().map(|s| &s.signer)
    }

    /// Adds a signature, replacing any earlier one by the same signer.
    pub fn add_sign(&mut self, entry: SignEntry) {
        self.signs.retain(|s| s.signer != entry.signer);
        self.signs.push(entry);
    }

    /// Checks the fact and every signature against the network.
    pub fn is_valid(&self, network_id: &NetworkId) -> Result<(), OperationError> {
        self.fact.is_valid()?;

        if self.signs.is_empty() {
            return Err(OperationError::NoSigns);
        }

        let node_op = self.kind().is_node_operation();
        let mut signers = BTreeSet::new();
        let mut nodes = BTreeSet::new();
        for s in &self.signs {
            if !signers.insert(s.signer) {
                return Err(OperationError::DuplicatedSigner(s.signer));
            }

            match (&s.node, node_op) {
                (None, true) => return Err(OperationError::MissingNode),
                (Some(_), false) => return Err(OperationError::UnexpectedNode(self.kind())),
                (Some(n), true) => {
                    if !nodes.insert(n) {
                        return Err(OperationError::DuplicatedNode(n.clone()));
                    }
                }
                (None, false) => {}
            }

            if !s.verify(network_id, self.fact.hash()) {
                return Err(OperationError::InvalidSign(s.signer));
            }
        }

        Ok(())
    }
}

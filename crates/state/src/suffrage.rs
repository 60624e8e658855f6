//! Validator set records.
//!
//! Both lists are kept sorted by address so that their encoding doesn't depend
//! on the order in which joins and removals were applied.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;
use serde::{Deserialize, Serialize};

/// One validator's membership record.
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
pub struct SuffrageNode {
    address: Address,
    public_key: PublicKey,

    /// Height from which the node is a member.
    start: Height,
}

impl SuffrageNode {
    pub fn new(address: Address, public_key: PublicKey, start: Height) -> Self {
        Self {
            address,
            public_key,
            start,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn start(&self) -> Height {
        self.start
    }
}

/// The aggregate suffrage state, at the `suffrage` key.
#[derive(
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct SuffrageNodes {
    nodes: Vec<SuffrageNode>,
}

impl SuffrageNodes {
    pub fn new(mut nodes: Vec<SuffrageNode>) -> Self {
        nodes.sort_by(|a, b| a.address.cmp(&b.address));
        nodes.dedup_by(|a, b| a.address == b.address);
        Self { nodes }
    }

    pub fn nodes(&self) -> &[SuffrageNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, addr: &Address) -> Option<&SuffrageNode> {
        self.nodes
            .binary_search_by(|n| n.address.cmp(addr))
            .ok()
            .map(|i| &self.nodes[i])
    }

    pub fn exists(&self, addr: &Address) -> bool {
        self.get(addr).is_some()
    }

    /// Inserts or replaces the node with the same address.
    pub fn insert(&mut self, node: SuffrageNode) {
        match self.nodes.binary_search_by(|n| n.address.cmp(&node.address)) {
            Ok(i) => self.nodes[i] = node,
            Err(i) => self.nodes.insert(i, node),
        }
    }

    /// Removes a node, returning if it was present.
    pub fn remove(&mut self, addr: &Address) -> bool {
        match self.nodes.binary_search_by(|n| n.address.cmp(addr)) {
            Ok(i) => {
                self.nodes.remove(i);
                true
            }
            Err(_) => false,
        }
    }
}

/// A node waiting to join the suffrage.
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
pub struct SuffrageCandidate {
    address: Address,
    public_key: PublicKey,

    /// Height at which the candidate was accepted, a join has to name it.
    start: Height,

    /// Last height at which the candidate may still join.
    deadline: Height,
}

impl SuffrageCandidate {
    pub fn new(address: Address, public_key: PublicKey, start: Height, deadline: Height) -> Self {
        Self {
            address,
            public_key,
            start,
            deadline,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn start(&self) -> Height {
        self.start
    }

    pub fn deadline(&self) -> Height {
        self.deadline
    }

    pub fn is_expired(&self, height: Height) -> bool {
        height > self.deadline
    }
}

/// Pending candidates, at the `suffragecandidate` key.
#[derive(
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct SuffrageCandidates {
    candidates: Vec<SuffrageCandidate>,
}

impl SuffrageCandidates {
    pub fn new(mut candidates: Vec<SuffrageCandidate>) -> Self {
        candidates.sort_by(|a, b| a.address.cmp(&b.address));
        candidates.dedup_by(|a, b| a.address == b.address);
        Self { candidates }
    }

    pub fn candidates(&self) -> &[SuffrageCandidate] {
        &self.candidates
    }

    pub fn get(&self, addr: &Address) -> Option<&SuffrageCandidate> {
        self.candidates
            .binary_search_by(|c| c.address.cmp(addr))
            .ok()
            .map(|i| &self.candidates[i])
    }

    pub fn insert(&mut self, cand: SuffrageCandidate) {
        match self
            .candidates
            .binary_search_by(|c| c.address.cmp(&cand.address))
        {
            Ok(i) => self.candidates[i] = cand,
            Err(i) => self.candidates.insert(i, cand),
        }
    }

    pub fn remove(&mut self, addr: &Address) -> bool {
        match self.candidates.binary_search_by(|c| c.address.cmp(addr)) {
            Ok(i) => {
                self.candidates.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    /// Drops candidates whose deadline passed.
    pub fn prune_expired(&mut self, height: Height) {
        self.candidates.retain(|c| !c.is_expired(height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(addr: &str, start: Height) -> SuffrageNode {
        SuffrageNode::new(Address::new(addr).unwrap(), Buf32::from([1; 32]), start)
    }

    #[test]
    fn test_nodes_sorted_insert_remove() {
        let mut ns = SuffrageNodes::new(vec![node("ccc000mca", 1), node("aaa000mca", 1)]);
        assert_eq!(ns.nodes()[0].address().as_str(), "aaa000mca");

        ns.insert(node("bbb000mca", 4));
        assert_eq!(ns.len(), 3);
        assert_eq!(ns.nodes()[1].start(), 4);

        ns.insert(node("bbb000mca", 9));
        assert_eq!(ns.len(), 3);
        assert_eq!(ns.get(&Address::new("bbb000mca").unwrap()).unwrap().start(), 9);

        assert!(ns.remove(&Address::new("aaa000mca").unwrap()));
        assert!(!ns.remove(&Address::new("aaa000mca").unwrap()));
        assert_eq!(ns.len(), 2);
    }

    #[test]
    fn test_candidates_prune() {
        let mut cs = SuffrageCandidates::default();
        cs.insert(SuffrageCandidate::new(
            Address::new("aaa000mca").unwrap(),
            Buf32::from([1; 32]),
            2,
            10,
        ));
        cs.insert(SuffrageCandidate::new(
            Address::new("bbb000mca").unwrap(),
            Buf32::from([2; 32]),
            2,
            20,
        ));

        cs.prune_expired(11);
        assert_eq!(cs.candidates().len(), 1);
        assert_eq!(cs.candidates()[0].address().as_str(), "bbb000mca");
    }
}

//! Per-block bookkeeping: duplication tracking and the shared suffrage
//! context.  A session belongs to exactly one block and is dropped (or
//! reset) before the next.

use std::collections::{BTreeMap, BTreeSet};

use ledger_ops::{FactBody, Operation};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::{
    errors::{ProcResult, ReasonError},
    helpers::get_account,
    pending::PendingBalances,
};

/// How an operation brings a new address into existence.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AddressOrigin {
    /// Named as the target of an account creation.
    Explicit,

    /// Receiver of a transfer that doesn't exist yet.
    AutoCreated,
}

/// The keys an operation claims in the block.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DupKeys {
    pub senders: Vec<Address>,
    pub currencies: Vec<CurrencyId>,
    pub new_addresses: Vec<(Address, AddressOrigin)>,
}

impl DupKeys {
    /// Works out the keys `op` claims.  Transfer receivers only count as new
    /// addresses when they don't exist in the snapshot.
    pub fn for_operation(op: &Operation, acc: &dyn StateAccessor) -> ProcResult<Self> {
        let mut keys = DupKeys::default();
        match op.fact().body() {
            FactBody::CreateAccount(f) => {
                keys.senders.push(f.sender.clone());
                keys.new_addresses.extend(
                    f.items
                        .iter()
                        .map(|it| (it.address(), AddressOrigin::Explicit)),
                );
            }
            FactBody::CreateContractAccount(f) => {
                keys.senders.push(f.sender.clone());
                keys.new_addresses.extend(
                    f.items
                        .iter()
                        .map(|it| (it.address(), AddressOrigin::Explicit)),
                );
            }
            FactBody::Transfer(f) => {
                keys.senders.push(f.sender.clone());
                for it in &f.items {
                    if get_account(acc, &it.receiver)?.is_none() {
                        keys.new_addresses
                            .push((it.receiver.clone(), AddressOrigin::AutoCreated));
                    }
                }
            }
            FactBody::UpdateKey(f) => keys.senders.push(f.target.clone()),
            FactBody::Withdraw(f) => {
                keys.senders.push(f.sender.clone());
                keys.senders
                    .extend(f.items.iter().map(|it| it.target.clone()));
            }
            FactBody::UpdateOperator(f)
            | FactBody::UpdateRecipient(f)
            | FactBody::UpdateHandler(f) => keys.senders.push(f.sender.clone()),
            FactBody::RegisterCurrency(f) => keys.currencies.push(f.currency.clone()),
            FactBody::UpdateCurrency(f) => keys.currencies.push(f.currency.clone()),
            _ => {}
        }

        Ok(keys)
    }
}

/// Keys claimed by the operations seen so far in one phase of a block.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DupTracker {
    facts: BTreeSet<Buf32>,
    senders: BTreeMap<Address, Buf32>,
    currencies: BTreeMap<CurrencyId, Buf32>,
    new_addresses: BTreeMap<Address, AddressOrigin>,
}

impl DupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
            && self.senders.is_empty()
            && self.currencies.is_empty()
            && self.new_addresses.is_empty()
    }

    /// Rejects a fact this phase already accepted.
    pub fn check_fact(&self, fact: &Buf32) -> Result<(), ReasonError> {
        if self.facts.contains(fact) {
            return Err(ReasonError::Duplicated(format!("fact {fact}")));
        }
        Ok(())
    }

    pub fn check(&self, keys: &DupKeys) -> Result<(), ReasonError> {
        for s in &keys.senders {
            if self.senders.contains_key(s) {
                return Err(ReasonError::Duplicated(format!("sender {s}")));
            }
        }

        for c in &keys.currencies {
            if self.currencies.contains_key(c) {
                return Err(ReasonError::Duplicated(format!("currency {c}")));
            }
        }

        for (a, origin) in &keys.new_addresses {
            match (self.new_addresses.get(a), origin) {
                (None, _) => {}
                (Some(AddressOrigin::AutoCreated), AddressOrigin::AutoCreated) => {}
                (Some(_), _) => {
                    return Err(ReasonError::Duplicated(format!("new address {a}")));
                }
            }
        }

        Ok(())
    }

    pub fn record(&mut self, keys: DupKeys, fact_hash: Buf32) {
        self.facts.insert(fact_hash);

        for s in keys.senders {
            self.senders.insert(s, fact_hash);
        }

        for c in keys.currencies {
            self.currencies.insert(c, fact_hash);
        }

        for (a, origin) in keys.new_addresses {
            let e = self.new_addresses.entry(a).or_insert(origin);
            if origin == AddressOrigin::Explicit {
                *e = origin;
            }
        }
    }

    pub fn clear(&mut self) {
        self.facts.clear();
        self.senders.clear();
        self.currencies.clear();
        self.new_addresses.clear();
    }
}

/// Suffrage changes claimed in the block, so that join, disjoin and expel
/// can't race on the same node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum SuffrageSlot {
    Candidate,
    Join,
    Removal,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SuffrageContext {
    claims: BTreeMap<(SuffrageSlot, Address), Buf32>,
}

impl SuffrageContext {
    /// Whether another fact already claimed `slot` for `addr`.
    pub fn is_claimed_by_other(&self, slot: SuffrageSlot, addr: &Address, fact: &Buf32) -> bool {
        self.claims
            .get(&(slot, addr.clone()))
            .is_some_and(|h| h != fact)
    }

    pub fn claim(&mut self, slot: SuffrageSlot, addr: &Address, fact: Buf32) {
        self.claims.entry((slot, addr.clone())).or_insert(fact);
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn clear(&mut self) {
        self.claims.clear();
    }
}

/// Everything the dispatcher tracks for one block.
#[derive(Clone, Debug)]
pub struct BlockSession {
    params: ExecParams,
    height: Height,
    preprocessed: DupTracker,
    processed: DupTracker,
    suffrage: SuffrageContext,
    pending: PendingBalances,
}

/// Disjoint borrows of a session for a single processor call.
pub(crate) struct SessionParts<'a> {
    pub params: &'a ExecParams,
    pub height: Height,
    pub preprocessed: &'a mut DupTracker,
    pub processed: &'a mut DupTracker,
    pub suffrage: &'a mut SuffrageContext,
    pub pending: &'a mut PendingBalances,
}

impl BlockSession {
    pub fn new(params: ExecParams, height: Height) -> Self {
        Self {
            params,
            height,
            preprocessed: DupTracker::new(),
            processed: DupTracker::new(),
            suffrage: SuffrageContext::default(),
            pending: PendingBalances::new(),
        }
    }

    pub fn params(&self) -> &ExecParams {
        &self.params
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn preprocessed(&self) -> &DupTracker {
        &self.preprocessed
    }

    pub fn processed(&self) -> &DupTracker {
        &self.processed
    }

    pub fn suffrage(&self) -> &SuffrageContext {
        &self.suffrage
    }

    pub fn pending(&self) -> &PendingBalances {
        &self.pending
    }

    /// Splits the session into the parts a single processor call needs.
    pub(crate) fn parts_mut(&mut self) -> SessionParts<'_> {
        SessionParts {
            params: &self.params,
            height: self.height,
            preprocessed: &mut self.preprocessed,
            processed: &mut self.processed,
            suffrage: &mut self.suffrage,
            pending: &mut self.pending,
        }
    }

    /// Clears everything and moves the session to the next height.
    pub fn reset(&mut self, height: Height) {
        self.height = height;
        self.preprocessed.clear();
        self.processed.clear();
        self.suffrage.clear();
        self.pending.clear();
    }

    pub fn is_clean(&self) -> bool {
        self.preprocessed.is_empty()
            && self.processed.is_empty()
            && self.suffrage.is_empty()
            && self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn keys_with_new(a: &str, origin: AddressOrigin) -> DupKeys {
        DupKeys {
            new_addresses: vec![(addr(a), origin)],
            ..Default::default()
        }
    }

    #[test]
    fn test_sender_duplication() {
        let mut t = DupTracker::new();
        let k = DupKeys {
            senders: vec![addr("sender0mca")],
            ..Default::default()
        };
        assert!(t.check(&k).is_ok());
        t.record(k.clone(), Buf32::zero());
        assert!(matches!(t.check(&k), Err(ReasonError::Duplicated(_))));
    }

    #[test]
    fn test_fact_recorded_even_without_keys() {
        let mut t = DupTracker::new();
        let fact = Buf32::from([7; 32]);
        assert!(t.check_fact(&fact).is_ok());

        t.record(DupKeys::default(), fact);
        assert!(!t.is_empty());
        assert!(matches!(t.check_fact(&fact), Err(ReasonError::Duplicated(_))));
        assert!(t.check_fact(&Buf32::from([8; 32])).is_ok());

        t.clear();
        assert!(t.check_fact(&fact).is_ok());
    }

    #[test]
    fn test_new_address_origins() {
        use AddressOrigin::*;

        let mut t = DupTracker::new();
        t.record(keys_with_new("new0mca", AutoCreated), Buf32::zero());
        assert!(t.check(&keys_with_new("new0mca", AutoCreated)).is_ok());
        assert!(t.check(&keys_with_new("new0mca", Explicit)).is_err());

        let mut t = DupTracker::new();
        t.record(keys_with_new("new0mca", Explicit), Buf32::zero());
        assert!(t.check(&keys_with_new("new0mca", AutoCreated)).is_err());

        // An explicit creation upgrades an earlier auto-creation.
        let mut t = DupTracker::new();
        t.record(keys_with_new("new0mca", AutoCreated), Buf32::zero());
        t.record(keys_with_new("new0mca", Explicit), Buf32::zero());
        assert!(t.check(&keys_with_new("new0mca", AutoCreated)).is_err());
    }

    #[test]
    fn test_suffrage_claims() {
        let mut c = SuffrageContext::default();
        let n = addr("node0mca");
        let f1 = Buf32::from([1; 32]);
        let f2 = Buf32::from([2; 32]);

        c.claim(SuffrageSlot::Removal, &n, f1);
        assert!(!c.is_claimed_by_other(SuffrageSlot::Removal, &n, &f1));
        assert!(c.is_claimed_by_other(SuffrageSlot::Removal, &n, &f2));
        assert!(!c.is_claimed_by_other(SuffrageSlot::Join, &n, &f2));
    }

    #[test]
    fn test_session_reset_clears() {
        let mut s = BlockSession::new(ExecParams::new(NetworkId::new("t")), 3);
        {
            let parts = s.parts_mut();
            parts
                .preprocessed
                .record(keys_with_new("new0mca", AddressOrigin::Explicit), Buf32::zero());
            parts
                .suffrage
                .claim(SuffrageSlot::Join, &addr("node0mca"), Buf32::zero());
        }
        assert!(!s.is_clean());

        s.reset(4);
        assert!(s.is_clean());
        assert_eq!(s.height(), 4);
    }
}

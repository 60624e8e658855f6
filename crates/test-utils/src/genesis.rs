//! Builds snapshots for tests.

use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::keys::TestNode;

#[derive(Default)]
pub struct GenesisBuilder {
    height: Height,
    states: Vec<State>,
}

impl GenesisBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Height the records are stamped with.
    pub fn at_height(mut self, height: Height) -> Self {
        self.height = height;
        self
    }

    fn push(mut self, key: StateKey, value: StateValue) -> Self {
        self.states.push(State::new(key, value, self.height, vec![]));
        self
    }

    pub fn account(self, keys: &AccountKeys) -> Self {
        let acc = Account::from_keys(keys.clone());
        self.push(StateKey::account(acc.address()), StateValue::Account(acc))
    }

    pub fn nil_account(self, addr: &Address) -> Self {
        self.push(
            StateKey::account(addr),
            StateValue::Account(Account::new_nil_keys(addr.clone())),
        )
    }

    pub fn balance(self, addr: &Address, amount: Amount) -> Self {
        self.push(
            StateKey::balance(addr, amount.currency()),
            StateValue::Balance(amount),
        )
    }

    /// Registers a currency whose whole supply sits with `genesis_account`.
    pub fn currency(
        self,
        cid: &CurrencyId,
        genesis_account: &Address,
        supply: u64,
        policy: CurrencyPolicy,
    ) -> Self {
        let design = CurrencyDesign::new(
            cid.clone(),
            genesis_account.clone(),
            policy,
            Big::from(supply),
        );
        self.push(StateKey::design(cid), StateValue::CurrencyDesign(design))
            .balance(genesis_account, Amount::new(cid.clone(), Big::from(supply)))
    }

    /// Marks an existing account as a contract owned by `owner`.
    pub fn contract(self, addr: &Address, owner: &Address) -> Self {
        self.nil_account(addr).push(
            StateKey::contract_account(addr),
            StateValue::ContractAccount(ContractAccountStatus::new(owner.clone())),
        )
    }

    pub fn contract_status(self, addr: &Address, status: ContractAccountStatus) -> Self {
        self.push(
            StateKey::contract_account(addr),
            StateValue::ContractAccount(status),
        )
    }

    pub fn suffrage(self, nodes: &[TestNode]) -> Self {
        let nodes = nodes
            .iter()
            .map(|n| SuffrageNode::new(n.address.clone(), n.public_key, 0))
            .collect();
        self.push(
            StateKey::suffrage(),
            StateValue::Suffrage(SuffrageNodes::new(nodes)),
        )
    }

    pub fn candidates(self, cands: Vec<SuffrageCandidate>) -> Self {
        self.push(
            StateKey::suffrage_candidate(),
            StateValue::SuffrageCandidates(SuffrageCandidates::new(cands)),
        )
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn build(self) -> MemStateAccessor {
        MemStateAccessor::from_states(self.states)
    }
}

/// Fixed fee policy paying `fee` to `receiver`.
pub fn fixed_fee_policy(receiver: &Address, fee: u64) -> CurrencyPolicy {
    CurrencyPolicy::new(
        Big::ZERO,
        Big::ZERO,
        Feeer::Fixed {
            receiver: receiver.clone(),
            amount: Big::from(fee),
        },
    )
}

pub fn nil_fee_policy() -> CurrencyPolicy {
    CurrencyPolicy::new(Big::ZERO, Big::ZERO, Feeer::Nil)
}

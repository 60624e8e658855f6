//! Low-level operations processors emit to write to state.  Nothing is
//! written in place: every change is a [`StateMergeValue`] layered onto the
//! previous version of its key.

use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    account::{Account, ContractAccountStatus},
    currency::{CurrencyDesign, CurrencyPolicy},
    key::StateKey,
    merger::MergerKind,
    suffrage::{SuffrageCandidate, SuffrageNode},
    value::StateValue,
};

/// A delta instruction against one key.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[serde(tag = "op", content = "arg", rename_all = "snake_case")]
pub enum MergeOp {
    /// Replace whatever is there.
    Replace(StateValue),

    /// Increase a balance.
    AddBalance(Amount),

    /// Decrease a balance.
    DeductBalance(Amount),

    /// Replace a currency design wholesale.
    ReplaceDesign(CurrencyDesign),

    /// Replace the policy of an existing design.
    UpdatePolicy(CurrencyPolicy),

    /// Increase the recorded total supply of a design.
    AddSupply(Big),

    /// Write a fresh contract account status.
    ReplaceContractStatus(ContractAccountStatus),

    SetOperators(Vec<Address>),
    SetRecipients(Vec<Address>),
    SetHandlers(Vec<Address>),

    /// Add a node to the suffrage.
    SuffrageJoin(SuffrageNode),

    /// Remove a node from the suffrage.
    SuffrageRemove(Address),

    /// Register a candidate.
    CandidateAdd(SuffrageCandidate),

    /// Drop a candidate.
    CandidateRemove(Address),
}

impl MergeOp {
    pub fn name(&self) -> &'static str {
        match self {
            MergeOp::Replace(_) => "replace",
            MergeOp::AddBalance(_) => "add_balance",
            MergeOp::DeductBalance(_) => "deduct_balance",
            MergeOp::ReplaceDesign(_) => "replace_design",
            MergeOp::UpdatePolicy(_) => "update_policy",
            MergeOp::AddSupply(_) => "add_supply",
            MergeOp::ReplaceContractStatus(_) => "replace_contract_status",
            MergeOp::SetOperators(_) => "set_operators",
            MergeOp::SetRecipients(_) => "set_recipients",
            MergeOp::SetHandlers(_) => "set_handlers",
            MergeOp::SuffrageJoin(_) => "suffrage_join",
            MergeOp::SuffrageRemove(_) => "suffrage_remove",
            MergeOp::CandidateAdd(_) => "candidate_add",
            MergeOp::CandidateRemove(_) => "candidate_remove",
        }
    }
}

/// "Apply this delta to this key", along with the factory for the merger
/// that knows how to fold it.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct StateMergeValue {
    key: StateKey,
    op: MergeOp,
    merger: MergerKind,
}

impl StateMergeValue {
    pub fn new(key: StateKey, op: MergeOp, merger: MergerKind) -> Self {
        Self { key, op, merger }
    }

    pub fn key(&self) -> &StateKey {
        &self.key
    }

    pub fn op(&self) -> &MergeOp {
        &self.op
    }

    pub fn merger(&self) -> MergerKind {
        self.merger
    }

    pub fn into_parts(self) -> (StateKey, MergeOp, MergerKind) {
        (self.key, self.op, self.merger)
    }

    pub fn new_account(account: Account) -> Self {
        Self::new(
            StateKey::account(account.address()),
            MergeOp::Replace(StateValue::Account(account)),
            MergerKind::Replace,
        )
    }

    pub fn add_balance(addr: &Address, amount: Amount) -> Self {
        Self::new(
            StateKey::balance(addr, amount.currency()),
            MergeOp::AddBalance(amount),
            MergerKind::Balance,
        )
    }

    pub fn deduct_balance(addr: &Address, amount: Amount) -> Self {
        Self::new(
            StateKey::balance(addr, amount.currency()),
            MergeOp::DeductBalance(amount),
            MergerKind::Balance,
        )
    }

    pub fn replace_design(design: CurrencyDesign) -> Self {
        Self::new(
            StateKey::design(design.currency()),
            MergeOp::ReplaceDesign(design),
            MergerKind::Design,
        )
    }

    pub fn update_policy(cid: &CurrencyId, policy: CurrencyPolicy) -> Self {
        Self::new(
            StateKey::design(cid),
            MergeOp::UpdatePolicy(policy),
            MergerKind::Design,
        )
    }

    pub fn add_supply(cid: &CurrencyId, big: Big) -> Self {
        Self::new(StateKey::design(cid), MergeOp::AddSupply(big), MergerKind::Design)
    }

    pub fn new_contract_status(addr: &Address, status: ContractAccountStatus) -> Self {
        Self::new(
            StateKey::contract_account(addr),
            MergeOp::ReplaceContractStatus(status),
            MergerKind::ContractStatus,
        )
    }

    pub fn set_operators(addr: &Address, operators: Vec<Address>) -> Self {
        Self::new(
            StateKey::contract_account(addr),
            MergeOp::SetOperators(operators),
            MergerKind::ContractStatus,
        )
    }

    pub fn set_recipients(addr: &Address, recipients: Vec<Address>) -> Self {
        Self::new(
            StateKey::contract_account(addr),
            MergeOp::SetRecipients(recipients),
            MergerKind::ContractStatus,
        )
    }

    pub fn set_handlers(addr: &Address, handlers: Vec<Address>) -> Self {
        Self::new(
            StateKey::contract_account(addr),
            MergeOp::SetHandlers(handlers),
            MergerKind::ContractStatus,
        )
    }

    pub fn suffrage_join(node: SuffrageNode) -> Self {
        Self::new(
            StateKey::suffrage(),
            MergeOp::SuffrageJoin(node),
            MergerKind::Suffrage,
        )
    }

    pub fn suffrage_remove(addr: Address) -> Self {
        Self::new(
            StateKey::suffrage(),
            MergeOp::SuffrageRemove(addr),
            MergerKind::Suffrage,
        )
    }

    pub fn candidate_add(cand: SuffrageCandidate) -> Self {
        Self::new(
            StateKey::suffrage_candidate(),
            MergeOp::CandidateAdd(cand),
            MergerKind::SuffrageCandidates,
        )
    }

    pub fn candidate_remove(addr: Address) -> Self {
        Self::new(
            StateKey::suffrage_candidate(),
            MergeOp::CandidateRemove(addr),
            MergerKind::SuffrageCandidates,
        )
    }
}

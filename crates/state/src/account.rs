//! Account and contract-account records.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;
use serde::{Deserialize, Serialize};

/// An account.  Accounts without keys ("nil keys") exist and can hold
/// balances, but can't sign anything directly.  Receivers auto-created by a
/// transfer and contract accounts look like this.
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
pub struct Account {
    address: Address,
    keys: Option<AccountKeys>,
}

impl Account {
    /// Creates an account controlled by the given keys, at the address they
    /// derive.
    pub fn from_keys(keys: AccountKeys) -> Self {
        Self {
            address: keys.address(),
            keys: Some(keys),
        }
    }

    pub fn new_nil_keys(address: Address) -> Self {
        Self {
            address,
            keys: None,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn keys(&self) -> Option<&AccountKeys> {
        self.keys.as_ref()
    }

    pub fn is_nil_keys(&self) -> bool {
        self.keys.is_none()
    }

    /// Returns a copy controlled by different keys at the same address.
    pub fn with_keys(&self, keys: AccountKeys) -> Self {
        Self {
            address: self.address.clone(),
            keys: Some(keys),
        }
    }
}

/// Authorization metadata attached to a contract account.
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
pub struct ContractAccountStatus {
    owner: Address,
    is_active: bool,
    operators: Vec<Address>,
    recipients: Vec<Address>,
    handlers: Vec<Address>,
}

impl ContractAccountStatus {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            is_active: true,
            operators: Vec::new(),
            recipients: Vec::new(),
            handlers: Vec::new(),
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn operators(&self) -> &[Address] {
        &self.operators
    }

    pub fn recipients(&self) -> &[Address] {
        &self.recipients
    }

    pub fn handlers(&self) -> &[Address] {
        &self.handlers
    }

    pub fn is_owner(&self, addr: &Address) -> bool {
        &self.owner == addr
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub fn set_operators(&mut self, operators: Vec<Address>) {
        self.operators = operators;
    }

    pub fn set_recipients(&mut self, recipients: Vec<Address>) {
        self.recipients = recipients;
    }

    pub fn set_handlers(&mut self, handlers: Vec<Address>) {
        self.handlers = handlers;
    }
}

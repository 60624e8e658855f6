use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    account::{Account, ContractAccountStatus},
    currency::CurrencyDesign,
    suffrage::{SuffrageCandidates, SuffrageNodes},
};

/// Every kind of value the ledger stores.
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
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StateValue {
    Balance(Amount),
    Account(Account),
    CurrencyDesign(CurrencyDesign),
    ContractAccount(ContractAccountStatus),
    Suffrage(SuffrageNodes),
    SuffrageCandidates(SuffrageCandidates),
}

impl StateValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            StateValue::Balance(_) => "balance",
            StateValue::Account(_) => "account",
            StateValue::CurrencyDesign(_) => "currency_design",
            StateValue::ContractAccount(_) => "contract_account",
            StateValue::Suffrage(_) => "suffrage",
            StateValue::SuffrageCandidates(_) => "suffrage_candidates",
        }
    }

    pub fn as_balance(&self) -> Option<&Amount> {
        match self {
            StateValue::Balance(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_account(&self) -> Option<&Account> {
        match self {
            StateValue::Account(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_currency_design(&self) -> Option<&CurrencyDesign> {
        match self {
            StateValue::CurrencyDesign(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_contract_account(&self) -> Option<&ContractAccountStatus> {
        match self {
            StateValue::ContractAccount(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_suffrage(&self) -> Option<&SuffrageNodes> {
        match self {
            StateValue::Suffrage(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_suffrage_candidates(&self) -> Option<&SuffrageCandidates> {
        match self {
            StateValue::SuffrageCandidates(c) => Some(c),
            _ => None,
        }
    }
}

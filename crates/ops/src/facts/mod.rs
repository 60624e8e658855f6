//! Per-operation fact payloads and the stateless checks they share.

use std::collections::BTreeSet;

use ledger_primitives::prelude::*;

use crate::{errors::FactError, kind::OperationKind, MAX_AMOUNTS_PER_ITEM};

pub mod contract;
pub mod currency;
pub mod suffrage;

pub use contract::{CreateContractAccountFact, UpdateContractListFact, WithdrawFact, WithdrawItem};
pub use currency::{
    CreateAccountFact, CreateAccountItem, MintFact, MintItem, RegisterCurrencyFact, TransferFact,
    TransferItem, UpdateCurrencyFact, UpdateKeyFact,
};
pub use suffrage::{
    SuffrageCandidateFact, SuffrageDisjoinFact, SuffrageExpelFact, SuffrageJoinFact,
};

pub(crate) fn check_items<T>(kind: OperationKind, items: &[T], max: usize) -> Result<(), FactError> {
    if items.is_empty() {
        return Err(FactError::NoItems(kind));
    }

    if items.len() > max {
        return Err(FactError::TooManyItems(kind, max, items.len()));
    }

    Ok(())
}

pub(crate) fn check_address(addr: &Address) -> Result<(), FactError> {
    if !addr.is_valid() {
        return Err(FactError::InvalidAddress(addr.clone()));
    }
    Ok(())
}

pub(crate) fn check_currency(cid: &CurrencyId) -> Result<(), FactError> {
    if !cid.is_valid() {
        return Err(FactError::InvalidCurrency(cid.clone()));
    }
    Ok(())
}

/// Checks the amounts of one item: bounded, non-zero, one per currency.
pub(crate) fn check_amounts(amounts: &[Amount]) -> Result<(), FactError> {
    if amounts.is_empty() {
        return Err(FactError::NoAmounts);
    }

    if amounts.len() > MAX_AMOUNTS_PER_ITEM {
        return Err(FactError::TooManyAmounts(MAX_AMOUNTS_PER_ITEM, amounts.len()));
    }

    let mut seen = BTreeSet::new();
    for am in amounts {
        check_currency(am.currency())?;

        if am.big().is_zero() {
            return Err(FactError::ZeroAmount(am.currency().clone()));
        }

        if !seen.insert(am.currency()) {
            return Err(FactError::DuplicatedCurrency(am.currency().clone()));
        }
    }

    Ok(())
}

/// Checks a bounded list of distinct, well-formed addresses.
pub(crate) fn check_address_list(list: &[Address], max: usize) -> Result<(), FactError> {
    if list.len() > max {
        return Err(FactError::ListTooLong(max, list.len()));
    }

    let mut seen = BTreeSet::new();
    for a in list {
        check_address(a)?;
        if !seen.insert(a) {
            return Err(FactError::DuplicatedItem(a.to_string()));
        }
    }

    Ok(())
}

/// Checks that every target is distinct and none is the sender.
pub(crate) fn check_targets<'a>(
    sender: &Address,
    targets: impl IntoIterator<Item = &'a Address>,
) -> Result<(), FactError> {
    let mut seen = BTreeSet::new();
    for t in targets {
        check_address(t)?;

        if t == sender {
            return Err(FactError::SelfTarget(t.clone()));
        }

        if !seen.insert(t) {
            return Err(FactError::DuplicatedItem(t.to_string()));
        }
    }

    Ok(())
}

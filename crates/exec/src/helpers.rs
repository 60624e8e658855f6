//! State lookups and authorization checks shared by the processors.

use std::collections::BTreeSet;

use ledger_ops::Operation;
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::errors::{reject, ExecError, ProcResult, ReasonError};

fn unexpected(key: &StateKey, what: &'static str) -> ExecError {
    ExecError::UnexpectedValue(key.clone(), what)
}

pub fn get_account(acc: &dyn StateAccessor, addr: &Address) -> ProcResult<Option<Account>> {
    let key = StateKey::account(addr);
    match acc.get_state(&key)? {
        None => Ok(None),
        Some(st) => match st.into_value() {
            StateValue::Account(a) => Ok(Some(a)),
            _ => Err(unexpected(&key, "account").into()),
        },
    }
}

pub fn existing_account(acc: &dyn StateAccessor, addr: &Address) -> ProcResult<Account> {
    match get_account(acc, addr)? {
        Some(a) => Ok(a),
        None => reject(ReasonError::AccountNotFound(addr.clone())),
    }
}

pub fn check_not_exists_account(acc: &dyn StateAccessor, addr: &Address) -> ProcResult<()> {
    if acc.exists(&StateKey::account(addr))? {
        return reject(ReasonError::AccountExists(addr.clone()));
    }
    Ok(())
}

pub fn get_balance(
    acc: &dyn StateAccessor,
    addr: &Address,
    cid: &CurrencyId,
) -> ProcResult<Option<Amount>> {
    let key = StateKey::balance(addr, cid);
    match acc.get_state(&key)? {
        None => Ok(None),
        Some(st) => match st.into_value() {
            StateValue::Balance(a) if a.currency() == cid => Ok(Some(a)),
            _ => Err(unexpected(&key, "balance").into()),
        },
    }
}

pub fn get_design(acc: &dyn StateAccessor, cid: &CurrencyId) -> ProcResult<Option<CurrencyDesign>> {
    let key = StateKey::design(cid);
    match acc.get_state(&key)? {
        None => Ok(None),
        Some(st) => match st.into_value() {
            StateValue::CurrencyDesign(d) => Ok(Some(d)),
            _ => Err(unexpected(&key, "currency design").into()),
        },
    }
}

pub fn existing_design(acc: &dyn StateAccessor, cid: &CurrencyId) -> ProcResult<CurrencyDesign> {
    match get_design(acc, cid)? {
        Some(d) => Ok(d),
        None => reject(ReasonError::CurrencyNotFound(cid.clone())),
    }
}

pub fn get_contract_status(
    acc: &dyn StateAccessor,
    addr: &Address,
) -> ProcResult<Option<ContractAccountStatus>> {
    let key = StateKey::contract_account(addr);
    match acc.get_state(&key)? {
        None => Ok(None),
        Some(st) => match st.into_value() {
            StateValue::ContractAccount(s) => Ok(Some(s)),
            _ => Err(unexpected(&key, "contract account status").into()),
        },
    }
}

pub fn check_not_contract_account(acc: &dyn StateAccessor, addr: &Address) -> ProcResult<()> {
    if acc.exists(&StateKey::contract_account(addr))? {
        return reject(ReasonError::ContractAccount(addr.clone()));
    }
    Ok(())
}

pub fn existing_contract(
    acc: &dyn StateAccessor,
    addr: &Address,
) -> ProcResult<ContractAccountStatus> {
    match get_contract_status(acc, addr)? {
        Some(s) => Ok(s),
        None => reject(ReasonError::NotContractAccount(addr.clone())),
    }
}

/// Checks that the signers of `op` carry enough weight among the keys
/// recorded for `addr`.
pub fn check_sign_by_state(
    acc: &dyn StateAccessor,
    addr: &Address,
    op: &Operation,
) -> ProcResult<Account> {
    let account = existing_account(acc, addr)?;
    let Some(keys) = account.keys() else {
        return reject(ReasonError::NilKeys(addr.clone()));
    };

    if !keys.is_satisfied_by(op.signers()) {
        return reject(ReasonError::NotEnoughSigns(addr.clone()));
    }

    Ok(account)
}

pub fn get_suffrage(acc: &dyn StateAccessor) -> ProcResult<SuffrageNodes> {
    let key = StateKey::suffrage();
    match acc.get_state(&key)? {
        None => Ok(SuffrageNodes::default()),
        Some(st) => match st.into_value() {
            StateValue::Suffrage(n) => Ok(n),
            _ => Err(unexpected(&key, "suffrage").into()),
        },
    }
}

pub fn get_candidates(acc: &dyn StateAccessor) -> ProcResult<SuffrageCandidates> {
    let key = StateKey::suffrage_candidate();
    match acc.get_state(&key)? {
        None => Ok(SuffrageCandidates::default()),
        Some(st) => match st.into_value() {
            StateValue::SuffrageCandidates(c) => Ok(c),
            _ => Err(unexpected(&key, "suffrage candidates").into()),
        },
    }
}

/// Counts the distinct suffrage members, other than `excluded`, that signed
/// `op` with their recorded key.
fn count_node_signs(nodes: &SuffrageNodes, op: &Operation, excluded: Option<&Address>) -> usize {
    let mut signed = BTreeSet::new();
    for s in op.signs() {
        let Some(node_addr) = &s.node else {
            continue;
        };

        if Some(node_addr) == excluded {
            continue;
        }

        if let Some(node) = nodes.get(node_addr) {
            if node.public_key() == &s.signer {
                signed.insert(node_addr);
            }
        }
    }
    signed.len()
}

/// Checks that enough of the current suffrage signed a node operation.
pub fn check_node_signs(
    acc: &dyn StateAccessor,
    op: &Operation,
    params: &ExecParams,
) -> ProcResult<SuffrageNodes> {
    let nodes = get_suffrage(acc)?;
    let need = params.required_node_signs(nodes.len()).max(1);
    let got = count_node_signs(&nodes, op, None);
    if got < need {
        return reject(ReasonError::InvalidNodeSigns { got, need });
    }
    Ok(nodes)
}

/// Like [`check_node_signs`], but the threshold is taken over the suffrage
/// without `excluded`, whose own sign doesn't count.
pub fn check_node_signs_excluding(
    acc: &dyn StateAccessor,
    op: &Operation,
    params: &ExecParams,
    excluded: &Address,
) -> ProcResult<SuffrageNodes> {
    let nodes = get_suffrage(acc)?;
    let others = nodes.len() - usize::from(nodes.exists(excluded));
    let need = params.required_node_signs(others).max(1);
    let got = count_node_signs(&nodes, op, Some(excluded));
    if got < need {
        return reject(ReasonError::InvalidNodeSigns { got, need });
    }
    Ok(nodes)
}

/// Finds the sign made with `pk`, if any.
pub fn signed_with(op: &Operation, pk: &PublicKey) -> bool {
    op.signers().any(|s| s == pk)
}

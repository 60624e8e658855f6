//! Accumulators that fold every delta a height produced for one key into the
//! key's next value.
//!
//! Mergers never reject user input: processors have already checked
//! everything that could make a merge meaningless.  Every merge error is a
//! bug in whoever produced the deltas, either a mismatch between a merger and
//! the deltas routed to it or deductions the processors should have refused.

use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::*;

use crate::{
    account::ContractAccountStatus,
    currency::CurrencyDesign,
    errors::MergeError,
    key::StateKey,
    state::State,
    state_op::MergeOp,
    suffrage::{SuffrageCandidates, SuffrageNodes},
    value::StateValue,
};

/// Identifies the merger a delta must be folded with.  Acts as the factory
/// for the merger itself.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum MergerKind {
    Replace,
    Balance,
    Design,
    ContractStatus,
    Suffrage,
    SuffrageCandidates,
}

pub trait StateValueMerger: Send {
    fn kind(&self) -> MergerKind;

    /// Folds one delta in.  Deltas arrive in operation processing order.
    fn merge(&mut self, op: &MergeOp) -> Result<(), MergeError>;

    /// Produces the value to write back.
    fn close(self: Box<Self>) -> Result<StateValue, MergeError>;
}

impl MergerKind {
    /// Creates a merger for `key` seeded with the key's previous version.
    pub fn new_merger(
        self,
        key: &StateKey,
        height: Height,
        base: Option<&State>,
    ) -> Result<Box<dyn StateValueMerger>, MergeError> {
        let key = key.clone();
        let base = base.map(|s| s.value());
        let unexpected = |v: &StateValue| MergeError::UnexpectedValue(key.clone(), v.type_name());

        Ok(match self {
            MergerKind::Replace => Box::new(ReplaceMerger {
                key,
                value: base.cloned(),
            }),

            MergerKind::Balance => {
                let base = match base {
                    None => None,
                    Some(v) => Some(v.as_balance().cloned().ok_or_else(|| unexpected(v))?),
                };
                Box::new(BalanceMerger {
                    currency: base.as_ref().map(|a| a.currency().clone()),
                    base: base.map(|a| a.big()).unwrap_or(Big::ZERO),
                    key,
                    add: Big::ZERO,
                    deduct: Big::ZERO,
                })
            }

            MergerKind::Design => {
                let design = match base {
                    None => None,
                    Some(v) => Some(v.as_currency_design().cloned().ok_or_else(|| unexpected(v))?),
                };
                Box::new(DesignMerger {
                    key,
                    design,
                    supply_add: Big::ZERO,
                })
            }

            MergerKind::ContractStatus => {
                let status = match base {
                    None => None,
                    Some(v) => Some(v.as_contract_account().cloned().ok_or_else(|| unexpected(v))?),
                };
                Box::new(ContractStatusMerger { key, status })
            }

            MergerKind::Suffrage => {
                let nodes = match base {
                    None => SuffrageNodes::default(),
                    Some(v) => v.as_suffrage().cloned().ok_or_else(|| unexpected(v))?,
                };
                Box::new(SuffrageMerger { key, nodes })
            }

            MergerKind::SuffrageCandidates => {
                let candidates = match base {
                    None => SuffrageCandidates::default(),
                    Some(v) => v.as_suffrage_candidates().cloned().ok_or_else(|| unexpected(v))?,
                };
                Box::new(CandidatesMerger {
                    key,
                    height,
                    candidates,
                })
            }
        })
    }
}

/// Last write wins.  Used for records at most one operation per height may
/// write, like a new account.
struct ReplaceMerger {
    key: StateKey,
    value: Option<StateValue>,
}

impl StateValueMerger for ReplaceMerger {
    fn kind(&self) -> MergerKind {
        MergerKind::Replace
    }

    fn merge(&mut self, op: &MergeOp) -> Result<(), MergeError> {
        match op {
            MergeOp::Replace(v) => {
                self.value = Some(v.clone());
                Ok(())
            }
            _ => Err(MergeError::UnexpectedOp(self.key.clone(), self.kind(), op.name())),
        }
    }

    fn close(self: Box<Self>) -> Result<StateValue, MergeError> {
        self.value.ok_or(MergeError::Empty(self.key))
    }
}

/// Sums additions and deductions separately so the result doesn't depend on
/// the order they were applied in.
struct BalanceMerger {
    key: StateKey,
    currency: Option<CurrencyId>,
    base: Big,
    add: Big,
    deduct: Big,
}

impl BalanceMerger {
    fn check_currency(&mut self, amount: &Amount) -> Result<(), MergeError> {
        match &self.currency {
            None => {
                self.currency = Some(amount.currency().clone());
                Ok(())
            }
            Some(c) if c == amount.currency() => Ok(()),
            Some(_) => Err(MergeError::UnexpectedOp(
                self.key.clone(),
                MergerKind::Balance,
                "mismatched currency",
            )),
        }
    }
}

impl StateValueMerger for BalanceMerger {
    fn kind(&self) -> MergerKind {
        MergerKind::Balance
    }

    fn merge(&mut self, op: &MergeOp) -> Result<(), MergeError> {
        match op {
            MergeOp::AddBalance(a) => {
                self.check_currency(a)?;
                self.add = self.add.checked_add(a.big()).unwrap_or_else(|| {
                    error!(key = %self.key, "balance additions overflowed, saturating");
                    Big::MAX
                });
            }
            MergeOp::DeductBalance(a) => {
                self.check_currency(a)?;
                self.deduct = self.deduct.checked_add(a.big()).unwrap_or_else(|| {
                    error!(key = %self.key, "balance deductions overflowed, saturating");
                    Big::MAX
                });
            }
            _ => {
                return Err(MergeError::UnexpectedOp(
                    self.key.clone(),
                    self.kind(),
                    op.name(),
                ))
            }
        }

        Ok(())
    }

    fn close(self: Box<Self>) -> Result<StateValue, MergeError> {
        let currency = self.currency.ok_or_else(|| MergeError::Empty(self.key.clone()))?;

        let credited = self.base.checked_add(self.add).unwrap_or(Big::MAX);
        let Some(big) = credited.checked_sub(self.deduct) else {
            error!(key = %self.key, %credited, deduct = %self.deduct, "balance would go negative");
            return Err(MergeError::Underflow {
                key: self.key,
                have: credited,
                deduct: self.deduct,
            });
        };

        Ok(StateValue::Balance(Amount::new(currency, big)))
    }
}

struct DesignMerger {
    key: StateKey,
    design: Option<CurrencyDesign>,
    supply_add: Big,
}

impl StateValueMerger for DesignMerger {
    fn kind(&self) -> MergerKind {
        MergerKind::Design
    }

    fn merge(&mut self, op: &MergeOp) -> Result<(), MergeError> {
        match op {
            MergeOp::ReplaceDesign(d) => self.design = Some(d.clone()),
            MergeOp::UpdatePolicy(p) => match self.design.as_mut() {
                Some(d) => d.set_policy(p.clone()),
                None => return Err(MergeError::MissingBase(self.key.clone())),
            },
            MergeOp::AddSupply(b) => {
                self.supply_add = self.supply_add.checked_add(*b).unwrap_or_else(|| {
                    error!(key = %self.key, "supply additions overflowed, saturating");
                    Big::MAX
                });
            }
            _ => {
                return Err(MergeError::UnexpectedOp(
                    self.key.clone(),
                    self.kind(),
                    op.name(),
                ))
            }
        }

        Ok(())
    }

    fn close(self: Box<Self>) -> Result<StateValue, MergeError> {
        let mut design = self.design.ok_or_else(|| MergeError::MissingBase(self.key.clone()))?;
        let total = design
            .total_supply()
            .checked_add(self.supply_add)
            .unwrap_or(Big::MAX);
        design.set_total_supply(total);
        Ok(StateValue::CurrencyDesign(design))
    }
}

/// Applies capability list updates field by field, so that updates to
/// different lists of the same contract in one height don't clobber each
/// other.
struct ContractStatusMerger {
    key: StateKey,
    status: Option<ContractAccountStatus>,
}

impl StateValueMerger for ContractStatusMerger {
    fn kind(&self) -> MergerKind {
        MergerKind::ContractStatus
    }

    fn merge(&mut self, op: &MergeOp) -> Result<(), MergeError> {
        if let MergeOp::ReplaceContractStatus(s) = op {
            self.status = Some(s.clone());
            return Ok(());
        }

        let Some(status) = self.status.as_mut() else {
            return Err(MergeError::MissingBase(self.key.clone()));
        };

        match op {
            MergeOp::SetOperators(v) => status.set_operators(v.clone()),
            MergeOp::SetRecipients(v) => status.set_recipients(v.clone()),
            MergeOp::SetHandlers(v) => status.set_handlers(v.clone()),
            _ => {
                return Err(MergeError::UnexpectedOp(
                    self.key.clone(),
                    MergerKind::ContractStatus,
                    op.name(),
                ))
            }
        }

        Ok(())
    }

    fn close(self: Box<Self>) -> Result<StateValue, MergeError> {
        self.status
            .map(StateValue::ContractAccount)
            .ok_or(MergeError::Empty(self.key))
    }
}

/// Folds joins and removals against the node list in the order received.
struct SuffrageMerger {
    key: StateKey,
    nodes: SuffrageNodes,
}

impl StateValueMerger for SuffrageMerger {
    fn kind(&self) -> MergerKind {
        MergerKind::Suffrage
    }

    fn merge(&mut self, op: &MergeOp) -> Result<(), MergeError> {
        match op {
            MergeOp::SuffrageJoin(node) => self.nodes.insert(node.clone()),
            MergeOp::SuffrageRemove(addr) => {
                if !self.nodes.remove(addr) {
                    warn!(%addr, "removing node that is not in the suffrage");
                }
            }
            _ => {
                return Err(MergeError::UnexpectedOp(
                    self.key.clone(),
                    self.kind(),
                    op.name(),
                ))
            }
        }

        Ok(())
    }

    fn close(self: Box<Self>) -> Result<StateValue, MergeError> {
        Ok(StateValue::Suffrage(self.nodes))
    }
}

struct CandidatesMerger {
    key: StateKey,
    height: Height,
    candidates: SuffrageCandidates,
}

impl StateValueMerger for CandidatesMerger {
    fn kind(&self) -> MergerKind {
        MergerKind::SuffrageCandidates
    }

    fn merge(&mut self, op: &MergeOp) -> Result<(), MergeError> {
        match op {
            MergeOp::CandidateAdd(c) => self.candidates.insert(c.clone()),
            MergeOp::CandidateRemove(addr) => {
                self.candidates.remove(addr);
            }
            _ => {
                return Err(MergeError::UnexpectedOp(
                    self.key.clone(),
                    self.kind(),
                    op.name(),
                ))
            }
        }

        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<StateValue, MergeError> {
        self.candidates.prune_expired(self.height);
        Ok(StateValue::SuffrageCandidates(self.candidates))
    }
}

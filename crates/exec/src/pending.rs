//! Balance changes of the operations already processed in a block, layered
//! over the snapshot so later operations are checked against what is left.

use std::collections::BTreeMap;

use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::errors::ExecError;

#[derive(Clone, Debug, Eq, PartialEq)]
struct Pending {
    currency: CurrencyId,
    add: Big,
    deduct: Big,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PendingBalances {
    balances: BTreeMap<StateKey, Pending>,
}

impl PendingBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn clear(&mut self) {
        self.balances.clear();
    }

    /// Folds in the balance changes of an accepted operation.  Other merge
    /// values are ignored.
    pub fn record(&mut self, values: &[StateMergeValue]) -> Result<(), ExecError> {
        for v in values {
            let (amount, is_add) = match v.op() {
                MergeOp::AddBalance(a) => (a, true),
                MergeOp::DeductBalance(a) => (a, false),
                _ => continue,
            };

            let p = self
                .balances
                .entry(v.key().clone())
                .or_insert_with(|| Pending {
                    currency: amount.currency().clone(),
                    add: Big::ZERO,
                    deduct: Big::ZERO,
                });
            let slot = if is_add { &mut p.add } else { &mut p.deduct };
            *slot = slot
                .checked_add(amount.big())
                .ok_or_else(|| ExecError::BalanceOverflow(v.key().clone()))?;
        }

        Ok(())
    }

    fn overlay(
        &self,
        key: &StateKey,
        base: Option<State>,
        height: Height,
    ) -> Result<Option<State>, AccessError> {
        let Some(p) = self.balances.get(key) else {
            return Ok(base);
        };

        let (have, at, ops) = match base {
            None => (Big::ZERO, height, Vec::new()),
            Some(st) => match st.value().as_balance() {
                Some(a) => (a.big(), st.height(), st.operations().to_vec()),
                None => return Err(AccessError::Corrupt(key.clone())),
            },
        };

        // Every recorded deduct passed a sufficiency check against this view.
        let big = have
            .checked_add(p.add)
            .and_then(|b| b.checked_sub(p.deduct))
            .ok_or_else(|| AccessError::Corrupt(key.clone()))?;

        let value = StateValue::Balance(Amount::new(p.currency.clone(), big));
        Ok(Some(State::new(key.clone(), value, at, ops)))
    }
}

/// The snapshot with the block's pending balance changes applied.
pub struct PendingView<'a> {
    base: &'a dyn StateAccessor,
    pending: &'a PendingBalances,
    height: Height,
}

impl<'a> PendingView<'a> {
    pub fn new(base: &'a dyn StateAccessor, pending: &'a PendingBalances, height: Height) -> Self {
        Self {
            base,
            pending,
            height,
        }
    }
}

impl StateAccessor for PendingView<'_> {
    fn get_state(&self, key: &StateKey) -> Result<Option<State>, AccessError> {
        let base = self.base.get_state(key)?;
        self.pending.overlay(key, base, self.height)
    }
}

//! Collects the merge values of every accepted operation in a block and
//! resolves them into the next version of each touched key.

use std::collections::{btree_map::Entry, BTreeMap};

use ledger_primitives::prelude::*;
use tracing::*;

use crate::{
    accessor::StateAccessor,
    errors::MergeError,
    key::StateKey,
    merger::StateValueMerger,
    state::State,
    state_op::StateMergeValue,
};

struct PendingKey {
    merger: Box<dyn StateValueMerger>,
    operations: Vec<Buf32>,
}

/// Merge state for one block height.
pub struct StateMergeSession<'a, A: StateAccessor + ?Sized> {
    accessor: &'a A,
    height: Height,
    pending: BTreeMap<StateKey, PendingKey>,
}

impl<'a, A: StateAccessor + ?Sized> StateMergeSession<'a, A> {
    pub fn new(accessor: &'a A, height: Height) -> Self {
        Self {
            accessor,
            height,
            pending: BTreeMap::new(),
        }
    }

    pub fn height(&self) -> Height {
        self.height
    }

    /// Number of keys touched so far.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Folds the values one accepted operation produced.  `fact_hash` is
    /// recorded against every key it touched.
    pub fn merge(
        &mut self,
        fact_hash: Buf32,
        values: impl IntoIterator<Item = StateMergeValue>,
    ) -> Result<(), MergeError> {
        for v in values {
            let (key, op, kind) = v.into_parts();

            let entry = match self.pending.entry(key.clone()) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    let base = self.accessor.get_state(e.key())?;
                    let merger = kind.new_merger(e.key(), self.height, base.as_ref())?;
                    trace!(%key, ?kind, "opened merger");
                    e.insert(PendingKey {
                        merger,
                        operations: Vec::new(),
                    })
                }
            };

            if entry.merger.kind() != kind {
                return Err(MergeError::MixedMergers(key, entry.merger.kind(), kind));
            }

            entry.merger.merge(&op)?;
            if entry.operations.last() != Some(&fact_hash) {
                entry.operations.push(fact_hash);
            }
        }

        Ok(())
    }

    /// Closes every merger and returns the new records, ordered by key.
    pub fn finish(self) -> Result<Vec<State>, MergeError> {
        let height = self.height;
        let mut out = Vec::with_capacity(self.pending.len());
        for (key, pk) in self.pending {
            let value = pk.merger.close()?;
            out.push(State::new(key, value, height, pk.operations));
        }

        debug!(%height, states = out.len(), "closed merge session");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{accessor::MemStateAccessor, state_op::MergeOp, value::StateValue};

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn amt(v: u64) -> Amount {
        Amount::new(CurrencyId::new("CUR").unwrap(), Big::from(v))
    }

    #[test]
    fn test_session_merges_across_operations() {
        let a = addr("aaa000mca");
        let b = addr("bbb000mca");
        let key_a = StateKey::balance(&a, amt(0).currency());

        let acc = MemStateAccessor::from_states([State::new(
            key_a.clone(),
            StateValue::Balance(amt(100)),
            1,
            vec![],
        )]);

        let f1 = Buf32::from([1; 32]);
        let f2 = Buf32::from([2; 32]);

        let mut sess = StateMergeSession::new(&acc, 7);
        sess.merge(
            f1,
            [
                StateMergeValue::deduct_balance(&a, amt(30)),
                StateMergeValue::add_balance(&b, amt(30)),
            ],
        )
        .unwrap();
        sess.merge(f2, [StateMergeValue::deduct_balance(&a, amt(5))])
            .unwrap();
        assert_eq!(sess.len(), 2);

        let states = sess.finish().unwrap();
        assert_eq!(states.len(), 2);
        assert!(states.windows(2).all(|w| w[0].key() < w[1].key()));

        let sa = states.iter().find(|s| s.key() == &key_a).unwrap();
        assert_eq!(sa.value().as_balance().unwrap().big(), Big::from(65));
        assert_eq!(sa.height(), 7);
        assert_eq!(sa.operations(), &[f1, f2]);

        let sb = states.iter().find(|s| s.key() != &key_a).unwrap();
        assert_eq!(sb.operations(), &[f1]);
    }

    #[test]
    fn test_session_rejects_mixed_mergers() {
        let a = addr("aaa000mca");
        let acc = MemStateAccessor::new();
        let key = StateKey::balance(&a, amt(0).currency());

        let mut sess = StateMergeSession::new(&acc, 1);
        sess.merge(Buf32::zero(), [StateMergeValue::add_balance(&a, amt(1))])
            .unwrap();

        let bad = StateMergeValue::new(
            key,
            MergeOp::Replace(StateValue::Balance(amt(3))),
            crate::merger::MergerKind::Replace,
        );
        assert!(matches!(
            sess.merge(Buf32::zero(), [bad]),
            Err(MergeError::MixedMergers(..))
        ));
    }

    #[test]
    fn test_session_propagates_access_errors() {
        use crate::errors::AccessError;

        let acc = |_: &StateKey| -> Result<Option<State>, AccessError> {
            Err(AccessError::Backend("gone".to_owned()))
        };

        let mut sess = StateMergeSession::new(&acc, 1);
        let res = sess.merge(
            Buf32::zero(),
            [StateMergeValue::add_balance(&addr("aaa000mca"), amt(1))],
        );
        assert!(matches!(res, Err(MergeError::Access(_))));
    }
}

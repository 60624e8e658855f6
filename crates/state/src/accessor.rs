//! Read access to the point-in-time snapshot the host agreed on.

use std::collections::BTreeMap;

use crate::{errors::AccessError, key::StateKey, state::State};

/// Point-in-time read against the snapshot for the current height.
///
/// Implementations must return the same answer for the same key for the whole
/// block.  Processors may query from worker threads, hence `Sync`.
pub trait StateAccessor: Sync {
    fn get_state(&self, key: &StateKey) -> Result<Option<State>, AccessError>;

    fn exists(&self, key: &StateKey) -> Result<bool, AccessError> {
        Ok(self.get_state(key)?.is_some())
    }
}

/// Any suitable closure is an accessor, which is the shape most hosts already
/// have on hand.
impl<F> StateAccessor for F
where
    F: Fn(&StateKey) -> Result<Option<State>, AccessError> + Sync,
{
    fn get_state(&self, key: &StateKey) -> Result<Option<State>, AccessError> {
        self(key)
    }
}

/// In-memory snapshot, used by the replay tool and in tests.
#[derive(Clone, Debug, Default)]
pub struct MemStateAccessor {
    states: BTreeMap<StateKey, State>,
}

impl MemStateAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_states(states: impl IntoIterator<Item = State>) -> Self {
        let mut acc = Self::new();
        acc.apply(states);
        acc
    }

    pub fn insert(&mut self, state: State) {
        self.states.insert(state.key().clone(), state);
    }

    /// Layers new versions on top of the snapshot.
    pub fn apply(&mut self, states: impl IntoIterator<Item = State>) {
        for s in states {
            self.insert(s);
        }
    }

    pub fn get(&self, key: &StateKey) -> Option<&State> {
        self.states.get(key)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> impl Iterator<Item = &State> + '_ {
        self.states.values()
    }
}

impl StateAccessor for MemStateAccessor {
    fn get_state(&self, key: &StateKey) -> Result<Option<State>, AccessError> {
        Ok(self.states.get(key).cloned())
    }
}

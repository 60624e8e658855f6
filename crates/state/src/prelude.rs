pub use crate::{
    accessor::{MemStateAccessor, StateAccessor},
    account::{Account, ContractAccountStatus},
    currency::{CurrencyDesign, CurrencyPolicy, Feeer},
    errors::{AccessError, MergeError},
    key::{StateKey, StateKeyKind},
    merge_session::StateMergeSession,
    merger::{MergerKind, StateValueMerger},
    state::State,
    state_op::{MergeOp, StateMergeValue},
    suffrage::{SuffrageCandidate, SuffrageCandidates, SuffrageNode, SuffrageNodes},
    value::StateValue,
};

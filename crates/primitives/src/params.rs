//! Consensus parameters the execution core needs to agree on with every other
//! node.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Block height.
pub type Height = u64;

/// Default percentage of the suffrage that must sign a node operation.
pub const DEFAULT_SUFFRAGE_THRESHOLD: u8 = 67;

/// Default number of heights a suffrage candidate stays eligible to join.
pub const DEFAULT_CANDIDATE_LIFESPAN: u64 = 333;

/// Network identifier mixed into every signed message so signatures can't be
/// replayed across networks.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(String);

impl NetworkId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parameters that don't change for the lifetime of the network (unless
/// there's some weird hard fork).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecParams {
    pub network_id: NetworkId,

    /// Percentage (1..=100) of current suffrage nodes that must sign node
    /// operations.
    #[serde(default = "default_suffrage_threshold")]
    pub suffrage_threshold: u8,

    /// Number of heights a registered candidate may wait before joining.
    #[serde(default = "default_candidate_lifespan")]
    pub candidate_lifespan: u64,
}

fn default_suffrage_threshold() -> u8 {
    DEFAULT_SUFFRAGE_THRESHOLD
}

fn default_candidate_lifespan() -> u64 {
    DEFAULT_CANDIDATE_LIFESPAN
}

impl ExecParams {
    pub fn new(network_id: NetworkId) -> Self {
        Self {
            network_id,
            suffrage_threshold: DEFAULT_SUFFRAGE_THRESHOLD,
            candidate_lifespan: DEFAULT_CANDIDATE_LIFESPAN,
        }
    }

    /// Number of distinct node signatures needed out of a suffrage of `n`
    /// nodes.  Rounds up, and a non-empty suffrage always needs at least one.
    pub fn required_node_signs(&self, n: usize) -> usize {
        let t = self.suffrage_threshold.clamp(1, 100) as usize;
        (n * t).div_ceil(100)
    }
}

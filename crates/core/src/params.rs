use serde::Deserialize;
use serde::Serialize;

/// The tunable bundle injected into a node: a handful of protocol constants
/// the harness owns and hands to every node, rather than each node
/// hardcoding them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Params {
    /// Ticks of silence after which a member is suspected.
    #[serde(default = "default_tfail")]
    pub tfail: i64,
    /// Ticks of silence after which a suspected member is evicted. Must be
    /// `>= tfail`.
    #[serde(default = "default_tremove")]
    pub tremove: i64,
    /// Upper bound on how many peers a single gossip round fans out to.
    #[serde(default = "default_gossip_fanout")]
    pub gossip_fanout: usize,
    /// Modulus applied to the address hash when placing a node on the ring.
    #[serde(default = "default_ring_size")]
    pub ring_size: u64,
    /// Ticks after which a non-finished transaction self-cancels.
    #[serde(default = "default_timeout_ticks")]
    pub timeout_ticks: i64,
    /// Replicas held per key. Fixed at 3 in practice; kept as a field so
    /// call sites read `par.replica_count` instead of a bare `3`.
    #[serde(default = "default_replica_count")]
    pub replica_count: usize,
}

const fn default_tfail() -> i64 {
    5
}

const fn default_tremove() -> i64 {
    10
}

const fn default_gossip_fanout() -> usize {
    4
}

const fn default_ring_size() -> u64 {
    1 << 32
}

const fn default_timeout_ticks() -> i64 {
    15
}

const fn default_replica_count() -> usize {
    3
}

impl Default for Params {
    fn default() -> Self {
        Self {
            tfail: default_tfail(),
            tremove: default_tremove(),
            gossip_fanout: default_gossip_fanout(),
            ring_size: default_ring_size(),
            timeout_ticks: default_timeout_ticks(),
            replica_count: default_replica_count(),
        }
    }
}

use kvquorum_core::Address;
use kvquorum_membership::Ring;
use kvquorum_metrics::GlobalMetrics;
use kvquorum_store::Store;

use crate::codec::KvMessage;
use crate::codec::ReplicaRole;

/// Re-replicates every locally-held key whenever the ring's membership
/// changes, restoring the "two successors hold my replicas, I hold my two
/// predecessors' replicas" invariant.
pub struct Stabilizer;

impl Stabilizer {
    /// True when `old_hashes` (the ring's hash list as of the previous
    /// tick) differs from `ring`'s current hash list — the trigger
    /// condition for re-running stabilization.
    pub fn ring_changed(old_hashes: &[u64], ring: &Ring) -> bool {
        old_hashes != ring.hashes()
    }

    /// Builds the untracked DELETE (to stale predecessors) and
    /// STABILIZATION-CREATE (to the new replica set) traffic for every key
    /// this node currently stores. `trans_id` on every emitted message is
    /// `-1`: stabilization messages are never tracked by a `Coordinator`.
    pub fn run(
        store: &Store,
        ring: &Ring,
        ring_size: u64,
        replica_count: usize,
        self_address: Address,
        stale_predecessors: &[Address],
    ) -> Vec<(Address, KvMessage)> {
        let mut outbound = Vec::new();
        for (key, value) in store.iter() {
            for predecessor in stale_predecessors {
                outbound.push((
                    *predecessor,
                    KvMessage::StabilizationDelete {
                        trans_id: -1,
                        from: self_address,
                        key: key.to_string(),
                    },
                ));
            }

            let replicas = ring.find_nodes(key, ring_size, replica_count);
            for (i, replica) in replicas.iter().enumerate() {
                outbound.push((
                    *replica,
                    KvMessage::StabilizationCreate {
                        trans_id: -1,
                        from: self_address,
                        key: key.to_string(),
                        value: value.to_string(),
                        replica: ReplicaRole::from_index(i),
                    },
                ));
            }
        }

        if !outbound.is_empty() {
            GlobalMetrics::get()
                .stabilization
                .re_replications
                .add(outbound.len() as u64, &[]);
        }
        outbound
    }

    /// Recomputes `hasMyReplicas` (this node's two successors, who mirror
    /// its primary data) and `haveReplicasOf` (this node's two
    /// predecessors, whose data this node mirrors) from the current ring.
    pub fn recompute_replica_sets(ring: &Ring, self_address: Address) -> (Vec<Address>, Vec<Address>) {
        let has_my_replicas = ring.successors(self_address, 2);
        let have_replicas_of = ring.predecessors(self_address, 2);
        (has_my_replicas, have_replicas_of)
    }
}

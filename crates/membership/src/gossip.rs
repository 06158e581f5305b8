use std::collections::HashSet;

use kvquorum_core::Address;
use kvquorum_core::Logger;
use kvquorum_core::Params;
use kvquorum_metrics::GlobalMetrics;
use kvquorum_metrics::MembershipMetrics;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::codec::MembershipMessage;
use crate::member::MemberEntry;
use crate::member::MemberList;

/// Drives the bootstrap handshake, gossip rounds, and failure eviction for
/// one node's `MemberList`.
///
/// The fanout RNG is seeded explicitly rather than pulled from OS entropy
/// so scenario tests are reproducible; callers that don't care can seed
/// from a real entropy source themselves.
pub struct Gossiper {
    rng: StdRng,
    pub in_group: bool,
}

impl Gossiper {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            in_group: false,
        }
    }

    /// Call once at startup. If `self_address` is the introducer, it is
    /// immediately in the group; otherwise a JOINREQ is emitted and the
    /// node waits for a JOINREP.
    pub fn bootstrap(&mut self, self_address: Address) -> Option<(Address, MembershipMessage)> {
        if self_address == Address::INTRODUCER {
            self.in_group = true;
            return None;
        }
        Some((
            Address::INTRODUCER,
            MembershipMessage::JoinReq {
                sender: self_address,
                heartbeat: 0,
            },
        ))
    }

    /// The introducer's handling of an inbound JOINREQ: add the sender and
    /// reply with the member list as it stood *before* the sender was
    /// added (the reply both grants membership and seeds the sender's
    /// table).
    pub fn on_joinreq(
        &mut self,
        list: &mut MemberList,
        sender: Address,
        heartbeat: i64,
        current_tick: i64,
        logger: &dyn Logger,
    ) -> (Address, MembershipMessage) {
        let seed: Vec<MemberEntry> = list.iter().copied().collect();
        list.add(sender, heartbeat, current_tick, logger);
        GlobalMetrics::get().membership.joins.add(1, &[]);
        (
            sender,
            MembershipMessage::JoinRep {
                sender: list.self_address(),
                entries: seed,
            },
        )
    }

    /// A joining node's handling of its JOINREP: marks it in-group and
    /// seeds its table from the payload.
    pub fn on_joinrep(
        &mut self,
        list: &mut MemberList,
        entries: &[MemberEntry],
        current_tick: i64,
        tfail: i64,
        logger: &dyn Logger,
    ) {
        self.in_group = true;
        for entry in entries {
            list.merge(*entry, current_tick, tfail, logger);
        }
    }

    /// Merges an inbound GOSSIP payload's entries into `list`.
    pub fn on_gossip(
        &mut self,
        list: &mut MemberList,
        entries: &[MemberEntry],
        current_tick: i64,
        tfail: i64,
        logger: &dyn Logger,
    ) {
        for entry in entries {
            list.merge(*entry, current_tick, tfail, logger);
        }
    }

    /// One membership tick: evict, gossip to a random fanout, then bump
    /// self's heartbeat. No-op (besides the bootstrap JOINREQ already
    /// sent) until `in_group` is true.
    pub fn tick(
        &mut self,
        list: &mut MemberList,
        current_tick: i64,
        par: &Params,
        logger: &dyn Logger,
    ) -> Vec<(Address, MembershipMessage)> {
        if !self.in_group {
            return Vec::new();
        }

        let removed = list.evict_stale(current_tick, par.tfail, par.tremove, logger);
        if !removed.is_empty() {
            GlobalMetrics::get().membership.removals.add(
                removed.len() as u64,
                &MembershipMetrics::removal_labels(MembershipMetrics::REASON_TIMEOUT),
            );
        }

        let self_address = list.self_address();
        let candidates: Vec<Address> = list
            .iter()
            .map(|e| e.address)
            .filter(|a| *a != self_address)
            .collect();
        let targets = self.select_fanout(&candidates, par.gossip_fanout);

        let payload: Vec<MemberEntry> = list.alive(current_tick, par.tfail).copied().collect();
        let outbound = targets
            .into_iter()
            .map(|dst| {
                (
                    dst,
                    MembershipMessage::Gossip {
                        sender: self_address,
                        entries: payload.clone(),
                    },
                )
            })
            .collect::<Vec<_>>();

        if !outbound.is_empty() {
            GlobalMetrics::get()
                .membership
                .gossip_rounds
                .add(outbound.len() as u64, &[]);
        }

        list.bump_self_heartbeat(current_tick);
        outbound
    }

    /// Samples up to `fanout` distinct addresses from `candidates`,
    /// uniformly at random with replacement-with-dedup.
    fn select_fanout(&mut self, candidates: &[Address], fanout: usize) -> Vec<Address> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let target = fanout.min(candidates.len());
        let mut chosen = HashSet::with_capacity(target);
        while chosen.len() < target {
            let idx = self.rng.random_range(0..candidates.len());
            chosen.insert(candidates[idx]);
        }
        candidates
            .iter()
            .filter(|a| chosen.contains(a))
            .copied()
            .collect()
    }
}

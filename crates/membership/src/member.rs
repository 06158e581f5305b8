use kvquorum_core::Address;
use kvquorum_core::Logger;

/// A peer's view as held in one node's `MemberList`.
///
/// `heartbeat` is the highest counter this node has observed from the
/// entry's owner; `last_heard` is the *local* tick at which that counter
/// last advanced, used to derive [`MemberStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberEntry {
    pub address: Address,
    pub heartbeat: i64,
    pub last_heard: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Alive,
    Suspect,
    Removed,
}

impl MemberEntry {
    pub fn status(&self, current_tick: i64, tfail: i64, tremove: i64) -> MemberStatus {
        let silence = current_tick - self.last_heard;
        if silence >= tremove {
            MemberStatus::Removed
        } else if silence > tfail {
            MemberStatus::Suspect
        } else {
            MemberStatus::Alive
        }
    }
}

/// The member table a node maintains of its peers, always including self.
///
/// Backed by a `Vec` rather than a map to keep insertion order stable for
/// deterministic tests, even though order carries no correctness meaning
/// on its own — a hash map cannot promise that.
#[derive(Debug, Clone)]
pub struct MemberList {
    self_address: Address,
    entries: Vec<MemberEntry>,
}

impl MemberList {
    pub fn new(self_address: Address, current_tick: i64) -> Self {
        Self {
            self_address,
            entries: vec![MemberEntry {
                address: self_address,
                heartbeat: 0,
                last_heard: current_tick,
            }],
        }
    }

    pub fn self_address(&self) -> Address {
        self.self_address
    }

    pub fn self_entry(&self) -> &MemberEntry {
        self.get(self.self_address)
            .expect("self entry is never removed")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberEntry> {
        self.entries.iter()
    }

    pub fn contains(&self, address: Address) -> bool {
        self.position(address).is_some()
    }

    pub fn get(&self, address: Address) -> Option<&MemberEntry> {
        self.position(address).map(|i| &self.entries[i])
    }

    fn position(&self, address: Address) -> Option<usize> {
        self.entries.iter().position(|e| e.address == address)
    }

    /// Advances self's heartbeat by one and refreshes self's `last_heard`,
    /// per the final step of a membership tick.
    pub fn bump_self_heartbeat(&mut self, current_tick: i64) {
        let idx = self.position(self.self_address).expect("self always present");
        self.entries[idx].heartbeat += 1;
        self.entries[idx].last_heard = current_tick;
    }

    /// Unconditionally adds `address` with the given heartbeat, as happens
    /// on `on_joinreq` for the sender. No-op if already present.
    pub fn add(&mut self, address: Address, heartbeat: i64, current_tick: i64, logger: &dyn Logger) {
        if self.contains(address) {
            return;
        }
        self.entries.push(MemberEntry {
            address,
            heartbeat,
            last_heard: current_tick,
        });
        logger.member_added(address);
    }

    /// Applies the gossip/JOINREP merge rule for one incoming entry:
    /// - absent locally: insert with `(incoming.heartbeat, current_tick)`.
    /// - present and `incoming.heartbeat > local.heartbeat` and the local
    ///   entry is not yet suspected: adopt the heartbeat and refresh
    ///   `last_heard`.
    /// - otherwise: frozen, no change (prevents resurrecting a member
    ///   already past `tfail` via a stale replay).
    pub fn merge(
        &mut self,
        incoming: MemberEntry,
        current_tick: i64,
        tfail: i64,
        logger: &dyn Logger,
    ) {
        match self.position(incoming.address) {
            None => {
                self.entries.push(MemberEntry {
                    address: incoming.address,
                    heartbeat: incoming.heartbeat,
                    last_heard: current_tick,
                });
                logger.member_added(incoming.address);
            }
            Some(idx) => {
                let local = &mut self.entries[idx];
                let not_yet_suspected = current_tick - local.last_heard <= tfail;
                if incoming.heartbeat > local.heartbeat && not_yet_suspected {
                    local.heartbeat = incoming.heartbeat;
                    local.last_heard = current_tick;
                }
            }
        }
    }

    /// Removes every entry whose status is `Removed`, logging each and
    /// returning their addresses so the caller can react (e.g. trigger a
    /// ring rebuild).
    pub fn evict_stale(
        &mut self,
        current_tick: i64,
        tfail: i64,
        tremove: i64,
        logger: &dyn Logger,
    ) -> Vec<Address> {
        let mut removed = Vec::new();
        self.entries.retain(|entry| {
            if entry.address == self.self_address {
                return true;
            }
            if entry.status(current_tick, tfail, tremove) == MemberStatus::Removed {
                removed.push(entry.address);
                false
            } else {
                true
            }
        });
        for addr in &removed {
            logger.member_removed(*addr);
        }
        removed
    }

    /// Entries considered alive as of `current_tick`, i.e. suitable for
    /// inclusion in an outgoing gossip payload.
    pub fn alive(&self, current_tick: i64, tfail: i64) -> impl Iterator<Item = &MemberEntry> {
        self.entries
            .iter()
            .filter(move |e| current_tick - e.last_heard <= tfail)
    }
}

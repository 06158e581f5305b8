use kvquorum_core::Address;
use kvquorum_core::Logger;
use kvquorum_core::OpKind;
use kvquorum_core::Params;
use kvquorum_coordinator::Coordinator;
use kvquorum_coordinator::KvMessage;
use kvquorum_coordinator::ReplicaRole;
use kvquorum_coordinator::Stabilizer;
use kvquorum_coordinator::Transaction;
use kvquorum_membership::Gossiper;
use kvquorum_membership::MemberList;
use kvquorum_membership::MembershipMessage;
use kvquorum_membership::Ring;
use kvquorum_metrics::GlobalMetrics;
use kvquorum_store::Store;

use crate::transport::Transport;

/// Tags which codec a frame on the wire belongs to. `Transport` exposes one
/// untyped byte channel per node, but the membership and KV layers use two
/// independent codecs; this one-byte prefix is the node's own
/// multiplexing, not part of either wire format.
const CHANNEL_MEMBERSHIP: u8 = 0;
const CHANNEL_KV: u8 = 1;

/// One process's entire state: membership view, ring, store, and the
/// transaction table for operations this node coordinates.
///
/// Per-node state is exclusively owned by `tick()`; nothing here is ever
/// mutated from outside a `tick()` or client-call invocation, so there is
/// no shared-memory concurrency to reason about.
pub struct Node {
    address: Address,
    params: Params,
    members: MemberList,
    gossiper: Gossiper,
    ring: Ring,
    prev_ring_hashes: Vec<u64>,
    store: Store,
    coordinator: Coordinator,
    has_my_replicas: Vec<Address>,
    have_replicas_of: Vec<Address>,
}

impl Node {
    pub fn new(address: Address, params: Params, rng_seed: u64, current_tick: i64) -> Self {
        Self {
            address,
            params,
            members: MemberList::new(address, current_tick),
            gossiper: Gossiper::new(rng_seed),
            ring: Ring::default(),
            prev_ring_hashes: Vec::new(),
            store: Store::new(),
            coordinator: Coordinator::new(),
            has_my_replicas: Vec::new(),
            have_replicas_of: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn members(&self) -> &MemberList {
        &self.members
    }

    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn has_my_replicas(&self) -> &[Address] {
        &self.has_my_replicas
    }

    pub fn have_replicas_of(&self) -> &[Address] {
        &self.have_replicas_of
    }

    pub fn transaction(&self, id: u32) -> Option<&Transaction> {
        self.coordinator.get(id)
    }

    /// Sends the bootstrap JOINREQ if this node is not the introducer.
    /// Call once before the first `tick()`.
    pub fn bootstrap(&mut self, transport: &mut dyn Transport) {
        if let Some((dst, msg)) = self.gossiper.bootstrap(self.address) {
            self.send_membership(dst, msg, transport);
        }
    }

    pub fn client_create(
        &mut self,
        key: &str,
        value: &str,
        current_tick: i64,
        transport: &mut dyn Transport,
        logger: &dyn Logger,
    ) -> u32 {
        self.client_op(OpKind::Create, key, value, current_tick, transport, logger)
    }

    pub fn client_read(
        &mut self,
        key: &str,
        current_tick: i64,
        transport: &mut dyn Transport,
        logger: &dyn Logger,
    ) -> u32 {
        self.client_op(OpKind::Read, key, "", current_tick, transport, logger)
    }

    pub fn client_update(
        &mut self,
        key: &str,
        value: &str,
        current_tick: i64,
        transport: &mut dyn Transport,
        logger: &dyn Logger,
    ) -> u32 {
        self.client_op(OpKind::Update, key, value, current_tick, transport, logger)
    }

    pub fn client_delete(
        &mut self,
        key: &str,
        current_tick: i64,
        transport: &mut dyn Transport,
        logger: &dyn Logger,
    ) -> u32 {
        self.client_op(OpKind::Delete, key, "", current_tick, transport, logger)
    }

    fn client_op(
        &mut self,
        kind: OpKind,
        key: &str,
        value: &str,
        current_tick: i64,
        transport: &mut dyn Transport,
        logger: &dyn Logger,
    ) -> u32 {
        let id = self.coordinator.begin(kind, key, value, current_tick);
        let replicas = self
            .ring
            .find_nodes(key, self.params.ring_size, self.params.replica_count);
        if replicas.len() < self.params.replica_count {
            self.coordinator.reject(id, current_tick, logger);
            return id;
        }

        for (i, replica) in replicas.iter().enumerate() {
            let role = ReplicaRole::from_index(i);
            let msg = match kind {
                OpKind::Create => KvMessage::Create {
                    trans_id: id as i64,
                    from: self.address,
                    key: key.to_string(),
                    value: value.to_string(),
                    replica: role,
                },
                OpKind::Update => KvMessage::Update {
                    trans_id: id as i64,
                    from: self.address,
                    key: key.to_string(),
                    value: value.to_string(),
                    replica: role,
                },
                OpKind::Read => KvMessage::Read {
                    trans_id: id as i64,
                    from: self.address,
                    key: key.to_string(),
                },
                OpKind::Delete => KvMessage::Delete {
                    trans_id: id as i64,
                    from: self.address,
                    key: key.to_string(),
                },
            };
            self.send_kv(*replica, msg, transport);
        }
        id
    }

    /// Runs one tick: receive-and-dispatch, membership maintenance, KV
    /// maintenance (timeouts, then stabilization if the ring changed).
    pub fn tick(&mut self, current_tick: i64, transport: &mut dyn Transport, logger: &dyn Logger) {
        let inbound = transport.recv(self.address);
        for frame in inbound {
            self.dispatch(&frame, current_tick, transport, logger);
        }

        let outbound = self
            .gossiper
            .tick(&mut self.members, current_tick, &self.params, logger);
        for (dst, msg) in outbound {
            self.send_membership(dst, msg, transport);
        }

        self.coordinator
            .sweep_timeouts(current_tick, self.params.timeout_ticks, logger);

        let new_ring = Ring::build(
            self.members.iter().map(|e| e.address),
            self.params.ring_size,
        );
        GlobalMetrics::get()
            .membership
            .ring_size
            .record(new_ring.len() as u64, &[]);
        if Stabilizer::ring_changed(&self.prev_ring_hashes, &new_ring) {
            let outbound = Stabilizer::run(
                &self.store,
                &new_ring,
                self.params.ring_size,
                self.params.replica_count,
                self.address,
                &self.have_replicas_of,
            );
            for (dst, msg) in outbound {
                self.send_kv(dst, msg, transport);
            }
            let (has_my_replicas, have_replicas_of) =
                Stabilizer::recompute_replica_sets(&new_ring, self.address);
            self.has_my_replicas = has_my_replicas;
            self.have_replicas_of = have_replicas_of;
        }
        self.prev_ring_hashes = new_ring.hashes();
        self.ring = new_ring;
    }

    fn dispatch(
        &mut self,
        frame: &[u8],
        current_tick: i64,
        transport: &mut dyn Transport,
        logger: &dyn Logger,
    ) {
        let Some((&channel, payload)) = frame.split_first() else {
            return;
        };
        match channel {
            CHANNEL_MEMBERSHIP => self.dispatch_membership(payload, current_tick, transport, logger),
            CHANNEL_KV => self.dispatch_kv(payload, current_tick, transport, logger),
            _ => {}
        }
    }

    fn dispatch_membership(
        &mut self,
        payload: &[u8],
        current_tick: i64,
        transport: &mut dyn Transport,
        logger: &dyn Logger,
    ) {
        let Ok(msg) = MembershipMessage::decode(payload) else {
            return;
        };
        match msg {
            MembershipMessage::JoinReq { sender, heartbeat } => {
                let (dst, reply) = self.gossiper.on_joinreq(
                    &mut self.members,
                    sender,
                    heartbeat,
                    current_tick,
                    logger,
                );
                self.send_membership(dst, reply, transport);
            }
            MembershipMessage::JoinRep { entries, .. } => {
                self.gossiper.on_joinrep(
                    &mut self.members,
                    &entries,
                    current_tick,
                    self.params.tfail,
                    logger,
                );
            }
            MembershipMessage::Gossip { entries, .. } => {
                self.gossiper.on_gossip(
                    &mut self.members,
                    &entries,
                    current_tick,
                    self.params.tfail,
                    logger,
                );
            }
        }
    }

    fn dispatch_kv(
        &mut self,
        payload: &[u8],
        current_tick: i64,
        transport: &mut dyn Transport,
        logger: &dyn Logger,
    ) {
        let Ok(msg) = KvMessage::decode(payload) else {
            return;
        };
        match msg {
            KvMessage::Create {
                trans_id,
                from,
                key,
                value,
                ..
            } => {
                let result = self.store.create(&key, &value, logger);
                self.reply(from, trans_id, result.success, transport);
            }
            KvMessage::Update {
                trans_id,
                from,
                key,
                value,
                ..
            } => {
                let result = self.store.update(&key, &value, logger);
                self.reply(from, trans_id, result.success, transport);
            }
            KvMessage::Delete { trans_id, from, key } => {
                let result = self.store.delete(&key, logger);
                self.reply(from, trans_id, result.success, transport);
            }
            KvMessage::Read { trans_id, from, key } => {
                let value = self.store.read(&key, logger);
                self.send_readreply(from, trans_id, value, transport);
            }
            KvMessage::StabilizationCreate { key, value, .. } => {
                self.store.stabilization_create(&key, &value);
            }
            KvMessage::StabilizationDelete { key, .. } => {
                self.store.untracked_delete(&key);
            }
            KvMessage::Reply {
                trans_id, success, ..
            } => {
                if let Ok(id) = u32::try_from(trans_id) {
                    self.coordinator.on_reply(id, success, current_tick, logger);
                }
            }
            KvMessage::ReadReply {
                trans_id, value, ..
            } => {
                if let Ok(id) = u32::try_from(trans_id) {
                    self.coordinator.on_readreply(id, &value, current_tick, logger);
                }
            }
        }
    }

    fn reply(&self, dst: Address, trans_id: i64, success: bool, transport: &mut dyn Transport) {
        if trans_id < 0 {
            return;
        }
        self.send_kv(
            dst,
            KvMessage::Reply {
                trans_id,
                from: self.address,
                success,
            },
            transport,
        );
    }

    fn send_readreply(&self, dst: Address, trans_id: i64, value: String, transport: &mut dyn Transport) {
        if trans_id < 0 {
            return;
        }
        self.send_kv(
            dst,
            KvMessage::ReadReply {
                trans_id,
                from: self.address,
                value,
            },
            transport,
        );
    }

    fn send_membership(&self, dst: Address, msg: MembershipMessage, transport: &mut dyn Transport) {
        let mut bytes = vec![CHANNEL_MEMBERSHIP];
        bytes.extend(msg.encode());
        transport.send(self.address, dst, bytes);
    }

    fn send_kv(&self, dst: Address, msg: KvMessage, transport: &mut dyn Transport) {
        let mut bytes = vec![CHANNEL_KV];
        bytes.extend(msg.encode());
        transport.send(self.address, dst, bytes);
    }
}

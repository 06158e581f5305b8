use kvquorum_core::Address;
use kvquorum_core::Params;
use kvquorum_node::Node;
use pretty_assertions::assert_eq;
use tests_toolkit::Event;
use tests_toolkit::RecordingLogger;
use tests_toolkit::SimTransport;

fn addr(id: u32) -> Address {
    Address::new(id, 0)
}

fn spin_up(count: u32, par: Params) -> (Vec<Node>, SimTransport) {
    let mut transport = SimTransport::new();
    let mut nodes: Vec<Node> = (1..=count)
        .map(|id| Node::new(addr(id), par, u64::from(id), 0))
        .collect();
    for n in &mut nodes {
        n.bootstrap(&mut transport);
    }
    (nodes, transport)
}

fn tick_all(nodes: &mut [Node], tick: i64, transport: &mut SimTransport, logger: &RecordingLogger) {
    for n in nodes {
        n.tick(tick, transport, logger);
    }
}

fn node_mut<'a>(nodes: &'a mut [Node], address: Address) -> &'a mut Node {
    nodes.iter_mut().find(|n| n.address() == address).unwrap()
}

fn node<'a>(nodes: &'a [Node], address: Address) -> &'a Node {
    nodes.iter().find(|n| n.address() == address).unwrap()
}

#[test]
fn introducer_bootstrap_converges_within_two_ticks() {
    let par = Params::default();
    let (mut nodes, mut transport) = spin_up(2, par);
    let logger = RecordingLogger::new();

    for tick in 1..=2 {
        tick_all(&mut nodes, tick, &mut transport, &logger);
    }

    assert!(node(&nodes, addr(1)).members().contains(addr(2)));
    assert!(node(&nodes, addr(2)).members().contains(addr(1)));
    assert!(node(&nodes, addr(2)).members().len() == 2);

    assert!(
        logger
            .events()
            .iter()
            .any(|e| matches!(e, Event::MemberAdded(a) if *a == addr(2)))
    );
    assert!(
        logger
            .events()
            .iter()
            .any(|e| matches!(e, Event::MemberAdded(a) if *a == addr(1)))
    );
}

#[test]
fn failure_is_not_suspected_before_tfail_but_removed_by_tremove() {
    let par = Params {
        tfail: 3,
        tremove: 6,
        gossip_fanout: 10,
        ..Params::default()
    };
    let (mut nodes, mut transport) = spin_up(10, par);
    let logger = RecordingLogger::new();

    let converge_until = 8;
    for tick in 1..=converge_until {
        tick_all(&mut nodes, tick, &mut transport, &logger);
    }
    logger.clear();

    let failed = addr(5);
    let last_active_tick = converge_until;

    // node 5 stops ticking here; everyone else keeps going.
    for tick in (last_active_tick + 1)..=(last_active_tick + par.tfail) {
        for n in &mut nodes {
            if n.address() == failed {
                continue;
            }
            n.tick(tick, &mut transport, &logger);
        }
    }
    assert!(
        !logger
            .events()
            .iter()
            .any(|e| matches!(e, Event::MemberRemoved(a) if *a == failed)),
        "no node may evict a peer before TFAIL ticks of silence have elapsed"
    );

    for tick in (last_active_tick + par.tfail + 1)..=(last_active_tick + par.tremove) {
        for n in &mut nodes {
            if n.address() == failed {
                continue;
            }
            n.tick(tick, &mut transport, &logger);
        }
    }

    for n in &nodes {
        if n.address() == failed {
            continue;
        }
        assert!(
            !n.members().contains(failed),
            "{} must have evicted node 5 by TREMOVE",
            n.address()
        );
    }
}

#[test]
fn quorum_crud_create_then_read_round_trips() {
    let par = Params::default();
    let (mut nodes, mut transport) = spin_up(5, par);
    let logger = RecordingLogger::new();

    for tick in 1..=6 {
        tick_all(&mut nodes, tick, &mut transport, &logger);
    }

    let coordinator_addr = addr(1);
    let id = node_mut(&mut nodes, coordinator_addr).client_create("k1", "v1", 7, &mut transport, &logger);

    for tick in 7..=9 {
        tick_all(&mut nodes, tick, &mut transport, &logger);
    }

    let create_txn = node(&nodes, coordinator_addr).transaction(id).unwrap();
    assert!(create_txn.finished);
    assert!(create_txn.has_quorum(), "create must reach quorum with all replicas alive");

    let read_id = node_mut(&mut nodes, coordinator_addr).client_read("k1", 10, &mut transport, &logger);
    for tick in 10..=12 {
        tick_all(&mut nodes, tick, &mut transport, &logger);
    }
    let read_txn = node(&nodes, coordinator_addr).transaction(read_id).unwrap();
    assert!(read_txn.finished);
    assert!(read_txn.has_quorum());
    assert_eq!(read_txn.collected_read_value, "v1");
}

#[test]
fn partial_failure_still_reaches_quorum() {
    let par = Params {
        tfail: 3,
        tremove: 100,
        ..Params::default()
    };
    let (mut nodes, mut transport) = spin_up(5, par);
    let logger = RecordingLogger::new();

    for tick in 1..=6 {
        tick_all(&mut nodes, tick, &mut transport, &logger);
    }

    let coordinator_addr = addr(1);
    let replicas = node(&nodes, coordinator_addr)
        .ring()
        .find_nodes("k1", par.ring_size, par.replica_count);
    assert_eq!(replicas.len(), 3);

    let create_id = node_mut(&mut nodes, coordinator_addr).client_create("k1", "v1", 7, &mut transport, &logger);
    for tick in 7..=9 {
        tick_all(&mut nodes, tick, &mut transport, &logger);
    }
    assert!(node(&nodes, coordinator_addr).transaction(create_id).unwrap().has_quorum());

    // one of the three replicas stops ticking permanently (never the
    // coordinator itself, which must keep ticking to observe the outcome);
    // tremove is large enough that it is never evicted from the ring
    // during this test.
    let failed_replica = *replicas
        .iter()
        .find(|a| **a != coordinator_addr)
        .expect("at least one replica is not the coordinator itself");

    let update_id =
        node_mut(&mut nodes, coordinator_addr).client_update("k1", "v2", 10, &mut transport, &logger);
    for tick in 10..=12 {
        for n in &mut nodes {
            if n.address() == failed_replica {
                continue;
            }
            n.tick(tick, &mut transport, &logger);
        }
    }

    let update_txn = node(&nodes, coordinator_addr).transaction(update_id).unwrap();
    assert!(update_txn.finished);
    assert!(
        update_txn.has_quorum(),
        "update must succeed on quorum of 2 even though one replica never replies"
    );
}

#[test]
fn stabilization_re_replicates_within_two_ticks_of_removal() {
    let par = Params {
        tfail: 2,
        tremove: 4,
        gossip_fanout: 10,
        ..Params::default()
    };
    let (mut nodes, mut transport) = spin_up(5, par);
    let logger = RecordingLogger::new();

    for tick in 1..=6 {
        tick_all(&mut nodes, tick, &mut transport, &logger);
    }

    let coordinator_addr = addr(1);
    let replicas_before = node(&nodes, coordinator_addr)
        .ring()
        .find_nodes("k1", par.ring_size, par.replica_count);
    let failed_replica = *replicas_before
        .iter()
        .find(|a| **a != coordinator_addr)
        .expect("at least one replica is not the coordinator itself");

    let create_id = node_mut(&mut nodes, coordinator_addr).client_create("k1", "v1", 7, &mut transport, &logger);
    for tick in 7..=9 {
        tick_all(&mut nodes, tick, &mut transport, &logger);
    }
    assert!(node(&nodes, coordinator_addr).transaction(create_id).unwrap().has_quorum());

    let last_active_tick = 9;
    for tick in (last_active_tick + 1)..=(last_active_tick + par.tremove) {
        for n in &mut nodes {
            if n.address() == failed_replica {
                continue;
            }
            n.tick(tick, &mut transport, &logger);
        }
    }
    let removal_tick = last_active_tick + par.tremove;

    let replicas_after = node(&nodes, coordinator_addr)
        .ring()
        .find_nodes("k1", par.ring_size, par.replica_count);
    assert!(
        !replicas_after.contains(&failed_replica),
        "the removed node must no longer be in the replica set"
    );

    let new_replica = *replicas_after
        .iter()
        .find(|a| !replicas_before.contains(a))
        .expect("ring growth must bring in a replacement replica");

    for tick in (removal_tick + 1)..=(removal_tick + 2) {
        for n in &mut nodes {
            if n.address() == failed_replica {
                continue;
            }
            n.tick(tick, &mut transport, &logger);
        }
    }

    assert!(
        node(&nodes, new_replica).store().iter().any(|(k, v)| k == "k1" && v == "v1"),
        "the newly-adopted replica must hold the key within two ticks of stabilization"
    );
}

#[test]
fn stale_reply_after_finalization_does_not_mutate_transaction() {
    let par = Params::default();
    let (mut nodes, mut transport) = spin_up(5, par);
    let logger = RecordingLogger::new();

    for tick in 1..=6 {
        tick_all(&mut nodes, tick, &mut transport, &logger);
    }

    let coordinator_addr = addr(1);
    let replicas = node(&nodes, coordinator_addr)
        .ring()
        .find_nodes("k1", par.ring_size, par.replica_count);
    let slow_replica = *replicas
        .iter()
        .find(|a| **a != coordinator_addr)
        .expect("at least one replica is not the coordinator itself");

    let created_tick = 7;
    let id = node_mut(&mut nodes, coordinator_addr)
        .client_create("k1", "v1", created_tick, &mut transport, &logger);

    // every node but the slow replica keeps ticking; its inbound CREATE
    // sits queued untouched while the coordinator times the transaction out.
    let timeout_tick = created_tick + par.timeout_ticks + 1;
    for tick in created_tick..=timeout_tick {
        for n in &mut nodes {
            if n.address() == slow_replica {
                continue;
            }
            n.tick(tick, &mut transport, &logger);
        }
    }

    let finished_txn = node(&nodes, coordinator_addr).transaction(id).unwrap().clone();
    assert!(finished_txn.finished, "coordinator must time the transaction out by timeout_ticks");
    assert!(finished_txn.has_quorum(), "the two on-time replicas already gave quorum");
    let replies_before = finished_txn.replies_received;

    logger.clear();

    // the slow replica finally ticks, processes the stale CREATE, and
    // replies; the coordinator then ticks and receives that late reply.
    node_mut(&mut nodes, slow_replica).tick(timeout_tick + 1, &mut transport, &logger);
    node_mut(&mut nodes, coordinator_addr).tick(timeout_tick + 2, &mut transport, &logger);

    let txn_after = node(&nodes, coordinator_addr).transaction(id).unwrap();
    assert_eq!(
        txn_after.replies_received, replies_before,
        "a reply arriving after finalization must not be counted"
    );
    assert!(
        !logger
            .events()
            .iter()
            .any(|e| matches!(e, Event::CoordinatorOutcome { .. })),
        "a stale reply to an already-finished transaction must not emit a second outcome log"
    );
}

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::VecDeque;

use kvquorum_core::Address;
use kvquorum_core::Logger;
use kvquorum_core::OpKind;
use kvquorum_node::Transport;

/// An in-memory FIFO network shared by every `Node` in a test or demo.
/// There is no real I/O here — `send` enqueues to the destination's queue
/// and `recv` drains it, preserving per-sender order but not ordering
/// across senders.
#[derive(Debug, Default)]
pub struct SimTransport {
    queues: HashMap<Address, VecDeque<Vec<u8>>>,
}

impl SimTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames currently queued for `addr`, for test assertions.
    pub fn pending(&self, addr: Address) -> usize {
        self.queues.get(&addr).map_or(0, VecDeque::len)
    }
}

impl Transport for SimTransport {
    fn send(&mut self, _src: Address, dst: Address, bytes: Vec<u8>) {
        self.queues.entry(dst).or_default().push_back(bytes);
    }

    fn recv(&mut self, addr: Address) -> Vec<Vec<u8>> {
        self.queues
            .get_mut(&addr)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }
}

/// One structured event a `Logger` implementation emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    MemberAdded(Address),
    MemberRemoved(Address),
    CoordinatorOutcome {
        trans_id: u32,
        kind: OpKind,
        key: String,
        success: bool,
    },
    ServerOutcome {
        kind: OpKind,
        key: String,
        success: bool,
    },
}

/// Captures every event verbatim instead of routing it to `log`, so tests
/// can assert on exactly what was logged without scraping text output.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    events: RefCell<Vec<Event>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Logger for RecordingLogger {
    fn member_added(&self, addr: Address) {
        self.events.borrow_mut().push(Event::MemberAdded(addr));
    }

    fn member_removed(&self, addr: Address) {
        self.events.borrow_mut().push(Event::MemberRemoved(addr));
    }

    fn coordinator_outcome(&self, trans_id: u32, kind: OpKind, key: &str, success: bool) {
        self.events.borrow_mut().push(Event::CoordinatorOutcome {
            trans_id,
            kind,
            key: key.to_string(),
            success,
        });
    }

    fn server_outcome(&self, kind: OpKind, key: &str, success: bool) {
        self.events.borrow_mut().push(Event::ServerOutcome {
            kind,
            key: key.to_string(),
            success,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(id: u32) -> Address {
        Address::new(id, 0)
    }

    #[test]
    fn transport_delivers_in_send_order() {
        let mut transport = SimTransport::new();
        transport.send(addr(1), addr(2), vec![1]);
        transport.send(addr(1), addr(2), vec![2]);
        assert_eq!(transport.recv(addr(2)), vec![vec![1], vec![2]]);
        assert!(transport.recv(addr(2)).is_empty());
    }

    #[test]
    fn pending_reports_queue_depth() {
        let mut transport = SimTransport::new();
        assert_eq!(transport.pending(addr(2)), 0);
        transport.send(addr(1), addr(2), vec![0]);
        assert_eq!(transport.pending(addr(2)), 1);
        transport.recv(addr(2));
        assert_eq!(transport.pending(addr(2)), 0);
    }

    #[test]
    fn recording_logger_captures_events_verbatim() {
        let logger = RecordingLogger::new();
        logger.member_added(addr(2));
        logger.coordinator_outcome(0, OpKind::Create, "k1", true);
        assert_eq!(
            logger.events(),
            vec![
                Event::MemberAdded(addr(2)),
                Event::CoordinatorOutcome {
                    trans_id: 0,
                    kind: OpKind::Create,
                    key: "k1".to_string(),
                    success: true,
                },
            ]
        );
    }
}

use std::fmt;

use crate::address::Address;

/// The four key/value operation kinds. Shared by the store and the
/// coordinator so a log line or metric label never has to be assembled
/// from a bare string at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Create,
    Read,
    Update,
    Delete,
}

impl OpKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            OpKind::Create => "create",
            OpKind::Read => "read",
            OpKind::Update => "update",
            OpKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured events a node emits over its lifetime: membership changes and
/// CRUD outcomes. Kept separate from the `log` crate so a test can swap in
/// a recording sink and assert on exact events rather than scraping text.
///
/// Coordinator-side events describe the final, client-visible outcome of a
/// transaction; server-side events describe one replica's local execution
/// of the corresponding op. A single CREATE typically produces one
/// coordinator event and up to three server events.
pub trait Logger {
    fn member_added(&self, addr: Address);
    fn member_removed(&self, addr: Address);
    fn coordinator_outcome(&self, trans_id: u32, kind: OpKind, key: &str, success: bool);
    fn server_outcome(&self, kind: OpKind, key: &str, success: bool);
}

/// Default `Logger` that forwards every event to the `log` crate, tagging
/// each subsystem with its own `target:`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLogger;

impl Logger for StdLogger {
    fn member_added(&self, addr: Address) {
        log::info!(target: "membership", "added member {addr}");
    }

    fn member_removed(&self, addr: Address) {
        log::info!(target: "membership", "removed member {addr}");
    }

    fn coordinator_outcome(&self, trans_id: u32, kind: OpKind, key: &str, success: bool) {
        if success {
            log::info!(target: "coordinator", "transaction {trans_id} {kind} {key} succeeded");
        } else {
            log::warn!(target: "coordinator", "transaction {trans_id} {kind} {key} failed");
        }
    }

    fn server_outcome(&self, kind: OpKind, key: &str, success: bool) {
        if success {
            log::info!(target: "store", "{kind} {key} succeeded");
        } else {
            log::info!(target: "store", "{kind} {key} failed");
        }
    }
}

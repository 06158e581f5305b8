use kvquorum_core::Logger;
use kvquorum_core::OpKind;
use kvquorum_metrics::GlobalMetrics;
use kvquorum_metrics::OperationMetrics;

use crate::transaction::Transaction;

/// Tracks every client-initiated transaction this node has coordinated.
///
/// The table is append-only: an id is never reused, so "transaction id
/// exists but refers to a finished slot" and "transaction id was never
/// issued" remain distinguishable without a sentinel value.
#[derive(Debug, Default)]
pub struct Coordinator {
    transactions: Vec<Transaction>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh transaction id and records it as pending.
    pub fn begin(&mut self, kind: OpKind, key: &str, value: &str, created_tick: i64) -> u32 {
        let id = self.transactions.len() as u32;
        self.transactions.push(Transaction::new(
            id,
            kind,
            key.to_string(),
            value.to_string(),
            created_tick,
        ));
        id
    }

    pub fn get(&self, id: u32) -> Option<&Transaction> {
        self.transactions.get(id as usize)
    }

    /// Applies an incoming REPLY. Silently ignored if `id` is unknown or
    /// the transaction already finished — a later-arriving reply can never
    /// un-finalize it.
    pub fn on_reply(&mut self, id: u32, success: bool, current_tick: i64, logger: &dyn Logger) {
        self.apply_reply(id, success, None, current_tick, logger);
    }

    /// Applies an incoming READREPLY. Success is "value non-empty"; the
    /// returned value is whichever reply most recently updated
    /// `collected_read_value` — value divergence across replicas is not
    /// detected.
    pub fn on_readreply(&mut self, id: u32, value: &str, current_tick: i64, logger: &dyn Logger) {
        let success = !value.is_empty();
        self.apply_reply(id, success, Some(value), current_tick, logger);
    }

    /// Immediately fails a transaction with zero replies, for the
    /// "ring has fewer than 3 members" rejection path — no network I/O
    /// is ever attempted for it.
    pub fn reject(&mut self, id: u32, current_tick: i64, logger: &dyn Logger) {
        if let Some(txn) = self.transactions.get_mut(id as usize) {
            if !txn.finished {
                Self::finalize(txn, false, current_tick, logger);
            }
        }
    }

    fn apply_reply(
        &mut self,
        id: u32,
        success: bool,
        read_value: Option<&str>,
        current_tick: i64,
        logger: &dyn Logger,
    ) {
        let Some(txn) = self.transactions.get_mut(id as usize) else {
            GlobalMetrics::get().stabilization.stale_drops.add(1, &[]);
            return;
        };
        if txn.finished {
            GlobalMetrics::get().stabilization.stale_drops.add(1, &[]);
            return;
        }
        txn.replies_received += 1;
        if success {
            txn.replies_success += 1;
            if let Some(value) = read_value {
                txn.collected_read_value = value.to_string();
            }
        }
        if txn.replies_received == 3 {
            let id = txn.id;
            Self::finalize(&mut self.transactions[id as usize], false, current_tick, logger);
        }
    }

    /// Finalizes every non-finished transaction older than `timeout_ticks`,
    /// with success iff quorum was reached on whatever replies did arrive.
    pub fn sweep_timeouts(&mut self, current_tick: i64, timeout_ticks: i64, logger: &dyn Logger) {
        for txn in &mut self.transactions {
            if !txn.finished && current_tick - txn.created_tick > timeout_ticks {
                Self::finalize(txn, true, current_tick, logger);
            }
        }
    }

    fn finalize(txn: &mut Transaction, via_timeout: bool, current_tick: i64, logger: &dyn Logger) {
        txn.finished = true;
        let success = txn.has_quorum();
        logger.coordinator_outcome(txn.id, txn.kind, &txn.key, success);

        let status = match (success, via_timeout) {
            (true, _) => OperationMetrics::STATUS_SUCCESS,
            (false, true) => OperationMetrics::STATUS_TIMEOUT,
            (false, false) => OperationMetrics::STATUS_FAILURE,
        };
        GlobalMetrics::get().operation.count.add(
            1,
            &OperationMetrics::operation_labels(txn.kind.as_str(), status),
        );
        GlobalMetrics::get()
            .operation
            .duration
            .record((current_tick - txn.created_tick) as f64, &[]);
    }
}

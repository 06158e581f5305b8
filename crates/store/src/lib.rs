use std::collections::HashMap;

use kvquorum_core::Logger;
use kvquorum_core::OpKind;
use kvquorum_metrics::GlobalMetrics;
use kvquorum_metrics::OperationMetrics;

/// Server-side outcome of a single CRUD operation, independent of any
/// quorum accounting — this is what one replica's local `Store` decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpResult {
    pub success: bool,
}

impl OpResult {
    const fn ok() -> Self {
        Self { success: true }
    }

    const fn fail() -> Self {
        Self { success: false }
    }
}

/// In-memory key/value mapping held by one node for the keys it replicates.
///
/// There is no disk tier and no eviction: a node holds exactly the replicas
/// assigned to it by the ring, and stabilization keeps that set in sync as
/// membership changes.
#[derive(Debug, Default)]
pub struct Store {
    entries: HashMap<String, String>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Succeeds only when `key` was absent.
    pub fn create(&mut self, key: &str, value: &str, logger: &dyn Logger) -> OpResult {
        let result = if self.entries.contains_key(key) {
            OpResult::fail()
        } else {
            self.entries.insert(key.to_string(), value.to_string());
            OpResult::ok()
        };
        self.log_and_count(OpKind::Create, key, result, logger);
        result
    }

    /// Returns the value, or `""` as the absent sentinel — there is no
    /// `Option` here because the wire codec cannot distinguish "empty
    /// string" from "absent" either.
    pub fn read(&mut self, key: &str, logger: &dyn Logger) -> String {
        let value = self.entries.get(key).cloned().unwrap_or_default();
        let success = !value.is_empty();
        let result = if success { OpResult::ok() } else { OpResult::fail() };
        self.log_and_count(OpKind::Read, key, result, logger);
        value
    }

    /// Succeeds only when `key` was present.
    pub fn update(&mut self, key: &str, value: &str, logger: &dyn Logger) -> OpResult {
        let result = if self.entries.contains_key(key) {
            self.entries.insert(key.to_string(), value.to_string());
            OpResult::ok()
        } else {
            OpResult::fail()
        };
        self.log_and_count(OpKind::Update, key, result, logger);
        result
    }

    /// Succeeds only when `key` was present.
    pub fn delete(&mut self, key: &str, logger: &dyn Logger) -> OpResult {
        let result = if self.entries.remove(key).is_some() {
            OpResult::ok()
        } else {
            OpResult::fail()
        };
        self.log_and_count(OpKind::Delete, key, result, logger);
        result
    }

    /// Unconditional overwrite used only by the stabilizer: delete-then-insert
    /// regardless of prior presence. Never logged or counted — stabilization
    /// traffic is untracked by design.
    pub fn stabilization_create(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    /// Removes `key` without emitting a server-side log, for the stabilizer's
    /// untracked DELETE sent to stale predecessors.
    pub fn untracked_delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn log_and_count(&self, kind: OpKind, key: &str, result: OpResult, logger: &dyn Logger) {
        let status = if result.success {
            OperationMetrics::STATUS_SUCCESS
        } else {
            OperationMetrics::STATUS_FAILURE
        };
        let metrics = GlobalMetrics::get();
        metrics.operation.count.add(
            1,
            &OperationMetrics::operation_labels(kind.as_str(), status),
        );
        logger.server_outcome(kind, key, result.success);
    }
}

#[cfg(test)]
mod tests {
    use kvquorum_core::StdLogger;

    use super::*;

    #[test]
    fn create_succeeds_only_when_absent() {
        let mut store = Store::new();
        let logger = StdLogger;
        assert!(store.create("k1", "v1", &logger).success);
        assert!(!store.create("k1", "v2", &logger).success);
        assert_eq!(store.read("k1", &logger), "v1");
    }

    #[test]
    fn update_succeeds_only_when_present() {
        let mut store = Store::new();
        let logger = StdLogger;
        assert!(!store.update("k1", "v1", &logger).success);
        store.create("k1", "v1", &logger);
        assert!(store.update("k1", "v2", &logger).success);
        assert_eq!(store.read("k1", &logger), "v2");
    }

    #[test]
    fn delete_succeeds_only_when_present() {
        let mut store = Store::new();
        let logger = StdLogger;
        assert!(!store.delete("k1", &logger).success);
        store.create("k1", "v1", &logger);
        assert!(store.delete("k1", &logger).success);
        assert!(!store.delete("k1", &logger).success);
    }

    #[test]
    fn read_of_absent_key_is_empty_sentinel() {
        let mut store = Store::new();
        let logger = StdLogger;
        assert_eq!(store.read("missing", &logger), "");
    }

    #[test]
    fn stabilization_create_overwrites_unconditionally() {
        let mut store = Store::new();
        store.create("k1", "v1", &StdLogger);
        store.stabilization_create("k1", "v2");
        assert_eq!(store.read("k1", &StdLogger), "v2");

        store.stabilization_create("k2", "v3");
        assert_eq!(store.read("k2", &StdLogger), "v3");
    }
}

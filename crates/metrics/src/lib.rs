use std::sync::LazyLock;

use opentelemetry::KeyValue;
use opentelemetry::metrics::Counter;
use opentelemetry::metrics::Gauge;
use opentelemetry::metrics::Histogram;
use opentelemetry::metrics::Meter;

pub struct GlobalMetrics {
    pub meter: Meter,
    pub membership: MembershipMetrics,
    pub operation: OperationMetrics,
    pub stabilization: StabilizationMetrics,
}

impl GlobalMetrics {
    fn new() -> Self {
        let meter = opentelemetry::global::meter("kvquorum");
        Self {
            membership: MembershipMetrics::new(meter.clone()),
            operation: OperationMetrics::new(meter.clone()),
            stabilization: StabilizationMetrics::new(meter.clone()),
            meter,
        }
    }

    pub fn get() -> &'static GlobalMetrics {
        static GLOBAL_METRICS: LazyLock<GlobalMetrics> = LazyLock::new(GlobalMetrics::new);
        &GLOBAL_METRICS
    }
}

/// Membership-table and gossip-round metrics.
pub struct MembershipMetrics {
    pub ring_size: Gauge<u64>,
    pub joins: Counter<u64>,
    pub removals: Counter<u64>,
    pub gossip_rounds: Counter<u64>,
}

impl MembershipMetrics {
    pub fn new(meter: Meter) -> Self {
        Self {
            ring_size: meter
                .u64_gauge("kvquorum.membership.ring_size")
                .with_description("Number of members currently ALIVE on this node's ring")
                .build(),
            joins: meter
                .u64_counter("kvquorum.membership.joins")
                .with_description("Number of members added to the membership list")
                .build(),
            removals: meter
                .u64_counter("kvquorum.membership.removals")
                .with_description("Number of members evicted from the membership list")
                .build(),
            gossip_rounds: meter
                .u64_counter("kvquorum.membership.gossip_rounds")
                .with_description("Number of gossip rounds sent")
                .build(),
        }
    }

    pub const REASON_TIMEOUT: &str = "timeout";
    pub const REASON_GOSSIP: &str = "gossip";

    pub fn removal_labels(reason: &str) -> [KeyValue; 1] {
        [KeyValue::new("reason", reason.to_string())]
    }
}

/// Coordinator-side and server-side key/value operation metrics.
pub struct OperationMetrics {
    pub count: Counter<u64>,
    pub duration: Histogram<f64>,
}

impl OperationMetrics {
    pub fn new(meter: Meter) -> Self {
        Self {
            count: meter
                .u64_counter("kvquorum.operation.count")
                .with_description("The number of key/value operations")
                .build(),
            duration: meter
                .f64_histogram("kvquorum.operation.duration")
                .with_description("The duration of an operation, in ticks")
                .with_unit("tick")
                .with_boundaries([1.0, 2.0, 5.0, 10.0, 15.0, 20.0].into())
                .build(),
        }
    }

    pub const OPERATION_CREATE: &str = "create";
    pub const OPERATION_READ: &str = "read";
    pub const OPERATION_UPDATE: &str = "update";
    pub const OPERATION_DELETE: &str = "delete";

    pub const STATUS_SUCCESS: &str = "ok";
    pub const STATUS_FAILURE: &str = "error";
    pub const STATUS_TIMEOUT: &str = "timeout";

    pub fn operation_labels(operation: &str, status: &str) -> [KeyValue; 2] {
        [
            KeyValue::new("operation", operation.to_string()),
            KeyValue::new("status", status.to_string()),
        ]
    }
}

/// Ring-change re-replication metrics.
pub struct StabilizationMetrics {
    pub re_replications: Counter<u64>,
    pub stale_drops: Counter<u64>,
}

impl StabilizationMetrics {
    pub fn new(meter: Meter) -> Self {
        Self {
            re_replications: meter
                .u64_counter("kvquorum.stabilization.re_replications")
                .with_description("Number of keys re-replicated after a ring change")
                .build(),
            stale_drops: meter
                .u64_counter("kvquorum.stabilization.stale_drops")
                .with_description("Number of replies dropped because they belong to a stale transaction")
                .build(),
        }
    }
}

use logforth::append;
use logforth::filter::env_filter::EnvFilterBuilder;
use logforth::layout;

/// Installs a stderr logger for a node in the simulation.
///
/// There is no file or OTLP appender here: the node has no disk and no
/// network to ship telemetry over, so stderr with an env-driven filter is
/// the whole story. `label` is logged once so multi-node demos and tests
/// can tell which node's process emitted it, since every node otherwise
/// shares the same filter spec.
pub fn init_stderr_logging(label: &str) {
    let spec = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilterBuilder::try_from_spec(&spec)
        .unwrap_or_else(|_| panic!("failed to parse RUST_LOG filter: {spec}"))
        .build();

    let _ = logforth::starter_log::builder()
        .dispatch(|b| {
            b.filter(filter)
                .append(append::Stderr::default().with_layout(layout::TextLayout::default()))
        })
        .try_apply();

    log::debug!("logging initialized for {label}");
}

use clap::Parser;
use kvquorum_core::Address;
use kvquorum_core::Params;
use kvquorum_core::StdLogger;
use kvquorum_core::init_stderr_logging;
use kvquorum_node::Node;
use tests_toolkit::SimTransport;

/// Spins up `--nodes` simulated peers over an in-memory transport, ticks
/// them `--ticks` times, and prints the resulting membership and store
/// state of every node. A demonstration harness: a real deployment
/// supplies its own `Transport`, tick source, and `Logger`.
#[derive(Debug, clap::Parser)]
#[command(name = "kvquorum-sim", version)]
struct Command {
    /// Number of simulated nodes, including the introducer.
    #[clap(short, long, default_value_t = 5)]
    nodes: u32,
    /// Number of ticks to run.
    #[clap(short, long, default_value_t = 20)]
    ticks: i64,
}

fn main() {
    init_stderr_logging("kvquorum-sim");
    let cmd = Command::parse();

    let mut transport = SimTransport::new();
    let logger = StdLogger;
    let par = Params::default();

    let mut nodes: Vec<Node> = (1..=cmd.nodes)
        .map(|id| Node::new(Address::new(id, 0), par, u64::from(id), 0))
        .collect();

    for node in &mut nodes {
        node.bootstrap(&mut transport);
    }

    for tick in 1..=cmd.ticks {
        for node in &mut nodes {
            node.tick(tick, &mut transport, &logger);
        }
    }

    for node in &nodes {
        println!(
            "node {}: {} members alive, {} keys stored, {} replicas held for others",
            node.address(),
            node.members().len(),
            node.store().len(),
            node.has_my_replicas().len(),
        );
    }
}

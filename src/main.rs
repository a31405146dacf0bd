//! memcache-discovery - resolve the members of an auto-discovery cache cluster
//!
//! Connects to a configuration endpoint, issues `config get cluster` and
//! prints the validated topology.

use anyhow::Result;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use memcache_discovery::config::{CliArgs, OutputFormat};
use memcache_discovery::{AutoDiscovery, ClusterTopology, Resolver, ResolverConfig};

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn print_topology(topology: &ClusterTopology, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(topology)?);
        }
        OutputFormat::Text => {
            println!("Config version: {}", topology.version);
            println!("Nodes ({}):", topology.len());
            for node in topology {
                println!("  {:<40} {}", node.hostname, node.address());
            }
        }
    }
    Ok(())
}

fn run() -> Result<()> {
    let args = CliArgs::parse_args();

    setup_logging(args.verbose, args.quiet);

    let config = ResolverConfig::from_cli(&args)?;
    info!(
        "Resolving {} (dial timeout {:?}, deadline {:?})",
        args.endpoint, config.dial_timeout, config.operation_timeout
    );

    let resolver = AutoDiscovery::new(config);
    let topology = resolver
        .resolve(&config.context(), &args.endpoint)
        .map_err(|e| anyhow::anyhow!("{} error resolving {}: {}", e.kind(), args.endpoint, e))?;

    print_topology(&topology, args.output_format)
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

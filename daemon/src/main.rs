//! `latticed` — runs a lattice node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lattice_ledger::{Genesis, Ledger};
use lattice_node::{Node, NodeConfig};
use lattice_store::Store;
use lattice_types::Network;

#[derive(Parser)]
#[command(name = "latticed", about = "block-lattice node daemon")]
struct Cli {
    /// Path to a TOML configuration file. CLI flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Network to participate in: "live", "beta", or "test".
    #[arg(long, env = "LATTICE_NETWORK")]
    network: Option<String>,

    /// UDP/TCP listen endpoint.
    #[arg(long, env = "LATTICE_ADDR")]
    addr: Option<String>,

    /// Initial peers (comma-separated host:port).
    #[arg(long, env = "LATTICE_PEERS", value_delimiter = ',')]
    peers: Vec<String>,

    /// Data directory for the ledger store.
    #[arg(long, env = "LATTICE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Accept IPv6 peers.
    #[arg(long, env = "LATTICE_ENABLE_IPV6")]
    enable_ipv6: bool,

    /// Maximum number of peers to track.
    #[arg(long, env = "LATTICE_MAX_PEERS")]
    max_peers: Option<usize>,
}

fn parse_network(s: &str) -> anyhow::Result<Network> {
    match s.to_lowercase().as_str() {
        "live" => Ok(Network::Live),
        "beta" => Ok(Network::Beta),
        "test" => Ok(Network::Test),
        other => anyhow::bail!("unknown network {other:?} (expected live, beta, or test)"),
    }
}

fn default_data_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".config/lattice/db"),
        None => PathBuf::from("./lattice/db"),
    }
}

fn build_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig {
            data_dir: default_data_dir(),
            ..NodeConfig::default()
        },
    };

    if let Some(network) = &cli.network {
        config.network = parse_network(network)?;
    }
    if let Some(addr) = &cli.addr {
        config.addr = addr.clone();
    }
    if !cli.peers.is_empty() {
        config.peers = cli.peers.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if cli.enable_ipv6 {
        config.enable_ipv6 = true;
    }
    if let Some(max_peers) = cli.max_peers {
        config.max_peers = max_peers;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    info!(
        network = config.network.as_str(),
        data_dir = %config.data_dir.display(),
        "starting node"
    );

    let store = Store::open(&config.data_dir)
        .with_context(|| format!("opening store in {}", config.data_dir.display()))?;
    let genesis = Genesis::for_network(config.network);
    let ledger = Arc::new(Ledger::new(store.clone(), genesis).context("opening ledger")?);
    info!(blocks = ledger.count_blocks()?, "ledger ready");

    let node = Arc::new(Node::new(config, Arc::clone(&ledger)).await?);

    let runner = {
        let node = Arc::clone(&node);
        tokio::spawn(async move { node.run().await })
    };

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("shutdown signal received, stopping node");
    node.shutdown();
    runner.await??;

    store.force_sync()?;
    info!("node exited cleanly");
    Ok(())
}

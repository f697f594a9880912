//! glint daemon: entry point for running a glint node.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use glint_chain::{build_genesis, Collaborators};
use glint_node::{init_logging, GlintNode, LogFormat, NodeConfig};
use glint_types::NetworkId;
use glint_work::Blake2bOracle;

#[derive(Parser)]
#[command(name = "glint-daemon", about = "glint consensus node daemon")]
struct Cli {
    /// Network to follow: "main", "test" or "dev".
    /// When a config file is provided, defaults to the file's network value.
    #[arg(long, env = "GLINT_NETWORK")]
    network: Option<NetworkId>,

    /// Data directory for ledger storage.
    #[arg(long, env = "GLINT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[arg(long, env = "GLINT_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GLINT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log the final metrics on shutdown.
    #[arg(long, env = "GLINT_ENABLE_METRICS")]
    metrics: bool,

    /// Accept headers without checking proof of work (test networks only).
    #[arg(long, env = "GLINT_SKIP_POW_CHECK")]
    skip_pow_check: bool,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "GLINT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the node until SIGINT or SIGTERM.
    Run,
    /// Print the effective configuration as TOML.
    PrintConfig,
    /// Print the genesis block hash of the configured network.
    Genesis,
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            NodeConfig::from_toml_file(&path)
                .with_context(|| format!("loading config from {path}"))?
        }
        None => NodeConfig::default(),
    };
    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.enable_metrics |= cli.metrics;
    config.chain.skip_pow_check |= cli.skip_pow_check;
    if config.chain.skip_pow_check && config.network == NetworkId::Main {
        anyhow::bail!("proof of work checks cannot be skipped on the main network");
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::PrintConfig => {
            print!("{}", config.to_toml_string()?);
        }
        Command::Genesis => {
            let genesis = build_genesis(&config.params(), &Blake2bOracle)?;
            println!("{}", genesis.hash());
        }
        Command::Run => {
            let format: LogFormat = config.log_format.parse()?;
            init_logging(format, &config.log_level)?;
            tracing::info!(
                network = %config.network,
                data_dir = %config.data_dir.display(),
                "starting glint node"
            );

            let node = GlintNode::start(config, Collaborators::default())?;
            node.shutdown_controller().wait().await;
            let reason = node.stop().await?;
            if reason.is_fault() {
                anyhow::bail!("glint node stopped on {reason}");
            }
            tracing::info!(%reason, "glint daemon exited cleanly");
        }
    }

    Ok(())
}

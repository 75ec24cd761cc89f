//! Critter node binary.
//!
//! Loads the node configuration, builds the ledger from genesis and serves
//! the JSON-RPC interface until interrupted.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use critter_core::address::Address;
use critter_node_lib::{Node, NodeConfig, start_rpc_server};
use tracing::{error, info};

/// Critter node: social-content ledger with scout pools.
#[derive(Parser, Debug)]
#[command(
    name = "critter-node",
    version,
    about = "Critter ledger node with JSON-RPC server"
)]
struct Args {
    /// Config file (default: <data-dir>/critter.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// RPC server bind address
    #[arg(long)]
    rpc_bind: Option<String>,

    /// RPC server port
    #[arg(long)]
    rpc_port: Option<u16>,

    /// Genesis admin address (receives every role)
    #[arg(long)]
    genesis_admin: Option<Address>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text")]
    log_format: String,
}

impl Args {
    /// Resolve the node configuration: file and environment first, then
    /// command-line overrides.
    fn into_config(self) -> Result<(NodeConfig, String), critter_node_lib::NodeError> {
        let path = match (&self.config, &self.data_dir) {
            (Some(path), _) => path.clone(),
            (None, Some(dir)) => dir.join(critter_node_lib::config::CONFIG_FILE_NAME),
            (None, None) => NodeConfig::default().default_config_path(),
        };
        let mut config = NodeConfig::load(Some(path.as_path()))?;

        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(bind) = self.rpc_bind {
            config.rpc_bind = bind;
        }
        if let Some(port) = self.rpc_port {
            config.rpc_port = port;
        }
        if let Some(admin) = self.genesis_admin {
            config.genesis_admin = admin;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        Ok((config, self.log_format))
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let (config, log_format) = match args.into_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            process::exit(1);
        }
    };

    init_logging(&config.log_level, &log_format);

    info!("Critter Node v{}", env!("CARGO_PKG_VERSION"));
    info!("data_dir: {:?}", config.data_dir);
    info!("rpc_addr: {}", config.rpc_addr());
    info!("genesis_admin: {}", config.genesis_admin);

    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        error!("failed to create data_dir: {}", e);
        process::exit(1);
    }

    let node = match Node::new(config.clone()) {
        Ok(n) => n,
        Err(e) => {
            error!("failed to start node: {}", e);
            process::exit(1);
        }
    };

    let rpc_handle = match start_rpc_server(&config.rpc_addr(), node.clone()).await {
        Ok((handle, addr)) => {
            info!("RPC server listening on {}", addr);
            handle
        }
        Err(e) => {
            error!("failed to start RPC server: {}", e);
            process::exit(1);
        }
    };

    info!("Critter node running (Ctrl+C to stop)");

    tokio::select! {
        _ = rpc_handle.clone().stopped() => {
            info!("RPC server exited");
        }
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!("failed to listen for Ctrl+C: {}", e);
            }
            info!("shutdown signal received");
        }
    }

    rpc_handle.stop().ok();
    info!(tip = node.read(|l| l.tip()), "Critter node shutdown complete");
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Pass `format = "json"` for structured JSON output. Any other value
/// defaults to human-readable text.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}

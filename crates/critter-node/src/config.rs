//! Node configuration for the Critter node.
//!
//! Provides [`NodeConfig`] with defaults for data directory, RPC binding,
//! logging, and genesis. [`NodeConfig::load`] layers an optional TOML file
//! and `CRITTER_`-prefixed environment variables over those defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use critter_core::address::Address;
use critter_core::config::{ConfigKey, Configuration, FeeSchedule};
use critter_core::constants::DEFAULT_RPC_PORT;
use critter_core::types::Interaction;
use critter_ledger::Genesis;

use crate::error::NodeError;

/// Environment variable prefix, e.g. `CRITTER_RPC_PORT=9000`.
pub const ENV_PREFIX: &str = "CRITTER";

/// Name of the config file looked up in the data directory.
pub const CONFIG_FILE_NAME: &str = "critter.toml";

/// A genesis balance entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance {
    pub address: Address,
    pub amount: u64,
}

/// Configuration for a node instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Root directory for node data and the default config file.
    pub data_dir: PathBuf,
    /// IP address for the JSON-RPC server to bind to.
    pub rpc_bind: String,
    /// Port for the JSON-RPC server.
    pub rpc_port: u16,
    /// Log level filter string (e.g. "info", "debug", "critter_ledger=trace").
    pub log_level: String,
    /// Account granted every role at genesis.
    pub genesis_admin: Address,
    /// Balances credited at genesis.
    pub genesis_balances: Vec<GenesisBalance>,
    /// Protocol parameter overrides by key name (e.g. `virality_threshold`).
    pub parameters: BTreeMap<String, u64>,
    /// Interaction fee overrides by interaction name (e.g. `like`).
    pub fees: BTreeMap<String, u64>,
    /// Number of committed events kept in memory.
    pub event_log_capacity: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("critter");

        Self {
            data_dir,
            rpc_bind: "127.0.0.1".to_string(),
            rpc_port: DEFAULT_RPC_PORT,
            log_level: "info".to_string(),
            genesis_admin: Address::ZERO,
            genesis_balances: Vec::new(),
            parameters: BTreeMap::new(),
            fees: BTreeMap::new(),
            event_log_capacity: 10_000,
        }
    }
}

impl NodeConfig {
    /// Load configuration from `path` (if it exists) and the environment.
    ///
    /// Missing fields fall back to [`NodeConfig::default`].
    pub fn load(path: Option<&Path>) -> Result<Self, NodeError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Default config file location inside the data directory.
    pub fn default_config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }

    /// Socket address string for the RPC server.
    pub fn rpc_addr(&self) -> String {
        format!("{}:{}", self.rpc_bind, self.rpc_port)
    }

    /// Build the ledger genesis from this configuration.
    ///
    /// # Errors
    ///
    /// [`NodeError::Config`] if a parameter or fee name is unknown.
    pub fn genesis(&self) -> Result<Genesis, NodeError> {
        let mut configuration = Configuration::default();
        for (name, value) in &self.parameters {
            let key: ConfigKey = name
                .parse()
                .map_err(|e| NodeError::Config(format!("parameters.{name}: {e}")))?;
            configuration.set(key, *value);
        }

        let mut fees = FeeSchedule::default();
        for (name, amount) in &self.fees {
            let kind: Interaction = name
                .parse()
                .map_err(|e| NodeError::Config(format!("fees.{name}: {e}")))?;
            fees.set(kind, *amount);
        }

        Ok(Genesis {
            admin: self.genesis_admin,
            balances: self
                .genesis_balances
                .iter()
                .map(|b| (b.address, b.amount))
                .collect(),
            configuration,
            fees,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_rpc_port() {
        let cfg = NodeConfig::default();
        assert_eq!(cfg.rpc_port, DEFAULT_RPC_PORT);
        assert_eq!(cfg.rpc_bind, "127.0.0.1");
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn default_data_dir_ends_with_critter() {
        let cfg = NodeConfig::default();
        assert!(
            cfg.data_dir.ends_with("critter"),
            "data_dir should end with 'critter': {:?}",
            cfg.data_dir
        );
        assert!(cfg.default_config_path().ends_with(CONFIG_FILE_NAME));
    }

    #[test]
    fn rpc_addr_custom() {
        let cfg = NodeConfig {
            rpc_bind: "0.0.0.0".to_string(),
            rpc_port: 9999,
            ..NodeConfig::default()
        };
        assert_eq!(cfg.rpc_addr(), "0.0.0.0:9999");
    }

    #[test]
    fn load_reads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
rpc_port = 9100
log_level = "debug"
genesis_admin = "0x{admin}"

[[genesis_balances]]
address = "0x{alice}"
amount = 5000

[parameters]
virality_threshold = 40

[fees]
like = 3000
"#,
            admin = "ad".repeat(20),
            alice = "01".repeat(20),
        )
        .unwrap();

        let cfg = NodeConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.rpc_port, 9100);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.genesis_admin, Address([0xAD; 20]));
        assert_eq!(
            cfg.genesis_balances,
            vec![GenesisBalance { address: Address([1; 20]), amount: 5000 }]
        );
        // untouched fields keep their defaults
        assert_eq!(cfg.rpc_bind, "127.0.0.1");

        let genesis = cfg.genesis().unwrap();
        assert_eq!(genesis.configuration.virality_threshold(), 40);
        assert_eq!(genesis.fees.get(Interaction::Like), 3000);
        assert_eq!(genesis.balances, vec![(Address([1; 20]), 5000)]);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = NodeConfig::load(Some(dir.path().join("missing.toml").as_path())).unwrap();
        assert_eq!(cfg.event_log_capacity, 10_000);
        assert!(cfg.parameters.is_empty());
    }

    #[test]
    fn unknown_parameter_is_a_config_error() {
        let mut cfg = NodeConfig::default();
        cfg.parameters.insert("max_supply".into(), 1);
        assert!(matches!(cfg.genesis(), Err(NodeError::Config(_))));

        let mut cfg = NodeConfig::default();
        cfg.fees.insert("retweet".into(), 1);
        assert!(matches!(cfg.genesis(), Err(NodeError::Config(_))));
    }
}

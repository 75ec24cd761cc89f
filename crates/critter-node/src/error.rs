//! Node-level errors.

use thiserror::Error;

use critter_core::error::LedgerError;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("RPC server error: {0}")]
    Rpc(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<::config::ConfigError> for NodeError {
    fn from(e: ::config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

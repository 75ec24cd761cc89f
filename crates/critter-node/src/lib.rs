//! # critter-node: Node composition and JSON-RPC.
//!
//! Wraps the Critter ledger in a running node:
//! - [`node::Node`]: single-writer command processor with block numbering
//! - [`rpc`]: JSON-RPC server for external access
//! - [`config::NodeConfig`]: node configuration (file + environment)

pub mod config;
pub mod error;
pub mod node;
pub mod rpc;

pub use config::NodeConfig;
pub use error::NodeError;
pub use node::Node;
pub use rpc::start_rpc_server;

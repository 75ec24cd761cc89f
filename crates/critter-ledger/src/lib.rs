//! # critter-ledger
//! The Critter ledger engine.
//!
//! [`Ledger`] is a single-writer command processor over a staged-commit
//! state store. Every mutating call runs as one transaction: all writes go
//! to a pending overlay that is committed when the call returns `Ok` and
//! discarded when it returns `Err`.

pub mod engine;
pub mod fees;
pub mod genesis;
pub mod levels;
pub mod pool;
pub mod sentiment;
pub mod staged;
pub mod state;
mod tx;

pub use engine::Ledger;
pub use genesis::Genesis;

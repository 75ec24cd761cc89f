//! # critter-core
//! Foundation types and traits for the Critter ledger.

pub mod address;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

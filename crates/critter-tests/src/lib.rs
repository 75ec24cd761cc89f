//! Integration test suite for the Critter ledger.
//!
//! Tests under `tests/` drive a full [`critter_ledger::Ledger`] through
//! multi-account scenarios and randomized call sequences, checking fee
//! routing, scout pool accounting and atomicity of failed calls.

pub mod helpers;

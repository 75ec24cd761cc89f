//! # critter-virality: Virality scoring engine.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! - **Fixed-point logarithms**: `ln` of integer counts via a Q64.64 binary
//!   logarithm, converted to parts-per-billion.
//! - **Integer square roots**: Newton iteration on `u128`.
//! - **Score**: `round(1000 / (block_age + 1/order + 10))`, where `order`
//!   combines the like/dislike ratio, interaction volume, and resqueak
//!   amplification.

pub mod engine;
pub mod fixed;

pub use engine::{ScoreBreakdown, ViralityEngine};
pub use fixed::VIRALITY_PRECISION;

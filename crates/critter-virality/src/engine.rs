//! Virality engine implementing the [`ViralityCalculator`] trait.
//!
//! ```text
//! ratio       = sqrt(likes / dislikes)          (dislikes 0 → 1)
//! magnitude   = ln(likes + dislikes)
//! amplifier   = ln(resqueaks) / resqueaks
//! order       = ratio * magnitude * amplifier
//! coefficient = order != 0 ? 1 / order : 0
//! score       = round(1000 / (block_age + coefficient + 10))
//! ```
//!
//! A squeak with no likes or no resqueaks scores 0. All intermediate values
//! are decimal fixed-point with [`VIRALITY_PRECISION`] as the denominator;
//! every product stays below `u128::MAX` for any `u64` counts.

use critter_core::error::MathError;
use critter_core::traits::ViralityCalculator;
use critter_core::types::SentimentCounts;
use tracing::trace;

use crate::fixed::{VIRALITY_PRECISION, div_round, ln_fixed, mul_fixed, sqrt_ratio_fixed};

/// Numerator of the final score division.
const SCORE_SCALE: u128 = 1_000;

/// Constant block offset added to the denominator.
const BLOCK_OFFSET: u128 = 10;

/// Intermediate terms of one score computation, in fixed-point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreBreakdown {
    pub ratio: u128,
    pub magnitude: u128,
    pub amplifier: u128,
    pub order: u128,
    pub coefficient: u128,
    pub score: u64,
}

/// The production virality calculator.
#[derive(Debug, Clone, Default)]
pub struct ViralityEngine;

impl ViralityEngine {
    /// Create a new ViralityEngine.
    pub fn new() -> Self {
        Self
    }

    /// Compute the score along with its intermediate terms.
    ///
    /// Returns an all-zero breakdown for squeaks without likes or resqueaks.
    pub fn breakdown(
        &self,
        counts: &SentimentCounts,
        block_age: u64,
    ) -> Result<ScoreBreakdown, MathError> {
        if counts.likes == 0 || counts.resqueaks == 0 {
            return Ok(ScoreBreakdown::default());
        }
        let likes = counts.likes;
        let dislikes = counts.dislikes.max(1);
        let resqueaks = counts.resqueaks;

        let ratio = sqrt_ratio_fixed(likes, dislikes)?;
        let total = likes.checked_add(dislikes).ok_or(MathError::ArithmeticOverflow)?;
        let magnitude = ln_fixed(total)?;
        let amplifier = ln_fixed(resqueaks)? / resqueaks as u128;

        let order = mul_fixed(mul_fixed(ratio, magnitude)?, amplifier)?;
        let coefficient = if order == 0 {
            0
        } else {
            VIRALITY_PRECISION * VIRALITY_PRECISION / order
        };

        let denominator = (block_age as u128)
            .checked_mul(VIRALITY_PRECISION)
            .and_then(|age| age.checked_add(coefficient))
            .and_then(|d| d.checked_add(BLOCK_OFFSET * VIRALITY_PRECISION))
            .ok_or(MathError::ArithmeticOverflow)?;
        let score = div_round(SCORE_SCALE * VIRALITY_PRECISION, denominator)?;

        Ok(ScoreBreakdown {
            ratio,
            magnitude,
            amplifier,
            order,
            coefficient,
            score: score as u64,
        })
    }
}

impl ViralityCalculator for ViralityEngine {
    fn score(&self, counts: &SentimentCounts, block_age: u64) -> Result<u64, MathError> {
        let b = self.breakdown(counts, block_age)?;
        trace!(
            likes = counts.likes,
            dislikes = counts.dislikes,
            resqueaks = counts.resqueaks,
            block_age,
            score = b.score,
            "virality score"
        );
        Ok(b.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn engine() -> ViralityEngine {
        ViralityEngine::new()
    }

    fn counts(likes: u64, dislikes: u64, resqueaks: u64) -> SentimentCounts {
        SentimentCounts {
            dislikes,
            likes,
            resqueaks,
        }
    }

    fn score(likes: u64, dislikes: u64, resqueaks: u64, age: u64) -> u64 {
        engine().score(&counts(likes, dislikes, resqueaks), age).unwrap()
    }

    // --- eligibility gate ---

    #[test]
    fn zero_without_resqueaks() {
        assert_eq!(score(1, 0, 0, 5), 0);
        assert_eq!(score(100, 3, 0, 0), 0);
    }

    #[test]
    fn zero_without_likes() {
        assert_eq!(score(0, 0, 2, 1), 0);
        assert_eq!(score(0, 9, 9, 0), 0);
    }

    // --- recorded fixtures ---

    #[test]
    fn first_like_after_two_resqueaks() {
        // ratio 1, magnitude ln 2, amplifier ln 2 / 2 → coefficient ~4.163
        assert_eq!(score(1, 0, 2, 3), 58);
    }

    #[test]
    fn second_like_crosses_sixty() {
        assert_eq!(score(2, 1, 2, 4), 63);
        // a missing dislike is counted as one
        assert_eq!(score(2, 0, 2, 4), 63);
    }

    #[test]
    fn single_resqueak_has_zero_coefficient() {
        // ln(1) = 0 → order 0 → coefficient 0 → 1000 / 10
        assert_eq!(score(1, 0, 1, 0), 100);
        let b = engine().breakdown(&counts(5, 0, 1), 0).unwrap();
        assert_eq!(b.amplifier, 0);
        assert_eq!(b.coefficient, 0);
    }

    #[test]
    fn assorted_fixtures() {
        assert_eq!(score(1, 1, 2, 0), 71);
        assert_eq!(score(3, 0, 3, 0), 90);
        assert_eq!(score(5, 5, 5, 5), 61);
        assert_eq!(score(7, 3, 4, 2), 78);
        assert_eq!(score(10, 2, 5, 0), 95);
        assert_eq!(score(50, 0, 20, 1), 89);
        assert_eq!(score(100, 10, 50, 20), 32);
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        assert_eq!(score(1 << 32, 1, 1 << 20, 100), 9);
        assert!(engine().score(&counts(u64::MAX - 1, 1, u64::MAX), u64::MAX / 2).is_ok());
    }

    #[test]
    fn breakdown_terms() {
        let b = engine().breakdown(&counts(1, 0, 2), 3).unwrap();
        assert_eq!(b.ratio, 1_000_000_000);
        assert_eq!(b.magnitude, 693_147_180);
        assert_eq!(b.amplifier, 346_573_590);
        assert_eq!(b.score, 58);
        assert!(b.coefficient > 4_160_000_000 && b.coefficient < 4_170_000_000);
    }

    #[test]
    fn score_decays_with_age() {
        let young = score(10, 2, 5, 0);
        let old = score(10, 2, 5, 1_000);
        assert!(young > old, "{young} should exceed {old}");
        assert_eq!(score(10, 2, 5, 1_000_000), 0);
    }

    #[test]
    fn threshold_comparison_is_inclusive() {
        let e = engine();
        assert!(e.is_viral_score(60, 60));
        assert!(!e.is_viral_score(59, 60));
        assert!(e.is_viral_score(0, 0));
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn score_bounded_by_one_hundred(
            likes in 0u64..1_000_000,
            dislikes in 0u64..1_000_000,
            resqueaks in 0u64..1_000_000,
            age in 0u64..1_000_000,
        ) {
            let s = score(likes, dislikes, resqueaks, age);
            prop_assert!(s <= 100, "score {} exceeds 1000 / 10", s);
        }

        #[test]
        fn score_non_increasing_in_age(
            likes in 1u64..10_000,
            dislikes in 0u64..10_000,
            resqueaks in 1u64..10_000,
            a in 0u64..100_000,
            b in 0u64..100_000,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(score(likes, dislikes, resqueaks, lo) >= score(likes, dislikes, resqueaks, hi));
        }

        #[test]
        fn score_deterministic(
            likes in any::<u32>(),
            dislikes in any::<u32>(),
            resqueaks in any::<u32>(),
            age in any::<u32>(),
        ) {
            let c = counts(likes as u64, dislikes as u64, resqueaks as u64);
            prop_assert_eq!(engine().score(&c, age as u64), engine().score(&c, age as u64));
        }
    }
}

//! Fee arithmetic: platform take, pool split, deletion fee.
//!
//! All results are checked; an overflow aborts the transaction.

use critter_core::constants::PERCENT_PRECISION;
use critter_core::error::MathError;

/// Split `fee` into `(treasury_take, remainder)` at `take_rate` percent.
///
/// Rates above 100 are treated as 100.
pub fn split_fee(fee: u64, take_rate: u64) -> Result<(u64, u64), MathError> {
    let rate = take_rate.min(PERCENT_PRECISION);
    let take = (fee as u128 * rate as u128 / PERCENT_PRECISION as u128) as u64;
    let remainder = fee.checked_sub(take).ok_or(MathError::ArithmeticOverflow)?;
    Ok((take, remainder))
}

/// Split a remainder into `(pool_share, owner_share)`.
///
/// The pool gets the rounded-down half; odd units go to the owner.
pub fn split_remainder(remainder: u64) -> (u64, u64) {
    let pool = remainder / 2;
    (pool, remainder - pool)
}

/// Deletion fee: `(current_block + buffer - created_block) * rate_per_block`.
pub fn delete_fee(
    current_block: u64,
    buffer: u64,
    created_block: u64,
    rate_per_block: u64,
) -> Result<u64, MathError> {
    current_block
        .checked_add(buffer)
        .and_then(|b| b.checked_sub(created_block))
        .and_then(|age| age.checked_mul(rate_per_block))
        .ok_or(MathError::ArithmeticOverflow)
}

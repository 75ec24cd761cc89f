//! Integer fixed-point primitives for virality scoring.
//!
//! All computation uses integer arithmetic only. Logarithms are evaluated
//! in binary Q64.64 with the digit-by-digit squaring method and then
//! converted to decimal fixed-point with [`VIRALITY_PRECISION`] as the
//! denominator. Square roots use Newton's method on `u128`.

use critter_core::error::MathError;

/// Precision of decimal fixed-point values (parts-per-billion).
pub const VIRALITY_PRECISION: u128 = 1_000_000_000;

/// `ln(2)` in Q64.64, truncated.
const LN2_Q64: u128 = 0xB172_17F7_D1CF_79AB;

/// Number of fractional bits in the Q64.64 representation.
const Q64_FRAC_BITS: u32 = 64;

/// Compute `floor(sqrt(n))` using Newton's method.
///
/// Starts from the overestimate `2^ceil(bits/2)`; iterations then decrease
/// monotonically and the loop stops once the estimate stops decreasing.
pub fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let bits = 128 - n.leading_zeros();
    let mut x = 1u128 << bits.div_ceil(2);
    loop {
        let x_next = (x + n / x) / 2;
        if x_next >= x {
            return x;
        }
        x = x_next;
    }
}

/// `log2(n)` in Q64.64 for an integer `n >= 1`.
///
/// The integer part is the position of the highest set bit. The mantissa
/// is normalised into Q1.63 (`[1, 2)`) and squared once per fractional
/// bit; each time the square reaches 2 the bit is set and the mantissa
/// halved. 64 fractional bits are produced.
pub fn log2_q64(n: u64) -> Result<u128, MathError> {
    if n == 0 {
        return Err(MathError::LogOfZero);
    }
    let int_part = 63 - n.leading_zeros();
    // m / 2^63 is in [1, 2).
    let mut m = (n as u128) << (63 - int_part);
    let mut result = (int_part as u128) << Q64_FRAC_BITS;
    let mut bit = 1u128 << 63;
    while bit > 0 {
        // m < 2^64 so m * m < 2^128.
        m = (m * m) >> 63;
        if m >= 1u128 << 64 {
            m >>= 1;
            result |= bit;
        }
        bit >>= 1;
    }
    Ok(result)
}

/// `ln(n)` in Q64.64 for an integer `n >= 1`: `log2(n) * ln(2)`.
pub fn ln_q64(n: u64) -> Result<u128, MathError> {
    let log2 = log2_q64(n)?;
    let int_part = log2 >> Q64_FRAC_BITS;
    let frac_part = log2 & ((1u128 << Q64_FRAC_BITS) - 1);
    // int_part <= 63 and frac_part < 2^64: neither product overflows.
    Ok(int_part * LN2_Q64 + ((frac_part * LN2_Q64) >> Q64_FRAC_BITS))
}

/// Convert a Q64.64 value to decimal fixed-point, truncating.
pub fn q64_to_fixed(value: u128) -> Result<u128, MathError> {
    value
        .checked_mul(VIRALITY_PRECISION)
        .map(|v| v >> Q64_FRAC_BITS)
        .ok_or(MathError::ArithmeticOverflow)
}

/// `ln(n) * VIRALITY_PRECISION` for an integer `n >= 1`.
pub fn ln_fixed(n: u64) -> Result<u128, MathError> {
    q64_to_fixed(ln_q64(n)?)
}

/// `sqrt(num / den) * VIRALITY_PRECISION`, truncated.
///
/// `num * PRECISION^2` fits in u128 for every `u64` numerator.
pub fn sqrt_ratio_fixed(num: u64, den: u64) -> Result<u128, MathError> {
    if den == 0 {
        return Err(MathError::ArithmeticOverflow);
    }
    let scaled = (num as u128)
        .checked_mul(VIRALITY_PRECISION * VIRALITY_PRECISION)
        .ok_or(MathError::ArithmeticOverflow)?
        / den as u128;
    Ok(isqrt(scaled))
}

/// `a * b / VIRALITY_PRECISION` with overflow checking.
pub fn mul_fixed(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_mul(b)
        .map(|v| v / VIRALITY_PRECISION)
        .ok_or(MathError::ArithmeticOverflow)
}

/// `round(num / den)` with halves rounded up. `den` must be non-zero.
pub fn div_round(num: u128, den: u128) -> Result<u128, MathError> {
    let doubled = num.checked_mul(2).ok_or(MathError::ArithmeticOverflow)?;
    let adjusted = doubled.checked_add(den).ok_or(MathError::ArithmeticOverflow)?;
    let den2 = den.checked_mul(2).ok_or(MathError::ArithmeticOverflow)?;
    Ok(adjusted / den2)
}

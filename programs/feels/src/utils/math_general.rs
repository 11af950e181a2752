/// General fixed-point functions used by the fee engine: base-2 and natural
/// logarithms of Q64.64 values, computed with integer arithmetic only so that
/// every host evaluates the potential to the same bits.
use crate::constants::LN2_X64;
use crate::error::{FeelsError, FeelsResult};
use crate::utils::math_u256::mul_shr_64_signed;

/// Fractional bits resolved by the squaring loop
const LOG2_FRACTION_BITS: u32 = 48;

/// log2(x / 2^64) in signed Q64.64
pub fn log2_x64(x: u128) -> FeelsResult<i128> {
    if x == 0 {
        return Err(FeelsError::InvalidLogarithmInput);
    }
    let msb = 127 - x.leading_zeros() as i128;
    let mut result: i128 = (msb - 64) << 64;

    // Normalize to a Q63 mantissa in [1, 2)
    let mut mantissa: u128 = if msb >= 63 {
        x >> (msb - 63)
    } else {
        x << (63 - msb)
    };

    let mut bit: i128 = 1 << 63;
    for _ in 0..LOG2_FRACTION_BITS {
        mantissa = (mantissa * mantissa) >> 63;
        if mantissa >= 1u128 << 64 {
            mantissa >>= 1;
            result += bit;
        }
        bit >>= 1;
    }
    Ok(result)
}

/// ln(x / 2^64) in signed Q64.64
pub fn ln_x64(x: u128) -> FeelsResult<i128> {
    mul_shr_64_signed(log2_x64(x)?, LN2_X64)
}

/// |ln(a / b)| in Q64.64 for two Q64.64 values
pub fn abs_ln_ratio_x64(a: u128, b: u128) -> FeelsResult<u128> {
    let diff = ln_x64(a)?
        .checked_sub(ln_x64(b)?)
        .ok_or(FeelsError::MathOverflow)?;
    Ok(diff.unsigned_abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Q64;

    fn to_f64(x: i128) -> f64 {
        x as f64 / Q64 as f64
    }

    #[test]
    fn test_log2_exact_powers() {
        assert_eq!(log2_x64(Q64), Ok(0));
        assert_eq!(log2_x64(Q64 * 8), Ok(3 << 64));
        assert_eq!(log2_x64(Q64 / 4), Ok(-2 << 64));
        assert_eq!(log2_x64(0), Err(FeelsError::InvalidLogarithmInput));
    }

    #[test]
    fn test_ln_matches_float_reference() {
        for raw in [3u128, 7, 10, 12_345, 1 << 40] {
            let x = Q64 * raw / 10;
            let expected = (raw as f64 / 10.0).ln();
            let got = to_f64(ln_x64(x).unwrap());
            assert!((got - expected).abs() < 1e-9, "ln({}) = {} vs {}", raw, got, expected);
        }
    }

    #[test]
    fn test_abs_ln_ratio_is_symmetric() {
        let a = Q64 + Q64 / 100;
        let b = Q64;
        assert_eq!(abs_ln_ratio_x64(a, b), abs_ln_ratio_x64(b, a));
        let got = abs_ln_ratio_x64(a, b).unwrap() as f64 / Q64 as f64;
        assert!((got - 1.01f64.ln()).abs() < 1e-9);
    }
}

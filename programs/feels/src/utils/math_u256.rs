/// High-precision intermediate arithmetic on 256-bit integers.
/// Products of two Q64.64 values or of a token amount and a Q64.64 price do
/// not fit in 128 bits, so every such product goes through ethnum's U256 and
/// is narrowed back with an explicit overflow check.
use crate::error::{FeelsError, FeelsResult};
use ethnum::U256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

fn narrow(value: U256) -> FeelsResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(FeelsError::MathOverflow);
    }
    Ok(value.as_u128())
}

/// (a * b) / denominator with the requested rounding
pub fn mul_div(a: u128, b: u128, denominator: u128, rounding: Rounding) -> FeelsResult<u128> {
    if denominator == 0 {
        return Err(FeelsError::DivisionByZero);
    }
    let product = U256::from(a) * U256::from(b);
    let denom = U256::from(denominator);
    let quotient = product / denom;
    let result = match rounding {
        Rounding::Up if product % denom != U256::ZERO => quotient + U256::ONE,
        _ => quotient,
    };
    narrow(result)
}

/// (a * b) >> 64, rounding down
pub fn mul_shr_64(a: u128, b: u128) -> FeelsResult<u128> {
    narrow((U256::from(a) * U256::from(b)) >> 64)
}

/// (a << 64) / b, rounding down
pub fn shl_64_div(a: u128, b: u128) -> FeelsResult<u128> {
    if b == 0 {
        return Err(FeelsError::DivisionByZero);
    }
    narrow((U256::from(a) << 64) / U256::from(b))
}

/// Signed Q64 product: (a * b) >> 64 where only `a` carries a sign
pub fn mul_shr_64_signed(a: i128, b: u128) -> FeelsResult<i128> {
    let magnitude = mul_shr_64(a.unsigned_abs(), b)?;
    let magnitude = i128::try_from(magnitude).map_err(|_| FeelsError::MathOverflow)?;
    Ok(if a < 0 { -magnitude } else { magnitude })
}

/// Fee growth per unit of liquidity: (fee << 64) / liquidity
pub fn fee_growth_delta_x64(fee_amount: u64, liquidity: u128) -> FeelsResult<u128> {
    shl_64_div(fee_amount as u128, liquidity)
}

/// Token owed for a fee-growth delta: (liquidity * delta) >> 64
pub fn fees_owed_for(liquidity: u128, fee_growth_delta_x64: u128) -> FeelsResult<u64> {
    let owed = mul_shr_64(liquidity, fee_growth_delta_x64)?;
    u64::try_from(owed).map_err(|_| FeelsError::MathOverflow)
}

/// Convert an amount of token A into token B at the given sqrt price (B per A)
pub fn quote_a_to_b(amount_a: u64, sqrt_price_x64: u128) -> FeelsResult<u128> {
    let price_x64 = mul_shr_64(sqrt_price_x64, sqrt_price_x64)?;
    mul_div(amount_a as u128, price_x64, crate::constants::Q64, Rounding::Down)
}

/// Convert an amount of token B into token A at the given sqrt price (B per A)
pub fn quote_b_to_a(amount_b: u64, sqrt_price_x64: u128) -> FeelsResult<u128> {
    let price_x64 = mul_shr_64(sqrt_price_x64, sqrt_price_x64)?;
    mul_div(amount_b as u128, crate::constants::Q64, price_x64, Rounding::Down)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Q64;

    #[test]
    fn test_mul_div_rounding() {
        assert_eq!(mul_div(10, 10, 3, Rounding::Down), Ok(33));
        assert_eq!(mul_div(10, 10, 3, Rounding::Up), Ok(34));
        assert_eq!(mul_div(9, 10, 3, Rounding::Up), Ok(30));
        assert_eq!(mul_div(1, 1, 0, Rounding::Down), Err(FeelsError::DivisionByZero));
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // u128::MAX * 2 / 4 only fits because of the 256-bit product
        assert_eq!(
            mul_div(u128::MAX, 2, 4, Rounding::Down),
            Ok(u128::MAX / 2)
        );
        assert_eq!(
            mul_div(u128::MAX, 2, 1, Rounding::Down),
            Err(FeelsError::MathOverflow)
        );
    }

    #[test]
    fn test_fee_growth_round_trip() {
        let liquidity = 1_000_000u128;
        let growth = fee_growth_delta_x64(500, liquidity).unwrap();
        // Accrued back to the same liquidity, rounding down loses at most one unit
        let owed = fees_owed_for(liquidity, growth).unwrap();
        assert!(owed == 499 || owed == 500);
    }

    #[test]
    fn test_quotes_at_unit_price() {
        assert_eq!(quote_a_to_b(1_000, Q64), Ok(1_000));
        assert_eq!(quote_b_to_a(1_000, Q64), Ok(1_000));
        assert_eq!(mul_shr_64_signed(-(Q64 as i128) * 3, Q64 / 2), Ok(-(Q64 as i128) * 3 / 2));
    }
}

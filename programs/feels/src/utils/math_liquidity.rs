/// Pure liquidity math: token amounts backing a liquidity delta over a range.
use crate::error::{FeelsError, FeelsResult};
use crate::utils::math_tick::TickMath;
use orca_whirlpools_core::{try_get_amount_delta_a, try_get_amount_delta_b, U128};

/// Token A between two sqrt prices for the given liquidity
pub fn get_amount_a_delta(
    sqrt_price_1: u128,
    sqrt_price_2: u128,
    liquidity: u128,
    round_up: bool,
) -> FeelsResult<u64> {
    try_get_amount_delta_a(
        U128::from(sqrt_price_1.min(sqrt_price_2)),
        U128::from(sqrt_price_1.max(sqrt_price_2)),
        U128::from(liquidity),
        round_up,
    )
    .map_err(|_| FeelsError::MathOverflow)
}

/// Token B between two sqrt prices for the given liquidity
pub fn get_amount_b_delta(
    sqrt_price_1: u128,
    sqrt_price_2: u128,
    liquidity: u128,
    round_up: bool,
) -> FeelsResult<u64> {
    try_get_amount_delta_b(
        U128::from(sqrt_price_1.min(sqrt_price_2)),
        U128::from(sqrt_price_1.max(sqrt_price_2)),
        U128::from(liquidity),
        round_up,
    )
    .map_err(|_| FeelsError::MathOverflow)
}

/// Amounts of (A, B) that back `liquidity` over [tick_lower, tick_upper)
/// at the market's current price. Deposits round up, withdrawals round down.
pub fn amounts_for_liquidity(
    sqrt_price_x64: u128,
    current_tick: i32,
    tick_lower: i32,
    tick_upper: i32,
    liquidity: u128,
    round_up: bool,
) -> FeelsResult<(u64, u64)> {
    if liquidity == 0 {
        return Ok((0, 0));
    }
    let sqrt_lower = TickMath::sqrt_price_at_tick(tick_lower)?;
    let sqrt_upper = TickMath::sqrt_price_at_tick(tick_upper)?;

    if current_tick < tick_lower {
        Ok((get_amount_a_delta(sqrt_lower, sqrt_upper, liquidity, round_up)?, 0))
    } else if current_tick < tick_upper {
        Ok((
            get_amount_a_delta(sqrt_price_x64, sqrt_upper, liquidity, round_up)?,
            get_amount_b_delta(sqrt_lower, sqrt_price_x64, liquidity, round_up)?,
        ))
    } else {
        Ok((0, get_amount_b_delta(sqrt_lower, sqrt_upper, liquidity, round_up)?))
    }
}

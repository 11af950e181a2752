/// Tick-price conversion utilities.
/// Conversions delegate to orca_whirlpools_core; this layer adds bounds
/// validation and the tick-spacing arithmetic that addresses tick arrays.
use crate::constants::{
    MAX_SQRT_PRICE_X64, MAX_TICK, MAX_TICK_SPACING, MIN_SQRT_PRICE_X64, MIN_TICK,
    TICK_ARRAY_SIZE,
};
use crate::error::{FeelsError, FeelsResult};
use crate::require;
use orca_whirlpools_core::{sqrt_price_to_tick_index, tick_index_to_sqrt_price, U128};

pub struct TickMath;

impl TickMath {
    /// Q64.64 sqrt price at the given tick
    pub fn sqrt_price_at_tick(tick: i32) -> FeelsResult<u128> {
        require!((MIN_TICK..=MAX_TICK).contains(&tick), FeelsError::InvalidTick);
        Ok(tick_index_to_sqrt_price(tick))
    }

    /// Greatest tick whose sqrt price is <= the given sqrt price
    pub fn tick_at_sqrt_price(sqrt_price_x64: u128) -> FeelsResult<i32> {
        require!(
            (MIN_SQRT_PRICE_X64..=MAX_SQRT_PRICE_X64).contains(&sqrt_price_x64),
            FeelsError::InvalidPrice
        );
        Ok(sqrt_price_to_tick_index(U128::from(sqrt_price_x64)))
    }
}

pub fn validate_tick_spacing(tick_spacing: u16) -> FeelsResult<()> {
    require!(
        tick_spacing > 0 && tick_spacing <= MAX_TICK_SPACING,
        FeelsError::InvalidTickSpacing
    );
    Ok(())
}

/// Validate a liquidity range: ordered, in bounds and aligned to spacing
pub fn validate_tick_range(tick_lower: i32, tick_upper: i32, tick_spacing: u16) -> FeelsResult<()> {
    require!(tick_lower < tick_upper, FeelsError::InvalidTickRange);
    require!(
        tick_lower >= MIN_TICK && tick_upper <= MAX_TICK,
        FeelsError::InvalidTick
    );
    let spacing = tick_spacing as i32;
    require!(
        tick_lower % spacing == 0 && tick_upper % spacing == 0,
        FeelsError::TickNotSpaced
    );
    Ok(())
}

/// Number of tick indices covered by one array
pub fn ticks_per_array(tick_spacing: u16) -> i32 {
    TICK_ARRAY_SIZE as i32 * tick_spacing as i32
}

/// Start index of the array that contains `tick`
pub fn tick_array_start_index(tick: i32, tick_spacing: u16) -> i32 {
    let span = ticks_per_array(tick_spacing);
    tick.div_euclid(span) * span
}

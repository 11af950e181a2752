//! Position liquidity mutation
//!
//! Applies a signed liquidity delta to a position inside a work unit: the two
//! boundary ticks, the market's active liquidity when the range is live, and
//! the position's fee checkpoint, all against the same staged state.

use super::position_fees::{fee_growth_inside, settle_position_fees};
use super::unit_of_work::WorkUnit;
use crate::error::{FeelsError, FeelsResult};
use crate::host::AccountStore;
use crate::require;
use crate::state::{Market, Position, RecordKey, TickArray};
use crate::utils::{add_liquidity_delta, amounts_for_liquidity, tick_array_start_index};
use tracing::debug;

/// Token amounts moved by a liquidity change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiquidityAmounts {
    pub amount_a: u64,
    pub amount_b: u64,
}

pub fn tick_array_key(market: &Market, tick_index: i32) -> RecordKey {
    RecordKey::TickArray {
        market: market.id,
        start_tick_index: tick_array_start_index(tick_index, market.tick_spacing),
    }
}

/// Current fee growth inside the position's range
fn position_fee_growth_inside<S: AccountStore>(
    unit: &WorkUnit<'_, S>,
    market: &Market,
    position: &Position,
) -> FeelsResult<[u128; 2]> {
    let spacing = market.tick_spacing;
    let lower = *unit
        .get::<TickArray>(&tick_array_key(market, position.tick_lower))?
        .get_tick(position.tick_lower, spacing)?;
    let upper = *unit
        .get::<TickArray>(&tick_array_key(market, position.tick_upper))?
        .get_tick(position.tick_upper, spacing)?;
    Ok(fee_growth_inside(
        market.current_tick,
        position.tick_lower,
        position.tick_upper,
        &lower,
        &upper,
        market.fee_growth_global_x64,
    ))
}

/// Settle fees owed to a position without changing its liquidity
pub fn accrue_position_fees<S: AccountStore>(
    unit: &mut WorkUnit<'_, S>,
    market_key: &RecordKey,
    position_key: &RecordKey,
) -> FeelsResult<[u64; 2]> {
    let market = unit.get::<Market>(market_key)?.clone();
    let position = unit.get::<Position>(position_key)?.clone();
    if position.liquidity == 0 {
        return Ok([0, 0]);
    }
    let inside = position_fee_growth_inside(unit, &market, &position)?;
    settle_position_fees(unit.get_mut::<Position>(position_key)?, inside)
}

/// Apply `liquidity_delta` to a position and everything that depends on it.
///
/// Token amounts round up when liquidity is added and down when removed.
pub fn modify_position_liquidity<S: AccountStore>(
    unit: &mut WorkUnit<'_, S>,
    market_key: &RecordKey,
    position_key: &RecordKey,
    liquidity_delta: i128,
) -> FeelsResult<LiquidityAmounts> {
    require!(liquidity_delta != 0, FeelsError::ZeroAmount);
    let market = unit.get::<Market>(market_key)?.clone();
    let position = unit.get::<Position>(position_key)?.clone();
    let (lower, upper) = (position.tick_lower, position.tick_upper);
    let spacing = market.tick_spacing;
    let adding = liquidity_delta > 0;

    // Removal reads fee growth before a boundary tick can be cleared
    let inside_before = if adding {
        None
    } else {
        Some(position_fee_growth_inside(unit, &market, &position)?)
    };

    for (tick_index, is_upper) in [(lower, false), (upper, true)] {
        let update = unit
            .get_mut::<TickArray>(&tick_array_key(&market, tick_index))?
            .update_tick(
                tick_index,
                spacing,
                market.current_tick,
                market.fee_growth_global_x64,
                liquidity_delta,
                is_upper,
            )?;
        if update.flipped {
            debug!(tick = tick_index, initialized = adding, "tick flipped");
        }
    }

    let inside = match inside_before {
        Some(inside) => inside,
        None => position_fee_growth_inside(unit, &market, &position)?,
    };
    let position = unit.get_mut::<Position>(position_key)?;
    settle_position_fees(position, inside)?;
    position.liquidity = add_liquidity_delta(position.liquidity, liquidity_delta)?;

    if market.current_tick >= lower && market.current_tick < upper {
        let market = unit.get_mut::<Market>(market_key)?;
        market.liquidity = add_liquidity_delta(market.liquidity, liquidity_delta)?;
    }

    let (amount_a, amount_b) = amounts_for_liquidity(
        market.sqrt_price,
        market.current_tick,
        lower,
        upper,
        liquidity_delta.unsigned_abs(),
        adding,
    )?;
    Ok(LiquidityAmounts { amount_a, amount_b })
}

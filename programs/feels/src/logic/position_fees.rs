//! Position fee calculation logic
//!
//! Handles fee accrual for liquidity positions with the inside/outside
//! decomposition:
//!
//! ```text
//! inside = global - below(lower) - above(upper)
//! ```
//!
//! where `below`/`above` read a boundary tick's outside value directly or
//! as `global - outside`, depending on which side of it the price sits.
//! Accumulators are modular, so every subtraction wraps; only differences of
//! inside values are ever turned into token amounts.

use crate::error::{FeelsError, FeelsResult};
use crate::state::{Position, Tick};
use crate::utils::fees_owed_for;

/// Position fee accrual result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionFeeAccrual {
    /// Current fee growth inside the range, per side
    pub fee_growth_inside_x64: [u128; 2],
    /// Fees newly owed since the checkpoint, per side
    pub tokens_owed_increment: [u64; 2],
}

/// Fee growth inside `[tick_lower, tick_upper)` at the current tick
pub fn fee_growth_inside(
    current_tick: i32,
    tick_lower: i32,
    tick_upper: i32,
    lower: &Tick,
    upper: &Tick,
    fee_growth_global_x64: [u128; 2],
) -> [u128; 2] {
    let mut inside = [0u128; 2];
    for side in 0..2 {
        let global = fee_growth_global_x64[side];
        let below = if current_tick >= tick_lower {
            lower.fee_growth_outside_x64[side]
        } else {
            global.wrapping_sub(lower.fee_growth_outside_x64[side])
        };
        let above = if current_tick < tick_upper {
            upper.fee_growth_outside_x64[side]
        } else {
            global.wrapping_sub(upper.fee_growth_outside_x64[side])
        };
        inside[side] = global.wrapping_sub(below).wrapping_sub(above);
    }
    inside
}

/// Calculate position fee accrual against the position's checkpoint
pub fn calculate_position_fee_accrual(
    position: &Position,
    fee_growth_inside_x64: [u128; 2],
) -> FeelsResult<PositionFeeAccrual> {
    let mut increment = [0u64; 2];
    if position.liquidity > 0 {
        for side in 0..2 {
            let delta = fee_growth_inside_x64[side]
                .wrapping_sub(position.fee_growth_inside_checkpoint_x64[side]);
            increment[side] = fees_owed_for(position.liquidity, delta)?;
        }
    }
    Ok(PositionFeeAccrual {
        fee_growth_inside_x64,
        tokens_owed_increment: increment,
    })
}

/// Credit accrued fees to the position and advance its checkpoint
pub fn settle_position_fees(
    position: &mut Position,
    fee_growth_inside_x64: [u128; 2],
) -> FeelsResult<[u64; 2]> {
    let accrual = calculate_position_fee_accrual(position, fee_growth_inside_x64)?;
    for side in 0..2 {
        position.tokens_owed[side] = position.tokens_owed[side]
            .checked_add(accrual.tokens_owed_increment[side])
            .ok_or(FeelsError::MathOverflow)?;
    }
    position.fee_growth_inside_checkpoint_x64 = accrual.fee_growth_inside_x64;
    Ok(accrual.tokens_owed_increment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Q64;
    use crate::state::{Address, MarketId};

    fn tick(outside: [u128; 2]) -> Tick {
        Tick {
            fee_growth_outside_x64: outside,
            initialized: true,
            ..Tick::default()
        }
    }

    #[test]
    fn test_inside_when_price_in_range() {
        let inside = fee_growth_inside(0, -10, 10, &tick([3, 4]), &tick([5, 6]), [100, 200]);
        assert_eq!(inside, [92, 190]);
    }

    #[test]
    fn test_inside_when_price_outside_range() {
        // Below the range: inside = lower.outside - upper.outside
        let below = fee_growth_inside(-20, -10, 10, &tick([30, 0]), &tick([10, 0]), [100, 0]);
        assert_eq!(below[0], 20);
        // Above the range: inside = upper.outside - lower.outside
        let above = fee_growth_inside(20, -10, 10, &tick([10, 0]), &tick([30, 0]), [100, 0]);
        assert_eq!(above[0], 20);
    }

    #[test]
    fn test_wrapped_accumulators_still_yield_differences() {
        let lower = tick([u128::MAX - 5, 0]);
        let first = fee_growth_inside(0, -10, 10, &lower, &tick([0, 0]), [u128::MAX, 0]);
        let later = fee_growth_inside(0, -10, 10, &lower, &tick([0, 0]), [9, 0]);
        assert_eq!(later[0].wrapping_sub(first[0]), 10);
    }

    #[test]
    fn test_settle_advances_checkpoint() {
        let mut position = Position::new(MarketId::default(), 0, Address::from_seed(1), -10, 10);
        position.liquidity = 1_000;
        let owed = settle_position_fees(&mut position, [Q64 * 2, Q64 / 2]).unwrap();
        assert_eq!(owed, [2_000, 500]);
        assert_eq!(position.tokens_owed, [2_000, 500]);
        // Settling again at the same growth accrues nothing
        assert_eq!(settle_position_fees(&mut position, [Q64 * 2, Q64 / 2]), Ok([0, 0]));
        assert_eq!(position.tokens_owed, [2_000, 500]);
    }
}

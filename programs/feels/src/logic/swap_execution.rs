//! Swap execution logic
//!
//! Walks the price from the market's current position across initialized
//! ticks, one constant-liquidity segment at a time:
//! - stepping within a segment with `compute_swap_step`
//! - crossing initialized ticks (liquidity_net in, fee growth outside flipped)
//! - accruing the LP share of each step's fee into global fee growth
//!
//! The walk only reads the Market; its outcome is returned as a
//! `SwapExecutionResult` for the caller to apply. Crossed ticks are written
//! into the `TickArraySequence`, so a dry run works on a clone.

use super::engine::{compute_swap_step, fee_growth_increment, StepResult, SwapDirection};
use super::tick_array::{NextTick, TickArraySequence};
use crate::constants::{MAX_SQRT_PRICE_X64, MAX_SWAP_STEPS, MIN_SQRT_PRICE_X64};
use crate::error::{FeelsError, FeelsResult};
use crate::require;
use crate::state::{Market, RebateParams};
use crate::utils::{add_liquidity_delta, SafeMath, TickMath};
use tracing::trace;

/// Parameters for swap execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapParams {
    pub direction: SwapDirection,
    /// Gross input for exact-input swaps, output owed for exact-output swaps
    pub amount: u64,
    pub exact_input: bool,
    /// Price the swap may not move past; 0 selects the protocol bound
    pub sqrt_price_limit: u128,
    pub fee_bps: u16,
    /// Decides the share of every fee set aside for the buffer
    pub rebate: RebateParams,
}

impl SwapParams {
    /// Effective price limit, validated against the current price
    pub fn resolve_price_limit(&self, sqrt_price: u128) -> FeelsResult<u128> {
        let limit = match (self.sqrt_price_limit, self.direction) {
            (0, SwapDirection::AToB) => MIN_SQRT_PRICE_X64,
            (0, SwapDirection::BToA) => MAX_SQRT_PRICE_X64,
            (limit, _) => limit,
        };
        let valid = match self.direction {
            SwapDirection::AToB => limit >= MIN_SQRT_PRICE_X64 && limit < sqrt_price,
            SwapDirection::BToA => limit <= MAX_SQRT_PRICE_X64 && limit > sqrt_price,
        };
        require!(valid, FeelsError::InvalidPriceLimit);
        Ok(limit)
    }
}

/// One constant-liquidity price segment actually traversed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSegment {
    pub sqrt_start: u128,
    pub sqrt_end: u128,
    pub liquidity: u128,
}

/// Swap state tracking during execution
#[derive(Debug)]
struct SwapState {
    amount_remaining: u64,
    amount_calculated: u64,
    sqrt_price: u128,
    current_tick: i32,
    liquidity: u128,
    fee_growth_global_x64: [u128; 2],
    total_fee: u64,
    buffer_fee: u64,
    steps_taken: usize,
}

/// Final swap execution result for transfer and fee processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapExecutionResult {
    /// Gross input paid by the trader, fee included
    pub amount_in: u64,
    pub amount_out: u64,
    pub total_fee: u64,
    /// Part of `total_fee` that goes to the buffer
    pub buffer_fee: u64,
    pub start_tick: i32,
    pub final_tick: i32,
    pub final_sqrt_price: u128,
    pub final_liquidity: u128,
    pub fee_growth_global_x64: [u128; 2],
    pub segments: Vec<PathSegment>,
    pub ticks_crossed: Vec<i32>,
}

impl SwapState {
    fn apply_step(
        &mut self,
        step: &StepResult,
        exact_input: bool,
        rebate: &RebateParams,
        input_side: usize,
    ) -> FeelsResult<()> {
        let gross = step.gross_in()?;
        if exact_input {
            self.amount_remaining = self.amount_remaining.safe_sub(gross)?;
            self.amount_calculated = self.amount_calculated.safe_add(step.amount_out)?;
        } else {
            self.amount_remaining = self.amount_remaining.safe_sub(step.amount_out)?;
            self.amount_calculated = self.amount_calculated.safe_add(gross)?;
        }

        let (to_buffer, to_lp) = rebate.split_fee(step.fee);
        let growth = fee_growth_increment(to_lp, self.liquidity)?;
        // Fee growth is a modular accumulator, consumers only use differences
        self.fee_growth_global_x64[input_side] =
            self.fee_growth_global_x64[input_side].wrapping_add(growth);
        self.total_fee = self.total_fee.safe_add(step.fee)?;
        self.buffer_fee = self.buffer_fee.safe_add(to_buffer)?;
        Ok(())
    }
}

/// Execute the swap walk against `market` and the loaded tick arrays.
pub fn execute_swap_steps(
    market: &Market,
    tick_arrays: &mut TickArraySequence,
    params: &SwapParams,
) -> FeelsResult<SwapExecutionResult> {
    require!(params.amount > 0, FeelsError::ZeroAmount);
    let direction = params.direction;
    let a_to_b = direction.is_a_to_b();
    let input_side = if a_to_b { 0 } else { 1 };
    let price_limit = params.resolve_price_limit(market.sqrt_price)?;

    let mut state = SwapState {
        amount_remaining: params.amount,
        amount_calculated: 0,
        sqrt_price: market.sqrt_price,
        current_tick: market.current_tick,
        liquidity: market.liquidity,
        fee_growth_global_x64: market.fee_growth_global_x64,
        total_fee: 0,
        buffer_fee: 0,
        steps_taken: 0,
    };
    let mut segments = Vec::new();
    let mut ticks_crossed = Vec::new();

    while state.amount_remaining > 0 && state.sqrt_price != price_limit {
        state.steps_taken += 1;
        require!(state.steps_taken <= MAX_SWAP_STEPS, FeelsError::TooManySteps);

        let next = tick_arrays.next_initialized_tick(state.current_tick);
        let (next_tick, initialized) = match next {
            NextTick::Initialized(tick) => (tick, true),
            NextTick::EndOfCoverage(tick) => (tick, false),
        };
        let sqrt_tick = TickMath::sqrt_price_at_tick(next_tick)?;

        if !initialized {
            let ahead = match direction {
                SwapDirection::AToB => sqrt_tick < state.sqrt_price,
                SwapDirection::BToA => sqrt_tick > state.sqrt_price,
            };
            // Nothing to trade against and nothing known ahead
            if state.liquidity == 0 || !ahead {
                if state.liquidity > 0 {
                    return Err(FeelsError::NoLiquidityInTickArrays);
                }
                break;
            }
        }

        let sqrt_target = match direction {
            SwapDirection::AToB => sqrt_tick.max(price_limit),
            SwapDirection::BToA => sqrt_tick.min(price_limit),
        };

        let sqrt_start = state.sqrt_price;
        if state.liquidity == 0 {
            // Empty gap: jump to the next initialized tick at no cost
            state.sqrt_price = sqrt_target;
        } else {
            let step = compute_swap_step(
                state.sqrt_price,
                sqrt_target,
                state.liquidity,
                state.amount_remaining,
                params.fee_bps,
                direction,
                params.exact_input,
            )?;
            state.apply_step(&step, params.exact_input, &params.rebate, input_side)?;
            state.sqrt_price = step.sqrt_next;
            if step.sqrt_next != sqrt_start {
                segments.push(PathSegment {
                    sqrt_start,
                    sqrt_end: step.sqrt_next,
                    liquidity: state.liquidity,
                });
            }
        }

        if state.sqrt_price == sqrt_tick {
            if initialized {
                let tick = tick_arrays.tick_mut(next_tick)?;
                tick.flip_fee_growth_outside(state.fee_growth_global_x64);
                let liquidity_net = if a_to_b {
                    tick.liquidity_net.checked_neg().ok_or(FeelsError::MathOverflow)?
                } else {
                    tick.liquidity_net
                };
                state.liquidity = add_liquidity_delta(state.liquidity, liquidity_net)?;
                ticks_crossed.push(next_tick);
                trace!(tick = next_tick, liquidity = state.liquidity, "crossed tick");
                state.current_tick = if a_to_b { next_tick - 1 } else { next_tick };
            } else {
                state.current_tick = TickMath::tick_at_sqrt_price(state.sqrt_price)?;
                if state.amount_remaining > 0 && state.sqrt_price != price_limit {
                    return Err(FeelsError::NoLiquidityInTickArrays);
                }
            }
        } else if state.sqrt_price != sqrt_start {
            state.current_tick = TickMath::tick_at_sqrt_price(state.sqrt_price)?;
        }
    }

    let (amount_in, amount_out) = if params.exact_input {
        (params.amount - state.amount_remaining, state.amount_calculated)
    } else {
        require!(state.amount_remaining == 0, FeelsError::InsufficientLiquidity);
        (state.amount_calculated, params.amount)
    };
    require!(amount_in > 0, FeelsError::InsufficientLiquidity);

    Ok(SwapExecutionResult {
        amount_in,
        amount_out,
        total_fee: state.total_fee,
        buffer_fee: state.buffer_fee,
        start_tick: market.current_tick,
        final_tick: state.current_tick,
        final_sqrt_price: state.sqrt_price,
        final_liquidity: state.liquidity,
        fee_growth_global_x64: state.fee_growth_global_x64,
        segments,
        ticks_crossed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Q64;
    use crate::state::{
        DomainMultipliers, FallbackPolicy, FallbackState, FeeModel, FeePolicy, FlowParams,
        FlowState, MarketId, ReentrancyStatus, RiskClass, TickArray,
    };

    const SPACING: u16 = 10;
    const L: u128 = 1_000_000;

    fn market() -> Market {
        Market {
            id: MarketId::default(),
            authority: Default::default(),
            tick_spacing: SPACING,
            sqrt_price: Q64,
            current_tick: 0,
            liquidity: L,
            fee_growth_global_x64: [0, 0],
            base_fee_bps: 25,
            risk_class: RiskClass::Normal,
            fee_policy: FeePolicy {
                model: FeeModel::DisplacementFlow(FlowParams::default()),
                fallback: FallbackPolicy::default(),
            },
            flow: FlowState::default(),
            fallback: FallbackState::default(),
            domain: DomainMultipliers::default(),
            is_paused: false,
            reentrancy: ReentrancyStatus::Unlocked,
            next_position_id: 0,
            open_positions: 0,
            last_update_ts: 0,
        }
    }

    /// One position of `L` over [-100, 100]
    fn sequence(direction: SwapDirection) -> TickArraySequence {
        let mut lower = TickArray::new(MarketId::default(), -640);
        lower.update_tick(-100, SPACING, 0, [0, 0], L as i128, false).unwrap();
        let mut upper = TickArray::new(MarketId::default(), 0);
        upper.update_tick(100, SPACING, 0, [0, 0], L as i128, true).unwrap();
        let probed = TickArraySequence::probe_starts(0, SPACING, direction);
        TickArraySequence::new(
            MarketId::default(),
            SPACING,
            direction,
            probed,
            vec![lower, upper],
        )
        .unwrap()
    }

    fn params(direction: SwapDirection, amount: u64, exact_input: bool) -> SwapParams {
        SwapParams {
            direction,
            amount,
            exact_input,
            sqrt_price_limit: 0,
            fee_bps: 25,
            rebate: RebateParams {
                buffer_fee_share_bps: 1000,
                ..RebateParams::default()
            },
        }
    }

    #[test]
    fn test_small_exact_input_stays_in_range() {
        let mut ticks = sequence(SwapDirection::AToB);
        let result =
            execute_swap_steps(&market(), &mut ticks, &params(SwapDirection::AToB, 1_000, true))
                .unwrap();
        assert_eq!(result.amount_in, 1_000);
        assert!(result.amount_out > 0 && result.amount_out < 1_000);
        assert!(result.total_fee >= 3);
        assert!(result.buffer_fee <= result.total_fee);
        assert!(result.ticks_crossed.is_empty());
        assert!(result.final_tick < 0 && result.final_tick > -100);
        assert!(result.final_sqrt_price < Q64);
        assert_eq!(result.final_liquidity, L);
        assert!(result.fee_growth_global_x64[0] > 0);
        assert_eq!(result.fee_growth_global_x64[1], 0);
        assert_eq!(result.segments.len(), 1);
    }

    #[test]
    fn test_exact_input_past_range_fills_partially() {
        let mut ticks = sequence(SwapDirection::AToB);
        let result = execute_swap_steps(
            &market(),
            &mut ticks,
            &params(SwapDirection::AToB, 1_000_000_000, true),
        )
        .unwrap();
        assert!(result.amount_in < 1_000_000_000);
        assert_eq!(result.ticks_crossed, vec![-100]);
        assert_eq!(result.final_liquidity, 0);
        // Crossing down across -100 leaves the market just below it
        assert_eq!(result.final_tick, -101);
        let crossed = ticks.tick_mut(-100).unwrap();
        assert_eq!(crossed.fee_growth_outside_x64, result.fee_growth_global_x64);
    }

    #[test]
    fn test_exact_output_beyond_liquidity_fails() {
        let mut ticks = sequence(SwapDirection::BToA);
        let err = execute_swap_steps(
            &market(),
            &mut ticks,
            &params(SwapDirection::BToA, 10_000, false),
        )
        .unwrap_err();
        assert_eq!(err, FeelsError::InsufficientLiquidity);
    }

    #[test]
    fn test_exact_output_charges_fee_on_top() {
        let mut ticks = sequence(SwapDirection::BToA);
        let result =
            execute_swap_steps(&market(), &mut ticks, &params(SwapDirection::BToA, 500, false))
                .unwrap();
        assert_eq!(result.amount_out, 500);
        assert!(result.amount_in > 500);
        assert!(result.final_tick >= 0);
    }

    #[test]
    fn test_price_limit_stops_the_walk() {
        let mut ticks = sequence(SwapDirection::AToB);
        let limit = TickMath::sqrt_price_at_tick(-50).unwrap();
        let mut swap = params(SwapDirection::AToB, 1_000_000_000, true);
        swap.sqrt_price_limit = limit;
        let result = execute_swap_steps(&market(), &mut ticks, &swap).unwrap();
        assert_eq!(result.final_sqrt_price, limit);
        assert_eq!(result.final_tick, -50);
        assert!(result.ticks_crossed.is_empty());
    }

    #[test]
    fn test_limit_on_wrong_side_rejected() {
        let mut ticks = sequence(SwapDirection::AToB);
        let mut swap = params(SwapDirection::AToB, 1_000, true);
        swap.sqrt_price_limit = Q64 + 1;
        assert_eq!(
            execute_swap_steps(&market(), &mut ticks, &swap),
            Err(FeelsError::InvalidPriceLimit)
        );
    }
}

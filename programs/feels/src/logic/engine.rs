//! CLMM Engine - Core swap stepping logic
//!
//! Provides the single-segment stepper shared by the swap loop and the
//! quote path. A segment runs from the current price toward one target
//! price with constant active liquidity.
//!
//! Rounding
//! --------
//! - amounts paid into the pool round UP, amounts paid out round DOWN
//! - the fee is taken from input: gross = ceil(net * 10000 / (10000 - fee))
//! - next-price helpers from orca_whirlpools_core round in the pool's favour

use crate::constants::BPS_DENOMINATOR;
use crate::error::{FeelsError, FeelsResult};
use crate::utils::{fee_growth_delta_x64, get_amount_a_delta, get_amount_b_delta};
use orca_whirlpools_core::{try_get_next_sqrt_price_from_a, try_get_next_sqrt_price_from_b, U128};

/// Swap direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    /// Token A in, token B out, price moves down
    AToB,
    /// Token B in, token A out, price moves up
    BToA,
}

impl SwapDirection {
    pub fn from_a_to_b(a_to_b: bool) -> Self {
        if a_to_b {
            SwapDirection::AToB
        } else {
            SwapDirection::BToA
        }
    }

    pub fn is_a_to_b(self) -> bool {
        self == SwapDirection::AToB
    }
}

/// Simplified outcome of a swap step for cleaner outer logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Reached the target price
    ReachedTarget,
    /// Stopped inside the segment because the amount ran out
    PartialByAmount,
}

/// Result of one swap step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// Input that moved the price, fee excluded
    pub amount_in: u64,
    pub amount_out: u64,
    /// Fee charged on top of `amount_in`, in the input token
    pub fee: u64,
    pub sqrt_next: u128,
    pub outcome: StepOutcome,
}

impl StepResult {
    pub fn gross_in(&self) -> FeelsResult<u64> {
        self.amount_in
            .checked_add(self.fee)
            .ok_or(FeelsError::MathOverflow)
    }
}

/// Input needed to move between two prices. `None` when the amount does not
/// fit in u64, which the stepper treats as "target out of reach".
fn input_between(direction: SwapDirection, from: u128, to: u128, liquidity: u128) -> Option<u64> {
    match direction {
        SwapDirection::AToB => get_amount_a_delta(from, to, liquidity, true).ok(),
        SwapDirection::BToA => get_amount_b_delta(from, to, liquidity, true).ok(),
    }
}

fn output_between(direction: SwapDirection, from: u128, to: u128, liquidity: u128) -> Option<u64> {
    match direction {
        SwapDirection::AToB => get_amount_b_delta(from, to, liquidity, false).ok(),
        SwapDirection::BToA => get_amount_a_delta(from, to, liquidity, false).ok(),
    }
}

/// Price reached after moving `amount` through the pool.
///
/// With `specified_input` the amount is the input token; otherwise it is
/// the output token, which lives on the other side of the pair.
fn next_sqrt_price(
    direction: SwapDirection,
    sqrt_price: u128,
    liquidity: u128,
    amount: u64,
    specified_input: bool,
) -> FeelsResult<u128> {
    let moves_a = direction.is_a_to_b() == specified_input;
    let next = if moves_a {
        try_get_next_sqrt_price_from_a(
            U128::from(sqrt_price),
            U128::from(liquidity),
            amount,
            specified_input,
        )
    } else {
        try_get_next_sqrt_price_from_b(
            U128::from(sqrt_price),
            U128::from(liquidity),
            amount,
            specified_input,
        )
    };
    next.map(u128::from).map_err(|_| FeelsError::MathOverflow)
}

/// Fee owed on a net input amount: ceil(net * fee / (10000 - fee))
pub fn fee_on_net(amount_net: u64, fee_bps: u16) -> FeelsResult<u64> {
    let fee_bps = fee_bps as u128;
    let denom = (BPS_DENOMINATOR as u128)
        .checked_sub(fee_bps)
        .filter(|d| *d > 0)
        .ok_or(FeelsError::DivisionByZero)?;
    let fee = (amount_net as u128 * fee_bps).div_ceil(denom);
    u64::try_from(fee).map_err(|_| FeelsError::MathOverflow)
}

/// Compute one swap step between `sqrt_current` and `sqrt_target`.
///
/// For exact input `amount_remaining` is the gross input still to spend; for
/// exact output it is the output still owed. Liquidity must be non-zero,
/// zero-liquidity gaps are skipped by the caller without calling here.
pub fn compute_swap_step(
    sqrt_current: u128,
    sqrt_target: u128,
    liquidity: u128,
    amount_remaining: u64,
    fee_bps: u16,
    direction: SwapDirection,
    exact_input: bool,
) -> FeelsResult<StepResult> {
    if liquidity == 0 {
        return Err(FeelsError::DivisionByZero);
    }

    let sqrt_next = if exact_input {
        // Net budget after the fee: floor(gross * (10000 - fee) / 10000)
        let net_budget = (amount_remaining as u128
            * (BPS_DENOMINATOR as u128 - fee_bps as u128)
            / BPS_DENOMINATOR as u128) as u64;
        match input_between(direction, sqrt_current, sqrt_target, liquidity) {
            Some(to_target) if net_budget >= to_target => sqrt_target,
            _ => next_sqrt_price(direction, sqrt_current, liquidity, net_budget, true)?,
        }
    } else {
        match output_between(direction, sqrt_current, sqrt_target, liquidity) {
            Some(to_target) if amount_remaining >= to_target => sqrt_target,
            _ => next_sqrt_price(direction, sqrt_current, liquidity, amount_remaining, false)?,
        }
    };

    // Never step past the target, whatever rounding the helpers applied
    let sqrt_next = match direction {
        SwapDirection::AToB => sqrt_next.max(sqrt_target),
        SwapDirection::BToA => sqrt_next.min(sqrt_target),
    };
    let reached = sqrt_next == sqrt_target;

    let amount_in = input_between(direction, sqrt_current, sqrt_next, liquidity)
        .ok_or(FeelsError::MathOverflow)?;
    let mut amount_out = output_between(direction, sqrt_current, sqrt_next, liquidity)
        .ok_or(FeelsError::MathOverflow)?;
    if !exact_input {
        amount_out = amount_out.min(amount_remaining);
    }

    let fee = if exact_input && !reached {
        // The remainder of the budget is all fee
        amount_remaining
            .checked_sub(amount_in)
            .ok_or(FeelsError::MathUnderflow)?
    } else {
        fee_on_net(amount_in, fee_bps)?
    };

    Ok(StepResult {
        amount_in,
        amount_out,
        fee,
        sqrt_next,
        outcome: if reached {
            StepOutcome::ReachedTarget
        } else {
            StepOutcome::PartialByAmount
        },
    })
}

/// Fee growth increment for one segment: fee << 64 / liquidity
pub fn fee_growth_increment(fee_amount: u64, liquidity: u128) -> FeelsResult<u128> {
    if liquidity == 0 || fee_amount == 0 {
        return Ok(0);
    }
    fee_growth_delta_x64(fee_amount, liquidity)
}

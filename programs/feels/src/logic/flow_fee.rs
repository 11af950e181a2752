//! Displacement / flow fee model
//!
//! Price-only model:
//!
//! ```text
//! f = clamp(f_min, f_base + k_disp·g(δ_eff) + k_flow·h(|q|)·d, f_max)
//! ```
//!
//! - δ_eff = max(0, |tick - twap_tick| - ε), g(x) = x / (x + S)
//! - q is a signed EWMA of token-A notional flow, h(x) = x / (x + Q)
//! - d = +1 for trades away from the TWAP, -γ for trades toward it
//!
//! The EWMA decays with a half-life between updates. Whole half-lives are
//! applied as shifts, the remaining fraction with a cubic expansion of 2^-x.

use crate::constants::{BPS_DENOMINATOR, LN2_X64};
use crate::state::{FlowParams, FlowState};
use fixed::types::I64F64;

fn bps(value: u16) -> I64F64 {
    I64F64::from_num(value) / I64F64::from_num(BPS_DENOMINATOR)
}

/// 2^(-elapsed / half_life)
fn decay_factor(elapsed: i64, half_life_secs: u32) -> I64F64 {
    if elapsed <= 0 {
        return I64F64::ONE;
    }
    let half_life = half_life_secs.max(1) as i64;
    let halvings = elapsed / half_life;
    if halvings >= 64 {
        return I64F64::ZERO;
    }
    let fraction = I64F64::from_num(elapsed % half_life) / I64F64::from_num(half_life);
    let x = fraction * I64F64::from_bits(LN2_X64 as i128);
    let x2 = x * x;
    let partial = I64F64::ONE - x + x2 / I64F64::from_num(2) - x2 * x / I64F64::from_num(6);
    partial >> halvings as u32
}

/// Flow EWMA decayed to `now`, without recording a trade
pub fn decayed_flow(state: &FlowState, params: &FlowParams, now: i64) -> I64F64 {
    let q = I64F64::from_bits(state.signed_flow_ewma_bits);
    q.saturating_mul(decay_factor(now - state.last_update_ts, params.half_life_secs))
}

/// Fold one trade into the flow EWMA: q ← decay(q)·(1 - α) + α·sample.
///
/// `sample` is signed token-A notional, positive when the trader buys A.
/// The EWMA is a policy signal and saturates instead of failing the trade.
pub fn record_flow(state: &mut FlowState, params: &FlowParams, sample: i128, now: i64) {
    let q = decayed_flow(state, params, now);
    let denom = I64F64::from_num(BPS_DENOMINATOR);
    let alpha = I64F64::from_num(params.ewma_alpha_bps);
    let kept = (q / denom).saturating_mul(denom - alpha);
    let added = (I64F64::saturating_from_num(sample) / denom).saturating_mul(alpha);
    state.signed_flow_ewma_bits = kept.saturating_add(added).to_bits();
    state.last_update_ts = now;
}

/// Signed token-A notional of a trade: selling A is negative, buying A positive
pub fn trade_sample(a_to_b: bool, amount_in: u64, amount_out: u64) -> i128 {
    if a_to_b {
        -(amount_in as i128)
    } else {
        amount_out as i128
    }
}

/// Whether a trade pushes the price further from the TWAP. At equilibrium
/// every trade moves away.
pub fn is_away_from_twap(current_tick: i32, twap_tick: i32, a_to_b: bool) -> bool {
    if current_tick > twap_tick {
        !a_to_b
    } else if current_tick < twap_tick {
        a_to_b
    } else {
        true
    }
}

/// Instantaneous fee in bps under the flow model
pub fn flow_fee_bps(
    params: &FlowParams,
    base_fee_bps: u16,
    current_tick: i32,
    twap_tick: i32,
    flow: I64F64,
    away: bool,
) -> u16 {
    let displacement = (current_tick as i64 - twap_tick as i64).unsigned_abs();
    let effective = displacement.saturating_sub(params.deadband_ticks as u64);
    let effective = I64F64::from_num(effective);
    let g = effective
        .checked_div(effective + I64F64::from_num(params.displacement_half_saturation))
        .unwrap_or(I64F64::ZERO);

    let magnitude = flow.saturating_abs();
    let h = magnitude
        .checked_add(I64F64::from_num(params.flow_half_saturation))
        .map(|denom| magnitude / denom)
        .unwrap_or(I64F64::ONE);

    let direction = if away {
        I64F64::ONE
    } else {
        -bps(params.toward_discount_bps)
    };

    let fee = I64F64::from_num(base_fee_bps)
        + I64F64::from_num(params.k_disp_bps) * g
        + I64F64::from_num(params.k_flow_bps) * h * direction;
    let fee = fee
        .round()
        .clamp(
            I64F64::from_num(params.f_min_bps),
            I64F64::from_num(params.f_max_bps),
        );
    fee.to_num::<u16>()
}

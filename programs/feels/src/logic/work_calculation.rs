//! Work calculation for the potential fee model
//!
//! The market state is summarized by three domain values: spot S, time T and
//! leverage L. Its potential is
//!
//! ```text
//! V = -ŵ_s·ln(S) - ŵ_t·ln(T) - ŵ_l·ln(L)
//! ```
//!
//! with normalized weights. Spot is measured against the TWAP,
//! S = exp(-|ln P - ln P_twap|), so -ln S = 2·|ln √P - ln √P_twap|. T and L
//! are the Market's domain multipliers; a swap does not move them.
//!
//! Work for a transition is W = V(end) - V(start), accumulated per path
//! segment into uphill and downhill totals.

use super::swap_execution::PathSegment;
use crate::constants::{BPS_DENOMINATOR, MAX_SURCHARGE_BPS};
use crate::error::{FeelsError, FeelsResult};
use crate::state::{DomainMultipliers, PotentialParams};
use crate::utils::{abs_ln_ratio_x64, ln_x64, mul_div, mul_shr_64, mul_shr_64_signed, Rounding};

/// Accumulated work over a path, Q64.64
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkResult {
    /// Σ max(W_i, 0)
    pub work_up_x64: u128,
    /// Σ max(-W_i, 0)
    pub work_down_x64: u128,
}

impl WorkResult {
    pub fn net_x64(&self) -> i128 {
        self.work_up_x64 as i128 - self.work_down_x64 as i128
    }
}

/// Potential at a price for fixed domain multipliers, Q64.64
pub fn potential_x64(
    sqrt_price: u128,
    sqrt_twap: u128,
    domain: &DomainMultipliers,
    weights_x64: &[u128; 3],
) -> FeelsResult<i128> {
    let spot = abs_ln_ratio_x64(sqrt_price, sqrt_twap)?
        .checked_mul(2)
        .ok_or(FeelsError::MathOverflow)?;
    let spot = i128::try_from(spot).map_err(|_| FeelsError::MathOverflow)?;
    let time = ln_x64(domain.time_x64)?
        .checked_neg()
        .ok_or(FeelsError::MathOverflow)?;
    let leverage = ln_x64(domain.leverage_x64)?
        .checked_neg()
        .ok_or(FeelsError::MathOverflow)?;

    [
        mul_shr_64_signed(spot, weights_x64[0])?,
        mul_shr_64_signed(time, weights_x64[1])?,
        mul_shr_64_signed(leverage, weights_x64[2])?,
    ]
    .into_iter()
    .try_fold(0i128, |acc, term| acc.checked_add(term))
    .ok_or(FeelsError::MathOverflow)
}

/// Uphill and downhill work along the traversed segments.
///
/// A segment that passes through the TWAP price is split there, so moving
/// back to equilibrium and beyond counts as downhill then uphill work.
pub fn calculate_path_work(
    segments: &[PathSegment],
    sqrt_twap: u128,
    domain: &DomainMultipliers,
    params: &PotentialParams,
) -> FeelsResult<WorkResult> {
    let weights = params.normalized_weights_x64()?;
    let mut result = WorkResult::default();

    for segment in segments {
        let (low, high) = if segment.sqrt_start < segment.sqrt_end {
            (segment.sqrt_start, segment.sqrt_end)
        } else {
            (segment.sqrt_end, segment.sqrt_start)
        };
        let (pieces, count) = if low < sqrt_twap && sqrt_twap < high {
            (
                [(segment.sqrt_start, sqrt_twap), (sqrt_twap, segment.sqrt_end)],
                2,
            )
        } else {
            ([(segment.sqrt_start, segment.sqrt_end); 2], 1)
        };

        for &(from, to) in &pieces[..count] {
            let work = potential_x64(to, sqrt_twap, domain, &weights)?
                .checked_sub(potential_x64(from, sqrt_twap, domain, &weights)?)
                .ok_or(FeelsError::MathOverflow)?;
            if work >= 0 {
                result.work_up_x64 = result
                    .work_up_x64
                    .checked_add(work as u128)
                    .ok_or(FeelsError::MathOverflow)?;
            } else {
                result.work_down_x64 = result
                    .work_down_x64
                    .checked_add(work.unsigned_abs())
                    .ok_or(FeelsError::MathOverflow)?;
            }
        }
    }
    Ok(result)
}

/// dyn_bps = W_up · Π_in / amount_in · 10000 with Π_in = amount_in · λ,
/// clamped to [0, MAX_SURCHARGE_BPS]. The clamp saturates, never fails.
pub fn surcharge_bps(work_up_x64: u128, params: &PotentialParams) -> u16 {
    mul_shr_64(work_up_x64, params.work_price_bps as u128)
        .map(|bps| bps.min(MAX_SURCHARGE_BPS as u128) as u16)
        .unwrap_or(MAX_SURCHARGE_BPS)
}

/// Output gained over a trade filled at the TWAP price after base fee only.
pub fn price_improvement(
    amount_in: u64,
    amount_out: u64,
    base_fee_bps: u16,
    sqrt_twap: u128,
    a_to_b: bool,
) -> FeelsResult<u64> {
    let net_in = mul_div(
        amount_in as u128,
        BPS_DENOMINATOR as u128 - base_fee_bps as u128,
        BPS_DENOMINATOR as u128,
        Rounding::Down,
    )?;
    let net_in = u64::try_from(net_in).map_err(|_| FeelsError::MathOverflow)?;
    let baseline = if a_to_b {
        crate::utils::quote_a_to_b(net_in, sqrt_twap)?
    } else {
        crate::utils::quote_b_to_a(net_in, sqrt_twap)?
    };
    Ok((amount_out as u128).saturating_sub(baseline) as u64)
}

/// Rebate owed for downhill work, before buffer capacity is applied:
/// min(η · W_down · Π_out, κ · price_improvement), Π_out = amount_out · λ.
pub fn rebate_amount(
    work_down_x64: u128,
    amount_out: u64,
    improvement: u64,
    params: &PotentialParams,
) -> FeelsResult<u64> {
    if work_down_x64 == 0 || amount_out == 0 {
        return Ok(0);
    }
    let bps = BPS_DENOMINATOR as u128;
    let priced = mul_div(
        amount_out as u128,
        params.work_price_bps as u128,
        bps,
        Rounding::Down,
    )?;
    let raw = mul_div(
        mul_shr_64(priced, work_down_x64)?,
        params.eta_bps as u128,
        bps,
        Rounding::Down,
    )?;
    let kappa_cap = mul_div(
        improvement as u128,
        params.kappa_bps as u128,
        bps,
        Rounding::Down,
    )?;
    Ok(raw.min(kappa_cap).min(u64::MAX as u128) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::TickMath;

    fn segment(from_tick: i32, to_tick: i32) -> PathSegment {
        PathSegment {
            sqrt_start: TickMath::sqrt_price_at_tick(from_tick).unwrap(),
            sqrt_end: TickMath::sqrt_price_at_tick(to_tick).unwrap(),
            liquidity: 1,
        }
    }

    #[test]
    fn test_moving_away_is_uphill() {
        let twap = TickMath::sqrt_price_at_tick(0).unwrap();
        let params = PotentialParams::default();
        let work =
            calculate_path_work(&[segment(0, 100)], twap, &DomainMultipliers::default(), &params)
                .unwrap();
        assert_eq!(work.work_down_x64, 0);
        // ŵ_s · 2 · ln(√1.0001^100) ≈ 0.6 · 0.0100
        let got = work.work_up_x64 as f64 / 2f64.powi(64);
        assert!((got - 0.6 * 100.0 * 1.0001f64.ln()).abs() < 1e-6);
    }

    #[test]
    fn test_crossing_twap_splits_work() {
        let twap = TickMath::sqrt_price_at_tick(0).unwrap();
        let params = PotentialParams::default();
        let work =
            calculate_path_work(&[segment(50, -50)], twap, &DomainMultipliers::default(), &params)
                .unwrap();
        assert!(work.work_up_x64 > 0 && work.work_down_x64 > 0);
        // Symmetric around the TWAP up to log approximation error
        assert!(work.net_x64().abs() < (work.work_up_x64 / 1_000_000) as i128);
    }

    #[test]
    fn test_domain_terms_cancel() {
        let twap = TickMath::sqrt_price_at_tick(0).unwrap();
        let params = PotentialParams::default();
        let domain = DomainMultipliers {
            time_x64: 3 << 64,
            leverage_x64: 1 << 62,
        };
        let plain =
            calculate_path_work(&[segment(0, 80)], twap, &DomainMultipliers::default(), &params)
                .unwrap();
        let scaled = calculate_path_work(&[segment(0, 80)], twap, &domain, &params).unwrap();
        assert_eq!(plain, scaled);
    }

    #[test]
    fn test_surcharge_saturates() {
        let params = PotentialParams::default();
        assert_eq!(surcharge_bps(0, &params), 0);
        assert_eq!(surcharge_bps(u128::MAX, &params), MAX_SURCHARGE_BPS);
        // W_up = 0.01 at λ = 1 gives 100 bps
        assert_eq!(surcharge_bps((1u128 << 64) / 100 + 1, &params), 100);
    }

    #[test]
    fn test_rebate_clamped_by_kappa() {
        let params = PotentialParams::default();
        let w = (1u128 << 64) / 10;
        // η · W · out · λ = 0.5 · 0.1 · 1_000_000 = 50_000
        assert_eq!(rebate_amount(w, 1_000_000, u64::MAX / 2, &params), Ok(49_999));
        // κ · improvement = 0.5 · 800
        assert_eq!(rebate_amount(w, 1_000_000, 800, &params), Ok(400));
        assert_eq!(rebate_amount(0, 1_000_000, 800, &params), Ok(0));
    }

    #[test]
    fn test_price_improvement_against_twap() {
        let twap = TickMath::sqrt_price_at_tick(0).unwrap();
        // 10_000 in at 25 bps base fee is worth 9_975 at the TWAP
        assert_eq!(price_improvement(10_000, 10_100, 25, twap, true), Ok(125));
        assert_eq!(price_improvement(10_000, 9_000, 25, twap, false), Ok(0));
    }
}

//! Centralized swap pricing
//!
//! Selects the fee for a swap from the market's fee policy and runs the swap
//! walk at that fee. The policy is a closed enum, dispatched once here:
//!
//! - Potential: simulate at the base fee, derive the surcharge from the uphill
//!   work of that path, then execute at `base + surcharge`. Downhill work of
//!   the executed path earns a rebate.
//! - DisplacementFlow: fee from TWAP displacement and the flow EWMA, no rebate.
//! - Fallback (oracle unusable): base fee plus the configured spread, no rebate.

use super::engine::SwapDirection;
use super::fallback_mode::FallbackModeManager;
use super::flow_fee::{decayed_flow, flow_fee_bps, is_away_from_twap};
use super::swap_execution::{execute_swap_steps, SwapExecutionResult, SwapParams};
use super::tick_array::TickArraySequence;
use super::work_calculation::{
    calculate_path_work, price_improvement, rebate_amount, surcharge_bps, WorkResult,
};
use crate::constants::MAX_INSTANTANEOUS_FEE_BPS;
use crate::error::FeelsResult;
use crate::state::{FeeModel, Market, RebateParams};
use crate::utils::TickMath;
use tracing::debug;

/// Trader-facing swap parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRequest {
    pub direction: SwapDirection,
    pub amount: u64,
    pub exact_input: bool,
    pub sqrt_price_limit: u128,
}

/// How the swap is priced this instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingMode {
    Fallback,
    Oracle { twap_tick: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub fee_bps: u16,
    pub base_fee_bps: u16,
    /// Part of `fee_bps` above the base fee
    pub surcharge_bps: u16,
    pub fallback_active: bool,
}

/// Executed swap with its fee and the rebate it earned, before buffer caps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedSwap {
    pub execution: SwapExecutionResult,
    pub quote: FeeQuote,
    pub work: WorkResult,
    pub rebate_owed: u64,
}

pub struct FeeManager;

impl FeeManager {
    /// Price and execute a swap. Crossed ticks are written into `tick_arrays`.
    pub fn price_swap(
        market: &Market,
        tick_arrays: &mut TickArraySequence,
        request: &SwapRequest,
        mode: PricingMode,
        rebate: RebateParams,
        now: i64,
    ) -> FeelsResult<PricedSwap> {
        let base_fee_bps = market.base_fee_bps;
        let params_at = |fee_bps: u16| SwapParams {
            direction: request.direction,
            amount: request.amount,
            exact_input: request.exact_input,
            sqrt_price_limit: request.sqrt_price_limit,
            fee_bps,
            rebate,
        };

        let twap_tick = match mode {
            PricingMode::Fallback => {
                let fee_bps =
                    FallbackModeManager::fallback_fee_bps(base_fee_bps, &market.fee_policy.fallback);
                let execution = execute_swap_steps(market, tick_arrays, &params_at(fee_bps))?;
                return Ok(PricedSwap {
                    execution,
                    quote: FeeQuote {
                        fee_bps,
                        base_fee_bps,
                        surcharge_bps: fee_bps.saturating_sub(base_fee_bps),
                        fallback_active: true,
                    },
                    work: WorkResult::default(),
                    rebate_owed: 0,
                });
            }
            PricingMode::Oracle { twap_tick } => twap_tick,
        };

        match &market.fee_policy.model {
            FeeModel::Potential(params) => {
                let sqrt_twap = TickMath::sqrt_price_at_tick(twap_tick)?;

                // Pass 1: simulate at the base fee to measure uphill work
                let mut simulated = tick_arrays.clone();
                let probe = execute_swap_steps(market, &mut simulated, &params_at(base_fee_bps))?;
                let probe_work =
                    calculate_path_work(&probe.segments, sqrt_twap, &market.domain, params)?;
                let surcharge = surcharge_bps(probe_work.work_up_x64, params);
                let fee_bps = base_fee_bps
                    .saturating_add(surcharge)
                    .min(MAX_INSTANTANEOUS_FEE_BPS);

                // Pass 2: execute at the surcharged fee
                let execution = execute_swap_steps(market, tick_arrays, &params_at(fee_bps))?;
                let work =
                    calculate_path_work(&execution.segments, sqrt_twap, &market.domain, params)?;
                let improvement = price_improvement(
                    execution.amount_in,
                    execution.amount_out,
                    base_fee_bps,
                    sqrt_twap,
                    request.direction.is_a_to_b(),
                )?;
                let rebate_owed =
                    rebate_amount(work.work_down_x64, execution.amount_out, improvement, params)?;
                debug!(
                    fee_bps,
                    surcharge,
                    work_up = work.work_up_x64,
                    work_down = work.work_down_x64,
                    rebate_owed,
                    "priced swap under potential model"
                );

                Ok(PricedSwap {
                    execution,
                    quote: FeeQuote {
                        fee_bps,
                        base_fee_bps,
                        surcharge_bps: fee_bps - base_fee_bps,
                        fallback_active: false,
                    },
                    work,
                    rebate_owed,
                })
            }
            FeeModel::DisplacementFlow(params) => {
                let flow = decayed_flow(&market.flow, params, now);
                let away = is_away_from_twap(
                    market.current_tick,
                    twap_tick,
                    request.direction.is_a_to_b(),
                );
                let fee_bps = flow_fee_bps(
                    params,
                    base_fee_bps,
                    market.current_tick,
                    twap_tick,
                    flow,
                    away,
                );
                debug!(fee_bps, twap_tick, away, "priced swap under flow model");
                let execution = execute_swap_steps(market, tick_arrays, &params_at(fee_bps))?;
                Ok(PricedSwap {
                    execution,
                    quote: FeeQuote {
                        fee_bps,
                        base_fee_bps,
                        surcharge_bps: fee_bps.saturating_sub(base_fee_bps),
                        fallback_active: false,
                    },
                    work: WorkResult::default(),
                    rebate_owed: 0,
                })
            }
        }
    }
}

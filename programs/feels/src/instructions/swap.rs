//! Swap instruction for the Feels concentrated liquidity AMM
//!
//! This instruction orchestrates the core swap functionality:
//! - Declaring the market, oracle, buffer and every tick array window the
//!   walk may reach, before execution starts
//! - Oracle freshness and fallback mode evaluation
//! - Pricing and execution through the fee manager
//! - Oracle, flow signal and buffer bookkeeping
//! - Token transfers, then a single commit
//!
//! `quote_swap` runs the same computation against read-only declarations and
//! always discards.

use crate::error::{FeelsError, FeelsResult};
use crate::events::{FallbackModeChanged, FeelsEvent, SwapExecuted};
use crate::host::{AccountStore, Context, TokenProgram};
use crate::logic::{
    record_flow, tick_array_key, trade_sample, Access, FallbackModeManager, FallbackTransition,
    FeeManager, PricedSwap, PricingMode, SwapDirection, SwapRequest, TickArraySequence, WorkUnit,
};
use crate::require;
use crate::state::{
    Buffer, FeeModel, Market, MarketId, OracleState, RecordKey, TickArray, TokenSide,
};
use crate::utils::{transfer_from_user_to_vault, transfer_from_vault_to_user};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapInstructionParams {
    pub market: MarketId,
    pub is_a_to_b: bool,
    /// Input for exact-input swaps, desired output for exact-output swaps
    pub amount: u64,
    pub exact_input: bool,
    /// 0 selects the protocol price bound in the swap direction
    pub sqrt_price_limit: u128,
    /// Minimum output for exact-input swaps, maximum input for exact-output
    pub other_amount_threshold: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee_paid: u64,
    pub fee_bps: u16,
    /// Paid from the buffer on top of `amount_out`, in the output token
    pub rebate: u64,
    pub tick_before: i32,
    pub tick_after: i32,
    pub fallback_active: bool,
}

struct StagedSwap {
    market_key: RecordKey,
    oracle_key: RecordKey,
    buffer_key: RecordKey,
    direction: SwapDirection,
    probed: Vec<i32>,
}

/// Declare every record the swap may touch
fn stage_swap<S: AccountStore>(
    unit: &mut WorkUnit<'_, S>,
    params: &SwapInstructionParams,
    access: Access,
) -> FeelsResult<StagedSwap> {
    require!(params.amount > 0, FeelsError::ZeroAmount);
    let market_key = RecordKey::Market(params.market);
    let oracle_key = RecordKey::Oracle(params.market);
    let buffer_key = RecordKey::Buffer(params.market);

    unit.load::<Market>(market_key, access)?;
    let market = unit.get::<Market>(&market_key)?;
    market.ensure_active()?;
    let direction = SwapDirection::from_a_to_b(params.is_a_to_b);
    let probed =
        TickArraySequence::probe_starts(market.current_tick, market.tick_spacing, direction);
    let market_id = market.id;

    unit.load::<OracleState>(oracle_key, access)?;
    unit.load::<Buffer>(buffer_key, access)?;
    for &start_tick_index in &probed {
        let key = RecordKey::TickArray {
            market: market_id,
            start_tick_index,
        };
        unit.load_optional::<TickArray>(key, access)?;
    }
    unit.begin_execution()?;

    Ok(StagedSwap {
        market_key,
        oracle_key,
        buffer_key,
        direction,
        probed,
    })
}

fn tick_sequence<S: AccountStore>(
    unit: &WorkUnit<'_, S>,
    market: &Market,
    staged: &StagedSwap,
) -> FeelsResult<TickArraySequence> {
    let mut arrays = Vec::with_capacity(staged.probed.len());
    for &start_tick_index in &staged.probed {
        let key = RecordKey::TickArray {
            market: market.id,
            start_tick_index,
        };
        if unit.contains(&key) {
            arrays.push(unit.get::<TickArray>(&key)?.clone());
        }
    }
    TickArraySequence::new(
        market.id,
        market.tick_spacing,
        staged.direction,
        staged.probed.clone(),
        arrays,
    )
}

fn price<S: AccountStore>(
    unit: &WorkUnit<'_, S>,
    market: &Market,
    staged: &StagedSwap,
    params: &SwapInstructionParams,
    now: i64,
) -> FeelsResult<(PricedSwap, TickArraySequence)> {
    let mode = if market.fallback.active {
        PricingMode::Fallback
    } else {
        let oracle = unit.get::<OracleState>(&staged.oracle_key)?;
        PricingMode::Oracle {
            twap_tick: oracle.twap_tick(now, market.current_tick)?,
        }
    };
    let rebate_params = unit.get::<Buffer>(&staged.buffer_key)?.params;
    let request = SwapRequest {
        direction: staged.direction,
        amount: params.amount,
        exact_input: params.exact_input,
        sqrt_price_limit: params.sqrt_price_limit,
    };
    let mut sequence = tick_sequence(unit, market, staged)?;
    let priced = FeeManager::price_swap(
        market,
        &mut sequence,
        &request,
        mode,
        rebate_params,
        now,
    )?;
    Ok((priced, sequence))
}

fn sides(direction: SwapDirection) -> (TokenSide, TokenSide) {
    match direction {
        SwapDirection::AToB => (TokenSide::A, TokenSide::B),
        SwapDirection::BToA => (TokenSide::B, TokenSide::A),
    }
}

pub fn swap<S: AccountStore, T: TokenProgram>(
    ctx: &mut Context<'_, S, T>,
    params: SwapInstructionParams,
) -> FeelsResult<SwapOutcome> {
    let now = ctx.now();
    let signer = ctx.signer;

    let mut unit = WorkUnit::new(ctx.store);
    let staged = stage_swap(&mut unit, &params, Access::Writable)?;
    let (input_side, output_side) = sides(staged.direction);

    // Fallback status is decided on the oracle as it stood before this trade
    let oracle = unit.get::<OracleState>(&staged.oracle_key)?;
    let status = oracle.status(now);
    let min_dwell = oracle.params.min_dwell_secs;
    let market = unit.get_mut::<Market>(&staged.market_key)?;
    let policy = market.fee_policy.fallback;
    let transition =
        FallbackModeManager::evaluate(&mut market.fallback, &policy, status, min_dwell, now, true)?;
    let market = market.clone();
    if transition != FallbackTransition::Unchanged {
        unit.emit(FeelsEvent::FallbackModeChanged(FallbackModeChanged {
            market: market.id,
            active: market.fallback.active,
            timestamp: now,
        }));
    }

    let (priced, sequence) = price(&unit, &market, &staged, &params, now)?;
    let execution = &priced.execution;

    if params.exact_input {
        require!(
            execution.amount_out >= params.other_amount_threshold,
            FeelsError::SlippageExceeded
        );
    } else {
        require!(
            execution.amount_in <= params.other_amount_threshold,
            FeelsError::SlippageExceeded
        );
    }

    // Write back every array holding a crossed tick
    let touched: BTreeSet<RecordKey> = execution
        .ticks_crossed
        .iter()
        .map(|&tick| tick_array_key(&market, tick))
        .collect();
    for array in sequence.into_arrays() {
        let key = RecordKey::TickArray {
            market: market.id,
            start_tick_index: array.start_tick_index,
        };
        if touched.contains(&key) {
            *unit.get_mut::<TickArray>(&key)? = array;
        }
    }

    let state = unit.get_mut::<Market>(&staged.market_key)?;
    state.sqrt_price = execution.final_sqrt_price;
    state.current_tick = execution.final_tick;
    state.liquidity = execution.final_liquidity;
    state.fee_growth_global_x64 = execution.fee_growth_global_x64;
    state.last_update_ts = now;
    if let FeeModel::DisplacementFlow(flow_params) = state.fee_policy.model {
        let sample = trade_sample(
            staged.direction.is_a_to_b(),
            execution.amount_in,
            execution.amount_out,
        );
        record_flow(&mut state.flow, &flow_params, sample, now);
    }

    // The pre-trade tick was in effect up to now
    unit.get_mut::<OracleState>(&staged.oracle_key)?
        .append(execution.start_tick, now)?;

    let buffer = unit.get_mut::<Buffer>(&staged.buffer_key)?;
    buffer.roll_epoch(now);
    buffer.collect_fees(input_side, execution.buffer_fee)?;
    let rebate = if priced.rebate_owed > 0 {
        buffer.pay_rebate(output_side, priced.rebate_owed)?
    } else {
        0
    };
    let paid_out = execution
        .amount_out
        .checked_add(rebate)
        .ok_or(FeelsError::MathOverflow)?;

    transfer_from_user_to_vault(
        &mut *ctx.token_program,
        market.id,
        input_side,
        signer,
        execution.amount_in,
    )?;
    transfer_from_vault_to_user(
        &mut *ctx.token_program,
        market.id,
        output_side,
        signer,
        paid_out,
    )?;

    let outcome = SwapOutcome {
        amount_in: execution.amount_in,
        amount_out: execution.amount_out,
        fee_paid: execution.total_fee,
        fee_bps: priced.quote.fee_bps,
        rebate,
        tick_before: execution.start_tick,
        tick_after: execution.final_tick,
        fallback_active: priced.quote.fallback_active,
    };
    unit.emit(FeelsEvent::SwapExecuted(SwapExecuted {
        market: market.id,
        user: signer,
        a_to_b: params.is_a_to_b,
        amount_in: outcome.amount_in,
        amount_out: outcome.amount_out,
        fee_paid: outcome.fee_paid,
        fee_bps: outcome.fee_bps,
        base_fee_bps: priced.quote.base_fee_bps,
        rebate,
        tick_before: outcome.tick_before,
        tick_after: outcome.tick_after,
        sqrt_price_after: execution.final_sqrt_price,
        fallback_active: outcome.fallback_active,
        timestamp: now,
    }));
    let events = unit.commit()?;
    ctx.events.extend(events);

    debug!(
        market = %market.id,
        a_to_b = params.is_a_to_b,
        amount_in = outcome.amount_in,
        amount_out = outcome.amount_out,
        fee_bps = outcome.fee_bps,
        rebate,
        ticks_crossed = priced.execution.ticks_crossed.len(),
        "swap executed"
    );
    Ok(outcome)
}

/// Price a swap without changing any state
pub fn quote_swap<S: AccountStore, T: TokenProgram>(
    ctx: &Context<'_, S, T>,
    params: SwapInstructionParams,
) -> FeelsResult<SwapOutcome> {
    let now = ctx.now();
    let mut unit = WorkUnit::new(ctx.store);
    let staged = stage_swap(&mut unit, &params, Access::ReadOnly)?;
    let (_, output_side) = sides(staged.direction);

    let oracle = unit.get::<OracleState>(&staged.oracle_key)?;
    let mut market = unit.get::<Market>(&staged.market_key)?.clone();
    let policy = market.fee_policy.fallback;
    FallbackModeManager::evaluate(
        &mut market.fallback,
        &policy,
        oracle.status(now),
        oracle.params.min_dwell_secs,
        now,
        true,
    )?;

    let (priced, _) = price(&unit, &market, &staged, &params, now)?;
    let mut buffer = unit.get::<Buffer>(&staged.buffer_key)?.clone();
    buffer.roll_epoch(now);
    let input_side = output_side.other();
    buffer.collect_fees(input_side, priced.execution.buffer_fee)?;
    let rebate = if priced.rebate_owed > 0 {
        buffer.pay_rebate(output_side, priced.rebate_owed)?
    } else {
        0
    };

    let execution = priced.execution;
    Ok(SwapOutcome {
        amount_in: execution.amount_in,
        amount_out: execution.amount_out,
        fee_paid: execution.total_fee,
        fee_bps: priced.quote.fee_bps,
        rebate,
        tick_before: execution.start_tick,
        tick_after: execution.final_tick,
        fallback_active: priced.quote.fallback_active,
    })
}

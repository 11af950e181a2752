//! Market initialization
//!
//! Creates the Market, its oracle and its buffer in one work unit. Fee,
//! rebate and oracle parameters are snapshotted from the protocol config.

use crate::config::{FeeModelKind, ProtocolConfig};
use crate::constants::{MAX_SQRT_PRICE_X64, MIN_SQRT_PRICE_X64};
use crate::error::{FeelsError, FeelsResult};
use crate::events::{FeelsEvent, MarketInitialized};
use crate::host::{AccountStore, Context, TokenProgram};
use crate::logic::WorkUnit;
use crate::require;
use crate::state::{
    Address, Buffer, DomainMultipliers, FallbackState, FlowState, Market, MarketId, OracleState,
    RecordKey, ReentrancyStatus, RiskClass,
};
use crate::utils::{validate_tick_spacing, TickMath};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeMarketParams {
    pub token_a: Address,
    pub token_b: Address,
    pub tick_spacing: u16,
    pub initial_sqrt_price: u128,
    pub risk_class: RiskClass,
    /// Overrides the config's default fee model
    pub fee_model: Option<FeeModelKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeMarketResult {
    pub market: MarketId,
    pub tick: i32,
    pub base_fee_bps: u16,
}

pub fn initialize_market<S: AccountStore, T: TokenProgram>(
    ctx: &mut Context<'_, S, T>,
    config: &ProtocolConfig,
    params: InitializeMarketParams,
) -> FeelsResult<InitializeMarketResult> {
    require!(params.token_a < params.token_b, FeelsError::InvalidTokenOrder);
    validate_tick_spacing(params.tick_spacing)?;
    require!(
        params.initial_sqrt_price >= MIN_SQRT_PRICE_X64
            && params.initial_sqrt_price < MAX_SQRT_PRICE_X64,
        FeelsError::InvalidPrice
    );
    config.validate()?;

    let now = ctx.now();
    let id = MarketId::new(params.token_a, params.token_b);
    let tick = TickMath::tick_at_sqrt_price(params.initial_sqrt_price)?;
    let base_fee_bps = config.base_fee_bps(params.risk_class);

    let market = Market {
        id,
        authority: ctx.signer,
        tick_spacing: params.tick_spacing,
        sqrt_price: params.initial_sqrt_price,
        current_tick: tick,
        liquidity: 0,
        fee_growth_global_x64: [0, 0],
        base_fee_bps,
        risk_class: params.risk_class,
        fee_policy: config.fee_policy(params.fee_model),
        flow: FlowState {
            signed_flow_ewma_bits: 0,
            last_update_ts: now,
        },
        fallback: FallbackState::default(),
        domain: DomainMultipliers::default(),
        is_paused: false,
        reentrancy: ReentrancyStatus::Unlocked,
        next_position_id: 0,
        open_positions: 0,
        last_update_ts: now,
    };

    // The initial price is the first observation
    let mut oracle = OracleState::new(id, config.oracle);
    oracle.append(tick, now)?;

    let mut unit = WorkUnit::new(ctx.store);
    unit.create(RecordKey::Market(id), market)?;
    unit.create(RecordKey::Oracle(id), oracle)?;
    unit.create(RecordKey::Buffer(id), Buffer::new(id, config.rebate, now))?;
    unit.begin_execution()?;

    unit.emit(FeelsEvent::MarketInitialized(MarketInitialized {
        market: id,
        authority: ctx.signer,
        tick_spacing: params.tick_spacing,
        sqrt_price: params.initial_sqrt_price,
        tick,
        base_fee_bps,
        timestamp: now,
    }));
    let events = unit.commit()?;
    ctx.events.extend(events);

    debug!(%id, tick, base_fee_bps, "market initialized");
    Ok(InitializeMarketResult {
        market: id,
        tick,
        base_fee_bps,
    })
}

//! Oracle update
//!
//! Accepts a price observation from the market authority, folds it into the
//! ring and re-evaluates fallback mode against the refreshed oracle. Keepers
//! use it to keep quiet markets fresh and to bring a market out of fallback
//! without trading.

use crate::error::FeelsResult;
use crate::events::{FallbackModeChanged, FeelsEvent, OracleUpdated};
use crate::host::{AccountStore, Context, TokenProgram};
use crate::logic::{Access, FallbackModeManager, FallbackTransition, WorkUnit};
use crate::state::{Market, MarketId, OracleState, PriceObservation, RecordKey};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOracleParams {
    pub market: MarketId,
    pub observation: PriceObservation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOracleResult {
    pub tick: i32,
    pub twap_tick: i32,
    pub fallback_active: bool,
}

pub fn update_oracle<S: AccountStore, T: TokenProgram>(
    ctx: &mut Context<'_, S, T>,
    params: UpdateOracleParams,
) -> FeelsResult<UpdateOracleResult> {
    let now = ctx.now();
    let market_id = params.market;

    let mut unit = WorkUnit::new(ctx.store);
    let market_key = RecordKey::Market(market_id);
    let oracle_key = RecordKey::Oracle(market_id);
    unit.load::<Market>(market_key, Access::Writable)?;
    unit.load::<OracleState>(oracle_key, Access::Writable)?;
    unit.begin_execution()?;

    let market = unit.get::<Market>(&market_key)?;
    market.ensure_authority(&ctx.signer)?;
    let current_tick = market.current_tick;

    let tick = params.observation.tick;
    let oracle = unit.get_mut::<OracleState>(&oracle_key)?;
    oracle.record_observation(params.observation, now)?;
    let status = oracle.status(now);
    let min_dwell = oracle.params.min_dwell_secs;
    let twap_tick = oracle.twap_tick(now, current_tick)?;

    let market = unit.get_mut::<Market>(&market_key)?;
    let policy = market.fee_policy.fallback;
    let transition =
        FallbackModeManager::evaluate(&mut market.fallback, &policy, status, min_dwell, now, false)?;
    let fallback_active = market.fallback.active;

    if transition != FallbackTransition::Unchanged {
        unit.emit(FeelsEvent::FallbackModeChanged(FallbackModeChanged {
            market: market_id,
            active: fallback_active,
            timestamp: now,
        }));
    }
    unit.emit(FeelsEvent::OracleUpdated(OracleUpdated {
        market: market_id,
        tick,
        twap_tick,
        timestamp: now,
    }));
    let events = unit.commit()?;
    ctx.events.extend(events);

    debug!(%market_id, tick, twap_tick, fallback_active, "oracle updated");
    Ok(UpdateOracleResult {
        tick,
        twap_tick,
        fallback_active,
    })
}

//! Market administration
//!
//! Pause switch, fee policy replacement and the domain multipliers of the
//! potential model. All of them require the market authority.

use crate::error::{FeelsError, FeelsResult};
use crate::events::{FeelsEvent, MarketConfigured};
use crate::host::{AccountStore, Context, TokenProgram};
use crate::logic::{Access, WorkUnit};
use crate::require;
use crate::state::{FeeModel, FeePolicy, FlowState, Market, MarketId, RecordKey};
use std::mem::discriminant;
use tracing::info;

/// Stage the market for an authority-gated change and apply `update`
fn configure<S: AccountStore, T: TokenProgram>(
    ctx: &mut Context<'_, S, T>,
    market_id: MarketId,
    update: impl FnOnce(&mut Market, i64) -> FeelsResult<()>,
) -> FeelsResult<()> {
    let now = ctx.now();
    let key = RecordKey::Market(market_id);

    let mut unit = WorkUnit::new(ctx.store);
    unit.load::<Market>(key, Access::Writable)?;
    unit.get::<Market>(&key)?.ensure_authority(&ctx.signer)?;
    unit.begin_execution()?;

    let market = unit.get_mut::<Market>(&key)?;
    update(market, now)?;
    market.last_update_ts = now;
    let is_paused = market.is_paused;

    unit.emit(FeelsEvent::MarketConfigured(MarketConfigured {
        market: market_id,
        is_paused,
        timestamp: now,
    }));
    let events = unit.commit()?;
    ctx.events.extend(events);
    Ok(())
}

pub fn set_market_paused<S: AccountStore, T: TokenProgram>(
    ctx: &mut Context<'_, S, T>,
    market_id: MarketId,
    paused: bool,
) -> FeelsResult<()> {
    configure(ctx, market_id, |market, _| {
        market.is_paused = paused;
        info!(%market_id, paused, "market pause state changed");
        Ok(())
    })
}

/// Replace the fee policy. Switching model kinds restarts the flow signal.
pub fn update_fee_policy<S: AccountStore, T: TokenProgram>(
    ctx: &mut Context<'_, S, T>,
    market_id: MarketId,
    policy: FeePolicy,
) -> FeelsResult<()> {
    policy.validate()?;
    configure(ctx, market_id, |market, now| {
        if discriminant(&market.fee_policy.model) != discriminant(&policy.model) {
            market.flow = FlowState {
                signed_flow_ewma_bits: 0,
                last_update_ts: now,
            };
        }
        if !policy.fallback.enabled && market.fallback.active {
            market.fallback.active = false;
            market.fallback.recovering_since = None;
        }
        market.fee_policy = policy;
        let model = match policy.model {
            FeeModel::Potential(_) => "potential",
            FeeModel::DisplacementFlow(_) => "displacement_flow",
        };
        info!(%market_id, model, "fee policy updated");
        Ok(())
    })
}

/// Set the time and leverage multipliers (Q64.64) of the potential.
///
/// A swap moves only the spot term, so T and L shift the potential by the
/// same constant at both ends of every path segment and cancel out of the
/// work. They do not change swap fees or rebates; they are recorded for
/// readers of the market's potential level.
pub fn update_field_multipliers<S: AccountStore, T: TokenProgram>(
    ctx: &mut Context<'_, S, T>,
    market_id: MarketId,
    time_x64: u128,
    leverage_x64: u128,
) -> FeelsResult<()> {
    require!(
        time_x64 > 0 && leverage_x64 > 0,
        FeelsError::InvalidFeePolicy("domain multipliers must be positive")
    );
    configure(ctx, market_id, |market, _| {
        market.domain.time_x64 = time_x64;
        market.domain.leverage_x64 = leverage_x64;
        info!(%market_id, time_x64, leverage_x64, "field multipliers updated");
        Ok(())
    })
}

//! Collect fees
//!
//! Settles fee growth since the position's checkpoint, pays out everything
//! owed and closes the position once it holds nothing.

use crate::error::{FeelsError, FeelsResult};
use crate::events::{FeelsEvent, FeesCollected, PositionClosed};
use crate::host::{AccountStore, Context, TokenProgram};
use crate::logic::{accrue_position_fees, tick_array_key, Access, WorkUnit};
use crate::require;
use crate::state::{Market, MarketId, Position, RecordKey, TickArray, TokenSide};
use crate::utils::transfer_from_vault_to_user;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectFeesParams {
    pub market: MarketId,
    pub position: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectFeesResult {
    pub amount_a: u64,
    pub amount_b: u64,
    pub position_closed: bool,
}

pub fn collect_fees<S: AccountStore, T: TokenProgram>(
    ctx: &mut Context<'_, S, T>,
    params: CollectFeesParams,
) -> FeelsResult<CollectFeesResult> {
    let now = ctx.now();
    let signer = ctx.signer;

    let mut unit = WorkUnit::new(ctx.store);
    let market_key = RecordKey::Market(params.market);
    let position_key = RecordKey::Position {
        market: params.market,
        id: params.position,
    };
    unit.load::<Market>(market_key, Access::Writable)?;
    unit.load::<Position>(position_key, Access::Writable)?;
    let market = unit.get::<Market>(&market_key)?.clone();
    let position = unit.get::<Position>(&position_key)?.clone();
    require!(position.owner == signer, FeelsError::Unauthorized);

    // Ranges with liquidity always have both boundary arrays on record
    if position.liquidity > 0 {
        for tick in [position.tick_lower, position.tick_upper] {
            let key = tick_array_key(&market, tick);
            if !unit.contains(&key) {
                unit.load::<TickArray>(key, Access::ReadOnly)?;
            }
        }
    }
    unit.begin_execution()?;

    accrue_position_fees(&mut unit, &market_key, &position_key)?;
    let position = unit.get_mut::<Position>(&position_key)?;
    let [amount_a, amount_b] = std::mem::take(&mut position.tokens_owed);
    let position_closed = position.is_empty();
    if position_closed {
        unit.close(&position_key)?;
        unit.get_mut::<Market>(&market_key)?.release_position();
    }

    transfer_from_vault_to_user(
        &mut *ctx.token_program,
        market.id,
        TokenSide::A,
        signer,
        amount_a,
    )?;
    transfer_from_vault_to_user(
        &mut *ctx.token_program,
        market.id,
        TokenSide::B,
        signer,
        amount_b,
    )?;

    unit.emit(FeelsEvent::FeesCollected(FeesCollected {
        market: market.id,
        position: params.position,
        owner: signer,
        amount_a,
        amount_b,
        timestamp: now,
    }));
    if position_closed {
        unit.emit(FeelsEvent::PositionClosed(PositionClosed {
            market: market.id,
            position: params.position,
            owner: signer,
            timestamp: now,
        }));
    }
    let events = unit.commit()?;
    ctx.events.extend(events);

    debug!(
        market = %market.id,
        position = params.position,
        amount_a,
        amount_b,
        "fees collected"
    );
    Ok(CollectFeesResult {
        amount_a,
        amount_b,
        position_closed,
    })
}

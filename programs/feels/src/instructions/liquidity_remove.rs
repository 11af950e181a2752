//! Remove liquidity
//!
//! Principal leaves the vault immediately; accrued fees stay owed on the
//! position until `collect_fees`. A position left with neither is closed.

use crate::constants::MIN_LIQUIDITY;
use crate::error::{FeelsError, FeelsResult};
use crate::events::{FeelsEvent, LiquidityChanged, PositionClosed};
use crate::host::{AccountStore, Context, TokenProgram};
use crate::logic::{modify_position_liquidity, tick_array_key, Access, WorkUnit};
use crate::require;
use crate::state::{Market, MarketId, Position, RecordKey, TickArray, TokenSide};
use crate::utils::transfer_from_vault_to_user;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveLiquidityParams {
    pub market: MarketId,
    pub position: u64,
    pub liquidity: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveLiquidityResult {
    pub amount_a: u64,
    pub amount_b: u64,
    pub position_closed: bool,
}

pub fn remove_liquidity<S: AccountStore, T: TokenProgram>(
    ctx: &mut Context<'_, S, T>,
    params: RemoveLiquidityParams,
) -> FeelsResult<RemoveLiquidityResult> {
    require!(params.liquidity > 0, FeelsError::ZeroAmount);
    let delta = i128::try_from(params.liquidity)
        .map_err(|_| FeelsError::MathOverflow)?
        .checked_neg()
        .ok_or(FeelsError::MathOverflow)?;
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
    market.ensure_active()?;
    require!(position.owner == signer, FeelsError::Unauthorized);
    require!(
        params.liquidity <= position.liquidity,
        FeelsError::InsufficientLiquidity
    );
    let remaining = position.liquidity - params.liquidity;
    require!(
        remaining == 0 || remaining >= MIN_LIQUIDITY,
        FeelsError::LiquidityBelowMinimum
    );

    for tick in [position.tick_lower, position.tick_upper] {
        let key = tick_array_key(&market, tick);
        if !unit.contains(&key) {
            unit.load::<TickArray>(key, Access::Writable)?;
        }
    }
    unit.begin_execution()?;

    let amounts = modify_position_liquidity(&mut unit, &market_key, &position_key, delta)?;
    unit.get_mut::<Market>(&market_key)?.last_update_ts = now;

    let position_closed = unit.get::<Position>(&position_key)?.is_empty();
    if position_closed {
        unit.close(&position_key)?;
        unit.get_mut::<Market>(&market_key)?.release_position();
    }

    transfer_from_vault_to_user(
        &mut *ctx.token_program,
        market.id,
        TokenSide::A,
        signer,
        amounts.amount_a,
    )?;
    transfer_from_vault_to_user(
        &mut *ctx.token_program,
        market.id,
        TokenSide::B,
        signer,
        amounts.amount_b,
    )?;

    unit.emit(FeelsEvent::LiquidityChanged(LiquidityChanged {
        market: market.id,
        position: params.position,
        owner: signer,
        tick_lower: position.tick_lower,
        tick_upper: position.tick_upper,
        liquidity_delta: delta,
        amount_a: amounts.amount_a,
        amount_b: amounts.amount_b,
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
        liquidity = params.liquidity,
        amount_a = amounts.amount_a,
        amount_b = amounts.amount_b,
        position_closed,
        "liquidity removed"
    );
    Ok(RemoveLiquidityResult {
        amount_a: amounts.amount_a,
        amount_b: amounts.amount_b,
        position_closed,
    })
}

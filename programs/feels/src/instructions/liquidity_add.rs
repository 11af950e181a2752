//! Add liquidity
//!
//! Opens a new position over a tick range, or tops up an existing one owned
//! by the signer. Boundary tick arrays are created on first use.

use crate::constants::MIN_LIQUIDITY;
use crate::error::{FeelsError, FeelsResult};
use crate::events::{FeelsEvent, LiquidityChanged};
use crate::host::{AccountStore, Context, TokenProgram};
use crate::logic::{modify_position_liquidity, tick_array_key, Access, WorkUnit};
use crate::require;
use crate::state::{Market, MarketId, Position, RecordKey, TickArray, TokenSide};
use crate::utils::{tick_array_start_index, transfer_from_user_to_vault, validate_tick_range};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityParams {
    pub market: MarketId,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    /// Existing position to add to; `None` opens a new one
    pub position: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityResult {
    pub position: u64,
    pub amount_a: u64,
    pub amount_b: u64,
}

pub fn add_liquidity<S: AccountStore, T: TokenProgram>(
    ctx: &mut Context<'_, S, T>,
    params: AddLiquidityParams,
) -> FeelsResult<AddLiquidityResult> {
    require!(params.liquidity > 0, FeelsError::ZeroAmount);
    let delta = i128::try_from(params.liquidity).map_err(|_| FeelsError::MathOverflow)?;
    let now = ctx.now();
    let signer = ctx.signer;

    let mut unit = WorkUnit::new(ctx.store);
    let market_key = RecordKey::Market(params.market);
    unit.load::<Market>(market_key, Access::Writable)?;
    let market = unit.get::<Market>(&market_key)?.clone();
    market.ensure_active()?;
    validate_tick_range(params.tick_lower, params.tick_upper, market.tick_spacing)?;

    let (position_id, opened) = match params.position {
        Some(id) => {
            let key = RecordKey::Position {
                market: market.id,
                id,
            };
            unit.load::<Position>(key, Access::Writable)?;
            let position = unit.get::<Position>(&key)?;
            require!(position.owner == signer, FeelsError::Unauthorized);
            require!(
                position.tick_lower == params.tick_lower && position.tick_upper == params.tick_upper,
                FeelsError::InvalidTickRange
            );
            (id, false)
        }
        None => {
            let id = market.next_position_id;
            let position = Position::new(market.id, id, signer, params.tick_lower, params.tick_upper);
            unit.create(
                RecordKey::Position {
                    market: market.id,
                    id,
                },
                position,
            )?;
            (id, true)
        }
    };
    let position_key = RecordKey::Position {
        market: market.id,
        id: position_id,
    };

    for tick in [params.tick_lower, params.tick_upper] {
        let key = tick_array_key(&market, tick);
        if unit.contains(&key) {
            continue;
        }
        if !unit.load_optional::<TickArray>(key, Access::Writable)? {
            let start = tick_array_start_index(tick, market.tick_spacing);
            unit.create(key, TickArray::new(market.id, start))?;
        }
    }
    unit.begin_execution()?;

    if opened {
        let allocated = unit.get_mut::<Market>(&market_key)?.allocate_position_id()?;
        require!(allocated == position_id, FeelsError::AccountAlreadyInitialized);
    }

    let amounts = modify_position_liquidity(&mut unit, &market_key, &position_key, delta)?;
    let position_liquidity = unit.get::<Position>(&position_key)?.liquidity;
    require!(
        position_liquidity >= MIN_LIQUIDITY,
        FeelsError::LiquidityBelowMinimum
    );
    unit.get_mut::<Market>(&market_key)?.last_update_ts = now;

    transfer_from_user_to_vault(
        &mut *ctx.token_program,
        market.id,
        TokenSide::A,
        signer,
        amounts.amount_a,
    )?;
    transfer_from_user_to_vault(
        &mut *ctx.token_program,
        market.id,
        TokenSide::B,
        signer,
        amounts.amount_b,
    )?;

    unit.emit(FeelsEvent::LiquidityChanged(LiquidityChanged {
        market: market.id,
        position: position_id,
        owner: signer,
        tick_lower: params.tick_lower,
        tick_upper: params.tick_upper,
        liquidity_delta: delta,
        amount_a: amounts.amount_a,
        amount_b: amounts.amount_b,
        timestamp: now,
    }));
    let events = unit.commit()?;
    ctx.events.extend(events);

    debug!(
        market = %market.id,
        position = position_id,
        liquidity = params.liquidity,
        amount_a = amounts.amount_a,
        amount_b = amounts.amount_b,
        "liquidity added"
    );
    Ok(AddLiquidityResult {
        position: position_id,
        amount_a: amounts.amount_a,
        amount_b: amounts.amount_b,
    })
}

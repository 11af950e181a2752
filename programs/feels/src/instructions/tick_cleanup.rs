//! Tick array cleanup
//!
//! Reclaims a tick array that no longer holds any initialized tick. Swaps
//! treat a missing array inside their probed windows as empty, so removing
//! it never changes pricing.

use crate::error::{FeelsError, FeelsResult};
use crate::events::{FeelsEvent, TickArrayReclaimed};
use crate::host::{AccountStore, Context, TokenProgram};
use crate::logic::{Access, WorkUnit};
use crate::require;
use crate::state::{Market, MarketId, RecordKey, TickArray};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupTickArrayParams {
    pub market: MarketId,
    pub start_tick_index: i32,
}

pub fn cleanup_empty_tick_array<S: AccountStore, T: TokenProgram>(
    ctx: &mut Context<'_, S, T>,
    params: CleanupTickArrayParams,
) -> FeelsResult<()> {
    let now = ctx.now();
    let key = RecordKey::TickArray {
        market: params.market,
        start_tick_index: params.start_tick_index,
    };

    let mut unit = WorkUnit::new(ctx.store);
    // Read-only, but still refused while another instruction holds the market
    unit.load::<Market>(RecordKey::Market(params.market), Access::ReadOnly)?;
    unit.load::<TickArray>(key, Access::Writable)?;
    unit.begin_execution()?;

    require!(
        unit.get::<TickArray>(&key)?.is_empty(),
        FeelsError::TickArrayNotEmpty
    );
    unit.close(&key)?;

    unit.emit(FeelsEvent::TickArrayReclaimed(TickArrayReclaimed {
        market: params.market,
        start_tick_index: params.start_tick_index,
        timestamp: now,
    }));
    let events = unit.commit()?;
    ctx.events.extend(events);

    debug!(market = %params.market, start = params.start_tick_index, "tick array reclaimed");
    Ok(())
}

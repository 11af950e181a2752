//! Event definitions
//!
//! Events are buffered by the work unit and released only when it commits,
//! so an indexer never observes an event for an instruction that rolled back.

use crate::state::{Address, MarketId};
use serde::Serialize;

/// Event emitted when a market is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketInitialized {
    pub market: MarketId,
    pub authority: Address,
    pub tick_spacing: u16,
    pub sqrt_price: u128,
    pub tick: i32,
    pub base_fee_bps: u16,
    pub timestamp: i64,
}

/// Event emitted when a swap is executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapExecuted {
    pub market: MarketId,
    pub user: Address,
    pub a_to_b: bool,
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee_paid: u64,
    pub fee_bps: u16,
    pub base_fee_bps: u16,
    pub rebate: u64,
    pub tick_before: i32,
    pub tick_after: i32,
    pub sqrt_price_after: u128,
    pub fallback_active: bool,
    pub timestamp: i64,
}

/// Event emitted when a position's liquidity changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiquidityChanged {
    pub market: MarketId,
    pub position: u64,
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity_delta: i128,
    pub amount_a: u64,
    pub amount_b: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeesCollected {
    pub market: MarketId,
    pub position: u64,
    pub owner: Address,
    pub amount_a: u64,
    pub amount_b: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionClosed {
    pub market: MarketId,
    pub position: u64,
    pub owner: Address,
    pub timestamp: i64,
}

/// Event emitted on oracle update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OracleUpdated {
    pub market: MarketId,
    pub tick: i32,
    pub twap_tick: i32,
    pub timestamp: i64,
}

/// Floor-style status change: pricing entered or left fallback mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackModeChanged {
    pub market: MarketId,
    pub active: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickArrayReclaimed {
    pub market: MarketId,
    pub start_tick_index: i32,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketConfigured {
    pub market: MarketId,
    pub is_paused: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum FeelsEvent {
    MarketInitialized(MarketInitialized),
    SwapExecuted(SwapExecuted),
    LiquidityChanged(LiquidityChanged),
    FeesCollected(FeesCollected),
    PositionClosed(PositionClosed),
    OracleUpdated(OracleUpdated),
    FallbackModeChanged(FallbackModeChanged),
    TickArrayReclaimed(TickArrayReclaimed),
    MarketConfigured(MarketConfigured),
}

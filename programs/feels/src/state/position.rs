//! Liquidity position state
//!
//! A position is one owner's liquidity over a tick range, with the fee
//! growth checkpoints used to settle what it is owed.

use super::keys::{Address, MarketId};
use borsh::{BorshDeserialize, BorshSerialize};

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Position {
    /// Market this position belongs to
    pub market: MarketId,
    pub id: u64,

    /// Owner of the position
    pub owner: Address,

    /// Tick range
    pub tick_lower: i32,
    pub tick_upper: i32,

    /// Liquidity amount
    pub liquidity: u128,

    /// Fee growth inside the range at last settlement (Q64 fixed point)
    pub fee_growth_inside_checkpoint_x64: [u128; 2],

    /// Fees accrued and not yet collected
    pub tokens_owed: [u64; 2],
}

impl Position {
    pub fn new(market: MarketId, id: u64, owner: Address, tick_lower: i32, tick_upper: i32) -> Self {
        Self {
            market,
            id,
            owner,
            tick_lower,
            tick_upper,
            liquidity: 0,
            fee_growth_inside_checkpoint_x64: [0, 0],
            tokens_owed: [0, 0],
        }
    }

    /// Nothing left to withdraw or collect
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0 && self.tokens_owed == [0, 0]
    }
}

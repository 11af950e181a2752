//! Market record
//!
//! The hot-path summary of one trading pair: price, active liquidity, global
//! fee accumulators, and the fee policy and its accumulated state.

use super::fee_policy::{DomainMultipliers, FallbackState, FeePolicy, FlowState, RiskClass};
use super::keys::{Address, MarketId};
use super::reentrancy::ReentrancyStatus;
use crate::error::{FeelsError, FeelsResult};
use crate::require;
use borsh::{BorshDeserialize, BorshSerialize};

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Market {
    pub id: MarketId,
    /// Allowed to pause and reconfigure the market
    pub authority: Address,
    pub tick_spacing: u16,

    // Price state
    pub sqrt_price: u128, // Q64.64 of sqrt(B per A)
    pub current_tick: i32,
    pub liquidity: u128,

    /// Global fee growth per unit of liquidity, per side, Q64.64
    pub fee_growth_global_x64: [u128; 2],

    // Fee configuration
    pub base_fee_bps: u16,
    pub risk_class: RiskClass,
    pub fee_policy: FeePolicy,
    pub flow: FlowState,
    pub fallback: FallbackState,
    pub domain: DomainMultipliers,

    pub is_paused: bool,
    pub reentrancy: ReentrancyStatus,

    // Position bookkeeping
    pub next_position_id: u64,
    pub open_positions: u64,

    pub last_update_ts: i64,
}

impl Market {
    pub fn ensure_active(&self) -> FeelsResult<()> {
        require!(!self.is_paused, FeelsError::MarketPaused);
        Ok(())
    }

    pub fn ensure_authority(&self, signer: &Address) -> FeelsResult<()> {
        require!(self.authority == *signer, FeelsError::Unauthorized);
        Ok(())
    }

    /// Hand out the next position identifier
    pub fn allocate_position_id(&mut self) -> FeelsResult<u64> {
        let id = self.next_position_id;
        self.next_position_id = id.checked_add(1).ok_or(FeelsError::MathOverflow)?;
        self.open_positions = self
            .open_positions
            .checked_add(1)
            .ok_or(FeelsError::MathOverflow)?;
        Ok(id)
    }

    pub fn release_position(&mut self) {
        self.open_positions = self.open_positions.saturating_sub(1);
    }
}

//! Buffer (τ) state
//!
//! The buffer retains a share of swap fees per token side and funds the
//! rebates paid for downhill work. Rebates are bounded by a per-transaction
//! cap and a per-epoch cap, both relative to the buffer balance, and can never
//! exceed what the buffer actually holds.

use super::keys::{MarketId, TokenSide};
use crate::constants::{
    BPS_DENOMINATOR, DEFAULT_BUFFER_FEE_SHARE_BPS, MAX_REBATE_PER_EPOCH_BPS, MAX_REBATE_PER_TX_BPS,
    REBATE_EPOCH_DURATION,
};
use crate::error::{FeelsError, FeelsResult};
use crate::require;
use crate::utils::SafeMath;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(default)]
pub struct RebateParams {
    /// Per-transaction cap as a share of the buffer balance
    pub cap_tx_bps: u16,
    /// Per-epoch cap as a share of the balance at epoch start
    pub cap_epoch_bps: u16,
    pub epoch_duration_secs: i64,
    /// Share of every swap fee retained by the buffer
    pub buffer_fee_share_bps: u16,
}

impl Default for RebateParams {
    fn default() -> Self {
        Self {
            cap_tx_bps: MAX_REBATE_PER_TX_BPS,
            cap_epoch_bps: MAX_REBATE_PER_EPOCH_BPS,
            epoch_duration_secs: REBATE_EPOCH_DURATION,
            buffer_fee_share_bps: DEFAULT_BUFFER_FEE_SHARE_BPS,
        }
    }
}

impl RebateParams {
    /// Split a swap fee into (buffer share, LP share)
    pub fn split_fee(&self, fee_amount: u64) -> (u64, u64) {
        let to_buffer = (fee_amount as u128 * self.buffer_fee_share_bps as u128
            / BPS_DENOMINATOR as u128) as u64;
        (to_buffer, fee_amount - to_buffer)
    }

    pub fn validate(&self) -> FeelsResult<()> {
        require!(
            self.cap_tx_bps as u64 <= BPS_DENOMINATOR
                && self.cap_epoch_bps as u64 <= BPS_DENOMINATOR
                && self.buffer_fee_share_bps as u64 <= BPS_DENOMINATOR,
            FeelsError::InvalidFeePolicy("rebate shares above 10000 bps")
        );
        require!(
            self.epoch_duration_secs > 0,
            FeelsError::InvalidFeePolicy("epoch duration must be positive")
        );
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Buffer {
    pub market: MarketId,
    pub params: RebateParams,

    /// τ held per side, in token units
    pub balance: [u64; 2],

    // Epoch accounting
    pub epoch_start: i64,
    pub epoch_start_balance: [u64; 2],
    pub rebate_paid_epoch: [u64; 2],

    // Lifetime totals
    pub total_fees_collected: [u64; 2],
    pub total_rebates_paid: [u64; 2],
}

impl Buffer {
    pub fn new(market: MarketId, params: RebateParams, now: i64) -> Self {
        Self {
            market,
            params,
            balance: [0, 0],
            epoch_start: now,
            epoch_start_balance: [0, 0],
            rebate_paid_epoch: [0, 0],
            total_fees_collected: [0, 0],
            total_rebates_paid: [0, 0],
        }
    }

    /// Collect fees into buffer
    pub fn collect_fees(&mut self, side: TokenSide, amount: u64) -> FeelsResult<()> {
        let i = side.index();
        self.balance[i] = self.balance[i].safe_add(amount)?;
        self.total_fees_collected[i] = self.total_fees_collected[i].safe_add(amount)?;
        Ok(())
    }

    /// Start a new epoch once the current one has elapsed
    pub fn roll_epoch(&mut self, now: i64) {
        if now >= self.epoch_start.saturating_add(self.params.epoch_duration_secs) {
            self.epoch_start = now;
            self.epoch_start_balance = self.balance;
            self.rebate_paid_epoch = [0, 0];
        }
    }

    /// Budget left in the current epoch for one side
    pub fn epoch_remaining(&self, side: TokenSide) -> u64 {
        let i = side.index();
        let cap = (self.epoch_start_balance[i] as u128 * self.params.cap_epoch_bps as u128
            / BPS_DENOMINATOR as u128) as u64;
        cap.saturating_sub(self.rebate_paid_epoch[i])
    }

    /// Largest rebate payable right now on one side: min of the
    /// per-transaction cap, the epoch remainder and the balance itself
    pub fn rebate_capacity(&self, side: TokenSide) -> u64 {
        let i = side.index();
        let cap_tx = (self.balance[i] as u128 * self.params.cap_tx_bps as u128
            / BPS_DENOMINATOR as u128) as u64;
        cap_tx.min(self.epoch_remaining(side)).min(self.balance[i])
    }

    /// Pay rebate from buffer, returns the amount actually paid
    pub fn pay_rebate(&mut self, side: TokenSide, requested: u64) -> FeelsResult<u64> {
        let paid = requested.min(self.rebate_capacity(side));
        let i = side.index();
        self.balance[i] = self.balance[i]
            .checked_sub(paid)
            .ok_or(FeelsError::MathUnderflow)?;
        self.rebate_paid_epoch[i] = self.rebate_paid_epoch[i].safe_add(paid)?;
        self.total_rebates_paid[i] = self.total_rebates_paid[i].safe_add(paid)?;
        Ok(paid)
    }
}

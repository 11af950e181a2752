//! Tick data structures for concentrated liquidity
//!
//! Ticks are grouped into fixed windows of `TICK_ARRAY_SIZE` spaced ticks.
//! A tick is addressed by its global index; its slot in the window is pure
//! index arithmetic, so neighbours never hold references to each other.

use super::keys::MarketId;
use crate::constants::TICK_ARRAY_SIZE;
use crate::error::{FeelsError, FeelsResult};
use crate::require;
use crate::utils::{add_liquidity_delta, ticks_per_array};
use borsh::{BorshDeserialize, BorshSerialize};

/// Individual tick within an array
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Tick {
    pub liquidity_net: i128,
    pub liquidity_gross: u128,
    pub fee_growth_outside_x64: [u128; 2], // Q64 fixed point, per side
    pub initialized: bool,
}

impl Tick {
    /// Flip the fee growth outside values when crossing this tick.
    /// Implements: fee_outside = fee_global - fee_outside (mod 2^128)
    pub fn flip_fee_growth_outside(&mut self, fee_growth_global_x64: [u128; 2]) {
        for side in 0..2 {
            self.fee_growth_outside_x64[side] =
                fee_growth_global_x64[side].wrapping_sub(self.fee_growth_outside_x64[side]);
        }
    }
}

/// Result of applying a liquidity delta to one boundary tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickUpdate {
    /// The tick went from uninitialized to initialized or back
    pub flipped: bool,
    pub liquidity_gross_after: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TickArray {
    pub market: MarketId,
    pub start_tick_index: i32,
    pub ticks: [Tick; TICK_ARRAY_SIZE],
    pub initialized_tick_count: u16,
}

impl TickArray {
    pub fn new(market: MarketId, start_tick_index: i32) -> Self {
        Self {
            market,
            start_tick_index,
            ticks: [Tick::default(); TICK_ARRAY_SIZE],
            initialized_tick_count: 0,
        }
    }

    /// Last tick index covered by this window (inclusive)
    pub fn end_tick_index(&self, tick_spacing: u16) -> i32 {
        self.start_tick_index + ticks_per_array(tick_spacing) - tick_spacing as i32
    }

    pub fn contains(&self, tick_index: i32, tick_spacing: u16) -> bool {
        tick_index >= self.start_tick_index
            && tick_index < self.start_tick_index + ticks_per_array(tick_spacing)
    }

    /// Returns the index within the array for a global tick index
    pub fn offset_for(&self, tick_index: i32, tick_spacing: u16) -> FeelsResult<usize> {
        let spacing = tick_spacing as i32;
        require!(tick_index % spacing == 0, FeelsError::TickNotSpaced);
        require!(
            self.contains(tick_index, tick_spacing),
            FeelsError::TickArrayNotFound
        );
        Ok(((tick_index - self.start_tick_index) / spacing) as usize)
    }

    pub fn get_tick(&self, tick_index: i32, tick_spacing: u16) -> FeelsResult<&Tick> {
        let off = self.offset_for(tick_index, tick_spacing)?;
        Ok(&self.ticks[off])
    }

    pub fn get_tick_mut(&mut self, tick_index: i32, tick_spacing: u16) -> FeelsResult<&mut Tick> {
        let off = self.offset_for(tick_index, tick_spacing)?;
        Ok(&mut self.ticks[off])
    }

    /// Apply a position's liquidity delta to one of its boundary ticks.
    ///
    /// A newly initialized tick records all global fee growth as "outside"
    /// when it sits at or below the current tick (Uniswap V3 convention).
    /// A tick whose gross liquidity returns to zero is cleared entirely.
    pub fn update_tick(
        &mut self,
        tick_index: i32,
        tick_spacing: u16,
        current_tick: i32,
        fee_growth_global_x64: [u128; 2],
        liquidity_delta: i128,
        upper: bool,
    ) -> FeelsResult<TickUpdate> {
        let tick = self.get_tick_mut(tick_index, tick_spacing)?;
        let gross_before = tick.liquidity_gross;
        let gross_after = add_liquidity_delta(gross_before, liquidity_delta)?;

        if gross_before == 0 && gross_after > 0 {
            tick.initialized = true;
            tick.fee_growth_outside_x64 = if tick_index <= current_tick {
                fee_growth_global_x64
            } else {
                [0, 0]
            };
        }

        tick.liquidity_gross = gross_after;
        tick.liquidity_net = if upper {
            tick.liquidity_net.checked_sub(liquidity_delta)
        } else {
            tick.liquidity_net.checked_add(liquidity_delta)
        }
        .ok_or(FeelsError::MathOverflow)?;

        let flipped = (gross_before == 0) != (gross_after == 0);
        if gross_after == 0 {
            *tick = Tick::default();
        }
        if flipped {
            self.initialized_tick_count = if gross_after > 0 {
                self.initialized_tick_count.saturating_add(1)
            } else {
                self.initialized_tick_count.saturating_sub(1)
            };
        }

        Ok(TickUpdate {
            flipped,
            liquidity_gross_after: gross_after,
        })
    }

    /// Next initialized tick strictly in the swap direction within this window.
    ///
    /// Moving down (`a_to_b`) the search includes `from` itself, because the
    /// market sits at or above its current tick; moving up it starts at the
    /// next spaced tick above `from`.
    pub fn next_initialized_tick(
        &self,
        from: i32,
        tick_spacing: u16,
        a_to_b: bool,
    ) -> Option<i32> {
        let spacing = tick_spacing as i32;
        let span = ticks_per_array(tick_spacing);
        if a_to_b {
            let mut offset = (from - self.start_tick_index).div_euclid(spacing);
            if offset < 0 {
                return None;
            }
            offset = offset.min(TICK_ARRAY_SIZE as i32 - 1);
            while offset >= 0 {
                if self.ticks[offset as usize].initialized {
                    return Some(self.start_tick_index + offset * spacing);
                }
                offset -= 1;
            }
            None
        } else {
            let mut offset = (from - self.start_tick_index).div_euclid(spacing) + 1;
            if offset >= TICK_ARRAY_SIZE as i32 || from >= self.start_tick_index + span {
                return None;
            }
            offset = offset.max(0);
            while offset < TICK_ARRAY_SIZE as i32 {
                if self.ticks[offset as usize].initialized {
                    return Some(self.start_tick_index + offset * spacing);
                }
                offset += 1;
            }
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.initialized_tick_count == 0
    }
}

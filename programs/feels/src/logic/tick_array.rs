//! Tick array sequence for swaps
//!
//! Owns the tick arrays a swap may touch, keyed by start index, together with
//! the list of array windows that were probed while loading. A probed window
//! that holds no record is known to contain no initialized tick; anything
//! past the last probed window is unknown and never crossed.

use super::engine::SwapDirection;
use crate::constants::{MAX_TICK, MAX_TICK_ARRAYS_PER_SWAP, MIN_TICK};
use crate::error::{FeelsError, FeelsResult};
use crate::require;
use crate::state::{MarketId, Tick, TickArray};
use crate::utils::{tick_array_start_index, ticks_per_array};
use std::collections::BTreeMap;

/// Where the next swap segment ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextTick {
    /// An initialized tick that must be crossed
    Initialized(i32),
    /// Last tick covered by the probed windows; stepping past it is not allowed
    EndOfCoverage(i32),
}

#[derive(Debug, Clone)]
pub struct TickArraySequence {
    tick_spacing: u16,
    direction: SwapDirection,
    /// Probed window starts, nearest first
    probed: Vec<i32>,
    arrays: BTreeMap<i32, TickArray>,
}

impl TickArraySequence {
    /// Window starts a swap from `current_tick` may need, nearest first
    pub fn probe_starts(current_tick: i32, tick_spacing: u16, direction: SwapDirection) -> Vec<i32> {
        let span = ticks_per_array(tick_spacing);
        let step = match direction {
            SwapDirection::AToB => -span,
            SwapDirection::BToA => span,
        };
        let mut start = tick_array_start_index(current_tick, tick_spacing);
        let mut starts = Vec::with_capacity(MAX_TICK_ARRAYS_PER_SWAP);
        while starts.len() < MAX_TICK_ARRAYS_PER_SWAP && start <= MAX_TICK && start + span > MIN_TICK
        {
            starts.push(start);
            start += step;
        }
        starts
    }

    /// Build a sequence from the probed windows and the records found for them
    pub fn new(
        market: MarketId,
        tick_spacing: u16,
        direction: SwapDirection,
        probed: Vec<i32>,
        arrays: Vec<TickArray>,
    ) -> FeelsResult<Self> {
        require!(
            probed.len() <= MAX_TICK_ARRAYS_PER_SWAP,
            FeelsError::TooManyTickArrays
        );
        require!(!probed.is_empty(), FeelsError::TickArrayNotFound);

        let mut by_start = BTreeMap::new();
        for array in arrays {
            require!(array.market == market, FeelsError::TickArrayNotFound);
            require!(
                array.start_tick_index == tick_array_start_index(array.start_tick_index, tick_spacing)
                    && probed.contains(&array.start_tick_index),
                FeelsError::TickArrayNotFound
            );
            by_start.insert(array.start_tick_index, array);
        }

        Ok(Self {
            tick_spacing,
            direction,
            probed,
            arrays: by_start,
        })
    }

    pub fn direction(&self) -> SwapDirection {
        self.direction
    }

    /// Last tick the swap may reach without leaving the probed windows
    pub fn coverage_end(&self) -> i32 {
        let span = ticks_per_array(self.tick_spacing);
        let last = self.probed.last().copied().unwrap_or_default();
        match self.direction {
            SwapDirection::AToB => last.max(MIN_TICK),
            SwapDirection::BToA => (last + span - self.tick_spacing as i32).min(MAX_TICK),
        }
    }

    /// Next initialized tick in the swap direction, searching from `from`.
    ///
    /// Moving down the search includes `from`; moving up it excludes it.
    pub fn next_initialized_tick(&self, from: i32) -> NextTick {
        let a_to_b = self.direction.is_a_to_b();
        for start in &self.probed {
            if let Some(array) = self.arrays.get(start) {
                if let Some(tick) = array.next_initialized_tick(from, self.tick_spacing, a_to_b) {
                    return NextTick::Initialized(tick);
                }
            }
        }
        NextTick::EndOfCoverage(self.coverage_end())
    }

    pub fn tick_mut(&mut self, tick_index: i32) -> FeelsResult<&mut Tick> {
        let start = tick_array_start_index(tick_index, self.tick_spacing);
        self.arrays
            .get_mut(&start)
            .ok_or(FeelsError::TickArrayNotFound)?
            .get_tick_mut(tick_index, self.tick_spacing)
    }

    pub fn arrays(&self) -> impl Iterator<Item = &TickArray> {
        self.arrays.values()
    }

    pub fn into_arrays(self) -> impl Iterator<Item = TickArray> {
        self.arrays.into_values()
    }
}

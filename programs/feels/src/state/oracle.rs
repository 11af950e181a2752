//! Oracle state for TWAP price tracking
//!
//! A ring of `(timestamp, tick_cumulative)` samples. The newest slot stays
//! open until it sits a full sample gap after its predecessor; appends inside
//! the gap extend it in place. Closed samples are never edited, so the ring
//! always spans at least the TWAP window once it is full.

use super::keys::MarketId;
use crate::constants::{MAX_TICK, MIN_TICK, MIN_TWAP_WINDOW, ORACLE_CAPACITY};
use crate::error::{FeelsError, FeelsResult};
use crate::require;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Single price observation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Observation {
    pub timestamp: i64,
    /// Cumulative tick value (tick * seconds)
    pub tick_cumulative: i128,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(default)]
pub struct OracleParams {
    /// TWAP window W in seconds
    pub twap_window_secs: u32,
    /// Newest sample older than this marks the oracle stale
    pub max_age_secs: u32,
    /// Fresh time required before leaving fallback mode
    pub min_dwell_secs: u32,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            twap_window_secs: 600,
            max_age_secs: 900,
            min_dwell_secs: 120,
        }
    }
}

impl OracleParams {
    pub fn validate(&self) -> FeelsResult<()> {
        require!(
            self.twap_window_secs >= MIN_TWAP_WINDOW,
            FeelsError::InvalidFeePolicy("twap window below minimum")
        );
        require!(
            self.max_age_secs > 0,
            FeelsError::InvalidFeePolicy("max age must be positive")
        );
        Ok(())
    }

    /// Smallest spacing between closed samples for the ring to cover the window
    pub fn min_sample_gap_secs(&self) -> i64 {
        self.twap_window_secs
            .div_ceil((ORACLE_CAPACITY - 2) as u32)
            .max(1) as i64
    }
}

/// Externally reported tick that held from the newest sample up to `timestamp`
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct PriceObservation {
    pub tick: i32,
    pub timestamp: i64,
}

/// Freshness of the oracle at a given time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OracleStatus {
    Uninitialized,
    Stale,
    Fresh,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct OracleState {
    pub market: MarketId,
    pub params: OracleParams,
    /// Slot of the newest observation
    pub observation_index: u16,
    /// Number of written slots (grows to capacity)
    pub observation_count: u16,
    pub observations: [Observation; ORACLE_CAPACITY],
}

impl OracleState {
    pub fn new(market: MarketId, params: OracleParams) -> Self {
        Self {
            market,
            params,
            observation_index: 0,
            observation_count: 0,
            observations: [Observation::default(); ORACLE_CAPACITY],
        }
    }

    pub fn newest(&self) -> Option<&Observation> {
        (self.observation_count > 0).then(|| &self.observations[self.observation_index as usize])
    }

    fn oldest_slot(&self) -> usize {
        if (self.observation_count as usize) < ORACLE_CAPACITY {
            0
        } else {
            (self.observation_index as usize + 1) % ORACLE_CAPACITY
        }
    }

    /// Observation by age order, 0 being the oldest
    fn nth(&self, n: usize) -> &Observation {
        &self.observations[(self.oldest_slot() + n) % ORACLE_CAPACITY]
    }

    /// Record the tick that has been in effect since the newest sample.
    ///
    /// Returns false when a sample already exists at `now`.
    pub fn append(&mut self, tick_in_effect: i32, now: i64) -> FeelsResult<bool> {
        let Some(last) = self.newest().copied() else {
            self.observations[0] = Observation {
                timestamp: now,
                tick_cumulative: 0,
            };
            self.observation_index = 0;
            self.observation_count = 1;
            return Ok(true);
        };

        require!(now >= last.timestamp, FeelsError::InvalidTimestamp);
        if now == last.timestamp {
            return Ok(false);
        }

        let tick_cumulative = last
            .tick_cumulative
            .checked_add(
                (tick_in_effect as i128)
                    .checked_mul((now - last.timestamp) as i128)
                    .ok_or(FeelsError::MathOverflow)?,
            )
            .ok_or(FeelsError::MathOverflow)?;

        let sample = Observation {
            timestamp: now,
            tick_cumulative,
        };

        let count = self.observation_count as usize;
        if count > 1 {
            let previous = self.nth(count - 2).timestamp;
            if last.timestamp - previous < self.params.min_sample_gap_secs() {
                self.observations[self.observation_index as usize] = sample;
                return Ok(true);
            }
        }

        let next = (self.observation_index as usize + 1) % ORACLE_CAPACITY;
        self.observations[next] = sample;
        self.observation_index = next as u16;
        if (self.observation_count as usize) < ORACLE_CAPACITY {
            self.observation_count += 1;
        }
        Ok(true)
    }

    /// Validate an outside observation and fold it into the ring
    pub fn record_observation(
        &mut self,
        observation: PriceObservation,
        now: i64,
    ) -> FeelsResult<()> {
        require!(
            (MIN_TICK..=MAX_TICK).contains(&observation.tick),
            FeelsError::InvalidObservation
        );
        require!(observation.timestamp <= now, FeelsError::InvalidObservation);
        if let Some(last) = self.newest() {
            require!(
                observation.timestamp > last.timestamp,
                FeelsError::InvalidObservation
            );
        }
        self.append(observation.tick, observation.timestamp)?;
        Ok(())
    }

    pub fn status(&self, now: i64) -> OracleStatus {
        match self.newest() {
            None => OracleStatus::Uninitialized,
            Some(obs) if now.saturating_sub(obs.timestamp) > self.params.max_age_secs as i64 => {
                OracleStatus::Stale
            }
            Some(_) => OracleStatus::Fresh,
        }
    }

    pub fn is_stale(&self, now: i64) -> bool {
        self.status(now) != OracleStatus::Fresh
    }

    /// Cumulative tick at `target`, extrapolating past the newest sample with
    /// the current tick and interpolating between bracketing samples.
    fn cumulative_at(&self, target: i64, current_tick: i32) -> FeelsResult<i128> {
        let count = self.observation_count as usize;
        let newest = *self.newest().ok_or(FeelsError::InvalidTimestamp)?;

        if target >= newest.timestamp {
            return (current_tick as i128)
                .checked_mul((target - newest.timestamp) as i128)
                .and_then(|extra| newest.tick_cumulative.checked_add(extra))
                .ok_or(FeelsError::MathOverflow);
        }

        let oldest = *self.nth(0);
        require!(target >= oldest.timestamp, FeelsError::InvalidTimestamp);

        // Binary search for the last sample at or before target
        let (mut lo, mut hi) = (0usize, count - 1);
        while lo + 1 < hi {
            let mid = (lo + hi) / 2;
            if self.nth(mid).timestamp <= target {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let before = *self.nth(lo);
        let after = *self.nth(hi);
        if before.timestamp == target {
            return Ok(before.tick_cumulative);
        }

        let span = (after.timestamp - before.timestamp) as i128;
        let delta = after
            .tick_cumulative
            .checked_sub(before.tick_cumulative)
            .ok_or(FeelsError::MathOverflow)?;
        let elapsed = (target - before.timestamp) as i128;
        let interpolated = delta
            .checked_mul(elapsed)
            .ok_or(FeelsError::MathOverflow)?
            .div_euclid(span);
        before
            .tick_cumulative
            .checked_add(interpolated)
            .ok_or(FeelsError::MathOverflow)
    }

    /// Arithmetic mean tick over `[now - W, now]`, rounded toward negative
    /// infinity. The window only shrinks to the oldest sample while the
    /// market is younger than W.
    pub fn twap_tick(&self, now: i64, current_tick: i32) -> FeelsResult<i32> {
        require!(self.observation_count > 0, FeelsError::InvalidTimestamp);
        let oldest = self.nth(0).timestamp;
        let start = (now - self.params.twap_window_secs as i64).max(oldest);
        if start >= now {
            return Ok(current_tick);
        }
        let end_cumulative = self.cumulative_at(now, current_tick)?;
        let start_cumulative = self.cumulative_at(start, current_tick)?;
        let mean = end_cumulative
            .checked_sub(start_cumulative)
            .ok_or(FeelsError::MathOverflow)?
            .div_euclid((now - start) as i128);
        i32::try_from(mean).map_err(|_| FeelsError::MathOverflow)
    }
}

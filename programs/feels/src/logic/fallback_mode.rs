//! Fallback mode for stale or missing oracle data
//!
//! While the oracle cannot be trusted the market prices at the base fee plus
//! an optional fixed spread and pays no rebates. Leaving fallback requires a
//! fresh observation and then `min_dwell` seconds of continuous freshness.

use crate::constants::MAX_INSTANTANEOUS_FEE_BPS;
use crate::error::{FeelsError, FeelsResult};
use crate::state::{FallbackPolicy, FallbackState, OracleStatus};
use tracing::info;

/// Mode change produced by one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTransition {
    Entered,
    Exited,
    Unchanged,
}

pub struct FallbackModeManager;

impl FallbackModeManager {
    /// Advance the fallback state machine for the oracle status at `now`.
    ///
    /// With fallback disabled a stale oracle is an error for pricing paths;
    /// callers that only maintain the oracle pass `strict = false`.
    pub fn evaluate(
        state: &mut FallbackState,
        policy: &FallbackPolicy,
        status: OracleStatus,
        min_dwell_secs: u32,
        now: i64,
        strict: bool,
    ) -> FeelsResult<FallbackTransition> {
        if status != OracleStatus::Fresh {
            if !policy.enabled {
                if strict {
                    return Err(FeelsError::OracleStale);
                }
                return Ok(FallbackTransition::Unchanged);
            }
            state.recovering_since = None;
            if state.active {
                return Ok(FallbackTransition::Unchanged);
            }
            state.active = true;
            state.entered_at = now;
            info!(?status, now, "entering fallback mode");
            return Ok(FallbackTransition::Entered);
        }

        if !state.active {
            return Ok(FallbackTransition::Unchanged);
        }
        let since = *state.recovering_since.get_or_insert(now);
        if now.saturating_sub(since) >= min_dwell_secs as i64 {
            state.active = false;
            state.recovering_since = None;
            info!(now, entered_at = state.entered_at, "leaving fallback mode");
            return Ok(FallbackTransition::Exited);
        }
        Ok(FallbackTransition::Unchanged)
    }

    /// Fee charged while in fallback: base plus spread, capped
    pub fn fallback_fee_bps(base_fee_bps: u16, policy: &FallbackPolicy) -> u16 {
        base_fee_bps
            .saturating_add(policy.spread_bps)
            .min(MAX_INSTANTANEOUS_FEE_BPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> FallbackPolicy {
        FallbackPolicy {
            enabled: true,
            spread_bps: 10,
        }
    }

    #[test]
    fn test_enter_on_stale_and_exit_after_dwell() {
        let mut state = FallbackState::default();
        let evaluate = |state: &mut FallbackState, status, now| {
            FallbackModeManager::evaluate(state, &policy(), status, 120, now, true).unwrap()
        };

        assert_eq!(evaluate(&mut state, OracleStatus::Stale, 0), FallbackTransition::Entered);
        assert_eq!(evaluate(&mut state, OracleStatus::Stale, 10), FallbackTransition::Unchanged);
        assert_eq!(evaluate(&mut state, OracleStatus::Fresh, 100), FallbackTransition::Unchanged);
        assert_eq!(state.recovering_since, Some(100));
        assert_eq!(evaluate(&mut state, OracleStatus::Fresh, 219), FallbackTransition::Unchanged);
        assert_eq!(evaluate(&mut state, OracleStatus::Fresh, 220), FallbackTransition::Exited);
        assert!(!state.active);
    }

    #[test]
    fn test_staleness_resets_recovery() {
        let mut state = FallbackState::default();
        let p = policy();
        FallbackModeManager::evaluate(&mut state, &p, OracleStatus::Uninitialized, 60, 0, true)
            .unwrap();
        FallbackModeManager::evaluate(&mut state, &p, OracleStatus::Fresh, 60, 10, true).unwrap();
        FallbackModeManager::evaluate(&mut state, &p, OracleStatus::Stale, 60, 30, true).unwrap();
        assert_eq!(state.recovering_since, None);
        let t = FallbackModeManager::evaluate(&mut state, &p, OracleStatus::Fresh, 60, 80, true);
        assert_eq!(t, Ok(FallbackTransition::Unchanged));
    }

    #[test]
    fn test_disabled_fallback_rejects_stale_pricing() {
        let mut state = FallbackState::default();
        let disabled = FallbackPolicy {
            enabled: false,
            spread_bps: 0,
        };
        assert_eq!(
            FallbackModeManager::evaluate(&mut state, &disabled, OracleStatus::Stale, 60, 0, true),
            Err(FeelsError::OracleStale)
        );
        assert_eq!(
            FallbackModeManager::evaluate(&mut state, &disabled, OracleStatus::Stale, 60, 0, false),
            Ok(FallbackTransition::Unchanged)
        );
    }

    #[test]
    fn test_fallback_fee_capped() {
        assert_eq!(FallbackModeManager::fallback_fee_bps(25, &policy()), 35);
        let wide = FallbackPolicy {
            enabled: true,
            spread_bps: 1_000,
        };
        assert_eq!(
            FallbackModeManager::fallback_fee_bps(25, &wide),
            MAX_INSTANTANEOUS_FEE_BPS
        );
    }
}

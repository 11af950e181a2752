//! Fee policy records
//!
//! The fee model is a closed set selected per market at initialization and
//! snapshotted into the Market record, together with the mutable state the
//! models accumulate (flow EWMA, fallback status).

use crate::constants::{
    BASE_FEE_NORMAL_BPS, BASE_FEE_STABLE_BPS, BASE_FEE_VOLATILE_BPS, BPS_DENOMINATOR,
    MAX_INSTANTANEOUS_FEE_BPS, Q64,
};
use crate::error::{FeelsError, FeelsResult};
use crate::require;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Pool risk class, selects the base fee
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskClass {
    Stable,
    #[default]
    Normal,
    Volatile,
}

/// Base fee per risk class in basis points
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseFeeSchedule {
    pub stable_bps: u16,
    pub normal_bps: u16,
    pub volatile_bps: u16,
}

impl Default for BaseFeeSchedule {
    fn default() -> Self {
        Self {
            stable_bps: BASE_FEE_STABLE_BPS,
            normal_bps: BASE_FEE_NORMAL_BPS,
            volatile_bps: BASE_FEE_VOLATILE_BPS,
        }
    }
}

impl BaseFeeSchedule {
    pub fn base_fee_bps(&self, class: RiskClass) -> u16 {
        match class {
            RiskClass::Stable => self.stable_bps,
            RiskClass::Normal => self.normal_bps,
            RiskClass::Volatile => self.volatile_bps,
        }
    }

    pub fn validate(&self) -> FeelsResult<()> {
        for bps in [self.stable_bps, self.normal_bps, self.volatile_bps] {
            require!(
                bps <= MAX_INSTANTANEOUS_FEE_BPS,
                FeelsError::InvalidFeePolicy("base fee above instantaneous cap")
            );
        }
        Ok(())
    }
}

// ============================================================================
// Potential (work) model parameters
// ============================================================================

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(default)]
pub struct PotentialParams {
    /// Raw domain weights, normalized on use
    pub weight_spot: u32,
    pub weight_time: u32,
    pub weight_leverage: u32,
    /// λ: token units per unit of work per unit traded, in bps (10000 = 1.0)
    pub work_price_bps: u32,
    /// η: share of downhill work paid back as rebate
    pub eta_bps: u16,
    /// κ: share of measured price improvement eligible as rebate, (0, 10000]
    pub kappa_bps: u16,
}

impl Default for PotentialParams {
    fn default() -> Self {
        Self {
            weight_spot: 6000,
            weight_time: 2000,
            weight_leverage: 2000,
            work_price_bps: 10_000,
            eta_bps: 5000,
            kappa_bps: 5000,
        }
    }
}

impl PotentialParams {
    fn weight_sum(&self) -> u64 {
        self.weight_spot as u64 + self.weight_time as u64 + self.weight_leverage as u64
    }

    /// Normalized weights (ŵ_s, ŵ_t, ŵ_l) in Q64.64, summing to 1
    pub fn normalized_weights_x64(&self) -> FeelsResult<[u128; 3]> {
        let sum = self.weight_sum() as u128;
        require!(sum > 0, FeelsError::InvalidFeePolicy("weights sum to zero"));
        let w = |raw: u32| (raw as u128) * Q64 / sum;
        Ok([
            w(self.weight_spot),
            w(self.weight_time),
            w(self.weight_leverage),
        ])
    }

    pub fn validate(&self) -> FeelsResult<()> {
        require!(
            self.weight_sum() > 0,
            FeelsError::InvalidFeePolicy("weights sum to zero")
        );
        require!(
            self.kappa_bps > 0 && self.kappa_bps as u64 <= BPS_DENOMINATOR,
            FeelsError::InvalidFeePolicy("kappa must be in (0, 10000] bps")
        );
        require!(
            self.eta_bps as u64 <= BPS_DENOMINATOR,
            FeelsError::InvalidFeePolicy("eta above 10000 bps")
        );
        require!(
            self.work_price_bps > 0,
            FeelsError::InvalidFeePolicy("work price must be positive")
        );
        Ok(())
    }
}

// ============================================================================
// Displacement / flow model parameters
// ============================================================================

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(default)]
pub struct FlowParams {
    pub f_min_bps: u16,
    pub f_max_bps: u16,
    /// Weight of the displacement term
    pub k_disp_bps: u16,
    /// Weight of the flow term
    pub k_flow_bps: u16,
    /// S: half-saturation of g, in ticks
    pub displacement_half_saturation: u32,
    /// Q: half-saturation of h, in token-A units
    pub flow_half_saturation: u64,
    /// ε: displacement dead band, in ticks
    pub deadband_ticks: u32,
    /// γ: discount applied to the flow term for trades toward equilibrium
    pub toward_discount_bps: u16,
    /// α: EWMA weight of each new trade
    pub ewma_alpha_bps: u16,
    /// Idle decay half-life of the flow EWMA
    pub half_life_secs: u32,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            f_min_bps: 1,
            f_max_bps: MAX_INSTANTANEOUS_FEE_BPS,
            k_disp_bps: 50,
            k_flow_bps: 40,
            displacement_half_saturation: 100,
            flow_half_saturation: 10_000,
            deadband_ticks: 2,
            toward_discount_bps: 5000,
            ewma_alpha_bps: 2000,
            half_life_secs: 300,
        }
    }
}

impl FlowParams {
    pub fn validate(&self) -> FeelsResult<()> {
        require!(
            self.f_min_bps <= self.f_max_bps,
            FeelsError::InvalidFeePolicy("f_min above f_max")
        );
        require!(
            self.f_max_bps <= MAX_INSTANTANEOUS_FEE_BPS,
            FeelsError::InvalidFeePolicy("f_max above instantaneous cap")
        );
        require!(
            self.displacement_half_saturation > 0 && self.flow_half_saturation > 0,
            FeelsError::InvalidFeePolicy("half-saturation constants must be positive")
        );
        require!(
            self.ewma_alpha_bps > 0 && self.ewma_alpha_bps as u64 <= BPS_DENOMINATOR,
            FeelsError::InvalidFeePolicy("alpha must be in (0, 10000] bps")
        );
        require!(
            self.toward_discount_bps as u64 <= BPS_DENOMINATOR,
            FeelsError::InvalidFeePolicy("gamma above 10000 bps")
        );
        require!(
            self.half_life_secs > 0,
            FeelsError::InvalidFeePolicy("half-life must be positive")
        );
        Ok(())
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Closed set of fee models, dispatched once per instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum FeeModel {
    Potential(PotentialParams),
    DisplacementFlow(FlowParams),
}

impl FeeModel {
    pub fn validate(&self) -> FeelsResult<()> {
        match self {
            FeeModel::Potential(params) => params.validate(),
            FeeModel::DisplacementFlow(params) => params.validate(),
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(default)]
pub struct FallbackPolicy {
    /// When false a stale oracle fails the swap instead of degrading
    pub enabled: bool,
    /// Fixed conservative spread added to the base fee while degraded
    pub spread_bps: u16,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            spread_bps: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct FeePolicy {
    pub model: FeeModel,
    pub fallback: FallbackPolicy,
}

impl FeePolicy {
    pub fn validate(&self) -> FeelsResult<()> {
        self.model.validate()?;
        require!(
            self.fallback.spread_bps <= MAX_INSTANTANEOUS_FEE_BPS,
            FeelsError::InvalidFeePolicy("fallback spread above instantaneous cap")
        );
        Ok(())
    }
}

// ============================================================================
// Accumulated model state
// ============================================================================

/// Signed flow EWMA, stored as I64F64 bits
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct FlowState {
    pub signed_flow_ewma_bits: i128,
    pub last_update_ts: i64,
}

/// Degraded pricing status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct FallbackState {
    pub active: bool,
    pub entered_at: i64,
    /// Time of the first fresh evaluation since entering
    pub recovering_since: Option<i64>,
}

/// Time and leverage domain multipliers for the potential, Q64.64
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct DomainMultipliers {
    pub time_x64: u128,
    pub leverage_x64: u128,
}

impl Default for DomainMultipliers {
    fn default() -> Self {
        Self {
            time_x64: Q64,
            leverage_x64: Q64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_weights_sum_to_one() {
        let weights = PotentialParams::default().normalized_weights_x64().unwrap();
        let sum: u128 = weights.iter().sum();
        assert!(Q64 - sum <= 3);
    }

    #[test]
    fn test_flow_params_validation() {
        assert!(FlowParams::default().validate().is_ok());
        let bad = FlowParams {
            f_min_bps: 300,
            ..FlowParams::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_kappa_must_be_positive() {
        let params = PotentialParams {
            kappa_bps: 0,
            ..PotentialParams::default()
        };
        assert!(params.validate().is_err());
    }
}

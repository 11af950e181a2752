//! Protocol configuration
//!
//! Fee, rebate and oracle parameters loaded from TOML. Markets snapshot the
//! relevant sections at initialization, so a later config change never
//! alters an existing market.

use crate::error::FeelsError;
use crate::state::{
    BaseFeeSchedule, FallbackPolicy, FeeModel, FeePolicy, FlowParams, OracleParams,
    PotentialParams, RebateParams, RiskClass,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] FeelsError),
}

/// Which fee model new markets use unless told otherwise
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeModelKind {
    #[default]
    Potential,
    DisplacementFlow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeesConfig {
    pub base: BaseFeeSchedule,
    pub model: FeeModelKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub fees: FeesConfig,
    pub potential: PotentialParams,
    pub flow: FlowParams,
    pub rebate: RebateParams,
    pub oracle: OracleParams,
    pub fallback: FallbackPolicy,
}

impl ProtocolConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FeelsError> {
        self.fees.base.validate()?;
        self.potential.validate()?;
        self.flow.validate()?;
        self.rebate.validate()?;
        self.oracle.validate()?;
        self.fee_policy(None).validate()
    }

    pub fn base_fee_bps(&self, class: RiskClass) -> u16 {
        self.fees.base.base_fee_bps(class)
    }

    /// Fee policy snapshot for a new market
    pub fn fee_policy(&self, model: Option<FeeModelKind>) -> FeePolicy {
        let model = match model.unwrap_or(self.fees.model) {
            FeeModelKind::Potential => FeeModel::Potential(self.potential),
            FeeModelKind::DisplacementFlow => FeeModel::DisplacementFlow(self.flow),
        };
        FeePolicy {
            model,
            fallback: self.fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ProtocolConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_fee_bps(RiskClass::Normal), 25);
        assert!(matches!(config.fee_policy(None).model, FeeModel::Potential(_)));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ProtocolConfig::from_toml_str(
            r#"
[fees]
model = "displacement_flow"

[fees.base]
volatile_bps = 100

[oracle]
twap_window_secs = 300
"#,
        )
        .unwrap();
        assert_eq!(config.fees.model, FeeModelKind::DisplacementFlow);
        assert_eq!(config.base_fee_bps(RiskClass::Volatile), 100);
        assert_eq!(config.base_fee_bps(RiskClass::Stable), 5);
        assert_eq!(config.oracle.twap_window_secs, 300);
        assert_eq!(config.oracle.max_age_secs, 900);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ProtocolConfig::from_toml_str("[potential]\nkappa_bps = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(FeelsError::InvalidFeePolicy(_))));

        let err = ProtocolConfig::from_toml_str("[oracle]\ntwap_window_secs = 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ProtocolConfig::from_toml_str("[fees.base]\nnormal_bps = 400\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = ProtocolConfig::from_toml_str("[fees\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

//! Loading protocol configuration from disk

mod common;

use common::*;
use feels::{ConfigError, FeeModel, FeeModelKind, ProtocolConfig, RiskClass};
use std::io::Write;

#[test]
fn test_load_from_file_and_initialize_market() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[fees]
model = "displacement_flow"

[fees.base]
normal_bps = 30

[flow]
k_flow_bps = 20

[rebate]
buffer_fee_share_bps = 2000
"#
    )
    .unwrap();

    let config = ProtocolConfig::load(file.path()).unwrap();
    assert_eq!(config.base_fee_bps(RiskClass::Normal), 30);
    assert_eq!(config.rebate.buffer_fee_share_bps, 2000);

    let mut market = TestMarket::with_config(config, config.fees.model);
    let state = market.market_state();
    assert_eq!(state.base_fee_bps, 30);
    assert!(matches!(
        state.fee_policy.model,
        FeeModel::DisplacementFlow(params) if params.k_flow_bps == 20
    ));
    assert_eq!(market.buffer_state().params.buffer_fee_share_bps, 2000);

    market.add_liquidity(-100, 100, 1_000_000).unwrap();
    assert_eq!(market.swap(true, 1_000, true).unwrap().fee_bps, 30);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProtocolConfig::load(dir.path().join("feels.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[fees\nmodel = ").unwrap();
    let err = ProtocolConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_explicit_model_overrides_config_default() {
    let market = TestMarket::new(FeeModelKind::Potential);
    assert!(matches!(
        market.market_state().fee_policy.model,
        FeeModel::Potential(_)
    ));
}

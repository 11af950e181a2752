//! Property-based tests for fee bounds, rebate caps, tick crossing and
//! value conservation through the swap path.

mod common;

use common::*;
use feels::constants::{MAX_INSTANTANEOUS_FEE_BPS, MAX_SURCHARGE_BPS};
use feels::logic::{flow_fee_bps, rebate_amount, surcharge_bps};
use feels::utils::{amounts_for_liquidity, quote_a_to_b, quote_b_to_a, TickMath};
use feels::{
    Buffer, FeeModelKind, FlowParams, MarketId, PotentialParams, RebateParams, Tick, TokenSide,
};
use fixed::types::I64F64;
use proptest::prelude::*;

// ============================================================================
// Test Strategies
// ============================================================================

fn potential_params() -> impl Strategy<Value = PotentialParams> {
    (1u32..100_000, 0u16..=10_000, 1u16..=10_000).prop_map(|(work_price_bps, eta_bps, kappa_bps)| {
        PotentialParams {
            work_price_bps,
            eta_bps,
            kappa_bps,
            ..PotentialParams::default()
        }
    })
}

fn flow_state() -> impl Strategy<Value = I64F64> {
    (-1_000_000_000_000i64..1_000_000_000_000).prop_map(I64F64::from_num)
}

// ============================================================================
// Fee bounds
// ============================================================================

proptest! {
    #[test]
    fn prop_flow_fee_stays_within_bounds(
        base in 0u16..=250,
        current_tick in -443_636i32..443_636,
        twap_tick in -443_636i32..443_636,
        flow in flow_state(),
        away in any::<bool>(),
    ) {
        let params = FlowParams::default();
        let fee = flow_fee_bps(&params, base, current_tick, twap_tick, flow, away);
        prop_assert!(fee >= params.f_min_bps);
        prop_assert!(fee <= params.f_max_bps);
        prop_assert!(fee <= MAX_INSTANTANEOUS_FEE_BPS);
    }

    #[test]
    fn prop_surcharge_is_capped(work_up in any::<u128>(), params in potential_params()) {
        let surcharge = surcharge_bps(work_up, &params);
        prop_assert!(surcharge <= MAX_SURCHARGE_BPS);
    }

    #[test]
    fn prop_surcharge_is_monotonic_in_work(
        a in 0u128..(1u128 << 80),
        b in 0u128..(1u128 << 80),
        params in potential_params(),
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(surcharge_bps(low, &params) <= surcharge_bps(high, &params));
    }
}

// ============================================================================
// Rebate bounds
// ============================================================================

proptest! {
    #[test]
    fn prop_rebate_never_exceeds_kappa_share_of_improvement(
        work_down in 0u128..(1u128 << 70),
        amount_out in 0u64..1_000_000_000_000,
        improvement in 0u64..1_000_000_000,
        params in potential_params(),
    ) {
        let rebate = rebate_amount(work_down, amount_out, improvement, &params).unwrap();
        let cap = improvement as u128 * params.kappa_bps as u128 / 10_000;
        prop_assert!(rebate as u128 <= cap);
    }

    #[test]
    fn prop_buffer_pays_within_caps(
        balance in 0u64..1_000_000_000_000,
        requests in prop::collection::vec(0u64..1_000_000_000, 1..20),
    ) {
        let mut buffer = Buffer::new(MarketId::default(), RebateParams::default(), 0);
        buffer.collect_fees(TokenSide::B, balance).unwrap();
        buffer.roll_epoch(RebateParams::default().epoch_duration_secs);
        let epoch_cap = balance as u128 * RebateParams::default().cap_epoch_bps as u128 / 10_000;

        let mut paid_total = 0u128;
        for requested in requests {
            let before = buffer.balance[1];
            let paid = buffer.pay_rebate(TokenSide::B, requested).unwrap();
            prop_assert!(paid <= requested);
            prop_assert!(paid as u128 <= before as u128 * 100 / 10_000);
            prop_assert_eq!(buffer.balance[1], before - paid);
            paid_total += paid as u128;
        }
        prop_assert!(paid_total <= epoch_cap);
    }
}

// ============================================================================
// Tick crossing and liquidity amounts
// ============================================================================

proptest! {
    #[test]
    fn prop_crossing_twice_restores_fee_growth_outside(
        outside in any::<[u128; 2]>(),
        global in any::<[u128; 2]>(),
    ) {
        let mut tick = Tick {
            fee_growth_outside_x64: outside,
            ..Tick::default()
        };
        tick.flip_fee_growth_outside(global);
        tick.flip_fee_growth_outside(global);
        prop_assert_eq!(tick.fee_growth_outside_x64, outside);
    }

    #[test]
    fn prop_deposit_rounding_covers_withdrawal(
        lower in -500i32..0,
        width in 1i32..500,
        current in -1_000i32..1_000,
        liquidity in 1_000u128..1_000_000_000_000,
    ) {
        let lower = lower * 10;
        let upper = lower + width * 10;
        let sqrt_price = TickMath::sqrt_price_at_tick(current).unwrap();
        let deposit = amounts_for_liquidity(sqrt_price, current, lower, upper, liquidity, true).unwrap();
        let withdrawal = amounts_for_liquidity(sqrt_price, current, lower, upper, liquidity, false).unwrap();
        prop_assert!(withdrawal.0 <= deposit.0 && deposit.0 - withdrawal.0 <= 1);
        prop_assert!(withdrawal.1 <= deposit.1 && deposit.1 - withdrawal.1 <= 1);
    }
}

// ============================================================================
// Swap conservation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_swap_never_pays_more_than_the_start_price(
        trades in prop::collection::vec((any::<bool>(), 1u64..5_000), 1..6),
    ) {
        let mut market = TestMarket::new(FeeModelKind::DisplacementFlow);
        market.add_liquidity(-300, 300, 2_000_000).unwrap();
        market.add_liquidity(-100, 50, 500_000).unwrap();

        for (a_to_b, amount) in trades {
            let sqrt_start = market.market_state().sqrt_price;
            let vault_a = market.vault_balance(token_a());
            let vault_b = market.vault_balance(token_b());
            let outcome = market.swap(a_to_b, amount, true).unwrap();

            prop_assert!(outcome.fee_paid <= outcome.amount_in);
            let net_in = outcome.amount_in - outcome.fee_paid;
            let bound = if a_to_b {
                quote_a_to_b(net_in, sqrt_start).unwrap()
            } else {
                quote_b_to_a(net_in, sqrt_start).unwrap()
            };
            prop_assert!(outcome.amount_out as u128 <= bound);

            // Vault moves by exactly what the trader paid and received
            let (paid_into, paid_from) = if a_to_b {
                (
                    market.vault_balance(token_a()) - vault_a,
                    vault_b - market.vault_balance(token_b()),
                )
            } else {
                (
                    market.vault_balance(token_b()) - vault_b,
                    vault_a - market.vault_balance(token_a()),
                )
            };
            prop_assert_eq!(paid_into, outcome.amount_in);
            prop_assert_eq!(paid_from, outcome.amount_out + outcome.rebate);

            let state = market.market_state();
            prop_assert_eq!(state.liquidity, market.liquidity_at(state.current_tick));
        }
    }
}

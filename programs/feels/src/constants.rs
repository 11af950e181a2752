//! Global constants for the Feels engine
//!
//! Centralized constants for tick math, fee caps and per-instruction resource limits

// Math constants
pub const Q64: u128 = 1u128 << 64;
pub const BPS_DENOMINATOR: u64 = 10_000;

/// ln(2) in Q64.64
pub const LN2_X64: u128 = 12_786_308_645_202_655_660;

// Tick constants
pub const MIN_TICK: i32 = -443636;
pub const MAX_TICK: i32 = 443636;
pub const MIN_SQRT_PRICE_X64: u128 = 4_295_048_016;
pub const MAX_SQRT_PRICE_X64: u128 = 79_226_673_515_401_279_992_447_579_055;
pub const MAX_TICK_SPACING: u16 = 1000;

/// Number of ticks per array (kept small to bound per-access cost)
pub const TICK_ARRAY_SIZE: usize = 64;

// Fee constants
/// Absolute ceiling on the per-swap fee rate after the dynamic surcharge
pub const MAX_INSTANTANEOUS_FEE_BPS: u16 = 250;
/// Ceiling on the dynamic component alone
pub const MAX_SURCHARGE_BPS: u16 = 200;

pub const BASE_FEE_STABLE_BPS: u16 = 5;
pub const BASE_FEE_NORMAL_BPS: u16 = 25;
pub const BASE_FEE_VOLATILE_BPS: u16 = 80;

// Rebate constants
pub const MAX_REBATE_PER_TX_BPS: u16 = 100; // 1% of buffer per transaction
pub const MAX_REBATE_PER_EPOCH_BPS: u16 = 1000; // 10% of buffer per epoch
pub const REBATE_EPOCH_DURATION: i64 = 3600;
pub const DEFAULT_BUFFER_FEE_SHARE_BPS: u16 = 1000;

// Oracle constants
/// Ring capacity of the observation buffer
pub const ORACLE_CAPACITY: usize = 64;
pub const MIN_TWAP_WINDOW: u32 = 60;

// Swap constants
/// Maximum number of stepping iterations in a single swap
pub const MAX_SWAP_STEPS: usize = 256;
/// Maximum number of tick arrays a single swap may declare
pub const MAX_TICK_ARRAYS_PER_SWAP: usize = 10;

// Liquidity constants
/// Minimum liquidity for a position
/// Prevents dust positions that consume records but carry no economic weight
pub const MIN_LIQUIDITY: u128 = 1000;

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::const_assert;

    const_assert!(BASE_FEE_VOLATILE_BPS <= MAX_INSTANTANEOUS_FEE_BPS);
    const_assert!(MAX_SURCHARGE_BPS <= MAX_INSTANTANEOUS_FEE_BPS);
    const_assert!(MIN_TICK == -MAX_TICK);

    #[test]
    fn ln2_matches_reference() {
        // ln(2) * 2^64 = 12786308645202655659.86...
        let approx = 0.693_147_180_559_945_3_f64 * 18_446_744_073_709_551_616.0;
        let diff = (approx - LN2_X64 as f64).abs();
        assert!(diff < 1e5);
    }

    #[test]
    fn sqrt_price_bounds_match_tick_math() {
        assert_eq!(
            orca_whirlpools_core::tick_index_to_sqrt_price(MIN_TICK),
            MIN_SQRT_PRICE_X64
        );
        assert_eq!(
            orca_whirlpools_core::tick_index_to_sqrt_price(MAX_TICK),
            MAX_SQRT_PRICE_X64
        );
    }
}

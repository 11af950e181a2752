/// Utility module providing mathematical primitives and helper functions.
/// Organized into specialized sub-modules for different mathematical domains:
/// wide intermediate products, liquidity math, tick conversions, logarithms
/// and safe arithmetic, plus the token transfer helpers handlers share.
pub mod math_general; // Fixed-point logarithms
pub mod math_liquidity; // Pure mathematical liquidity functions
pub mod math_safe; // Overflow-safe arithmetic traits
pub mod math_tick; // Tick-price conversion utilities
pub mod math_u256; // 256-bit intermediate products
pub mod transfers; // User <-> vault transfers

// Re-exports
pub use math_general::{abs_ln_ratio_x64, ln_x64, log2_x64};
pub use math_liquidity::{amounts_for_liquidity, get_amount_a_delta, get_amount_b_delta};
pub use math_safe::{add_liquidity_delta, to_u64, SafeMath};
pub use math_tick::{
    tick_array_start_index, ticks_per_array, validate_tick_range, validate_tick_spacing, TickMath,
};
pub use math_u256::{
    fee_growth_delta_x64, fees_owed_for, mul_div, mul_shr_64, mul_shr_64_signed, quote_a_to_b,
    quote_b_to_a, shl_64_div, Rounding,
};
pub use transfers::{transfer_from_user_to_vault, transfer_from_vault_to_user};

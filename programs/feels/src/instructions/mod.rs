/// Instruction module organizing all engine operations into logical groups.
/// Market instructions create and administer markets, liquidity instructions
/// manage LP positions, trading instructions price and execute swaps, and
/// maintenance instructions keep the oracle fresh and reclaim empty records.
/// Every handler stages its records in one work unit and commits once.

// Market operations
pub mod configure_market;
pub mod initialize_market;

// Liquidity
pub mod collect_fees;
pub mod liquidity_add;
pub mod liquidity_remove;

// Trading
pub mod swap;

// Maintenance
pub mod oracle_update;
pub mod tick_cleanup;

// Re-export functions and types
pub use collect_fees::{collect_fees, CollectFeesParams, CollectFeesResult};
pub use configure_market::{set_market_paused, update_fee_policy, update_field_multipliers};
pub use initialize_market::{initialize_market, InitializeMarketParams, InitializeMarketResult};
pub use liquidity_add::{add_liquidity, AddLiquidityParams, AddLiquidityResult};
pub use liquidity_remove::{remove_liquidity, RemoveLiquidityParams, RemoveLiquidityResult};
pub use oracle_update::{update_oracle, UpdateOracleParams, UpdateOracleResult};
pub use swap::{quote_swap, swap, SwapInstructionParams, SwapOutcome};
pub use tick_cleanup::{cleanup_empty_tick_array, CleanupTickArrayParams};

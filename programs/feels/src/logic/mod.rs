//! Protocol logic modules
//!
//! Core business logic separated from instruction handlers

pub mod engine;
pub mod fallback_mode;
pub mod fee_manager;
pub mod flow_fee;
pub mod liquidity;
pub mod position_fees;
pub mod swap_execution;
pub mod tick_array;
pub mod unit_of_work;
pub mod work_calculation;

pub use engine::*;
pub use fallback_mode::*;
pub use fee_manager::*;
pub use flow_fee::*;
pub use liquidity::*;
pub use position_fees::*;
pub use swap_execution::*;
pub use tick_array::*;
pub use unit_of_work::*;
pub use work_calculation::*;

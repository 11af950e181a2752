//! Feels concentrated liquidity engine
//!
//! Tick-indexed liquidity with fee-growth accounting, a potential-based
//! dynamic fee with bounded rebates, and a work unit that makes every
//! instruction apply completely or not at all. The engine runs against the
//! `host` traits and has no dependency on any particular ledger.

#[macro_use]
pub mod macros;

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod host;
pub mod instructions;
pub mod logic;
pub mod state;
pub mod utils;

pub use config::{ConfigError, FeeModelKind, ProtocolConfig};
pub use error::{ErrorCategory, FeelsError, FeelsResult};
pub use events::FeelsEvent;
pub use host::{AccountStore, Clock, Context, Holder, MemoryStore, MemoryTokenLedger, TokenProgram, TokenTransfer};
pub use instructions::*;
pub use state::*;

//! Host adapter
//!
//! The engine never touches a ledger directly. A host supplies record
//! storage, token movement and a clock through the traits below; the
//! in-memory implementations back the test-suite and simulations.

pub mod context;
pub mod store;
pub mod token;

pub use context::*;
pub use store::*;
pub use token::*;

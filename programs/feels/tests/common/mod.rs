//! Shared test infrastructure for the Feels engine

#![allow(dead_code)]

pub mod fixtures;
pub mod tracing;

pub use fixtures::*;
pub use tracing::init_test_tracing;

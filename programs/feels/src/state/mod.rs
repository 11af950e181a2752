//! Persisted state records
//!
//! Every record serializes with borsh behind an 8-byte discriminator so a
//! loader can tell a missing record, a record of another type and a record
//! of the wrong size apart.

pub mod buffer;
pub mod fee_policy;
pub mod keys;
pub mod market;
pub mod oracle;
pub mod position;
pub mod reentrancy;
pub mod tick;

pub use buffer::*;
pub use fee_policy::*;
pub use keys::*;
pub use market::*;
pub use oracle::*;
pub use position::*;
pub use reentrancy::*;
pub use tick::*;

use crate::error::{FeelsError, FeelsResult};
use borsh::{BorshDeserialize, BorshSerialize};

pub const DISCRIMINATOR_LEN: usize = 8;

/// A persisted record type
pub trait Record: BorshSerialize + BorshDeserialize + Clone {
    const DISCRIMINATOR: [u8; DISCRIMINATOR_LEN];

    fn try_serialize(&self) -> FeelsResult<Vec<u8>> {
        let mut data = Self::DISCRIMINATOR.to_vec();
        BorshSerialize::serialize(self, &mut data)
            .map_err(|_| FeelsError::AccountDidNotSerialize)?;
        Ok(data)
    }

    /// Decode stored bytes; trailing or missing bytes fail the load
    fn try_deserialize(data: &[u8]) -> FeelsResult<Self> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(FeelsError::AccountDidNotDeserialize);
        }
        if data[..DISCRIMINATOR_LEN] != Self::DISCRIMINATOR {
            return Err(FeelsError::AccountDiscriminatorMismatch);
        }
        Self::try_from_slice(&data[DISCRIMINATOR_LEN..])
            .map_err(|_| FeelsError::AccountDidNotDeserialize)
    }
}

impl Record for Market {
    const DISCRIMINATOR: [u8; 8] = *b"fl:mrket";
}

impl Record for TickArray {
    const DISCRIMINATOR: [u8; 8] = *b"fl:ticks";
}

impl Record for Position {
    const DISCRIMINATOR: [u8; 8] = *b"fl:posit";
}

impl Record for OracleState {
    const DISCRIMINATOR: [u8; 8] = *b"fl:oracl";
}

impl Record for Buffer {
    const DISCRIMINATOR: [u8; 8] = *b"fl:buffr";
}

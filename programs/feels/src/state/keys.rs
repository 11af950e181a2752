//! Record identities
//!
//! Every persisted record is addressed by a `RecordKey`. Ticks are never
//! addressed individually: they live inside the tick array whose window
//! contains them, and neighbours are found by index arithmetic.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque 32-byte identity for owners, authorities and token mints
#[derive(
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Address whose leading bytes carry `seed`, handy for hosts and fixtures
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&seed.to_be_bytes());
        Self(bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// One market per ordered token pair
#[derive(
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
pub struct MarketId {
    pub token_a: Address,
    pub token_b: Address,
}

impl MarketId {
    pub fn new(token_a: Address, token_b: Address) -> Self {
        Self { token_a, token_b }
    }

    pub fn mint(&self, side: TokenSide) -> Address {
        match side {
            TokenSide::A => self.token_a,
            TokenSide::B => self.token_b,
        }
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.token_a, self.token_b)
    }
}

/// Which side of the pair an amount or accumulator refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenSide {
    A,
    B,
}

impl TokenSide {
    pub const fn index(self) -> usize {
        match self {
            TokenSide::A => 0,
            TokenSide::B => 1,
        }
    }

    pub const fn other(self) -> Self {
        match self {
            TokenSide::A => TokenSide::B,
            TokenSide::B => TokenSide::A,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKey {
    Market(MarketId),
    TickArray { market: MarketId, start_tick_index: i32 },
    Position { market: MarketId, id: u64 },
    Oracle(MarketId),
    Buffer(MarketId),
}

impl RecordKey {
    pub fn market(&self) -> MarketId {
        match *self {
            RecordKey::Market(market)
            | RecordKey::Oracle(market)
            | RecordKey::Buffer(market)
            | RecordKey::TickArray { market, .. }
            | RecordKey::Position { market, .. } => market,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Market(m) => write!(f, "market:{}", m),
            RecordKey::TickArray {
                market,
                start_tick_index,
            } => write!(f, "tick_array:{}:{}", market, start_tick_index),
            RecordKey::Position { market, id } => write!(f, "position:{}:{}", market, id),
            RecordKey::Oracle(m) => write!(f, "oracle:{}", m),
            RecordKey::Buffer(m) => write!(f, "buffer:{}", m),
        }
    }
}

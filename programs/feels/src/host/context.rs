//! Per-instruction context handed to every handler

use super::store::AccountStore;
use super::token::TokenProgram;
use crate::events::FeelsEvent;
use crate::state::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Clock {
    pub unix_timestamp: i64,
}

pub struct Context<'a, S: AccountStore, T: TokenProgram> {
    pub store: &'a S,
    pub token_program: &'a mut T,
    pub clock: Clock,
    /// The account authorizing this instruction
    pub signer: Address,
    /// Events from committed instructions, in order
    pub events: Vec<FeelsEvent>,
}

impl<'a, S: AccountStore, T: TokenProgram> Context<'a, S, T> {
    pub fn new(store: &'a S, token_program: &'a mut T, signer: Address, unix_timestamp: i64) -> Self {
        Self {
            store,
            token_program,
            clock: Clock { unix_timestamp },
            signer,
            events: Vec::new(),
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.unix_timestamp
    }
}

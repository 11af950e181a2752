//! Token movement
//!
//! Transfers are external side effects. Handlers issue them after business
//! logic and before commit, so a failed transfer leaves no state behind.

use crate::error::{FeelsError, FeelsResult};
use crate::state::{Address, MarketId};
use std::collections::BTreeMap;
use tracing::debug;

/// Owner of a token balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Holder {
    User(Address),
    /// The market's pooled vault, which also holds the buffer's tokens
    Vault(MarketId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTransfer {
    pub mint: Address,
    pub from: Holder,
    pub to: Holder,
    pub amount: u64,
}

pub trait TokenProgram {
    fn transfer(&mut self, transfer: &TokenTransfer) -> FeelsResult<()>;
}

/// In-memory balances keyed by (holder, mint)
#[derive(Debug, Default, Clone)]
pub struct MemoryTokenLedger {
    balances: BTreeMap<(Holder, Address), u64>,
}

impl MemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint_to(&mut self, holder: Holder, mint: Address, amount: u64) -> FeelsResult<()> {
        let balance = self.balances.entry((holder, mint)).or_default();
        *balance = balance.checked_add(amount).ok_or(FeelsError::MathOverflow)?;
        Ok(())
    }

    pub fn balance(&self, holder: Holder, mint: Address) -> u64 {
        self.balances.get(&(holder, mint)).copied().unwrap_or(0)
    }
}

impl TokenProgram for MemoryTokenLedger {
    fn transfer(&mut self, transfer: &TokenTransfer) -> FeelsResult<()> {
        if transfer.amount == 0 {
            return Ok(());
        }
        let from_balance = self.balance(transfer.from, transfer.mint);
        let remaining = from_balance
            .checked_sub(transfer.amount)
            .ok_or(FeelsError::TokenTransferFailed)?;
        let to_balance = self
            .balance(transfer.to, transfer.mint)
            .checked_add(transfer.amount)
            .ok_or(FeelsError::TokenTransferFailed)?;
        self.balances.insert((transfer.from, transfer.mint), remaining);
        self.balances.insert((transfer.to, transfer.mint), to_balance);
        debug!(
            mint = %transfer.mint,
            amount = transfer.amount,
            "token transfer {:?} -> {:?}",
            transfer.from,
            transfer.to
        );
        Ok(())
    }
}

impl<T: TokenProgram + ?Sized> TokenProgram for &mut T {
    fn transfer(&mut self, transfer: &TokenTransfer) -> FeelsResult<()> {
        (**self).transfer(transfer)
    }
}

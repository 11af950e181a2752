//! Token transfer utilities
//!
//! Helper functions for the two transfer patterns every handler uses

use crate::error::FeelsResult;
use crate::host::{Holder, TokenProgram, TokenTransfer};
use crate::state::{Address, MarketId, TokenSide};

/// Transfer tokens from a user to the market vault
pub fn transfer_from_user_to_vault<T: TokenProgram + ?Sized>(
    token_program: &mut T,
    market: MarketId,
    side: TokenSide,
    user: Address,
    amount: u64,
) -> FeelsResult<()> {
    if amount == 0 {
        return Ok(());
    }
    token_program.transfer(&TokenTransfer {
        mint: market.mint(side),
        from: Holder::User(user),
        to: Holder::Vault(market),
        amount,
    })
}

/// Transfer tokens from the market vault to a user
pub fn transfer_from_vault_to_user<T: TokenProgram + ?Sized>(
    token_program: &mut T,
    market: MarketId,
    side: TokenSide,
    user: Address,
    amount: u64,
) -> FeelsResult<()> {
    if amount == 0 {
        return Ok(());
    }
    token_program.transfer(&TokenTransfer {
        mint: market.mint(side),
        from: Holder::Vault(market),
        to: Holder::User(user),
        amount,
    })
}

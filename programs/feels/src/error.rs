//! Error definitions
//!
//! Every fallible path in the engine surfaces one of these variants as the
//! instruction's terminal result. Nothing is retried internally.

use thiserror::Error;

/// Coarse classification used by hosts and routers to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Arithmetic,
    Liquidity,
    Account,
    Reentrancy,
    External,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeelsError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("Market is paused")]
    MarketPaused,

    #[error("Zero amount")]
    ZeroAmount,

    #[error("Invalid tick range")]
    InvalidTickRange,

    #[error("Tick must be a multiple of tick spacing")]
    TickNotSpaced,

    #[error("Tick index out of bounds")]
    InvalidTick,

    #[error("Invalid tick spacing")]
    InvalidTickSpacing,

    #[error("Invalid price")]
    InvalidPrice,

    #[error("Price limit is on the wrong side of the current price")]
    InvalidPriceLimit,

    #[error("Token pair must be ordered with token_a < token_b")]
    InvalidTokenOrder,

    #[error("Liquidity below minimum")]
    LiquidityBelowMinimum,

    #[error("Slippage exceeded")]
    SlippageExceeded,

    #[error("Oracle is stale and fallback mode is disabled")]
    OracleStale,

    #[error("Invalid timestamp")]
    InvalidTimestamp,

    #[error("Oracle observation is out of order, from the future or out of range")]
    InvalidObservation,

    #[error("Invalid fee policy: {0}")]
    InvalidFeePolicy(&'static str),

    #[error("Signer is not authorized for this record")]
    Unauthorized,

    #[error("Tick array still holds initialized ticks")]
    TickArrayNotEmpty,

    #[error("Position still holds liquidity or owed fees")]
    PositionNotEmpty,

    // ========================================================================
    // Arithmetic Errors
    // ========================================================================
    #[error("Math overflow")]
    MathOverflow,

    #[error("Math underflow")]
    MathUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid logarithm input")]
    InvalidLogarithmInput,

    // ========================================================================
    // Liquidity Errors
    // ========================================================================
    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("No initialized tick in the loaded tick arrays")]
    NoLiquidityInTickArrays,

    #[error("Too many swap steps")]
    TooManySteps,

    #[error("Too many tick arrays for a single swap")]
    TooManyTickArrays,

    #[error("Tick array not loaded")]
    TickArrayNotFound,

    // ========================================================================
    // Account / Scope Errors
    // ========================================================================
    #[error("Record not found")]
    AccountNotFound,

    #[error("Record discriminator mismatch")]
    AccountDiscriminatorMismatch,

    #[error("Record failed to deserialize")]
    AccountDidNotDeserialize,

    #[error("Record failed to serialize")]
    AccountDidNotSerialize,

    #[error("Record already initialized")]
    AccountAlreadyInitialized,

    #[error("Record was not declared writable")]
    AccountNotWritable,

    #[error("Record was not declared in this work unit")]
    AccountNotLoaded,

    #[error("Operation not allowed in the current work unit phase")]
    InvalidScopePhase,

    // ========================================================================
    // Reentrancy
    // ========================================================================
    #[error("Reentrancy detected")]
    ReentrancyDetected,

    // ========================================================================
    // External
    // ========================================================================
    #[error("Token transfer failed")]
    TokenTransferFailed,
}

impl FeelsError {
    pub fn category(&self) -> ErrorCategory {
        use FeelsError::*;
        match self {
            MarketPaused | ZeroAmount | InvalidTickRange | TickNotSpaced | InvalidTick
            | InvalidTickSpacing | InvalidPrice | InvalidPriceLimit | InvalidTokenOrder
            | LiquidityBelowMinimum | SlippageExceeded | OracleStale | InvalidTimestamp
            | InvalidObservation | InvalidFeePolicy(_) | Unauthorized | TickArrayNotEmpty
            | PositionNotEmpty => ErrorCategory::Validation,
            MathOverflow | MathUnderflow | DivisionByZero | InvalidLogarithmInput => {
                ErrorCategory::Arithmetic
            }
            InsufficientLiquidity
            | NoLiquidityInTickArrays
            | TooManySteps
            | TooManyTickArrays
            | TickArrayNotFound => ErrorCategory::Liquidity,
            AccountNotFound
            | AccountDiscriminatorMismatch
            | AccountDidNotDeserialize
            | AccountDidNotSerialize
            | AccountAlreadyInitialized
            | AccountNotWritable
            | AccountNotLoaded
            | InvalidScopePhase => ErrorCategory::Account,
            ReentrancyDetected => ErrorCategory::Reentrancy,
            TokenTransferFailed => ErrorCategory::External,
        }
    }
}

pub type FeelsResult<T> = Result<T, FeelsError>;

/// Provides overflow-safe arithmetic operations for all numerical calculations.
/// Every overflow or underflow becomes an instruction error instead of wrapping,
/// so token amounts are never silently saturated.
use crate::error::{FeelsError, FeelsResult};
use tracing::trace;

// ============================================================================
// Type Definitions
// ============================================================================

pub trait SafeMath<T> {
    fn safe_add(self, v: T) -> FeelsResult<T>;
    fn safe_sub(self, v: T) -> FeelsResult<T>;
    fn safe_mul(self, v: T) -> FeelsResult<T>;
    fn safe_div(self, v: T) -> FeelsResult<T>;
}

// ============================================================================
// Core Implementation
// ============================================================================

macro_rules! impl_safe_math {
    ($type:ty) => {
        impl SafeMath<$type> for $type {
            fn safe_add(self, v: $type) -> FeelsResult<$type> {
                self.checked_add(v).ok_or_else(|| {
                    trace!("math overflow in safe_add: {} + {}", self, v);
                    FeelsError::MathOverflow
                })
            }

            fn safe_sub(self, v: $type) -> FeelsResult<$type> {
                self.checked_sub(v).ok_or_else(|| {
                    trace!("math underflow in safe_sub: {} - {}", self, v);
                    FeelsError::MathUnderflow
                })
            }

            fn safe_mul(self, v: $type) -> FeelsResult<$type> {
                self.checked_mul(v).ok_or_else(|| {
                    trace!("math overflow in safe_mul: {} * {}", self, v);
                    FeelsError::MathOverflow
                })
            }

            fn safe_div(self, v: $type) -> FeelsResult<$type> {
                if v == 0 {
                    trace!("division by zero in safe_div: {} / {}", self, v);
                    return Err(FeelsError::DivisionByZero);
                }
                self.checked_div(v).ok_or(FeelsError::MathOverflow)
            }
        }
    };
}

impl_safe_math!(u16);
impl_safe_math!(u32);
impl_safe_math!(u64);
impl_safe_math!(u128);
impl_safe_math!(i32);
impl_safe_math!(i64);
impl_safe_math!(i128);

// ------------------------------------------------------------------------
// Liquidity helpers
// ------------------------------------------------------------------------

/// Apply a signed liquidity delta to an unsigned liquidity value
pub fn add_liquidity_delta(liquidity: u128, delta: i128) -> FeelsResult<u128> {
    if delta >= 0 {
        liquidity.safe_add(delta as u128)
    } else {
        liquidity.safe_sub(delta.unsigned_abs())
    }
}

/// Narrow a u128 token amount to u64
pub fn to_u64(value: u128) -> FeelsResult<u64> {
    u64::try_from(value).map_err(|_| FeelsError::MathOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_math_overflow() {
        assert_eq!(u64::MAX.safe_add(1), Err(FeelsError::MathOverflow));
        assert_eq!(100u64.safe_add(50), Ok(150));
        assert_eq!((u64::MAX / 2).safe_mul(3), Err(FeelsError::MathOverflow));
    }

    #[test]
    fn test_safe_math_underflow_and_div() {
        assert_eq!(0u128.safe_sub(1), Err(FeelsError::MathUnderflow));
        assert_eq!(10u128.safe_div(0), Err(FeelsError::DivisionByZero));
        assert_eq!(i128::MIN.safe_div(-1), Err(FeelsError::MathOverflow));
    }

    #[test]
    fn test_liquidity_delta() {
        assert_eq!(add_liquidity_delta(100, -40), Ok(60));
        assert_eq!(add_liquidity_delta(100, 40), Ok(140));
        assert_eq!(add_liquidity_delta(10, -11), Err(FeelsError::MathUnderflow));
    }
}

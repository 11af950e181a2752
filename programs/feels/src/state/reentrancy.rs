/// Reentrancy protection for swap and liquidity paths.
/// The status lives on the Market record so that a callback re-entering the
/// engine during a token transfer observes the lock persisted by the outer
/// instruction's work unit.
use crate::error::{FeelsError, FeelsResult};
use borsh::{BorshDeserialize, BorshSerialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum ReentrancyStatus {
    /// Market is ready for operations
    #[default]
    Unlocked,
    /// An instruction holds the market
    Locked,
}

pub struct ReentrancyGuard;

impl ReentrancyGuard {
    /// Acquire the lock for an instruction
    pub fn acquire(status: &mut ReentrancyStatus) -> FeelsResult<()> {
        match *status {
            ReentrancyStatus::Unlocked => {
                *status = ReentrancyStatus::Locked;
                Ok(())
            }
            ReentrancyStatus::Locked => Err(FeelsError::ReentrancyDetected),
        }
    }

    /// Release the lock once the instruction's writes are final
    pub fn release(status: &mut ReentrancyStatus) {
        *status = ReentrancyStatus::Unlocked;
    }

    /// Fail if any instruction currently holds the market
    pub fn ensure_unlocked(status: ReentrancyStatus) -> FeelsResult<()> {
        match status {
            ReentrancyStatus::Unlocked => Ok(()),
            ReentrancyStatus::Locked => Err(FeelsError::ReentrancyDetected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_twice_fails() {
        let mut status = ReentrancyStatus::default();
        assert!(ReentrancyGuard::acquire(&mut status).is_ok());
        assert_eq!(
            ReentrancyGuard::acquire(&mut status),
            Err(FeelsError::ReentrancyDetected)
        );
        ReentrancyGuard::release(&mut status);
        assert!(ReentrancyGuard::ensure_unlocked(status).is_ok());
    }
}

//! Validation macros

/// Early return with the given error when the condition does not hold
#[macro_export]
macro_rules! require {
    ($cond:expr, $err:expr $(,)?) => {
        if !($cond) {
            return Err($err);
        }
    };
}

/// Early return unless both sides compare equal
#[macro_export]
macro_rules! require_eq {
    ($left:expr, $right:expr, $err:expr $(,)?) => {
        if $left != $right {
            return Err($err);
        }
    };
}

//! Invariant-violation errors raised by `rebel-core` itself.
//!
//! These are the small set of structural failures a context/series/cell
//! operation can hit on its own (mismatched varlist/keylist lengths, an
//! out-of-range index, a write to a protected series). `rebel-runtime`
//! wraps these into its richer `RebelError` categories rather than
//! duplicating them.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    IndexOutOfRange { index: i64, len: usize },
    Protected,
    MismatchedContextLengths { varlist_len: usize, keylist_len: usize },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for series of length {len}")
            }
            CoreError::Protected => write!(f, "series is protected against mutation"),
            CoreError::MismatchedContextLengths {
                varlist_len,
                keylist_len,
            } => write!(
                f,
                "varlist length {varlist_len} does not equal keylist length {keylist_len} + 1"
            ),
        }
    }
}

impl std::error::Error for CoreError {}

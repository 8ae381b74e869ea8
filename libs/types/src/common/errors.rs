//! Error types for exact amount and fraction arithmetic
//!
//! Every failure here is a deterministic precondition violation: mixing
//! tokens, subtracting past zero, dividing by zero, or parsing input that
//! cannot be represented exactly at the token's decimal scale.

use thiserror::Error;

/// Errors that can occur during token amount and fraction arithmetic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// Arithmetic between amounts of two different tokens
    #[error("Token mismatch: expected {expected}, found {found}")]
    TokenMismatch { expected: String, found: String },

    /// Unsigned subtraction would go below zero
    #[error("Underflow: {context}")]
    Underflow { context: String },

    /// Division by zero in exact arithmetic
    #[error("Division by zero in exact arithmetic")]
    DivisionByZero,

    /// Input string cannot be represented exactly
    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },

    /// Fraction with a zero or malformed denominator
    #[error("Invalid fraction: {0}")]
    InvalidFraction(String),

    /// Address string is not a 32-byte base58 key
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
}

impl AmountError {
    pub(crate) fn underflow(context: impl Into<String>) -> Self {
        Self::Underflow {
            context: context.into(),
        }
    }

    pub(crate) fn invalid_amount(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

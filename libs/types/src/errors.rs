//! Error types for primitive ledger values
//!
//! Contract-level failures live in the contract crate; these cover
//! parsing addresses and converting human-readable amounts.

use thiserror::Error;

/// Amount parsing and arithmetic errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Amount must not be negative: {0}")]
    Negative(String),

    #[error("Too many decimal places: {scale} exceeds {decimals}")]
    TooManyDecimals { scale: u32, decimals: u32 },

    #[error("Unsupported decimals: {0}")]
    UnsupportedDecimals(u32),

    #[error("Arithmetic overflow in amount conversion")]
    Overflow,
}

/// Address parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address hex: {0}")]
    InvalidHex(String),

    #[error("Invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

//! Unsigned amounts in an asset's smallest unit
//!
//! Balances are plain unsigned integers (wei for the base asset, base units
//! for the token). Human-readable values ("1.5") are converted through
//! rust_decimal so no floating-point rounding ever reaches a balance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::NumericError;

/// Decimals of the base asset (1 ether = 10^18 wei).
pub const ETHER_DECIMALS: u32 = 18;

/// Largest scale a `Decimal` can carry.
pub const MAX_DECIMALS: u32 = 28;

/// Non-negative amount in base units.
///
/// Serialized as a decimal string so values above `u64::MAX` survive JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(base_units: u128) -> Self {
        Self(base_units)
    }

    pub const fn base_units(&self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Sum amounts, returning `None` on overflow.
    pub fn checked_sum<I>(amounts: I) -> Option<Amount>
    where
        I: IntoIterator<Item = Amount>,
    {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// Convert a decimal in whole units into base units.
    ///
    /// `Decimal::from(3)` with 18 decimals becomes `3 * 10^18`.
    pub fn from_decimal(value: Decimal, decimals: u32) -> Result<Amount, NumericError> {
        if decimals > MAX_DECIMALS {
            return Err(NumericError::UnsupportedDecimals(decimals));
        }
        if value.is_sign_negative() && !value.is_zero() {
            return Err(NumericError::Negative(value.to_string()));
        }

        let normalized = value.normalize();
        let scale = normalized.scale();
        if scale > decimals {
            return Err(NumericError::TooManyDecimals { scale, decimals });
        }

        let mantissa = normalized.mantissa().unsigned_abs();
        let factor = 10u128
            .checked_pow(decimals - scale)
            .ok_or(NumericError::Overflow)?;

        mantissa
            .checked_mul(factor)
            .map(Amount)
            .ok_or(NumericError::Overflow)
    }
}

impl From<u128> for Amount {
    fn from(base_units: u128) -> Self {
        Self(base_units)
    }
}

impl From<u64> for Amount {
    fn from(base_units: u64) -> Self {
        Self(base_units as u128)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = NumericError;

    /// Parse a base-unit integer string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u128>()
            .map(Amount)
            .map_err(|_| NumericError::InvalidNumber(s.to_string()))
    }
}

impl TryFrom<String> for Amount {
    type Error = NumericError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

/// Parse a human-readable value ("1", "0.25") into base units.
pub fn parse_units(value: &str, decimals: u32) -> Result<Amount, NumericError> {
    let decimal = Decimal::from_str(value.trim())
        .map_err(|_| NumericError::InvalidNumber(value.to_string()))?;
    Amount::from_decimal(decimal, decimals)
}

/// Parse an ether value into wei.
pub fn parse_ether(value: &str) -> Result<Amount, NumericError> {
    parse_units(value, ETHER_DECIMALS)
}

/// Render base units as a whole-unit string, always with a fractional part
/// (`10^18` with 18 decimals renders as `"1.0"`).
pub fn format_units(amount: Amount, decimals: u32) -> String {
    let decimals = decimals.min(MAX_DECIMALS);
    let unit = 10u128.pow(decimals);
    let whole = amount.0 / unit;
    let fraction = amount.0 % unit;

    if fraction == 0 {
        return format!("{}.0", whole);
    }

    let padded = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}

/// Render wei as ether.
pub fn format_ether(amount: Amount) -> String {
    format_units(amount, ETHER_DECIMALS)
}

//! Contract-specific error types
//!
//! Every error is fatal to the call that raised it: the savings ledger rolls
//! back all state touched by the call before returning it.

use std::fmt;

use thiserror::Error;
use types::errors::NumericError;
use types::numeric::Amount;

/// The two asset classes held by the savings ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Native base asset, moved through the native bank
    Ether,
    /// The bound ERC20-style token
    Token,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Ether => write!(f, "ether"),
            AssetKind::Token => write!(f, "token"),
        }
    }
}

/// Direction of a token movement, used to word zero-amount rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Save,
    Withdraw,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Save => write!(f, "save"),
            Action::Withdraw => write!(f, "withdraw"),
        }
    }
}

/// Errors raised by the fungible token collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("ERC20: insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("ERC20: insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance { required: Amount, available: Amount },

    #[error("ERC20: invalid receiver")]
    InvalidReceiver,

    #[error("ERC20: arithmetic overflow")]
    Overflow,
}

/// Errors raised when moving the native base asset
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NativeError {
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Amount, available: Amount },

    #[error("recipient rejected incoming value")]
    Rejected,

    #[error("native balance overflow")]
    Overflow,
}

/// Savings ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SavingError {
    #[error("can't {action} zero value")]
    ZeroAmount { action: Action },

    #[error("not enough {asset}: required {required}, available {available}")]
    InsufficientBalance {
        asset: AssetKind,
        required: Amount,
        available: Amount,
    },

    #[error("{asset} transfer failed")]
    TransferFailed { asset: AssetKind },

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Native(#[from] NativeError),

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,
}

/// Deployment configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid deployment config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid amount for {field}: {source}")]
    Amount {
        field: &'static str,
        #[source]
        source: NumericError,
    },

    #[error("duplicate account label: {0}")]
    DuplicateAccount(String),

    #[error("deployment needs at least one account")]
    NoAccounts,

    #[error("genesis funding failed: {0}")]
    Funding(#[from] NativeError),
}

//! Two-asset custodial savings ledger
//!
//! Accounts deposit the native base asset and one ERC20-style token into a
//! ledger that records, per account, how much of each it holds, and later
//! withdraw what they put in.
//!
//! # Modules
//! - `errors`: Ledger, token, native and config error types
//! - `events`: Events emitted by successful calls
//! - `token`: The `Erc20` collaborator trait and an in-memory token
//! - `native`: Native base-asset balances
//! - `journal`: Undo log behind all-or-nothing calls
//! - `saving`: The savings ledger
//! - `config`: Deployment configuration
//! - `deploy`: Builds a funded token, bank and ledger from a config

pub mod config;
pub mod deploy;
pub mod errors;
pub mod events;
pub mod journal;
pub mod native;
pub mod saving;
pub mod token;

pub use deploy::{deploy, Deployment};
pub use saving::{AccountBalance, EtherReceiver, Saving};
pub use token::{Erc20, Erc20Token};

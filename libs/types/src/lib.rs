//! Types library for the savings ledger
//!
//! Primitive value types shared by the contract crate and its tests.
//!
//! # Modules
//! - `ids`: Account/contract addresses and transaction identifiers
//! - `numeric`: Unsigned base-unit amounts and decimal unit conversion
//! - `errors`: Error taxonomy for the above

pub mod errors;
pub mod ids;
pub mod numeric;

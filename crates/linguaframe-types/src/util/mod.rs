//! Helper types.
//!
//! - [`b64`] - Base64 header payloads
//! - [`lit_str`] - Compile-time string literal types
//! - [`money_amount`] - Human-entered decimal amounts

pub mod b64;
pub mod lit_str;
pub mod money_amount;

pub use b64::*;
pub use money_amount::{MoneyAmount, MoneyAmountParseError};

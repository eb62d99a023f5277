//! EVM chain vocabulary.

pub mod erc20;
pub mod types;

pub use types::*;

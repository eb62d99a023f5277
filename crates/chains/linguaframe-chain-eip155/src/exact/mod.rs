//! The x402 `exact` scheme on EVM chains.
//!
//! The payer signs an ERC-3009 `transferWithAuthorization` for exactly the
//! requested amount; the server's facilitator submits it. Both x402 versions are
//! handled by [`client::Eip155ExactClient`].

use linguaframe_types::scheme::X402SchemeId;

pub mod client;
pub mod types;

pub use types::*;

/// Scheme identity for `exact` on `eip155`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eip155Exact;

impl X402SchemeId for Eip155Exact {
    fn namespace(&self) -> &str {
        crate::chain::EIP155_NAMESPACE
    }

    fn scheme(&self) -> &str {
        ExactScheme::VALUE
    }
}

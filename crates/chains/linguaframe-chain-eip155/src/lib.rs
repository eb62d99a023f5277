#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EIP-155 (EVM) support for LinguaFrame payments.
//!
//! # Modules
//!
//! - [`chain`] - Chain references, token deployments and the ERC-20 interface
//! - [`networks`] - Well-known networks and their USDC deployments
//! - [`signer`] - The signing capability payments need
//! - [`wallet`] - Wallet sessions, stale-safe signer handles and the local alloy wallet
//! - [`submitter`] - Direct USDC transfers that wait for one confirmation
//! - [`exact`] - The x402 `exact` scheme (ERC-3009 `transferWithAuthorization`)
//!
//! # Feature Flags
//!
//! - `client` - x402 payment signing
//! - `wallet` - Wallet sessions and on-chain submission (implies `client`)
//! - `telemetry` - Tracing instrumentation
//!
//! # Example
//!
//! ```ignore
//! use linguaframe_chain_eip155::submitter::PaymentSubmitter;
//! use linguaframe_chain_eip155::wallet::{Eip155LocalWallet, WalletSession};
//! use linguaframe_types::payment::PaymentRequest;
//!
//! let session = WalletSession::connected(Eip155LocalWallet::new(signer, chain, &rpc));
//! let request = PaymentRequest::new("1", "0x209693Bc6afc0C5328bA36FaF03C514EF312287C", 8453);
//! let result = PaymentSubmitter::default()
//!     .submit(&request, session.signer().as_ref())
//!     .await;
//! ```

pub mod chain;
pub mod networks;

#[cfg(feature = "client")]
pub mod exact;
#[cfg(feature = "client")]
pub mod signer;
#[cfg(feature = "wallet")]
pub mod submitter;
#[cfg(feature = "wallet")]
pub mod wallet;

pub use networks::KnownNetworkEip155;

#[cfg(feature = "client")]
pub use exact::client::Eip155ExactClient;
#[cfg(feature = "client")]
pub use signer::SignerLike;
#[cfg(feature = "wallet")]
pub use submitter::PaymentSubmitter;
#[cfg(feature = "wallet")]
pub use wallet::{SignerHandle, WalletSession};

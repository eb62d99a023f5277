//! LinguaFrame: translation paid for in USDC on Base.
//!
//! Payments take one of two routes:
//!
//! - **Direct transfer**: [`desk::PaymentDesk::handle_payment`] submits an ERC-20
//!   `transfer` through the connected wallet and waits for one confirmation.
//! - **Paid request**: [`desk::PaymentDesk::create_client`] returns an HTTP client
//!   that answers `402 Payment Required` with a signed x402 payment and retries.
//!
//! # Modules
//!
//! - [`config`] - JSON + environment configuration
//! - [`desk`] - Wallet session, processing guard and last result
//! - [`telemetry`] - `tracing` subscriber and optional OTLP export
//! - [`translate`] - Target languages and the translator seam

pub mod config;
pub mod desk;
pub mod telemetry;
pub mod translate;

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for LinguaFrame payments.
//!
//! This crate holds the chain-agnostic vocabulary shared by the payment submitter,
//! the paid-request client and the application binary.
//!
//! # Modules
//!
//! - [`chain`] - CAIP-2 chain identifiers
//! - [`config`] - RPC configuration and environment variable resolution
//! - [`networks`] - Registry of the networks LinguaFrame knows by name
//! - [`payment`] - Payment requests, payment results and the error taxonomy
//! - [`proto`] - x402 wire format (`402 Payment Required` bodies and headers)
//! - [`scheme`] - Client-side payment scheme plumbing
//! - [`timestamp`] - Unix timestamps for payment authorization windows
//! - [`util`] - Base64, string literal types and money amounts

pub mod chain;
pub mod config;
pub mod networks;
pub mod payment;
pub mod proto;
pub mod scheme;
pub mod timestamp;
pub mod util;

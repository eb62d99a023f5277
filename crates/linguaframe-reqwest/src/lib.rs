#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Reqwest middleware that pays for [x402](https://www.x402.org) `402 Payment Required`
//! responses and retries the request once.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use linguaframe_reqwest::{ClientOptions, create_client};
//!
//! let client = create_client(session.signer().as_ref(), ClientOptions::default())
//!     .ok_or("Please connect your wallet first")?;
//! let response = client.post("https://api.example.com/translate", &body).await?;
//! ```
//!
//! Lower level, [`X402Client`] is a plain `reqwest_middleware` middleware:
//!
//! ```rust,ignore
//! let http = reqwest_middleware::ClientBuilder::new(reqwest::Client::new())
//!     .with(X402Client::new().register(Eip155ExactClient::new(signer)))
//!     .build();
//! ```

mod client;
mod paid;

pub use client::*;
pub use paid::*;

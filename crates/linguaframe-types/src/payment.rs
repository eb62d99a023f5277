//! Payment requests, their results and the error taxonomy.
//!
//! A [`PaymentRequest`] is built per user action and consumed by exactly one
//! submission, which always resolves to a [`PaymentResult`]. Failures are values,
//! never panics: every [`PaymentError`] converts into [`PaymentResult::Failure`].
//!
//! The JSON shape matches what the payment form shows:
//!
//! ```json
//! { "success": true, "transactionHash": "0x…", "confirmations": 1 }
//! { "success": false, "error": "Wallet not connected" }
//! ```

use serde::{Deserialize, Serialize};

/// What the user asked to pay.
///
/// Fields are kept as entered; validation happens at submission time so that a
/// malformed request turns into [`PaymentError::InvalidInput`] rather than failing
/// to construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Decimal amount in whole tokens, e.g. `"1.25"`.
    pub amount: String,
    /// Recipient account address.
    pub recipient: String,
    /// Numeric EIP-155 chain id, e.g. `8453` for Base.
    pub chain_id: u64,
    /// Token contract. `None` means the chain's USDC deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
}

impl PaymentRequest {
    pub fn new<A: Into<String>, R: Into<String>>(amount: A, recipient: R, chain_id: u64) -> Self {
        Self {
            amount: amount.into(),
            recipient: recipient.into(),
            chain_id,
            token_address: None,
        }
    }

    pub fn with_token<T: Into<String>>(mut self, token_address: T) -> Self {
        self.token_address = Some(token_address.into());
        self
    }
}

/// Outcome of one payment submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PaymentResultWire", try_from = "PaymentResultWire")]
pub enum PaymentResult {
    Success {
        transaction_hash: String,
        confirmations: u64,
    },
    Failure {
        error: String,
    },
}

impl PaymentResult {
    pub fn success<H: Into<String>>(transaction_hash: H, confirmations: u64) -> Self {
        Self::Success {
            transaction_hash: transaction_hash.into(),
            confirmations,
        }
    }

    pub fn failure<E: Into<String>>(error: E) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn transaction_hash(&self) -> Option<&str> {
        match self {
            Self::Success {
                transaction_hash, ..
            } => Some(transaction_hash),
            Self::Failure { .. } => None,
        }
    }

    pub fn confirmations(&self) -> Option<u64> {
        match self {
            Self::Success { confirmations, .. } => Some(*confirmations),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }

    /// Block explorer link for a successful payment on a known chain.
    pub fn explorer_url(&self, chain_id: u64) -> Option<String> {
        let hash = self.transaction_hash()?;
        let explorer = match chain_id {
            8453 => "https://basescan.org",
            84532 => "https://sepolia.basescan.org",
            _ => return None,
        };
        Some(format!("{explorer}/tx/{hash}"))
    }
}

impl From<PaymentError> for PaymentResult {
    fn from(error: PaymentError) -> Self {
        PaymentResult::failure(error.to_string())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentResultWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confirmations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<PaymentResult> for PaymentResultWire {
    fn from(value: PaymentResult) -> Self {
        match value {
            PaymentResult::Success {
                transaction_hash,
                confirmations,
            } => PaymentResultWire {
                success: true,
                transaction_hash: Some(transaction_hash),
                confirmations: Some(confirmations),
                error: None,
            },
            PaymentResult::Failure { error } => PaymentResultWire {
                success: false,
                transaction_hash: None,
                confirmations: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<PaymentResultWire> for PaymentResult {
    type Error = String;

    fn try_from(wire: PaymentResultWire) -> Result<Self, Self::Error> {
        if wire.success {
            let transaction_hash = wire
                .transaction_hash
                .ok_or("successful payment without transactionHash")?;
            Ok(PaymentResult::Success {
                transaction_hash,
                confirmations: wire.confirmations.unwrap_or(1),
            })
        } else {
            Ok(PaymentResult::Failure {
                error: wire.error.unwrap_or_else(|| "Payment failed".to_string()),
            })
        }
    }
}

/// Everything that can go wrong between a user action and its result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    /// No signer, or the signer handle outlived its wallet session.
    #[error("Wallet not connected")]
    WalletNotConnected,
    /// Malformed amount, recipient, token or chain. Never reaches the network.
    #[error("{0}")]
    InvalidInput(String),
    /// Signing, transport or a reverted transaction.
    #[error("{0}")]
    SubmissionFailure(String),
    /// A non-payment HTTP error or a failed payment retry.
    #[error("{0}")]
    RequestFailure(String),
}

impl PaymentError {
    pub fn invalid_input<E: std::fmt::Display>(error: E) -> Self {
        Self::InvalidInput(error.to_string())
    }

    pub fn submission_failure<E: std::fmt::Display>(error: E) -> Self {
        Self::SubmissionFailure(error.to_string())
    }

    pub fn request_failure<E: std::fmt::Display>(error: E) -> Self {
        Self::RequestFailure(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_json_shape() {
        let request = PaymentRequest::new("1", "0xabc", 8453);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            json!({ "amount": "1", "recipient": "0xabc", "chainId": 8453 })
        );

        let with_token = request.with_token("0xdef");
        let json = serde_json::to_value(&with_token).unwrap();
        assert_eq!(json["tokenAddress"], "0xdef");
    }

    #[test]
    fn test_result_json_shape() {
        let success = PaymentResult::success("0x1234", 1);
        assert_eq!(
            serde_json::to_value(&success).unwrap(),
            json!({ "success": true, "transactionHash": "0x1234", "confirmations": 1 })
        );

        let failure = PaymentResult::from(PaymentError::WalletNotConnected);
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            json!({ "success": false, "error": "Wallet not connected" })
        );
    }

    #[test]
    fn test_result_deserializes_from_wire() {
        let failure: PaymentResult =
            serde_json::from_value(json!({ "success": false })).unwrap();
        assert_eq!(failure.error(), Some("Payment failed"));

        let bad = serde_json::from_value::<PaymentResult>(json!({ "success": true }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_error_messages_are_verbatim() {
        let error = PaymentError::submission_failure("User rejected the request.");
        assert_eq!(error.to_string(), "User rejected the request.");
        assert_eq!(
            PaymentResult::from(error).error(),
            Some("User rejected the request.")
        );
    }

    #[test]
    fn test_explorer_url() {
        let success = PaymentResult::success("0xfeed", 1);
        assert_eq!(
            success.explorer_url(8453).as_deref(),
            Some("https://basescan.org/tx/0xfeed")
        );
        assert!(success.explorer_url(1).is_none());
        assert!(PaymentResult::failure("nope").explorer_url(8453).is_none());
    }
}

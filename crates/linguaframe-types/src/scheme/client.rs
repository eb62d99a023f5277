//! Client side of a payment scheme: turning a `402` into a signed payment.
//!
//! Each registered [`X402SchemeClient`] offers [`PaymentCandidate`]s for the
//! requirements it understands. A [`PaymentSelector`] picks one, and the
//! candidate signs itself into a header value.

use alloy_primitives::U256;
use async_trait::async_trait;
use std::fmt;

use crate::chain::ChainId;
use crate::proto::PaymentRequired;
use crate::scheme::X402SchemeId;

/// A payment option the client is able to sign.
pub struct PaymentCandidate {
    pub chain_id: ChainId,
    pub asset: String,
    pub amount: U256,
    pub scheme: String,
    pub x402_version: u8,
    pub pay_to: String,
    pub signer: Box<dyn PaymentCandidateSigner + Send + Sync>,
}

impl fmt::Debug for PaymentCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentCandidate")
            .field("chain_id", &self.chain_id)
            .field("asset", &self.asset)
            .field("amount", &self.amount)
            .field("scheme", &self.scheme)
            .field("x402_version", &self.x402_version)
            .field("pay_to", &self.pay_to)
            .finish_non_exhaustive()
    }
}

impl PaymentCandidate {
    /// Signs the payment and returns the header value.
    pub async fn sign(&self) -> Result<String, X402Error> {
        self.signer.sign_payment().await
    }
}

/// Produces the base64 header value for one candidate.
#[async_trait]
pub trait PaymentCandidateSigner {
    async fn sign_payment(&self) -> Result<String, X402Error>;
}

/// A scheme implementation able to pay some of the options in a `402`.
pub trait X402SchemeClient: X402SchemeId + Send + Sync {
    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate>;
}

/// Chooses among candidates.
pub trait PaymentSelector: Send + Sync {
    fn select<'a>(&self, candidates: &'a [PaymentCandidate]) -> Option<&'a PaymentCandidate>;
}

/// Takes the first candidate, i.e. the server's order within registration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMatch;

impl PaymentSelector for FirstMatch {
    fn select<'a>(&self, candidates: &'a [PaymentCandidate]) -> Option<&'a PaymentCandidate> {
        candidates.first()
    }
}

/// Takes the first candidate costing at most the given base units.
#[derive(Debug, Clone, Copy)]
pub struct MaxAmount(pub U256);

impl PaymentSelector for MaxAmount {
    fn select<'a>(&self, candidates: &'a [PaymentCandidate]) -> Option<&'a PaymentCandidate> {
        candidates.iter().find(|c| c.amount <= self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum X402Error {
    #[error("Failed to parse 402 response: {0}")]
    ParseError(String),

    #[error("No matching payment option found")]
    NoMatchingPaymentOption,

    #[error("Request is not cloneable (streaming body?)")]
    RequestNotCloneable,

    #[error("Failed to sign payment: {0}")]
    SigningError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSigner(&'static str);

    #[async_trait]
    impl PaymentCandidateSigner for FixedSigner {
        async fn sign_payment(&self) -> Result<String, X402Error> {
            Ok(self.0.to_string())
        }
    }

    fn candidate(amount: u64, header: &'static str) -> PaymentCandidate {
        PaymentCandidate {
            chain_id: ChainId::new("eip155", "8453"),
            asset: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".to_string(),
            amount: U256::from(amount),
            scheme: "exact".to_string(),
            x402_version: 2,
            pay_to: "0x209693Bc6afc0C5328bA36FaF03C514EF312287C".to_string(),
            signer: Box::new(FixedSigner(header)),
        }
    }

    #[test]
    fn test_first_match() {
        let candidates = vec![candidate(10, "a"), candidate(5, "b")];
        let selected = FirstMatch.select(&candidates).unwrap();
        assert_eq!(selected.amount, U256::from(10));
        assert!(FirstMatch.select(&[]).is_none());
    }

    #[test]
    fn test_max_amount() {
        let candidates = vec![candidate(10, "a"), candidate(5, "b")];
        let selected = MaxAmount(U256::from(7)).select(&candidates).unwrap();
        assert_eq!(selected.amount, U256::from(5));
        assert!(MaxAmount(U256::from(1)).select(&candidates).is_none());
    }

    #[tokio::test]
    async fn test_candidate_signs() {
        let signed = candidate(1, "header-value").sign().await.unwrap();
        assert_eq!(signed, "header-value");
    }

    #[test]
    fn test_debug_omits_signer() {
        let debug = format!("{:?}", candidate(1, "secret"));
        assert!(debug.contains("PaymentCandidate"));
        assert!(!debug.contains("secret"));
    }
}

//! x402 wire format.
//!
//! A paid endpoint answers `402 Payment Required` with its payment terms. Two
//! protocol versions are in use:
//!
//! - **V1** ([`v1`]): terms in the JSON response body, networks named (`"base"`),
//!   payment sent back in the `X-Payment` header.
//! - **V2** ([`v2`]): terms base64-encoded in the `Payment-Required` header,
//!   networks as CAIP-2 chain IDs (`"eip155:8453"`), payment sent back in the
//!   `Payment-Signature` header.
//!
//! Either way the retried response may carry a [`SettlementResponse`] in
//! `X-Payment-Response` / `Payment-Response`.

use serde::{Deserialize, Serialize};

use crate::util::Base64Bytes;

/// Defines a unit type that serializes as a fixed protocol version number.
macro_rules! version_marker {
    ($name:ident, $value:literal) => {
        #[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
        pub struct $name;

        impl $name {
            pub const VALUE: u8 = $value;
        }

        impl From<$name> for u8 {
            fn from(_: $name) -> Self {
                $name::VALUE
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u8(Self::VALUE)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let num = <u8 as serde::Deserialize>::deserialize(deserializer)?;
                if num == Self::VALUE {
                    Ok($name)
                } else {
                    Err(serde::de::Error::custom(format!(
                        "expected x402 version {}, got {}",
                        Self::VALUE,
                        num
                    )))
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", Self::VALUE)
            }
        }
    };
}

pub mod v1;
pub mod v2;

pub const PAYMENT_REQUIRED_HEADER: &str = "Payment-Required";
pub const PAYMENT_SIGNATURE_HEADER: &str = "Payment-Signature";
pub const PAYMENT_RESPONSE_HEADER: &str = "Payment-Response";
pub const X_PAYMENT_HEADER: &str = "X-Payment";
pub const X_PAYMENT_RESPONSE_HEADER: &str = "X-Payment-Response";

/// Payment terms from a `402` response, in whichever version the server spoke.
#[derive(Debug, Clone)]
pub enum PaymentRequired {
    V1(v1::PaymentRequired),
    V2(v2::PaymentRequired),
}

impl PaymentRequired {
    pub fn x402_version(&self) -> u8 {
        match self {
            PaymentRequired::V1(_) => v1::X402Version1::VALUE,
            PaymentRequired::V2(_) => v2::X402Version2::VALUE,
        }
    }

    /// Header the signed payment goes into on the retried request.
    pub fn payment_header(&self) -> &'static str {
        match self {
            PaymentRequired::V1(_) => X_PAYMENT_HEADER,
            PaymentRequired::V2(_) => PAYMENT_SIGNATURE_HEADER,
        }
    }

    /// Server-provided reason, present when a previous payment was rejected.
    pub fn error(&self) -> Option<&str> {
        match self {
            PaymentRequired::V1(p) => p.error.as_deref(),
            PaymentRequired::V2(p) => p.error.as_deref(),
        }
    }
}

/// Settlement receipt returned alongside a paid response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl SettlementResponse {
    /// Decodes a base64 JSON header value. `None` if it is not one.
    pub fn from_header(value: &[u8]) -> Option<Self> {
        Base64Bytes::from(value).decode_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_from_header() {
        let header = Base64Bytes::encode(
            r#"{"success":true,"transaction":"0xabc","network":"base","payer":"0x01"}"#,
        );
        let settlement = SettlementResponse::from_header(header.as_ref()).unwrap();
        assert!(settlement.success);
        assert_eq!(settlement.transaction.as_deref(), Some("0xabc"));
        assert_eq!(settlement.network.as_deref(), Some("base"));
        assert!(settlement.error_reason.is_none());
    }

    #[test]
    fn test_settlement_from_garbage_header() {
        assert!(SettlementResponse::from_header(b"not base64 json").is_none());
    }

    #[test]
    fn test_payment_header_by_version() {
        let v1: v1::PaymentRequired =
            serde_json::from_str(r#"{"x402Version":1,"accepts":[]}"#).unwrap();
        let v1 = PaymentRequired::V1(v1);
        assert_eq!(v1.x402_version(), 1);
        assert_eq!(v1.payment_header(), "X-Payment");

        let v2: v2::PaymentRequired = serde_json::from_str(
            r#"{"x402Version":2,"resource":{"url":"https://api.example.com/translate"},"accepts":[],"error":"expired"}"#,
        )
        .unwrap();
        let v2 = PaymentRequired::V2(v2);
        assert_eq!(v2.x402_version(), 2);
        assert_eq!(v2.payment_header(), "Payment-Signature");
        assert_eq!(v2.error(), Some("expired"));
    }
}

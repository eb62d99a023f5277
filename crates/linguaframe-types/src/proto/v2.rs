//! x402 version 2: terms in the `Payment-Required` header, CAIP-2 networks.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{VecSkipError, serde_as};
use std::str::FromStr;

use crate::chain::ChainId;

version_marker!(X402Version2, 2);

/// What the payment buys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mime_type: String,
}

/// One way the server is willing to be paid.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements<
    TScheme = String,
    TAmount = String,
    TAddress = String,
    TExtra = Option<serde_json::Value>,
> {
    pub scheme: TScheme,
    pub network: ChainId,
    /// Amount in token base units.
    pub amount: TAmount,
    pub pay_to: TAddress,
    pub max_timeout_seconds: u64,
    pub asset: TAddress,
    #[serde(default)]
    pub extra: TExtra,
}

impl PaymentRequirements {
    /// Parses the string fields into concrete types. `None` if any of them fails.
    pub fn as_concrete<TScheme, TAmount, TAddress, TExtra>(
        &self,
    ) -> Option<PaymentRequirements<TScheme, TAmount, TAddress, Option<TExtra>>>
    where
        TScheme: FromStr,
        TAmount: FromStr,
        TAddress: FromStr,
        TExtra: DeserializeOwned,
    {
        Some(PaymentRequirements {
            scheme: self.scheme.parse().ok()?,
            network: self.network.clone(),
            amount: self.amount.parse().ok()?,
            pay_to: self.pay_to.parse().ok()?,
            max_timeout_seconds: self.max_timeout_seconds,
            asset: self.asset.parse().ok()?,
            extra: self
                .extra
                .as_ref()
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
        })
    }
}

/// Signed payment, base64-encoded into the `Payment-Signature` header.
///
/// Echoes the accepted requirements verbatim so the server can match them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload<TPaymentRequirements = PaymentRequirements, TPayload = serde_json::Value> {
    pub accepted: TPaymentRequirements,
    pub payload: TPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceInfo>,
    pub x402_version: X402Version2,
}

/// Decoded `Payment-Required` header.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    pub x402_version: X402Version2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub resource: ResourceInfo,
    #[serde(default)]
    #[serde_as(as = "VecSkipError<_>")]
    pub accepts: Vec<PaymentRequirements>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_header_json() {
        let json = json!({
            "x402Version": 2,
            "resource": {
                "url": "https://api.example.com/translate",
                "description": "Translation",
                "mimeType": "application/json"
            },
            "accepts": [{
                "scheme": "exact",
                "network": "eip155:8453",
                "amount": "10000",
                "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                "maxTimeoutSeconds": 60,
                "asset": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"
            }, {
                "scheme": "exact",
                "network": "not-a-caip2-id",
                "amount": "1",
                "payTo": "x",
                "maxTimeoutSeconds": 60,
                "asset": "y"
            }]
        });
        let required: PaymentRequired = serde_json::from_value(json).unwrap();
        assert_eq!(required.accepts.len(), 1);
        let accepted = &required.accepts[0];
        assert_eq!(accepted.network.to_string(), "eip155:8453");
        assert!(accepted.extra.is_none());
        assert_eq!(required.resource.mime_type, "application/json");
    }

    #[test]
    fn test_payload_echoes_accepted() {
        let accepted: PaymentRequirements = PaymentRequirements {
            scheme: "exact".to_string(),
            network: "eip155:84532".parse().unwrap(),
            amount: "5".to_string(),
            pay_to: "0x01".to_string(),
            max_timeout_seconds: 30,
            asset: "0x02".to_string(),
            extra: None,
        };
        let payload = PaymentPayload {
            accepted: accepted.clone(),
            payload: json!({ "signature": "0x" }),
            resource: None,
            x402_version: X402Version2,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["x402Version"], 2);
        assert_eq!(value["accepted"]["network"], "eip155:84532");
        assert_eq!(value["accepted"]["amount"], "5");
        assert!(value.get("resource").is_none());
    }
}

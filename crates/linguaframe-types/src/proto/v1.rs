//! x402 version 1: terms in the response body, networks by name.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{VecSkipError, serde_as};
use std::str::FromStr;

version_marker!(X402Version1, 1);

/// One way the server is willing to be paid.
///
/// The defaults keep every field as received; [`PaymentRequirements::as_concrete`]
/// parses them into scheme-specific types.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements<
    TScheme = String,
    TAmount = String,
    TAddress = String,
    TExtra = serde_json::Value,
> {
    pub scheme: TScheme,
    /// Network name, e.g. `"base"`.
    pub network: String,
    /// Amount in token base units.
    pub max_amount_required: TAmount,
    pub resource: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    pub pay_to: TAddress,
    pub max_timeout_seconds: u64,
    /// Token contract.
    pub asset: TAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<TExtra>,
}

impl PaymentRequirements {
    /// Parses the string fields into concrete types. `None` if any of them fails.
    ///
    /// A malformed `extra` is dropped rather than rejected.
    pub fn as_concrete<TScheme, TAmount, TAddress, TExtra>(
        &self,
    ) -> Option<PaymentRequirements<TScheme, TAmount, TAddress, TExtra>>
    where
        TScheme: FromStr,
        TAmount: FromStr,
        TAddress: FromStr,
        TExtra: DeserializeOwned,
    {
        Some(PaymentRequirements {
            scheme: self.scheme.parse().ok()?,
            network: self.network.clone(),
            max_amount_required: self.max_amount_required.parse().ok()?,
            resource: self.resource.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
            output_schema: self.output_schema.clone(),
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

/// Signed payment, base64-encoded into the `X-Payment` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload<TScheme = String, TPayload = serde_json::Value> {
    pub x402_version: X402Version1,
    pub scheme: TScheme,
    pub network: String,
    pub payload: TPayload,
}

/// Body of a V1 `402 Payment Required` response.
///
/// Entries of `accepts` that do not parse are skipped, so one exotic option
/// does not hide the others.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    pub x402_version: X402Version1,
    #[serde(default)]
    #[serde_as(as = "VecSkipError<_>")]
    pub accepts: Vec<PaymentRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

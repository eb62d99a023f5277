//! Wire types of the `exact` scheme on EVM chains.

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::sol;
use linguaframe_types::lit_str;
use linguaframe_types::proto::{v1, v2};
use linguaframe_types::timestamp::UnixTimestamp;
use serde::{Deserialize, Serialize};

use crate::chain::decimal_u256;

lit_str!(ExactScheme, "exact");

/// Signature plus the authorization it covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayload {
    pub signature: Bytes,
    pub authorization: ExactEvmPayloadAuthorization,
}

/// ERC-3009 authorization: `from` lets `to` pull `value`, once, within the window.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayloadAuthorization {
    pub from: Address,
    pub to: Address,
    #[serde(with = "decimal_u256")]
    pub value: U256,
    pub valid_after: UnixTimestamp,
    pub valid_before: UnixTimestamp,
    pub nonce: B256,
}

/// EIP-712 domain name and version, carried in the requirements' `extra`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirementsExtra {
    pub name: String,
    pub version: String,
}

pub type V1PaymentRequirements =
    v1::PaymentRequirements<ExactScheme, U256, Address, PaymentRequirementsExtra>;
pub type V1PaymentPayload = v1::PaymentPayload<ExactScheme, ExactEvmPayload>;

pub type V2PaymentRequirements =
    v2::PaymentRequirements<ExactScheme, U256, Address, Option<PaymentRequirementsExtra>>;
/// V2 echoes the accepted requirements exactly as the server sent them.
pub type V2PaymentPayload = v2::PaymentPayload<v2::PaymentRequirements, ExactEvmPayload>;

sol!(
    /// ERC-3009 `TransferWithAuthorization` typed data.
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
);

//! Client-side signing for the `exact` scheme.
//!
//! ```ignore
//! use linguaframe_chain_eip155::Eip155ExactClient;
//! use alloy_signer_local::PrivateKeySigner;
//!
//! let client = Eip155ExactClient::new(PrivateKeySigner::random());
//! let candidates = client.accept(&payment_required);
//! ```

use alloy_primitives::{Address, FixedBytes, U256};
use alloy_sol_types::{SolStruct, eip712_domain};
use async_trait::async_trait;
use linguaframe_types::chain::ChainId;
use linguaframe_types::proto::v1::X402Version1;
use linguaframe_types::proto::v2::X402Version2;
use linguaframe_types::proto::{PaymentRequired, v1, v2};
use linguaframe_types::scheme::X402SchemeId;
use linguaframe_types::scheme::client::{
    PaymentCandidate, PaymentCandidateSigner, X402Error, X402SchemeClient,
};
use linguaframe_types::timestamp::UnixTimestamp;
use linguaframe_types::util::Base64Bytes;
use rand::{Rng, rng};

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

use crate::chain::{Eip155ChainReference, TokenDeploymentEip712};
use crate::exact::{
    Eip155Exact, ExactEvmPayload, ExactEvmPayloadAuthorization, ExactScheme,
    PaymentRequirementsExtra, TransferWithAuthorization, V1PaymentPayload,
    V1PaymentRequirements, V2PaymentPayload, V2PaymentRequirements,
};
use crate::networks::known_token;
use crate::signer::SignerLike;

/// How far in the past `validAfter` is placed, to absorb clock skew.
const VALID_AFTER_SKEW_SECS: u64 = 10 * 60;

/// Signs `exact` payments for any EVM chain the server offers.
///
/// Requirements are skipped when their network is not EVM, their amount or
/// addresses do not parse, or no EIP-712 domain is known for the token.
#[derive(Debug, Clone)]
pub struct Eip155ExactClient<S> {
    signer: S,
}

impl<S> Eip155ExactClient<S> {
    pub fn new(signer: S) -> Self {
        Self { signer }
    }
}

impl<S> X402SchemeId for Eip155ExactClient<S> {
    fn namespace(&self) -> &str {
        Eip155Exact.namespace()
    }

    fn scheme(&self) -> &str {
        Eip155Exact.scheme()
    }
}

impl<S> X402SchemeClient for Eip155ExactClient<S>
where
    S: SignerLike + Clone + Send + Sync + 'static,
{
    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
        match payment_required {
            PaymentRequired::V1(payment_required) => payment_required
                .accepts
                .iter()
                .filter_map(|requirements| self.accept_v1(requirements))
                .collect(),
            PaymentRequired::V2(payment_required) => payment_required
                .accepts
                .iter()
                .filter_map(|requirements| self.accept_v2(requirements, &payment_required.resource))
                .collect(),
        }
    }
}

impl<S> Eip155ExactClient<S>
where
    S: SignerLike + Clone + Send + Sync + 'static,
{
    fn accept_v1(&self, original: &v1::PaymentRequirements) -> Option<PaymentCandidate> {
        let requirements: V1PaymentRequirements = original.as_concrete()?;
        let chain_id = ChainId::from_network_name(&requirements.network)?;
        let chain_reference = Eip155ChainReference::try_from(&chain_id).ok()?;
        let params = Eip3009SigningParams::resolve(
            chain_reference,
            requirements.asset,
            requirements.pay_to,
            requirements.max_amount_required,
            requirements.max_timeout_seconds,
            requirements.extra.clone(),
        )?;
        Some(PaymentCandidate {
            chain_id,
            asset: requirements.asset.to_string(),
            amount: requirements.max_amount_required,
            scheme: self.scheme().to_string(),
            x402_version: X402Version1::VALUE,
            pay_to: requirements.pay_to.to_string(),
            signer: Box::new(V1PayloadSigner {
                signer: self.signer.clone(),
                network: requirements.network,
                params,
            }),
        })
    }

    fn accept_v2(
        &self,
        original: &v2::PaymentRequirements,
        resource: &v2::ResourceInfo,
    ) -> Option<PaymentCandidate> {
        let requirements: V2PaymentRequirements = original.as_concrete()?;
        let chain_reference = Eip155ChainReference::try_from(&requirements.network).ok()?;
        let params = Eip3009SigningParams::resolve(
            chain_reference,
            requirements.asset,
            requirements.pay_to,
            requirements.amount,
            requirements.max_timeout_seconds,
            requirements.extra.clone(),
        )?;
        Some(PaymentCandidate {
            chain_id: requirements.network,
            asset: requirements.asset.to_string(),
            amount: requirements.amount,
            scheme: self.scheme().to_string(),
            x402_version: X402Version2::VALUE,
            pay_to: requirements.pay_to.to_string(),
            signer: Box::new(V2PayloadSigner {
                signer: self.signer.clone(),
                accepted: original.clone(),
                resource: resource.clone(),
                params,
            }),
        })
    }
}

/// Everything needed to sign one ERC-3009 authorization.
#[derive(Debug, Clone)]
pub struct Eip3009SigningParams {
    pub chain_id: u64,
    /// Token contract, the EIP-712 verifying contract.
    pub asset_address: Address,
    pub pay_to: Address,
    pub amount: U256,
    pub max_timeout_seconds: u64,
    pub domain: TokenDeploymentEip712,
}

impl Eip3009SigningParams {
    /// Takes the EIP-712 domain from `extra`, or from the known deployment of
    /// `asset`. `None` if neither has one.
    pub fn resolve(
        chain: Eip155ChainReference,
        asset_address: Address,
        pay_to: Address,
        amount: U256,
        max_timeout_seconds: u64,
        extra: Option<PaymentRequirementsExtra>,
    ) -> Option<Self> {
        let domain = match extra {
            Some(extra) => TokenDeploymentEip712 {
                name: extra.name,
                version: extra.version,
            },
            None => known_token(chain, asset_address)?.eip712?,
        };
        Some(Self {
            chain_id: chain.inner(),
            asset_address,
            pay_to,
            amount,
            max_timeout_seconds,
            domain,
        })
    }
}

/// Signs an ERC-3009 `TransferWithAuthorization` with EIP-712.
///
/// The window opens ten minutes in the past and closes `max_timeout_seconds`
/// from now. The nonce is 32 random bytes.
#[cfg_attr(feature = "telemetry", instrument(name = "linguaframe.sign_erc3009", skip_all, err, fields(chain_id = params.chain_id)))]
pub async fn sign_erc3009_authorization<S: SignerLike + Sync>(
    signer: &S,
    params: &Eip3009SigningParams,
) -> Result<ExactEvmPayload, X402Error> {
    let domain = eip712_domain! {
        name: params.domain.name.clone(),
        version: params.domain.version.clone(),
        chain_id: params.chain_id,
        verifying_contract: params.asset_address,
    };

    let now = UnixTimestamp::try_now().map_err(|e| X402Error::SigningError(e.to_string()))?;
    let valid_after = now.saturating_sub(VALID_AFTER_SKEW_SECS);
    let valid_before = now + params.max_timeout_seconds;
    let nonce: [u8; 32] = rng().random();

    let authorization = ExactEvmPayloadAuthorization {
        from: signer.address(),
        to: params.pay_to,
        value: params.amount,
        valid_after,
        valid_before,
        nonce: FixedBytes(nonce),
    };

    // Must mirror `authorization` field for field; the verifier rebuilds it.
    let typed = TransferWithAuthorization {
        from: authorization.from,
        to: authorization.to,
        value: authorization.value,
        validAfter: U256::from(authorization.valid_after.as_secs()),
        validBefore: U256::from(authorization.valid_before.as_secs()),
        nonce: authorization.nonce,
    };
    let hash = typed.eip712_signing_hash(&domain);
    let signature = signer
        .sign_hash(&hash)
        .await
        .map_err(|e| X402Error::SigningError(e.to_string()))?;

    #[cfg(feature = "telemetry")]
    debug!(from = %authorization.from, to = %authorization.to, value = %authorization.value, "Signed ERC-3009 authorization");

    Ok(ExactEvmPayload {
        signature: signature.as_bytes().into(),
        authorization,
    })
}

struct V1PayloadSigner<S> {
    signer: S,
    network: String,
    params: Eip3009SigningParams,
}

#[async_trait]
impl<S> PaymentCandidateSigner for V1PayloadSigner<S>
where
    S: SignerLike + Send + Sync,
{
    async fn sign_payment(&self) -> Result<String, X402Error> {
        let payload = V1PaymentPayload {
            x402_version: X402Version1,
            scheme: ExactScheme,
            network: self.network.clone(),
            payload: sign_erc3009_authorization(&self.signer, &self.params).await?,
        };
        Ok(Base64Bytes::encode_json(&payload)?.to_string())
    }
}

struct V2PayloadSigner<S> {
    signer: S,
    accepted: v2::PaymentRequirements,
    resource: v2::ResourceInfo,
    params: Eip3009SigningParams,
}

#[async_trait]
impl<S> PaymentCandidateSigner for V2PayloadSigner<S>
where
    S: SignerLike + Send + Sync,
{
    async fn sign_payment(&self) -> Result<String, X402Error> {
        let payload = V2PaymentPayload {
            accepted: self.accepted.clone(),
            payload: sign_erc3009_authorization(&self.signer, &self.params).await?,
            resource: Some(self.resource.clone()),
            x402_version: X402Version2,
        };
        Ok(Base64Bytes::encode_json(&payload)?.to_string())
    }
}

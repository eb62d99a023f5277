//! Well-known EVM networks and their USDC deployments.

use alloy_primitives::{Address, address};
use linguaframe_types::chain::ChainId;
use linguaframe_types::networks::USDC;

use crate::chain::{Eip155ChainReference, Eip155TokenDeployment, TokenDeploymentEip712};

/// Per-network instances for the networks LinguaFrame pays on.
///
/// ```
/// use linguaframe_chain_eip155::KnownNetworkEip155;
/// use linguaframe_types::chain::ChainId;
///
/// assert_eq!(ChainId::base().to_string(), "eip155:8453");
/// ```
pub trait KnownNetworkEip155<A> {
    /// Base mainnet (eip155:8453)
    fn base() -> A;
    /// Base Sepolia testnet (eip155:84532)
    fn base_sepolia() -> A;
}

const BASE: Eip155ChainReference = Eip155ChainReference::new(8453);
const BASE_SEPOLIA: Eip155ChainReference = Eip155ChainReference::new(84532);

impl KnownNetworkEip155<Eip155ChainReference> for Eip155ChainReference {
    fn base() -> Eip155ChainReference {
        BASE
    }

    fn base_sepolia() -> Eip155ChainReference {
        BASE_SEPOLIA
    }
}

impl KnownNetworkEip155<ChainId> for ChainId {
    fn base() -> ChainId {
        BASE.as_chain_id()
    }

    fn base_sepolia() -> ChainId {
        BASE_SEPOLIA.as_chain_id()
    }
}

impl KnownNetworkEip155<Eip155TokenDeployment> for USDC {
    fn base() -> Eip155TokenDeployment {
        Eip155TokenDeployment {
            chain_reference: BASE,
            address: address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            decimals: 6,
            eip712: Some(TokenDeploymentEip712 {
                name: "USD Coin".into(),
                version: "2".into(),
            }),
        }
    }

    fn base_sepolia() -> Eip155TokenDeployment {
        Eip155TokenDeployment {
            chain_reference: BASE_SEPOLIA,
            address: address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
            decimals: 6,
            eip712: Some(TokenDeploymentEip712 {
                name: "USDC".into(),
                version: "2".into(),
            }),
        }
    }
}

/// The USDC deployment on `chain`, if LinguaFrame knows one.
pub fn usdc_on_chain(chain: Eip155ChainReference) -> Option<Eip155TokenDeployment> {
    match chain {
        BASE => Some(USDC::base()),
        BASE_SEPOLIA => Some(USDC::base_sepolia()),
        _ => None,
    }
}

/// Looks up a known token by chain and contract address.
pub fn known_token(chain: Eip155ChainReference, address: Address) -> Option<Eip155TokenDeployment> {
    usdc_on_chain(chain).filter(|usdc| usdc.address == address)
}

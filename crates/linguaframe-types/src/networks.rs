//! Networks LinguaFrame knows by name.
//!
//! x402 V1 payment requirements name their network (`"base"`) rather than using a
//! CAIP-2 identifier. This registry maps between the two for the networks the
//! application pays on: Base mainnet and Base Sepolia.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::chain::ChainId;

/// A known network with its V1 name and CAIP-2 parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub name: &'static str,
    pub namespace: &'static str,
    pub reference: &'static str,
}

impl NetworkInfo {
    pub fn chain_id(&self) -> ChainId {
        ChainId::new(self.namespace, self.reference)
    }
}

pub static KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "base",
        namespace: "eip155",
        reference: "8453",
    },
    NetworkInfo {
        name: "base-sepolia",
        namespace: "eip155",
        reference: "84532",
    },
];

static NAME_TO_CHAIN_ID: LazyLock<HashMap<&'static str, ChainId>> = LazyLock::new(|| {
    KNOWN_NETWORKS
        .iter()
        .map(|n| (n.name, n.chain_id()))
        .collect()
});

static CHAIN_ID_TO_NAME: LazyLock<HashMap<ChainId, &'static str>> = LazyLock::new(|| {
    KNOWN_NETWORKS
        .iter()
        .map(|n| (n.chain_id(), n.name))
        .collect()
});

pub fn chain_id_by_network_name(name: &str) -> Option<&ChainId> {
    NAME_TO_CHAIN_ID.get(name)
}

pub fn network_name_by_chain_id(chain_id: &ChainId) -> Option<&'static str> {
    CHAIN_ID_TO_NAME.get(chain_id).copied()
}

/// Marker for USDC deployments.
///
/// Chain crates implement their known-network traits for this type, e.g.
/// `USDC::base()` in the EIP-155 crate yields the USDC contract on Base.
#[allow(clippy::upper_case_acronyms)]
pub struct USDC;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_from_network_name() {
        let base = chain_id_by_network_name("base").unwrap();
        assert_eq!(base.namespace, "eip155");
        assert_eq!(base.reference, "8453");

        let base_sepolia = chain_id_by_network_name("base-sepolia").unwrap();
        assert_eq!(base_sepolia.reference, "84532");

        assert!(chain_id_by_network_name("unknown").is_none());
    }

    #[test]
    fn test_network_name_by_chain_id() {
        let chain_id = ChainId::new("eip155", "84532");
        assert_eq!(network_name_by_chain_id(&chain_id), Some("base-sepolia"));

        let unknown = ChainId::new("eip155", "999999");
        assert!(network_name_by_chain_id(&unknown).is_none());
    }
}

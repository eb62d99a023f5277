//! CAIP-2 chain identifiers.
//!
//! A CAIP-2 chain ID is `namespace:reference`, e.g. `eip155:8453` for Base.
//! The x402 V2 wire format addresses networks this way; V1 uses network
//! names, which [`ChainId::from_network_name`] maps back.
//!
//! ```
//! use linguaframe_types::chain::ChainId;
//!
//! let base: ChainId = "eip155:8453".parse().unwrap();
//! assert_eq!(base.namespace(), "eip155");
//! assert_eq!(base.as_network_name(), Some("base"));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

use crate::networks;

/// A CAIP-2 compliant blockchain identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainId {
    pub namespace: String,
    pub reference: String,
}

impl ChainId {
    pub fn new<N: Into<String>, R: Into<String>>(namespace: N, reference: R) -> Self {
        Self {
            namespace: namespace.into(),
            reference: reference.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Resolves a V1 network name (`"base"`, `"base-sepolia"`) to its chain ID.
    pub fn from_network_name(network_name: &str) -> Option<Self> {
        networks::chain_id_by_network_name(network_name).cloned()
    }

    /// Returns the V1 network name for this chain, if it is a known network.
    pub fn as_network_name(&self) -> Option<&'static str> {
        networks::network_name_by_chain_id(self)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

impl From<ChainId> for String {
    fn from(value: ChainId) -> Self {
        value.to_string()
    }
}

/// Error returned when parsing an invalid chain ID string.
#[derive(Debug, thiserror::Error)]
#[error("Invalid chain id format {0}")]
pub struct ChainIdFormatError(String);

impl FromStr for ChainId {
    type Err = ChainIdFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, reference)) if !namespace.is_empty() && !reference.is_empty() => {
                Ok(ChainId::new(namespace, reference))
            }
            _ => Err(ChainIdFormatError(s.into())),
        }
    }
}

impl Serialize for ChainId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ChainId::from_str(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let chain_id: ChainId = "eip155:8453".parse().unwrap();
        assert_eq!(chain_id.namespace, "eip155");
        assert_eq!(chain_id.reference, "8453");
        assert_eq!(chain_id.to_string(), "eip155:8453");
    }

    #[test]
    fn test_parse_rejects_missing_parts() {
        assert!("eip155".parse::<ChainId>().is_err());
        assert!(":8453".parse::<ChainId>().is_err());
        assert!("eip155:".parse::<ChainId>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let chain_id = ChainId::new("eip155", "84532");
        let json = serde_json::to_string(&chain_id).unwrap();
        assert_eq!(json, "\"eip155:84532\"");
        let back: ChainId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chain_id);
    }

    #[test]
    fn test_network_name_round_trip() {
        let base = ChainId::from_network_name("base").unwrap();
        assert_eq!(base, ChainId::new("eip155", "8453"));
        assert_eq!(base.as_network_name(), Some("base"));
        assert!(ChainId::from_network_name("moonbase").is_none());
    }
}

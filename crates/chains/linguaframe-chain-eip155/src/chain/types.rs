//! EVM-specific values: chain references, token deployments and their wire forms.

use alloy_primitives::{Address, U256, hex};
use linguaframe_types::chain::ChainId;
use linguaframe_types::util::money_amount::{MoneyAmount, MoneyAmountParseError};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// An address that displays and serializes with its EIP-55 checksum.
///
/// ```
/// use linguaframe_chain_eip155::chain::ChecksummedAddress;
///
/// let addr: ChecksummedAddress = "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913".parse().unwrap();
/// assert_eq!(addr.to_string(), "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChecksummedAddress(pub Address);

impl ChecksummedAddress {
    /// `0x1234...abcd`, the way wallet widgets show an account.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl FromStr for ChecksummedAddress {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = Address::from_str(s.trim())?;
        Ok(Self(address))
    }
}

impl Display for ChecksummedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_checksum(None))
    }
}

impl Serialize for ChecksummedAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_checksum(None))
    }
}

impl<'de> Deserialize<'de> for ChecksummedAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<ChecksummedAddress> for Address {
    fn from(value: ChecksummedAddress) -> Self {
        value.0
    }
}

impl From<Address> for ChecksummedAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

/// Serde adapter for `U256` as a decimal string, as x402 amounts travel.
pub mod decimal_u256 {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(serde::de::Error::custom)
    }
}

/// The CAIP-2 namespace for EVM-compatible chains.
pub const EIP155_NAMESPACE: &str = "eip155";

/// Numeric EVM chain id, e.g. `8453` for Base.
///
/// ```
/// use linguaframe_chain_eip155::chain::Eip155ChainReference;
/// use linguaframe_types::chain::ChainId;
///
/// let base = Eip155ChainReference::new(8453);
/// let chain_id: ChainId = base.into();
/// assert_eq!(chain_id.to_string(), "eip155:8453");
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Eip155ChainReference(u64);

impl Eip155ChainReference {
    pub const fn new(chain_id: u64) -> Self {
        Self(chain_id)
    }

    pub fn inner(&self) -> u64 {
        self.0
    }

    pub fn as_chain_id(&self) -> ChainId {
        ChainId::new(EIP155_NAMESPACE, self.0.to_string())
    }
}

impl From<Eip155ChainReference> for ChainId {
    fn from(value: Eip155ChainReference) -> Self {
        value.as_chain_id()
    }
}

impl TryFrom<&ChainId> for Eip155ChainReference {
    type Error = Eip155ChainReferenceFormatError;

    fn try_from(value: &ChainId) -> Result<Self, Self::Error> {
        if value.namespace != EIP155_NAMESPACE {
            return Err(Eip155ChainReferenceFormatError::InvalidNamespace(
                value.namespace.clone(),
            ));
        }
        let chain_id: u64 = value.reference.parse().map_err(|_| {
            Eip155ChainReferenceFormatError::InvalidReference(value.reference.clone())
        })?;
        Ok(Eip155ChainReference(chain_id))
    }
}

impl TryFrom<ChainId> for Eip155ChainReference {
    type Error = Eip155ChainReferenceFormatError;

    fn try_from(value: ChainId) -> Result<Self, Self::Error> {
        Eip155ChainReference::try_from(&value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Eip155ChainReferenceFormatError {
    #[error("Invalid namespace {0}, expected eip155")]
    InvalidNamespace(String),
    #[error("Invalid eip155 chain reference {0}")]
    InvalidReference(String),
}

impl Display for Eip155ChainReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// EIP-712 domain of a token supporting ERC-3009 authorizations.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TokenDeploymentEip712 {
    pub name: String,
    pub version: String,
}

/// A token contract on a specific chain.
///
/// ```ignore
/// use linguaframe_chain_eip155::KnownNetworkEip155;
/// use linguaframe_types::networks::USDC;
///
/// let usdc = USDC::base();
/// assert_eq!(usdc.parse("10.50").unwrap(), U256::from(10_500_000u64));
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Eip155TokenDeployment {
    pub chain_reference: Eip155ChainReference,
    pub address: Address,
    /// 6 for USDC.
    pub decimals: u8,
    /// Present for tokens that accept ERC-3009 authorizations.
    pub eip712: Option<TokenDeploymentEip712>,
}

impl Eip155TokenDeployment {
    /// Scales a human-entered amount into the token's smallest unit.
    ///
    /// Inputs with more decimal places than the token has are rejected rather
    /// than rounded.
    pub fn parse<V>(&self, v: V) -> Result<U256, MoneyAmountParseError>
    where
        V: TryInto<MoneyAmount>,
        MoneyAmountParseError: From<<V as TryInto<MoneyAmount>>::Error>,
    {
        let money_amount = v.try_into()?;
        self.scale(&money_amount)
    }

    pub fn scale(&self, money_amount: &MoneyAmount) -> Result<U256, MoneyAmountParseError> {
        let scale = money_amount.scale();
        let token_scale = self.decimals as u32;
        if scale > token_scale {
            return Err(MoneyAmountParseError::WrongPrecision {
                money: scale,
                token: token_scale,
            });
        }
        let multiplier = U256::from(10).pow(U256::from(token_scale - scale));
        Ok(U256::from(money_amount.mantissa()) * multiplier)
    }

    /// Inverse of [`Eip155TokenDeployment::parse`]: base units back to a decimal amount.
    ///
    /// Fails with [`MoneyAmountParseError::OutOfRange`] for values a decimal cannot hold.
    pub fn format_units(&self, value: U256) -> Result<MoneyAmount, MoneyAmountParseError> {
        let units: u128 = value
            .try_into()
            .map_err(|_| MoneyAmountParseError::OutOfRange)?;
        let units = i128::try_from(units).map_err(|_| MoneyAmountParseError::OutOfRange)?;
        let decimal = Decimal::try_from_i128_with_scale(units, self.decimals as u32)
            .map_err(|_| MoneyAmountParseError::OutOfRange)?;
        Ok(MoneyAmount(decimal.normalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployment(decimals: u8) -> Eip155TokenDeployment {
        Eip155TokenDeployment {
            chain_reference: Eip155ChainReference::new(8453),
            address: Address::ZERO,
            decimals,
            eip712: Some(TokenDeploymentEip712 {
                name: "TestToken".into(),
                version: "2".into(),
            }),
        }
    }

    #[test]
    fn test_parse_whole_number() {
        assert_eq!(deployment(6).parse("1").unwrap(), U256::from(1_000_000u64));
        assert_eq!(deployment(6).parse("100").unwrap(), U256::from(100_000_000u64));
    }

    #[test]
    fn test_parse_with_decimals() {
        assert_eq!(deployment(6).parse("1.50").unwrap(), U256::from(1_500_000u64));
        assert_eq!(deployment(6).parse("0.000001").unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_parse_eighteen_decimals() {
        let expected = U256::from(10).pow(U256::from(18)) * U256::from(2);
        assert_eq!(deployment(18).parse("2").unwrap(), expected);
    }

    #[test]
    fn test_parse_too_precise() {
        assert_eq!(
            deployment(6).parse("0.0000001"),
            Err(MoneyAmountParseError::WrongPrecision { money: 7, token: 6 })
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(
            deployment(6).parse("abc"),
            Err(MoneyAmountParseError::InvalidFormat)
        );
    }

    #[test]
    fn test_scale_round_trip() {
        let token = deployment(6);
        for input in ["0", "1", "0.5", "12.345678", "999999999.999999", "1000"] {
            let units = token.parse(input).unwrap();
            let back = token.format_units(units).unwrap();
            assert_eq!(back, MoneyAmount::parse(input).unwrap(), "input {input}");
            assert_eq!(token.scale(&back).unwrap(), units);
        }
    }

    #[test]
    fn test_format_units_out_of_range() {
        assert_eq!(
            deployment(6).format_units(U256::MAX),
            Err(MoneyAmountParseError::OutOfRange)
        );
    }

    #[test]
    fn test_chain_reference_from_chain_id() {
        let base: ChainId = "eip155:8453".parse().unwrap();
        assert_eq!(
            Eip155ChainReference::try_from(&base).unwrap(),
            Eip155ChainReference::new(8453)
        );
        let solana = ChainId::new("solana", "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp");
        assert!(Eip155ChainReference::try_from(&solana).is_err());
        let broken = ChainId::new("eip155", "base");
        assert!(Eip155ChainReference::try_from(broken).is_err());
    }

    #[test]
    fn test_short_address() {
        let addr: ChecksummedAddress = "0x209693Bc6afc0C5328bA36FaF03C514EF312287C"
            .parse()
            .unwrap();
        assert_eq!(addr.short(), "0x2096...287C");
    }
}

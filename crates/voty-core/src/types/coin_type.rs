//! Chain identifiers
//!
//! Chains are identified by their SLIP-44 coin type. EVM chains additionally
//! have a chain id that differs between mainnet and testnet.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// SLIP-44 coin type identifying a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoinType(pub u32);

impl CoinType {
    /// Ethereum
    pub const ETH: CoinType = CoinType(60);
    /// Nervos CKB (home of `.bit` accounts)
    pub const CKB: CoinType = CoinType(309);
    /// Arweave (content-addressed storage)
    pub const AR: CoinType = CoinType(472);
    /// Polygon
    pub const MATIC: CoinType = CoinType(966);
    /// BNB Chain
    pub const BSC: CoinType = CoinType(9006);

    /// Raw numeric value
    pub fn value(self) -> u32 {
        self.0
    }

    /// Human-readable chain name
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::ETH => Some("Ethereum"),
            Self::CKB => Some("Nervos CKB"),
            Self::AR => Some("Arweave"),
            Self::MATIC => Some("Polygon"),
            Self::BSC => Some("BNB Chain"),
            _ => None,
        }
    }

    /// EVM chain id of this coin type on the given network
    pub fn chain_id(self, network: Network) -> Option<u64> {
        let testnet = network.is_testnet();
        match self {
            Self::ETH => Some(if testnet { 5 } else { 1 }),
            Self::MATIC => Some(if testnet { 80001 } else { 137 }),
            Self::BSC => Some(if testnet { 97 } else { 56 }),
            _ => None,
        }
    }

    /// Coin type of an EVM chain id on the given network
    pub fn from_chain_id(chain_id: u64, network: Network) -> Option<CoinType> {
        [Self::ETH, Self::MATIC, Self::BSC]
            .into_iter()
            .find(|coin_type| coin_type.chain_id(network) == Some(chain_id))
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CoinType {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(CoinType)
    }
}

impl From<u32> for CoinType {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Serialize for CoinType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

// Coin types appear both as numbers and as JSON object keys (strings), so
// deserialization accepts either form.
impl<'de> Deserialize<'de> for CoinType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CoinTypeVisitor;

        impl Visitor<'_> for CoinTypeVisitor {
            type Value = CoinType;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a coin type as integer or decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<CoinType, E> {
                u32::try_from(v)
                    .map(CoinType)
                    .map_err(|_| E::custom(format!("coin type out of range: {v}")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<CoinType, E> {
                u32::try_from(v)
                    .map(CoinType)
                    .map_err(|_| E::custom(format!("coin type out of range: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<CoinType, E> {
                v.parse()
                    .map_err(|_| E::custom(format!("invalid coin type: {v}")))
            }
        }

        deserializer.deserialize_any(CoinTypeVisitor)
    }
}

/// Network a process serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production chains
    #[default]
    Mainnet,
    /// Test chains (Goerli, Mumbai, Chapel)
    Testnet,
}

impl Network {
    /// Network for a `testnet` flag
    pub fn from_testnet(testnet: bool) -> Self {
        if testnet {
            Self::Testnet
        } else {
            Self::Mainnet
        }
    }

    /// Whether this is the test network
    pub fn is_testnet(self) -> bool {
        matches!(self, Self::Testnet)
    }
}

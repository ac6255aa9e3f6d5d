//! Decentralized identifiers and chain addresses

use crate::errors::{Result, VotyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decentralized identifier such as `alice.bit` or `vitalik.eth`
///
/// The trailing label (the method suffix) selects the resolver family. A DID
/// is immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Parse an identifier, requiring at least one label before the suffix
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return Err(VotyError::invalid(format!("malformed identifier: {value:?}")));
        }
        match value.rsplit_once('.') {
            Some((name, suffix)) if !name.is_empty() && !suffix.is_empty() => Ok(Self(value)),
            _ => Err(VotyError::invalid(format!(
                "identifier has no method suffix: {value:?}"
            ))),
        }
    }

    /// The identifier as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Method suffix, i.e. the trailing label (`bit` for `alice.bit`)
    pub fn suffix(&self) -> &str {
        self.0.rsplit_once('.').map(|(_, s)| s).unwrap_or_default()
    }

    /// Whether the identifier ends with `.{suffix}`
    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.strip_suffix(suffix).is_some()
    }

    /// Part before `.{suffix}`, if the identifier ends with it
    ///
    /// `strip_suffix("alice.bit")` on `dev.alice.bit` yields `dev`.
    pub fn strip_suffix(&self, suffix: &str) -> Option<&str> {
        self.0
            .strip_suffix(suffix)
            .and_then(|rest| rest.strip_suffix('.'))
            .filter(|rest| !rest.is_empty())
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = VotyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Did {
    type Error = VotyError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

/// 20-byte account address, `0x`-prefixed hex, compared case-insensitively
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse an address, normalizing hex digits to lowercase
    pub fn parse(value: &str) -> Result<Self> {
        let digits = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .ok_or_else(|| VotyError::invalid(format!("address missing 0x prefix: {value:?}")))?;
        if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(VotyError::invalid(format!("malformed address: {value:?}")));
        }
        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// Build an address from raw bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// The normalized address string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = VotyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = VotyError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_did_suffix() {
        let did = Did::parse("dev.alice.bit").unwrap();
        assert_eq!(did.suffix(), "bit");
        assert!(did.has_suffix("bit"));
        assert!(did.has_suffix("alice.bit"));
        assert!(!did.has_suffix("lice.bit"));
        assert_eq!(did.strip_suffix("alice.bit"), Some("dev"));
        assert_eq!(did.strip_suffix("bit"), Some("dev.alice"));
    }

    #[test]
    fn test_did_rejects_missing_suffix() {
        assert!(Did::parse("alice").is_err());
        assert!(Did::parse(".bit").is_err());
        assert!(Did::parse("alice.").is_err());
        assert!(Did::parse("al ice.bit").is_err());
        assert!(serde_json::from_str::<Did>("\"alice\"").is_err());
    }

    #[test]
    fn test_address_normalization() {
        let upper = Address::parse("0xAbCdEf0123456789abcdef0123456789ABCDEF01").unwrap();
        let lower = Address::parse("0xabcdef0123456789abcdef0123456789abcdef01").unwrap();
        assert_eq!(upper, lower);
        assert!(Address::parse("").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("abcdef0123456789abcdef0123456789abcdef01").is_err());
    }
}

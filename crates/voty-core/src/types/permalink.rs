//! Permanent references to content-addressed documents

use crate::errors::{Result, VotyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SCHEME: &str = "ar://";
const EXPLORER: &str = "https://viewblock.io/arweave/tx/";

/// Permanent, content-derived reference such as `ar://<transaction id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permalink(String);

impl Permalink {
    /// Permalink of a storage transaction id
    pub fn from_id(id: &str) -> Result<Self> {
        Self::parse(format!("{SCHEME}{id}"))
    }

    /// Parse an `ar://` permalink
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        match value.strip_prefix(SCHEME) {
            Some(id)
                if !id.is_empty()
                    && id
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
            {
                Ok(Self(value))
            }
            _ => Err(VotyError::invalid(format!("malformed permalink: {value:?}"))),
        }
    }

    /// Storage transaction id
    pub fn id(&self) -> &str {
        &self.0[SCHEME.len()..]
    }

    /// Block explorer URL of the underlying transaction
    pub fn explorer_url(&self) -> String {
        format!("{EXPLORER}{}", self.id())
    }

    /// Permalink as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permalink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Permalink {
    type Err = VotyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Permalink {
    type Error = VotyError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Permalink> for String {
    fn from(permalink: Permalink) -> Self {
        permalink.0
    }
}

/// Kind of document persisted by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Community definition with its workgroups
    Community,
    /// Proposal submitted to a workgroup
    Proposal,
    /// Vote cast on a proposal
    Vote,
}

impl DataType {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::Proposal => "proposal",
            Self::Vote => "vote",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permalink_id_round_trip() {
        let permalink = Permalink::from_id("bNbA3TEQVL60xlgCcqdz4ZPHFZ711cZ3hmkpGttDt_U").unwrap();
        assert_eq!(
            permalink.as_str(),
            "ar://bNbA3TEQVL60xlgCcqdz4ZPHFZ711cZ3hmkpGttDt_U"
        );
        assert_eq!(permalink.id(), "bNbA3TEQVL60xlgCcqdz4ZPHFZ711cZ3hmkpGttDt_U");
        assert_eq!(
            permalink.explorer_url(),
            "https://viewblock.io/arweave/tx/bNbA3TEQVL60xlgCcqdz4ZPHFZ711cZ3hmkpGttDt_U"
        );
    }

    #[test]
    fn test_permalink_rejects_other_schemes() {
        assert!(Permalink::parse("ipfs://abc").is_err());
        assert!(Permalink::parse("ar://").is_err());
        assert!(Permalink::parse("ar://a/b").is_err());
    }
}

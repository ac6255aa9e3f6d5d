//! Authorship records and proof envelopes carried by signed documents

use crate::types::{CoinType, Did, Snapshot};
use serde::{Deserialize, Serialize};

/// Which chain and height were used to prove the author controls `author`
///
/// Created once at signing time and embedded in the signed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorship {
    /// Claimed identity
    pub author: Did,
    /// Chain the identity was resolved on
    pub coin_type: CoinType,
    /// Height the identity was resolved at
    pub snapshot: Snapshot,
    /// Signed for the test network; omitted from the wire form when false
    #[serde(default, skip_serializing_if = "is_false")]
    pub testnet: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Signature scheme of a proof
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofScheme {
    /// Ed25519 over the templated signing message
    Ed25519,
}

/// Signature binding one serialized document to its signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Signature scheme
    #[serde(rename = "type")]
    pub scheme: ProofScheme,
    /// Hex-encoded public key of the signer
    pub public_key: String,
    /// Message template the document digest was substituted into
    pub template: String,
    /// Hex-encoded signature over the rendered message
    pub signature: String,
}

/// Document extended with its authorship record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorized<T> {
    /// Document body
    #[serde(flatten)]
    pub document: T,
    /// How the author was resolved at signing time
    pub authorship: Authorship,
}

/// Document extended with the proof over everything else in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proved<T> {
    /// Signed content
    #[serde(flatten)]
    pub document: T,
    /// Signature over `document`
    pub proof: Proof,
}

impl<T> Proved<Authorized<T>> {
    /// Authorship record of the signed document
    pub fn authorship(&self) -> &Authorship {
        &self.document.authorship
    }

    /// Document body without authorship or proof
    pub fn body(&self) -> &T {
        &self.document.document
    }
}

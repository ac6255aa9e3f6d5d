//! Deterministic document signers

use ed25519_dalek::SigningKey;
use serde::Serialize;
use voty_core::crypto::{address_of, sign_document, DEFAULT_SIGNING_TEMPLATE};
use voty_core::{Address, Authorized, Authorship, CoinType, Did, NameRecord, Proved, Snapshot};

/// Identity with a key derived from a one-byte seed
#[derive(Debug, Clone)]
pub struct TestSigner {
    did: Did,
    key: SigningKey,
}

impl TestSigner {
    /// Signer for `did` with key bytes `[seed; 32]`
    pub fn new(did: &str, seed: u8) -> Self {
        Self {
            did: Did::parse(did).expect("valid test identifier"),
            key: SigningKey::from_bytes(&[seed; 32]),
        }
    }

    /// Identifier
    pub fn did(&self) -> &Did {
        &self.did
    }

    /// Signing key
    pub fn key(&self) -> &SigningKey {
        &self.key
    }

    /// Address controlled by the key
    pub fn address(&self) -> Address {
        address_of(&self.key.verifying_key())
    }

    /// Name record binding the identifier to this signer's address
    pub fn name_record(&self) -> NameRecord {
        NameRecord {
            address: self.address().to_string(),
            coin_type: Some(CoinType::ETH),
        }
    }

    /// Mainnet authorship at `snapshot` of `coin_type`
    pub fn authorship(&self, coin_type: CoinType, snapshot: u64) -> Authorship {
        Authorship {
            author: self.did.clone(),
            coin_type,
            snapshot: Snapshot::new(snapshot),
            testnet: false,
        }
    }

    /// Sign `document` with a mainnet authorship at `snapshot` of `coin_type`
    pub fn sign<T: Serialize>(
        &self,
        document: T,
        coin_type: CoinType,
        snapshot: u64,
    ) -> Proved<Authorized<T>> {
        self.sign_with(document, self.authorship(coin_type, snapshot))
    }

    /// Sign `document` with an explicit authorship
    pub fn sign_with<T: Serialize>(
        &self,
        document: T,
        authorship: Authorship,
    ) -> Proved<Authorized<T>> {
        sign_document(document, authorship, &self.key, DEFAULT_SIGNING_TEMPLATE)
            .expect("test document signs")
    }
}

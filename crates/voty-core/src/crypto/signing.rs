//! Canonical signing messages and document proofs
//!
//! Signer and verifier must render a document to exactly the same bytes.
//! The document (body plus authorship, never the proof) is converted to a JSON
//! value, object keys are sorted, and the compact rendering is hashed. The
//! `0x`-hex digest is substituted into a textual template together with the
//! author identifier; the result is what gets signed.

use super::hash::{hash, hex_digest};
use crate::documents::{Authorized, Authorship, Proof, ProofScheme, Proved};
use crate::errors::{Result, VotyError};
use crate::types::{Address, Did};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Placeholder replaced by the document digest
pub const HASH_PLACEHOLDER: &str = "{hash}";
/// Placeholder replaced by the author identifier
pub const DID_PLACEHOLDER: &str = "{did}";
/// Template handed to signers unless configured otherwise
pub const DEFAULT_SIGNING_TEMPLATE: &str = "You are signing for Voty.\n\nauthor: {did}\nhash: {hash}";

/// Canonical JSON bytes of `document`
pub fn canonical_json<T: Serialize>(document: &T) -> Result<Vec<u8>> {
    let value = sort_keys(serde_json::to_value(document)?);
    Ok(serde_json::to_vec(&value)?)
}

// Key order must not depend on serde_json's map feature flags.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Digest of an authorized document, as substituted into the template
pub fn document_digest<T: Serialize>(document: &Authorized<T>) -> Result<String> {
    Ok(hex_digest(&canonical_json(document)?))
}

/// Render the message that gets signed
pub fn signing_message(template: &str, author: &Did, digest: &str) -> Result<String> {
    if !template.contains(HASH_PLACEHOLDER) {
        return Err(VotyError::invalid(format!(
            "signing template lacks {HASH_PLACEHOLDER} placeholder"
        )));
    }
    Ok(template
        .replace(DID_PLACEHOLDER, author.as_str())
        .replace(HASH_PLACEHOLDER, digest))
}

/// Address controlled by an ed25519 key: last 20 bytes of SHA-256(public key)
pub fn address_of(public_key: &VerifyingKey) -> Address {
    let digest = hash(public_key.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::from_bytes(bytes)
}

/// Attach authorship to `document` and sign it
pub fn sign_document<T: Serialize>(
    document: T,
    authorship: Authorship,
    key: &SigningKey,
    template: &str,
) -> Result<Proved<Authorized<T>>> {
    let authorized = Authorized {
        document,
        authorship,
    };
    let digest = document_digest(&authorized)?;
    let message = signing_message(template, &authorized.authorship.author, &digest)?;
    let signature = key.sign(message.as_bytes());

    Ok(Proved {
        document: authorized,
        proof: Proof {
            scheme: ProofScheme::Ed25519,
            public_key: hex::encode(key.verifying_key().as_bytes()),
            template: template.to_string(),
            signature: hex::encode(signature.to_bytes()),
        },
    })
}

/// Check the proof of a signed document, returning the signer's address
///
/// Only the cryptographic binding is checked here; whether the signer
/// controls the claimed identity is decided by identifier resolution.
pub fn verify_document<T: Serialize>(document: &Proved<Authorized<T>>) -> Result<Address> {
    let proof = &document.proof;
    match proof.scheme {
        ProofScheme::Ed25519 => {}
    }

    let key_bytes: [u8; 32] = decode_fixed(&proof.public_key, "public key")?;
    let signature_bytes: [u8; 64] = decode_fixed(&proof.signature, "signature")?;
    let public_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| VotyError::crypto(format!("invalid public key: {e}")))?;
    let signature = Signature::from_bytes(&signature_bytes);

    let digest = document_digest(&document.document)?;
    let message = signing_message(&proof.template, &document.authorship().author, &digest)?;

    public_key
        .verify_strict(message.as_bytes(), &signature)
        .map_err(|e| VotyError::crypto(format!("signature verification failed: {e}")))?;

    Ok(address_of(&public_key))
}

fn decode_fixed<const N: usize>(encoded: &str, what: &str) -> Result<[u8; N]> {
    let raw = encoded.strip_prefix("0x").unwrap_or(encoded);
    let bytes =
        hex::decode(raw).map_err(|e| VotyError::crypto(format!("invalid {what} hex: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| VotyError::crypto(format!("{what} must be {N} bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CoinType, Snapshot};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        title: String,
        body: String,
    }

    fn authorship() -> Authorship {
        Authorship {
            author: Did::parse("alice.bit").unwrap(),
            coin_type: CoinType::CKB,
            snapshot: Snapshot::new(100),
            testnet: false,
        }
    }

    fn note() -> Note {
        Note {
            title: "hello".into(),
            body: "world".into(),
        }
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let value = serde_json::json!({ "b": 1, "a": { "d": 2, "c": 3 } });
        let bytes = canonical_json(&value).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"a":{"c":3,"d":2},"b":1}"#);
    }

    #[test]
    fn test_message_substitutes_placeholders() {
        let did = Did::parse("alice.bit").unwrap();
        let message = signing_message("by {did}: {hash}", &did, "0xabc").unwrap();
        assert_eq!(message, "by alice.bit: 0xabc");
        assert!(signing_message("no placeholder", &did, "0xabc").is_err());
    }

    #[test]
    fn test_sign_then_verify() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let signed = sign_document(note(), authorship(), &key, DEFAULT_SIGNING_TEMPLATE).unwrap();
        let address = verify_document(&signed).unwrap();
        assert_eq!(address, address_of(&key.verifying_key()));
    }

    #[test]
    fn test_verify_after_json_round_trip() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let signed = sign_document(note(), authorship(), &key, DEFAULT_SIGNING_TEMPLATE).unwrap();
        let wire = serde_json::to_string(&signed).unwrap();
        let parsed: Proved<Authorized<Note>> = serde_json::from_str(&wire).unwrap();
        assert_eq!(parsed, signed);
        assert!(verify_document(&parsed).is_ok());
    }

    #[test]
    fn test_tampered_body_fails() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let mut signed =
            sign_document(note(), authorship(), &key, DEFAULT_SIGNING_TEMPLATE).unwrap();
        signed.document.document.body.push('!');
        assert!(matches!(
            verify_document(&signed),
            Err(VotyError::Crypto { .. })
        ));
    }

    #[test]
    fn test_tampered_authorship_fails() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let mut signed =
            sign_document(note(), authorship(), &key, DEFAULT_SIGNING_TEMPLATE).unwrap();
        signed.document.authorship.snapshot = Snapshot::new(101);
        assert!(verify_document(&signed).is_err());
    }
}

//! Hashing and document signatures

pub mod hash;
pub mod signing;

pub use hash::{hash, hex_digest};
pub use signing::{
    address_of, canonical_json, document_digest, sign_document, signing_message,
    verify_document, DEFAULT_SIGNING_TEMPLATE, DID_PLACEHOLDER, HASH_PLACEHOLDER,
};

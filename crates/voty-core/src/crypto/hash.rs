//! Content hashing
//!
//! Hashing is a pure operation, not an effect. SHA-256 is used for document
//! digests and for deriving addresses from public keys.

use sha2::{Digest, Sha256};

/// SHA-256 of `data`
pub fn hash(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// `0x`-prefixed hex SHA-256 of `data`
pub fn hex_digest(data: &[u8]) -> String {
    format!("0x{}", hex::encode(hash(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hex_digest(b"abc"),
            "0xba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}

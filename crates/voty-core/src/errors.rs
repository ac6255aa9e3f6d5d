//! Error types shared by every Voty crate
//!
//! `VotyError` covers malformed input and local failures. External collaborators
//! get their own types (`ChainError`, `StorageError`) so callers can tell an
//! unreachable provider apart from a document that is simply wrong.

use crate::types::CoinType;
use serde::{Deserialize, Serialize};

/// General error type for local (non-I/O) operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum VotyError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Cryptographic operation failed
    #[error("Crypto error: {message}")]
    Crypto {
        /// Error message describing the cryptographic failure
        message: String,
    },

    /// Configuration could not be loaded or validated
    #[error("Config error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },
}

impl VotyError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for VotyError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Standard Result type for local Voty operations
pub type Result<T> = std::result::Result<T, VotyError>;

/// Failure of a call to a chain RPC provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ChainError {
    /// The provider could not be reached or answered with an error
    #[error("Chain {coin_type} unreachable: {message}")]
    Unreachable {
        /// Chain the call was addressed to
        coin_type: CoinType,
        /// Provider-specific detail
        message: String,
    },

    /// The call did not complete within the configured timeout
    #[error("Chain {coin_type} call timed out after {timeout_ms}ms")]
    Timeout {
        /// Chain the call was addressed to
        coin_type: CoinType,
        /// Timeout that elapsed
        timeout_ms: u64,
    },

    /// No provider is configured for this chain
    #[error("No provider configured for chain {coin_type}")]
    UnsupportedChain {
        /// Chain that was requested
        coin_type: CoinType,
    },
}

impl ChainError {
    /// Create an unreachable-provider error
    pub fn unreachable(coin_type: CoinType, message: impl Into<String>) -> Self {
        Self::Unreachable {
            coin_type,
            message: message.into(),
        }
    }

    /// Chain the failed call was addressed to
    pub fn coin_type(&self) -> CoinType {
        match self {
            Self::Unreachable { coin_type, .. }
            | Self::Timeout { coin_type, .. }
            | Self::UnsupportedChain { coin_type } => *coin_type,
        }
    }
}

/// Failure of the content-addressed storage or the persistence lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum StorageError {
    /// Nothing is stored under the requested key
    #[error("Not found: {key}")]
    NotFound {
        /// Key that was looked up
        key: String,
    },

    /// The backend could not be reached
    #[error("Storage unavailable: {message}")]
    Unavailable {
        /// Backend-specific detail
        message: String,
    },

    /// Stored bytes could not be decoded
    #[error("Malformed document {key}: {message}")]
    Malformed {
        /// Key of the offending document
        key: String,
        /// Decoder detail
        message: String,
    },
}

impl StorageError {
    /// Create a not found error
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create an unavailable-backend error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = VotyError::invalid("test message");
        assert!(matches!(err, VotyError::Invalid { .. }));
        assert_eq!(err.to_string(), "Invalid: test message");
    }

    #[test]
    fn test_chain_error_reports_coin_type() {
        let err = ChainError::Timeout {
            coin_type: CoinType::ETH,
            timeout_ms: 250,
        };
        assert_eq!(err.coin_type(), CoinType::ETH);
        assert_eq!(err.to_string(), "Chain 60 call timed out after 250ms");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        assert!(matches!(
            VotyError::from(json_err),
            VotyError::Serialization { .. }
        ));
    }
}

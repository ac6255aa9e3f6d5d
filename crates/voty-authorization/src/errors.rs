//! Error taxonomy of the authorization engine
//!
//! Three layers, each wrapping the one below without rewording it:
//!
//! - `ResolutionError`: an identifier could not be turned into an address
//! - `EvaluationError`: a policy or weight tree could not be evaluated
//! - `AuthorizationError`: the terminal rejection of a verification request
//!
//! A legitimate denial (`AuthorizationError::PolicyDenied`) is never an
//! evaluation error, and no error ever degrades into "allowed".

use serde::{Deserialize, Serialize};
use std::fmt;
use voty_core::{ChainError, CoinType, Did, Network, Snapshot, StorageError, Timestamp};

/// Failure to resolve an identifier to an address
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// No resolver is registered for the identifier's suffix
    #[error("Unsupported identifier: {did}")]
    UnsupportedIdentifier {
        /// Offending identifier
        did: String,
    },

    /// The chain answered, but no address is bound to the identifier
    #[error("{did} is not registered on chain {coin_type}")]
    NotRegistered {
        /// Identifier that was looked up
        did: Did,
        /// Chain that was asked
        coin_type: CoinType,
    },

    /// The chain returned an address that is not well-formed
    #[error("{did} resolved to malformed address {address:?}")]
    MalformedAddress {
        /// Identifier that was looked up
        did: Did,
        /// Raw answer of the chain
        address: String,
    },

    /// The resolver needs a chain height that was not supplied
    #[error("Missing snapshot for chain {coin_type}")]
    MissingSnapshot {
        /// Chain without a height
        coin_type: CoinType,
    },

    /// The chain provider failed or timed out
    #[error(transparent)]
    Provider(#[from] ChainError),
}

/// Failure to evaluate a policy or weight tree
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// A leaf names a function that is not registered
    #[error("Unknown function: {name}")]
    UnknownFunction {
        /// Name used by the leaf
        name: String,
    },

    /// A leaf's arguments do not fit the function's shape
    #[error("Invalid arguments for {function}: {message}")]
    InvalidArguments {
        /// Function being bound
        function: String,
        /// What is wrong with the arguments
        message: String,
    },

    /// A chain required by the tree has no entry in the snapshot set
    #[error("Missing snapshot for chain {coin_type}")]
    MissingSnapshot {
        /// Chain without a height
        coin_type: CoinType,
    },

    /// A weight leaf or group produced a negative or non-finite value
    #[error("Function {function} produced invalid weight {value}")]
    InvalidWeight {
        /// Function, or `sum`/`max` for a group, that produced the value
        function: String,
        /// Offending value
        value: f64,
    },

    /// A leaf needed the evaluated identity's address and could not get it
    #[error(transparent)]
    Resolution(ResolutionError),
}

impl EvaluationError {
    /// Create an invalid arguments error
    pub fn invalid_arguments(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Whether the error indicates drift between stored trees and the registry
    /// rather than an unreachable collaborator
    pub fn is_consistency_error(&self) -> bool {
        !matches!(self, Self::Resolution(_))
    }
}

// A snapshot gap is a tree/snapshot-set mismatch wherever it is detected.
impl From<ResolutionError> for EvaluationError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::MissingSnapshot { coin_type } => Self::MissingSnapshot { coin_type },
            other => Self::Resolution(other),
        }
    }
}

impl From<ChainError> for EvaluationError {
    fn from(err: ChainError) -> Self {
        Self::Resolution(ResolutionError::Provider(err))
    }
}

/// Action gated by a workgroup permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create a proposal
    Propose,
    /// Cast a vote
    Vote,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Propose => f.write_str("propose"),
            Self::Vote => f.write_str("vote"),
        }
    }
}

/// Terminal rejection of a verification request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthorizationError {
    /// The document was signed for the other network
    #[error("Network mismatch: document is for {actual:?}, verifier serves {expected:?}")]
    NetworkMismatch {
        /// Network served by the verifier
        expected: Network,
        /// Network claimed by the document
        actual: Network,
    },

    /// The proof does not bind the document to the claimed author
    #[error("Invalid signature: {message}")]
    InvalidSignature {
        /// Why the proof was rejected
        message: String,
    },

    /// The document is signed by someone other than the required identity
    #[error("Author mismatch: expected {expected}, got {actual}")]
    AuthorMismatch {
        /// Identity that must sign
        expected: Did,
        /// Identity that signed
        actual: Did,
    },

    /// The claimed snapshot is outside the freshness window
    #[error("Stale snapshot on chain {coin_type}: claimed {claimed}, current {current}, tolerance {tolerance}")]
    StaleSnapshot {
        /// Chain of the authorship record
        coin_type: CoinType,
        /// Snapshot claimed by the document
        claimed: Snapshot,
        /// Snapshot reported by the oracle
        current: Snapshot,
        /// Allowed distance
        tolerance: u64,
    },

    /// Complete evaluation of the permission yielded "no"
    #[error("Permission to {action} denied for {author}")]
    PolicyDenied {
        /// Action that was attempted
        action: Action,
        /// Identity that attempted it
        author: Did,
    },

    /// The permission tree could not be evaluated
    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    /// An identifier could not be resolved
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Storage or index failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A referenced document or workgroup does not exist
    #[error("Not found: {what}")]
    NotFound {
        /// Description of the missing item
        what: String,
    },

    /// The document or a referenced document is structurally invalid
    #[error("Malformed document: {message}")]
    Malformed {
        /// Validation detail
        message: String,
    },

    /// The vote claims a different voting power than computed
    #[error("Voting power mismatch: claimed {claimed}, computed {computed}")]
    PowerMismatch {
        /// Power claimed by the voter
        claimed: f64,
        /// Power computed by the verifier
        computed: f64,
    },

    /// The vote was authored outside the proposal's voting phase
    #[error("Vote at {vote_time:?} outside voting window [{voting_start:?}, {voting_end:?})")]
    OutsideVotingWindow {
        /// Block time of the vote's snapshot
        vote_time: Timestamp,
        /// Start of the voting phase
        voting_start: Timestamp,
        /// End of the voting phase (exclusive)
        voting_end: Timestamp,
    },

    /// The vote's choice does not fit the proposal
    #[error("Invalid choice: {message}")]
    InvalidChoice {
        /// Validation detail
        message: String,
    },
}

impl From<ChainError> for AuthorizationError {
    fn from(err: ChainError) -> Self {
        Self::Resolution(ResolutionError::Provider(err))
    }
}

impl AuthorizationError {
    /// Stable reason code for API consumers
    pub fn reason(&self) -> RejectionReason {
        match self {
            Self::NetworkMismatch { .. } => RejectionReason::NetworkMismatch,
            Self::InvalidSignature { .. } => RejectionReason::InvalidSignature,
            Self::AuthorMismatch { .. } => RejectionReason::AuthorMismatch,
            Self::StaleSnapshot { .. } => RejectionReason::StaleSnapshot,
            Self::PolicyDenied { .. } => RejectionReason::PolicyDenied,
            Self::Evaluation(EvaluationError::Resolution(err)) | Self::Resolution(err) => {
                match err {
                    ResolutionError::UnsupportedIdentifier { .. } => {
                        RejectionReason::UnsupportedIdentifier
                    }
                    _ => RejectionReason::ResolutionFailed,
                }
            }
            Self::Evaluation(_) => RejectionReason::EvaluationError,
            Self::Storage(_) => RejectionReason::StorageFailed,
            Self::NotFound { .. } => RejectionReason::NotFound,
            Self::Malformed { .. } => RejectionReason::Malformed,
            Self::PowerMismatch { .. } => RejectionReason::PowerMismatch,
            Self::OutsideVotingWindow { .. } => RejectionReason::OutsideVotingWindow,
            Self::InvalidChoice { .. } => RejectionReason::InvalidChoice,
        }
    }

    /// Whether this is a legitimate negative answer rather than a failure
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::PolicyDenied { .. })
    }
}

/// Enumerable rejection reasons, stable across releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Document network flag differs from the verifier's
    NetworkMismatch,
    /// Proof invalid or signer does not control the identity
    InvalidSignature,
    /// Signed by the wrong identity
    AuthorMismatch,
    /// Snapshot outside the freshness window
    StaleSnapshot,
    /// Permission evaluated to "no"
    PolicyDenied,
    /// Permission tree could not be evaluated
    EvaluationError,
    /// Identifier family not supported
    UnsupportedIdentifier,
    /// Identifier could not be resolved or a chain was unreachable
    ResolutionFailed,
    /// Storage backend failed
    StorageFailed,
    /// Referenced item does not exist
    NotFound,
    /// Structurally invalid document
    Malformed,
    /// Claimed voting power differs from computed
    PowerMismatch,
    /// Vote outside the voting phase
    OutsideVotingWindow,
    /// Choice does not fit the proposal
    InvalidChoice,
}

impl RejectionReason {
    /// Wire code
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetworkMismatch => "network_mismatch",
            Self::InvalidSignature => "invalid_signature",
            Self::AuthorMismatch => "author_mismatch",
            Self::StaleSnapshot => "stale_snapshot",
            Self::PolicyDenied => "policy_denied",
            Self::EvaluationError => "evaluation_error",
            Self::UnsupportedIdentifier => "unsupported_identifier",
            Self::ResolutionFailed => "resolution_failed",
            Self::StorageFailed => "storage_failed",
            Self::NotFound => "not_found",
            Self::Malformed => "malformed",
            Self::PowerMismatch => "power_mismatch",
            Self::OutsideVotingWindow => "outside_voting_window",
            Self::InvalidChoice => "invalid_choice",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type of the authorization engine
pub type Result<T> = std::result::Result<T, AuthorizationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_match_serde() {
        for reason in [
            RejectionReason::StaleSnapshot,
            RejectionReason::PolicyDenied,
            RejectionReason::OutsideVotingWindow,
        ] {
            let json = serde_json::to_value(reason).unwrap();
            assert_eq!(json, serde_json::Value::String(reason.as_str().to_string()));
        }
    }

    #[test]
    fn test_denial_is_distinct_from_evaluation_error() {
        let denied = AuthorizationError::PolicyDenied {
            action: Action::Propose,
            author: Did::parse("alice.bit").unwrap(),
        };
        let failed = AuthorizationError::from(EvaluationError::UnknownFunction {
            name: "nope".into(),
        });
        assert!(denied.is_denial());
        assert!(!failed.is_denial());
        assert_eq!(denied.reason(), RejectionReason::PolicyDenied);
        assert_eq!(failed.reason(), RejectionReason::EvaluationError);
    }

    #[test]
    fn test_leaf_resolution_failures_keep_their_reason() {
        let err = AuthorizationError::from(EvaluationError::from(ChainError::Timeout {
            coin_type: CoinType::ETH,
            timeout_ms: 10,
        }));
        assert_eq!(err.reason(), RejectionReason::ResolutionFailed);

        let err = AuthorizationError::from(ResolutionError::UnsupportedIdentifier {
            did: "alice.sol".into(),
        });
        assert_eq!(err.reason(), RejectionReason::UnsupportedIdentifier);
    }

    #[test]
    fn test_resolver_snapshot_gap_is_an_evaluation_error() {
        let err = EvaluationError::from(ResolutionError::MissingSnapshot {
            coin_type: CoinType::CKB,
        });
        assert_eq!(
            err,
            EvaluationError::MissingSnapshot {
                coin_type: CoinType::CKB
            }
        );
        assert!(err.is_consistency_error());
        assert_eq!(
            AuthorizationError::from(err).reason(),
            RejectionReason::EvaluationError
        );
    }
}

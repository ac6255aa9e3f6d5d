//! # Voty Core
//!
//! Shared vocabulary of the Voty governance platform: identifiers, chain
//! snapshots, signed documents, canonical signing messages, configuration, and
//! the effect traits through which the authorization engine reaches chains and
//! storage.

pub mod config;
pub mod crypto;
pub mod documents;
pub mod effects;
pub mod errors;
pub mod policy;
pub mod types;

pub use config::VerifierConfig;
pub use documents::{
    Authorized, Authorship, Choice, Community, Permission, Proof, Proposal, Proved,
    SignedCommunity, SignedProposal, SignedVote, Vote, VotingType, Workgroup,
};
pub use effects::{ChainEffects, ContentStorageEffects, DocumentIndexEffects, NameRecord};
pub use errors::{ChainError, Result, StorageError, VotyError};
pub use policy::{
    BooleanOperator, FunctionCall, PolicyGroup, PolicyNode, WeightGroup, WeightNode,
    WeightOperator,
};
pub use types::{
    Address, CoinType, DataType, Did, Network, Permalink, Snapshot, SnapshotSet, Timestamp,
};

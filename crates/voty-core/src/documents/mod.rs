//! Signed document schemas
//!
//! Every document travels as `Proved<Authorized<T>>`: the body, the authorship
//! record, and a proof over both.

pub mod authorship;
pub mod community;
pub mod proposal;
pub mod tags;
pub mod vote;

pub use authorship::{Authorized, Authorship, Proof, ProofScheme, Proved};
pub use community::{Community, Duration, Permission, Workgroup, MIN_PHASE_SECS};
pub use proposal::{Proposal, VotingType};
pub use tags::{storage_tags, StorageTags, Taggable};
pub use vote::{Choice, Vote};

/// Signed community
pub type SignedCommunity = Proved<Authorized<Community>>;
/// Signed proposal
pub type SignedProposal = Proved<Authorized<Proposal>>;
/// Signed vote
pub type SignedVote = Proved<Authorized<Vote>>;

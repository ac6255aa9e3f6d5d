#![deny(clippy::await_holding_lock)]
//! # Voty Authorization - Identity, Policy and Document Verification
//!
//! Resolves identifiers to addresses at historical chain heights, evaluates
//! community-authored policy and weight trees, and verifies signed
//! communities, proposals and votes.
//!
//! All external access goes through the effect traits of `voty-core`; the
//! [`Verifier`] is assembled from handlers at startup and shared read-only
//! across concurrent requests.

pub mod chains;
pub mod errors;
pub mod functions;
pub mod oracle;
pub mod policy;
pub mod resolver;
pub mod verifier;

pub use chains::ChainGateway;
pub use errors::{
    Action, AuthorizationError, EvaluationError, RejectionReason, ResolutionError, Result,
};
pub use functions::{
    BooleanFunction, EvaluationContext, FunctionRegistry, Predicate, Weight, WeightFunction,
};
pub use oracle::SnapshotOracle;
pub use policy::{CompiledPolicy, CompiledWeight, PolicyEvaluator};
pub use resolver::{BitResolver, DidResolver, EnsResolver, ResolvedIdentity, ResolverRegistry};
pub use verifier::{
    check_freshness, check_voting_window, VerifiedAuthor, VerifiedProposal, VerifiedVote,
    Verifier, VerifierBuilder,
};

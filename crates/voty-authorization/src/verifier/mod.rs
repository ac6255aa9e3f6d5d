//! Authorization verifier
//!
//! Each request runs through the same stages: network consistency, proof and
//! identity binding, snapshot freshness, then the action-specific checks
//! (policy, phase window, voting power). The first failing stage decides the
//! verdict.
//!
//! # Effect Classification
//!
//! - **Category**: Authorization service
//! - **Dependencies**: chain, storage and index effects passed at construction
//! - **Usage**: called once per inbound community, proposal or vote

mod authorship;
mod community;
mod proposal;
mod vote;

pub use authorship::VerifiedAuthor;
pub use proposal::VerifiedProposal;
pub use vote::{VerifiedVote, POWER_TOLERANCE};

use crate::chains::ChainGateway;
use crate::errors::{Action, AuthorizationError, EvaluationError, Result};
use crate::functions::FunctionRegistry;
use crate::oracle::SnapshotOracle;
use crate::policy::{CompiledPolicy, PolicyEvaluator};
use crate::resolver::{DidResolver, ResolverRegistry};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::sync::Arc;
use voty_core::documents::Duration;
use voty_core::{
    ChainEffects, CoinType, ContentStorageEffects, DataType, Did, DocumentIndexEffects, Permalink,
    PolicyNode, Snapshot, SnapshotSet, StorageError, Timestamp, VerifierConfig, VotyError,
};

/// Reject when `claimed` is outside the freshness window around `current`
///
/// The window is `[current - tolerance - 1, current + tolerance]`, both ends
/// inclusive: a claimed snapshot may trail by one block more than it may lead.
pub fn check_freshness(
    coin_type: CoinType,
    claimed: Snapshot,
    current: Snapshot,
    tolerance: u64,
) -> Result<()> {
    let allowed = if claimed <= current {
        tolerance.saturating_add(1)
    } else {
        tolerance
    };
    if claimed.distance(current) > allowed {
        return Err(AuthorizationError::StaleSnapshot {
            coin_type,
            claimed,
            current,
            tolerance,
        });
    }
    Ok(())
}

/// Require `vote_time` to fall inside `[start + announcement, start + announcement + voting)`
pub fn check_voting_window(
    proposal_time: Timestamp,
    duration: &Duration,
    vote_time: Timestamp,
) -> Result<()> {
    let voting_start = proposal_time.add_secs(duration.announcement);
    let voting_end = voting_start.add_secs(duration.voting);
    if vote_time < voting_start || vote_time >= voting_end {
        return Err(AuthorizationError::OutsideVotingWindow {
            vote_time,
            voting_start,
            voting_end,
        });
    }
    Ok(())
}

/// Verifies signed documents against chains, storage and community policy
#[derive(Clone)]
pub struct Verifier {
    config: VerifierConfig,
    oracle: SnapshotOracle,
    evaluator: PolicyEvaluator,
    storage: Arc<dyn ContentStorageEffects>,
    index: Arc<dyn DocumentIndexEffects>,
}

impl Verifier {
    /// Start building a verifier
    pub fn builder(config: VerifierConfig) -> VerifierBuilder {
        VerifierBuilder::new(config)
    }

    /// Active configuration
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Snapshot oracle
    pub fn oracle(&self) -> &SnapshotOracle {
        &self.oracle
    }

    /// Policy evaluator
    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    fn resolvers(&self) -> &ResolverRegistry {
        self.evaluator.resolvers()
    }

    /// Policy check for `author` under `policy`
    ///
    /// Missing chains are fetched at their current height; chains already in
    /// `snapshots` are kept. `false` becomes `PolicyDenied`.
    #[tracing::instrument(skip(self, policy, snapshots), fields(author = %author))]
    pub async fn verify_permission(
        &self,
        action: Action,
        policy: &PolicyNode,
        author: &Did,
        snapshots: &SnapshotSet,
    ) -> Result<SnapshotSet> {
        let policy = self
            .evaluator
            .compile_policy(policy)
            .map_err(|e| self.evaluation_failure(e))?;
        let snapshots = self
            .prefetch(snapshots, policy.required_coin_types(), author)
            .await?;
        self.require_permission(action, &policy, author, &snapshots).await?;
        Ok(snapshots)
    }

    /// Evaluate a bound policy; `false` becomes `PolicyDenied`
    async fn require_permission(
        &self,
        action: Action,
        policy: &CompiledPolicy,
        author: &Did,
        snapshots: &SnapshotSet,
    ) -> Result<()> {
        let allowed = self
            .evaluator
            .check(policy, author, snapshots)
            .await
            .map_err(|e| self.evaluation_failure(e))?;
        if !allowed {
            tracing::info!(%action, "permission denied");
            return Err(AuthorizationError::PolicyDenied {
                action,
                author: author.clone(),
            });
        }
        Ok(())
    }

    /// `snapshots` completed with current heights for `required` plus the
    /// chains needed to resolve `author`
    async fn prefetch(
        &self,
        snapshots: &SnapshotSet,
        mut required: BTreeSet<CoinType>,
        author: &Did,
    ) -> Result<SnapshotSet> {
        required.extend(self.resolvers().required_coin_types(author)?);
        let completed = self.oracle.complete(snapshots, &required).await?;
        tracing::debug!(
            required = required.len(),
            fetched = completed.len() - snapshots.len(),
            "snapshots prefetched"
        );
        Ok(completed)
    }

    fn evaluation_failure(&self, err: EvaluationError) -> AuthorizationError {
        if err.is_consistency_error() {
            tracing::error!(error = %err, "policy tree does not match the function registry");
        } else {
            tracing::warn!(error = %err, "policy evaluation could not complete");
        }
        AuthorizationError::Evaluation(err)
    }

    /// Load a previously anchored document, preferring the index over storage
    async fn load_document<T: DeserializeOwned>(
        &self,
        data_type: DataType,
        permalink: &Permalink,
    ) -> Result<T> {
        let bytes = match self.index.get_by_permalink(data_type, permalink).await? {
            Some(bytes) => bytes,
            None => match self.storage.get(permalink).await {
                Ok(bytes) => bytes,
                Err(StorageError::NotFound { .. }) => {
                    return Err(AuthorizationError::NotFound {
                        what: format!("{data_type} {permalink}"),
                    })
                }
                Err(err) => return Err(err.into()),
            },
        };
        serde_json::from_slice(&bytes).map_err(|e| AuthorizationError::Malformed {
            message: format!("stored {data_type} {permalink}: {e}"),
        })
    }
}

/// Builder for [`Verifier`]
pub struct VerifierBuilder {
    config: VerifierConfig,
    chains: Vec<Arc<dyn ChainEffects>>,
    resolvers: Vec<Arc<dyn DidResolver>>,
    functions: Option<FunctionRegistry>,
    storage: Option<Arc<dyn ContentStorageEffects>>,
    index: Option<Arc<dyn DocumentIndexEffects>>,
}

impl VerifierBuilder {
    /// Builder with built-in resolvers and functions
    pub fn new(config: VerifierConfig) -> Self {
        Self {
            config,
            chains: Vec::new(),
            resolvers: Vec::new(),
            functions: None,
            storage: None,
            index: None,
        }
    }

    /// Add a chain handler
    pub fn chain(mut self, handler: Arc<dyn ChainEffects>) -> Self {
        self.chains.push(handler);
        self
    }

    /// Add or replace an identifier resolver
    pub fn resolver(mut self, resolver: Arc<dyn DidResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    /// Use `functions` instead of the built-in registry
    pub fn functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = Some(functions);
        self
    }

    /// Content-addressed storage
    pub fn storage(mut self, storage: Arc<dyn ContentStorageEffects>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Index of verified documents
    pub fn index(mut self, index: Arc<dyn DocumentIndexEffects>) -> Self {
        self.index = Some(index);
        self
    }

    /// Validate the configuration and assemble the verifier
    pub fn build(self) -> std::result::Result<Verifier, VotyError> {
        self.config.validate()?;
        let storage = self
            .storage
            .ok_or_else(|| VotyError::config("verifier requires content storage"))?;
        let index = self
            .index
            .ok_or_else(|| VotyError::config("verifier requires a document index"))?;

        let mut chains = ChainGateway::new(self.config.chain_call_timeout());
        for handler in self.chains {
            chains.register(handler);
        }
        let mut resolvers = ResolverRegistry::with_builtins(chains.clone());
        for resolver in self.resolvers {
            resolvers.register(resolver);
        }
        let functions = self.functions.unwrap_or_else(FunctionRegistry::with_builtins);

        let oracle = SnapshotOracle::new(
            chains,
            Arc::clone(&storage),
            self.config.max_concurrent_chain_calls,
        );
        let evaluator = PolicyEvaluator::new(Arc::new(functions), Arc::new(resolvers));
        tracing::info!(
            network = ?self.config.network(),
            tolerance = self.config.snapshot_tolerance,
            fan_out = self.config.max_concurrent_chain_calls,
            "verifier ready"
        );

        Ok(Verifier {
            config: self.config,
            oracle,
            evaluator,
            storage,
            index,
        })
    }
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("config", &self.config)
            .field("oracle", &self.oracle)
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for VerifierBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifierBuilder")
            .field("config", &self.config)
            .field("chains", &self.chains.len())
            .field("resolvers", &self.resolvers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_boundary_is_inclusive() {
        let current = Snapshot::new(100);
        let check = |claimed| check_freshness(CoinType::ETH, Snapshot::new(claimed), current, 5);
        assert!(check(94).is_ok());
        assert!(check(100).is_ok());
        assert!(check(105).is_ok());
        assert!(matches!(check(93), Err(AuthorizationError::StaleSnapshot { .. })));
        assert!(matches!(check(106), Err(AuthorizationError::StaleSnapshot { .. })));
    }

    #[test]
    fn test_voting_window() {
        let duration = Duration {
            announcement: 3600,
            voting: 7200,
        };
        let start = Timestamp(1_000);
        assert!(check_voting_window(start, &duration, Timestamp(4_600)).is_ok());
        assert!(check_voting_window(start, &duration, Timestamp(11_799)).is_ok());
        assert!(check_voting_window(start, &duration, Timestamp(4_599)).is_err());
        assert!(check_voting_window(start, &duration, Timestamp(11_800)).is_err());
    }
}

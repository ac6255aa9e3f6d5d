//! Policy evaluator
//!
//! Binds community-authored trees against the function registry and
//! evaluates them for one identity at one snapshot set. Before any leaf runs,
//! the snapshot set must cover every chain the tree declares, plus the
//! identity's resolver chains when a leaf resolves it; a gap is an error,
//! never a "no".

use super::{CompiledPolicy, CompiledWeight};
use crate::errors::EvaluationError;
use crate::functions::{EvaluationContext, FunctionRegistry};
use crate::resolver::ResolverRegistry;
use std::collections::BTreeSet;
use std::sync::Arc;
use voty_core::{CoinType, Did, PolicyNode, SnapshotSet, WeightNode};

/// Evaluates boolean policies and weight trees
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    functions: Arc<FunctionRegistry>,
    resolvers: Arc<ResolverRegistry>,
}

impl PolicyEvaluator {
    /// Create an evaluator over the given registries
    pub fn new(functions: Arc<FunctionRegistry>, resolvers: Arc<ResolverRegistry>) -> Self {
        Self {
            functions,
            resolvers,
        }
    }

    /// Function registry in use
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Resolver registry in use
    pub fn resolvers(&self) -> &ResolverRegistry {
        &self.resolvers
    }

    /// Bind a boolean policy
    pub fn compile_policy(&self, node: &PolicyNode) -> Result<CompiledPolicy, EvaluationError> {
        CompiledPolicy::compile(node, &self.functions, &self.resolvers)
    }

    /// Bind a weight tree
    pub fn compile_weight(&self, node: &WeightNode) -> Result<CompiledWeight, EvaluationError> {
        CompiledWeight::compile(node, &self.functions, &self.resolvers)
    }

    /// Chains a policy reads, as the union over all of its leaves
    pub fn required_coin_types(
        &self,
        node: &PolicyNode,
    ) -> Result<BTreeSet<CoinType>, EvaluationError> {
        Ok(self.compile_policy(node)?.required_coin_types())
    }

    /// Chains a weight tree reads
    pub fn required_weight_coin_types(
        &self,
        node: &WeightNode,
    ) -> Result<BTreeSet<CoinType>, EvaluationError> {
        Ok(self.compile_weight(node)?.required_coin_types())
    }

    /// Chains evaluating `policy` for `did` reads, including the identifier's
    /// resolver chains when a leaf resolves the identity
    pub fn policy_reads(
        &self,
        policy: &CompiledPolicy,
        did: &Did,
    ) -> Result<BTreeSet<CoinType>, EvaluationError> {
        self.with_identity_chains(policy.required_coin_types(), policy.reads_identity(), did)
    }

    /// Chains evaluating `weight` for `did` reads
    pub fn weight_reads(
        &self,
        weight: &CompiledWeight,
        did: &Did,
    ) -> Result<BTreeSet<CoinType>, EvaluationError> {
        self.with_identity_chains(weight.required_coin_types(), weight.reads_identity(), did)
    }

    fn with_identity_chains(
        &self,
        mut required: BTreeSet<CoinType>,
        reads_identity: bool,
        did: &Did,
    ) -> Result<BTreeSet<CoinType>, EvaluationError> {
        if reads_identity {
            required.extend(self.resolvers.required_coin_types(did)?);
        }
        Ok(required)
    }

    /// Evaluate a bound policy for `did`
    #[tracing::instrument(skip(self, policy, snapshots), fields(did = %did))]
    pub async fn check(
        &self,
        policy: &CompiledPolicy,
        did: &Did,
        snapshots: &SnapshotSet,
    ) -> Result<bool, EvaluationError> {
        ensure_covered(&self.policy_reads(policy, did)?, snapshots)?;
        let ctx = EvaluationContext::new(did, snapshots, &self.resolvers);
        let allowed = policy.evaluate(&ctx).await?;
        tracing::debug!(allowed, "policy evaluated");
        Ok(allowed)
    }

    /// Evaluate a bound weight tree for `did`
    #[tracing::instrument(skip(self, weight, snapshots), fields(did = %did))]
    pub async fn weigh(
        &self,
        weight: &CompiledWeight,
        did: &Did,
        snapshots: &SnapshotSet,
    ) -> Result<f64, EvaluationError> {
        ensure_covered(&self.weight_reads(weight, did)?, snapshots)?;
        let ctx = EvaluationContext::new(did, snapshots, &self.resolvers);
        let power = weight.evaluate(&ctx).await?;
        tracing::debug!(power, "weight evaluated");
        Ok(power)
    }

    /// Bind and evaluate a policy in one step
    pub async fn evaluate_policy(
        &self,
        node: &PolicyNode,
        did: &Did,
        snapshots: &SnapshotSet,
    ) -> Result<bool, EvaluationError> {
        let policy = self.compile_policy(node)?;
        self.check(&policy, did, snapshots).await
    }

    /// Bind and evaluate a weight tree in one step
    pub async fn evaluate_weight(
        &self,
        node: &WeightNode,
        did: &Did,
        snapshots: &SnapshotSet,
    ) -> Result<f64, EvaluationError> {
        let weight = self.compile_weight(node)?;
        self.weigh(&weight, did, snapshots).await
    }
}

fn ensure_covered(
    required: &BTreeSet<CoinType>,
    snapshots: &SnapshotSet,
) -> Result<(), EvaluationError> {
    match snapshots.missing(required).into_iter().next() {
        Some(coin_type) => Err(EvaluationError::MissingSnapshot { coin_type }),
        None => Ok(()),
    }
}

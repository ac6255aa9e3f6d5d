//! Function registry
//!
//! Policy leaves name a function and carry JSON arguments. Binding validates
//! the arguments once and yields an executable leaf that knows which chains it
//! reads; execution only ever reads heights from the evaluation context.
//!
//! Boolean functions answer "may this identity act"; weight functions answer
//! "how much voting power does it have". Both are deterministic for a fixed
//! identity and snapshot set.

mod args;
mod exact_did;
mod prefixes;
mod token;

pub use exact_did::{ExactDid, ExactDidFixedPower};
pub use prefixes::{PrefixesDotSuffixExactMatch, PrefixesDotSuffixFixedPower};
pub use token::{Erc20Balance, Erc20BalanceAtLeast, OwnsErc721};

use crate::chains::ChainGateway;
use crate::errors::EvaluationError;
use crate::resolver::{ResolvedIdentity, ResolverRegistry};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use voty_core::{CoinType, Did, Snapshot, SnapshotSet};

/// Everything a leaf may read while executing
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Identity being evaluated
    pub did: &'a Did,
    /// Heights all chain reads are pinned to
    pub snapshots: &'a SnapshotSet,
    /// Resolvers for the identity's address
    pub resolvers: &'a ResolverRegistry,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context
    pub fn new(did: &'a Did, snapshots: &'a SnapshotSet, resolvers: &'a ResolverRegistry) -> Self {
        Self {
            did,
            snapshots,
            resolvers,
        }
    }

    /// Height of `coin_type`, which the leaf must have declared
    pub fn snapshot(&self, coin_type: CoinType) -> Result<Snapshot, EvaluationError> {
        self.snapshots
            .get(coin_type)
            .ok_or(EvaluationError::MissingSnapshot { coin_type })
    }

    /// Chain gateway
    pub fn chains(&self) -> &'a ChainGateway {
        self.resolvers.chains()
    }

    /// Address of the evaluated identity at the context's snapshots
    pub async fn identity(&self) -> Result<ResolvedIdentity, EvaluationError> {
        Ok(self.resolvers.resolve(self.did, self.snapshots).await?)
    }
}

/// Bound boolean leaf
#[async_trait]
pub trait Predicate: Send + Sync + fmt::Debug {
    /// Chains this leaf reads
    fn required_coin_types(&self) -> BTreeSet<CoinType>;

    /// Whether the leaf resolves the evaluated identity to an address
    fn reads_identity(&self) -> bool {
        false
    }

    /// Evaluate for the context's identity
    async fn execute(&self, ctx: &EvaluationContext<'_>) -> Result<bool, EvaluationError>;
}

/// Bound weight leaf
#[async_trait]
pub trait Weight: Send + Sync + fmt::Debug {
    /// Chains this leaf reads
    fn required_coin_types(&self) -> BTreeSet<CoinType>;

    /// Whether the leaf resolves the evaluated identity to an address
    fn reads_identity(&self) -> bool {
        false
    }

    /// Voting power of the context's identity; must be finite and non-negative
    async fn execute(&self, ctx: &EvaluationContext<'_>) -> Result<f64, EvaluationError>;
}

/// Named boolean function
pub trait BooleanFunction: Send + Sync {
    /// Name referenced by policy leaves
    fn name(&self) -> &'static str;

    /// Validate `arguments` and bind them into an executable leaf
    fn bind(
        &self,
        arguments: &[Value],
        resolvers: &ResolverRegistry,
    ) -> Result<Box<dyn Predicate>, EvaluationError>;
}

/// Named weight function
pub trait WeightFunction: Send + Sync {
    /// Name referenced by weight leaves
    fn name(&self) -> &'static str;

    /// Validate `arguments` and bind them into an executable leaf
    fn bind(
        &self,
        arguments: &[Value],
        resolvers: &ResolverRegistry,
    ) -> Result<Box<dyn Weight>, EvaluationError>;
}

/// Name-keyed boolean and weight functions
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    boolean: HashMap<&'static str, Arc<dyn BooleanFunction>>,
    weight: HashMap<&'static str, Arc<dyn WeightFunction>>,
}

impl FunctionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in function
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_boolean(Arc::new(ExactDid));
        registry.register_boolean(Arc::new(PrefixesDotSuffixExactMatch));
        registry.register_boolean(Arc::new(Erc20BalanceAtLeast));
        registry.register_boolean(Arc::new(OwnsErc721));
        registry.register_weight(Arc::new(ExactDidFixedPower));
        registry.register_weight(Arc::new(PrefixesDotSuffixFixedPower));
        registry.register_weight(Arc::new(Erc20Balance));
        registry
    }

    /// Register a boolean function, returning the one it replaces
    pub fn register_boolean(
        &mut self,
        function: Arc<dyn BooleanFunction>,
    ) -> Option<Arc<dyn BooleanFunction>> {
        self.boolean.insert(function.name(), function)
    }

    /// Register a weight function, returning the one it replaces
    pub fn register_weight(
        &mut self,
        function: Arc<dyn WeightFunction>,
    ) -> Option<Arc<dyn WeightFunction>> {
        self.weight.insert(function.name(), function)
    }

    /// Boolean function called `name`
    pub fn boolean(&self, name: &str) -> Result<&Arc<dyn BooleanFunction>, EvaluationError> {
        self.boolean
            .get(name)
            .ok_or_else(|| EvaluationError::UnknownFunction { name: name.into() })
    }

    /// Weight function called `name`
    pub fn weight(&self, name: &str) -> Result<&Arc<dyn WeightFunction>, EvaluationError> {
        self.weight
            .get(name)
            .ok_or_else(|| EvaluationError::UnknownFunction { name: name.into() })
    }

    /// Names of all boolean functions, sorted
    pub fn boolean_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.boolean.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Names of all weight functions, sorted
    pub fn weight_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.weight.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("boolean", &self.boolean_names())
            .field("weight", &self.weight_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(
            registry.boolean_names(),
            vec![
                "erc20_balance_at_least",
                "exact_did",
                "owns_erc721",
                "prefixes_dot_suffix_exact_match",
            ]
        );
        assert_eq!(
            registry.weight_names(),
            vec![
                "erc20_balance",
                "exact_did_fixed_power",
                "prefixes_dot_suffix_fixed_power",
            ]
        );
    }

    #[test]
    fn test_unknown_function() {
        let registry = FunctionRegistry::with_builtins();
        assert!(matches!(
            registry.boolean("exact_did_fixed_power"),
            Err(EvaluationError::UnknownFunction { .. })
        ));
        assert!(matches!(
            registry.weight("nope"),
            Err(EvaluationError::UnknownFunction { .. })
        ));
    }
}

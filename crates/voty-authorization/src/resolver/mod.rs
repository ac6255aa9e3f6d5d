//! Identifier resolution
//!
//! Each resolver owns one identifier family (selected by the trailing label)
//! and declares the chains whose heights it needs. Resolution at a fixed
//! snapshot set is deterministic: it never consults a chain's current state.

mod bit;
mod eth;

pub use bit::BitResolver;
pub use eth::EnsResolver;

use crate::chains::ChainGateway;
use crate::errors::ResolutionError;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use voty_core::{Address, CoinType, Did, NameRecord, SnapshotSet};

/// Address an identifier resolved to, tagged with the chain it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Chain of the bound address
    pub coin_type: CoinType,
    /// Bound address
    pub address: Address,
}

/// Resolver of one identifier family
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Trailing label served by this resolver (`bit`, `eth`)
    fn suffix(&self) -> &'static str;

    /// Chains whose snapshots resolution reads
    fn required_coin_types(&self) -> BTreeSet<CoinType>;

    /// Resolve `did` using only heights from `snapshots`
    ///
    /// Callers guarantee every required chain is present in `snapshots`.
    async fn resolve(
        &self,
        did: &Did,
        snapshots: &SnapshotSet,
        chains: &ChainGateway,
    ) -> Result<ResolvedIdentity, ResolutionError>;
}

/// Turn a raw name record into a bound address
pub(crate) fn bound_address(
    did: &Did,
    coin_type: CoinType,
    record: Option<&NameRecord>,
) -> Result<Address, ResolutionError> {
    let raw = match record {
        Some(record) if !record.address.is_empty() => &record.address,
        _ => {
            return Err(ResolutionError::NotRegistered {
                did: did.clone(),
                coin_type,
            })
        }
    };
    Address::parse(raw).map_err(|_| ResolutionError::MalformedAddress {
        did: did.clone(),
        address: raw.clone(),
    })
}

/// Suffix-keyed set of resolvers sharing one chain gateway
#[derive(Clone)]
pub struct ResolverRegistry {
    resolvers: Vec<Arc<dyn DidResolver>>,
    chains: ChainGateway,
}

impl ResolverRegistry {
    /// Create a registry without resolvers
    pub fn new(chains: ChainGateway) -> Self {
        Self {
            resolvers: Vec::new(),
            chains,
        }
    }

    /// Registry serving `.bit` and `.eth`
    pub fn with_builtins(chains: ChainGateway) -> Self {
        let mut registry = Self::new(chains);
        registry.register(Arc::new(BitResolver));
        registry.register(Arc::new(EnsResolver));
        registry
    }

    /// Register a resolver, replacing any resolver for the same suffix
    pub fn register(&mut self, resolver: Arc<dyn DidResolver>) {
        self.resolvers.retain(|r| r.suffix() != resolver.suffix());
        self.resolvers.push(resolver);
    }

    /// Chain gateway used for lookups
    pub fn chains(&self) -> &ChainGateway {
        &self.chains
    }

    /// Resolver for the family `suffix`
    pub fn family(&self, suffix: &str) -> Option<&Arc<dyn DidResolver>> {
        self.resolvers.iter().find(|r| r.suffix() == suffix)
    }

    /// Resolver responsible for `did`
    pub fn resolver_for(&self, did: &Did) -> Result<&Arc<dyn DidResolver>, ResolutionError> {
        self.family(did.suffix())
            .ok_or_else(|| ResolutionError::UnsupportedIdentifier {
                did: did.to_string(),
            })
    }

    /// Chains needed to resolve `did`
    pub fn required_coin_types(&self, did: &Did) -> Result<BTreeSet<CoinType>, ResolutionError> {
        Ok(self.resolver_for(did)?.required_coin_types())
    }

    /// Resolve `did` at the heights in `snapshots`
    #[tracing::instrument(skip(self, snapshots), fields(did = %did))]
    pub async fn resolve(
        &self,
        did: &Did,
        snapshots: &SnapshotSet,
    ) -> Result<ResolvedIdentity, ResolutionError> {
        let resolver = self.resolver_for(did)?;
        if let Some(coin_type) = snapshots
            .missing(&resolver.required_coin_types())
            .into_iter()
            .next()
        {
            return Err(ResolutionError::MissingSnapshot { coin_type });
        }

        let identity = resolver.resolve(did, snapshots, &self.chains).await?;
        tracing::debug!(
            address = %identity.address,
            coin_type = %identity.coin_type,
            "identifier resolved"
        );
        Ok(identity)
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffixes: Vec<_> = self.resolvers.iter().map(|r| r.suffix()).collect();
        f.debug_struct("ResolverRegistry")
            .field("suffixes", &suffixes)
            .field("chains", &self.chains)
            .finish()
    }
}

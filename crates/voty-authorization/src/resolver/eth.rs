//! ENS name resolution on Ethereum

use super::{bound_address, DidResolver, ResolvedIdentity};
use crate::chains::ChainGateway;
use crate::errors::ResolutionError;
use async_trait::async_trait;
use std::collections::BTreeSet;
use voty_core::{CoinType, Did, SnapshotSet};

/// Resolver for `.eth` names
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsResolver;

#[async_trait]
impl DidResolver for EnsResolver {
    fn suffix(&self) -> &'static str {
        "eth"
    }

    fn required_coin_types(&self) -> BTreeSet<CoinType> {
        BTreeSet::from([CoinType::ETH])
    }

    async fn resolve(
        &self,
        did: &Did,
        snapshots: &SnapshotSet,
        chains: &ChainGateway,
    ) -> Result<ResolvedIdentity, ResolutionError> {
        let snapshot = snapshots
            .get(CoinType::ETH)
            .ok_or(ResolutionError::MissingSnapshot {
                coin_type: CoinType::ETH,
            })?;
        let record = chains
            .resolve_name(CoinType::ETH, did.as_str(), snapshot)
            .await?;
        let address = bound_address(did, CoinType::ETH, record.as_ref())?;
        Ok(ResolvedIdentity {
            coin_type: CoinType::ETH,
            address,
        })
    }
}

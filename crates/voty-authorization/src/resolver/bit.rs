//! `.bit` account resolution
//!
//! Accounts live on CKB. The account record carries the owner's chain and
//! address; owners without a recorded chain are EVM keys.

use super::{bound_address, DidResolver, ResolvedIdentity};
use crate::chains::ChainGateway;
use crate::errors::ResolutionError;
use async_trait::async_trait;
use std::collections::BTreeSet;
use voty_core::{CoinType, Did, SnapshotSet};

/// Resolver for `.bit` accounts
#[derive(Debug, Clone, Copy, Default)]
pub struct BitResolver;

#[async_trait]
impl DidResolver for BitResolver {
    fn suffix(&self) -> &'static str {
        "bit"
    }

    fn required_coin_types(&self) -> BTreeSet<CoinType> {
        BTreeSet::from([CoinType::CKB])
    }

    async fn resolve(
        &self,
        did: &Did,
        snapshots: &SnapshotSet,
        chains: &ChainGateway,
    ) -> Result<ResolvedIdentity, ResolutionError> {
        let snapshot = snapshots
            .get(CoinType::CKB)
            .ok_or(ResolutionError::MissingSnapshot {
                coin_type: CoinType::CKB,
            })?;
        let record = chains
            .resolve_name(CoinType::CKB, did.as_str(), snapshot)
            .await?;
        let address = bound_address(did, CoinType::CKB, record.as_ref())?;
        let coin_type = record
            .and_then(|r| r.coin_type)
            .unwrap_or(CoinType::ETH);
        Ok(ResolvedIdentity { coin_type, address })
    }
}

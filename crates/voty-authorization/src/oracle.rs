//! Snapshot oracle
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect consumer
//! - **Dependencies**: `ChainGateway`, `ContentStorageEffects`
//! - **Usage**: freshness checks, phase windows, filling missing snapshots
//!
//! Current heights are always read live. Multi-chain fan-out is bounded per
//! request, and the first failure cancels the outstanding calls.

use crate::chains::ChainGateway;
use futures::future::try_join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use voty_core::{
    ChainError, CoinType, ContentStorageEffects, Permalink, Snapshot, SnapshotSet, StorageError,
    Timestamp,
};

/// Source of current heights, block times and anchoring heights
#[derive(Clone)]
pub struct SnapshotOracle {
    chains: ChainGateway,
    storage: Arc<dyn ContentStorageEffects>,
    max_concurrency: usize,
}

impl SnapshotOracle {
    /// Create an oracle; `max_concurrency` is clamped to at least one
    pub fn new(
        chains: ChainGateway,
        storage: Arc<dyn ContentStorageEffects>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            chains,
            storage,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Current height of `coin_type`
    pub async fn current_snapshot(&self, coin_type: CoinType) -> Result<Snapshot, ChainError> {
        self.chains.current_height(coin_type).await
    }

    /// Block time at `snapshot` on `coin_type`
    pub async fn snapshot_timestamp(
        &self,
        coin_type: CoinType,
        snapshot: Snapshot,
    ) -> Result<Timestamp, ChainError> {
        self.chains.height_timestamp(coin_type, snapshot).await
    }

    /// Storage-chain height at which `permalink` was anchored
    pub async fn snapshot_of_stored_document(
        &self,
        permalink: &Permalink,
    ) -> Result<Option<Snapshot>, StorageError> {
        self.storage.anchored_height(permalink).await
    }

    /// Current heights of all `coin_types`, at most `max_concurrency` in flight
    pub async fn current_snapshots(
        &self,
        coin_types: &BTreeSet<CoinType>,
    ) -> Result<SnapshotSet, ChainError> {
        if coin_types.is_empty() {
            return Ok(SnapshotSet::new());
        }
        tracing::debug!(
            chains = coin_types.len(),
            limit = self.max_concurrency,
            "fetching current snapshots"
        );

        let limiter = Semaphore::new(self.max_concurrency);
        let limiter = &limiter;
        let fetches = coin_types.iter().map(|&coin_type| async move {
            let _permit = limiter
                .acquire()
                .await
                .map_err(|_| ChainError::unreachable(coin_type, "fan-out limiter closed"))?;
            let snapshot = self.current_snapshot(coin_type).await?;
            Ok::<_, ChainError>((coin_type, snapshot))
        });

        Ok(try_join_all(fetches).await?.into_iter().collect())
    }

    /// `snapshots` extended with current heights for every chain of `required`
    /// it lacks; existing entries are kept
    pub async fn complete(
        &self,
        snapshots: &SnapshotSet,
        required: &BTreeSet<CoinType>,
    ) -> Result<SnapshotSet, ChainError> {
        let missing = snapshots.missing(required);
        let mut completed = snapshots.clone();
        if !missing.is_empty() {
            completed.fill_from(&self.current_snapshots(&missing).await?);
        }
        Ok(completed)
    }
}

impl std::fmt::Debug for SnapshotOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotOracle")
            .field("chains", &self.chains)
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}

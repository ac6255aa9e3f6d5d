//! Chain RPC effects
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: provided by the embedding service (JSON-RPC clients)
//! - **Usage**: identifier resolution, snapshot oracle, asset-ownership functions
//!
//! One handler serves one chain. All calls are read-only; handlers should not
//! cache current heights since freshness checks rely on live answers.

use crate::errors::ChainError;
use crate::types::{Address, CoinType, Snapshot, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Raw answer of a reverse name lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    /// Bound address as returned by the chain; may be empty
    pub address: String,
    /// Chain the address belongs to, when the name system records one
    pub coin_type: Option<CoinType>,
}

/// Read-only capability of a single chain
#[async_trait]
pub trait ChainEffects: Send + Sync {
    /// Chain served by this handler
    fn coin_type(&self) -> CoinType;

    /// Current height
    async fn current_height(&self) -> Result<Snapshot, ChainError>;

    /// Wall-clock time of the block at `snapshot`
    async fn height_timestamp(&self, snapshot: Snapshot) -> Result<Timestamp, ChainError>;

    /// Resolve `name` to its bound address as of `snapshot`
    async fn resolve_name(
        &self,
        name: &str,
        snapshot: Snapshot,
    ) -> Result<Option<NameRecord>, ChainError>;

    /// Balance of `owner` in token `contract` as of `snapshot`
    ///
    /// For non-fungible contracts this is the number of tokens held.
    async fn token_balance(
        &self,
        contract: &str,
        owner: &Address,
        snapshot: Snapshot,
    ) -> Result<u128, ChainError>;
}

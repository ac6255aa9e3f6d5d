//! Storage effects
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: provided by the embedding service
//! - **Usage**: loading anchored communities and proposals during verification
//!
//! Content-addressed storage is write-once: `put` returns a new permalink and
//! `get` never observes a changed document. The document index is the
//! relational copy kept by the service and is only used as a key lookup.

use crate::documents::StorageTags;
use crate::errors::StorageError;
use crate::types::{DataType, Permalink, Snapshot};
use async_trait::async_trait;

/// Write-once, content-addressed document storage
#[async_trait]
pub trait ContentStorageEffects: Send + Sync {
    /// Fetch the bytes anchored under `permalink`
    async fn get(&self, permalink: &Permalink) -> Result<Vec<u8>, StorageError>;

    /// Append `data` with `tags`, returning its permanent reference
    async fn put(&self, data: Vec<u8>, tags: &StorageTags) -> Result<Permalink, StorageError>;

    /// Storage-chain height at which `permalink` became available
    ///
    /// `None` while the write is still pending.
    async fn anchored_height(
        &self,
        permalink: &Permalink,
    ) -> Result<Option<Snapshot>, StorageError>;
}

/// Lookup of previously verified documents by permalink
#[async_trait]
pub trait DocumentIndexEffects: Send + Sync {
    /// Stored bytes of a verified document, if the index has it
    async fn get_by_permalink(
        &self,
        data_type: DataType,
        permalink: &Permalink,
    ) -> Result<Option<Vec<u8>>, StorageError>;
}

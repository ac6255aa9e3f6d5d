//! In-memory content storage and document index

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use voty_core::crypto::hex_digest;
use voty_core::documents::{storage_tags, StorageTags, Taggable};
use voty_core::{
    Authorized, ContentStorageEffects, DataType, DocumentIndexEffects, Permalink, Proved,
    Snapshot, StorageError,
};

#[derive(Debug)]
struct StoredItem {
    data: Vec<u8>,
    tags: StorageTags,
    anchored_at: Option<Snapshot>,
}

/// Write-once storage keyed by content digest
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<Permalink, StoredItem>>,
    unavailable: Mutex<Option<String>>,
}

impl MemoryStorage {
    /// Empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` and mark it anchored at `height`
    pub fn insert_anchored(&self, data: Vec<u8>, tags: StorageTags, height: u64) -> Permalink {
        let permalink = permalink_of(&data);
        self.items.lock().insert(
            permalink.clone(),
            StoredItem {
                data,
                tags,
                anchored_at: Some(Snapshot::new(height)),
            },
        );
        permalink
    }

    /// Serialize a signed document, tag it, and anchor it at `height`
    pub fn publish<T>(&self, document: &Proved<Authorized<T>>, height: u64) -> Permalink
    where
        T: Serialize + Taggable,
    {
        let data = serde_json::to_vec(document).expect("signed document serializes");
        self.insert_anchored(data, storage_tags(document.body()), height)
    }

    /// Mark a pending write anchored at `height`
    pub fn anchor(&self, permalink: &Permalink, height: u64) {
        if let Some(item) = self.items.lock().get_mut(permalink) {
            item.anchored_at = Some(Snapshot::new(height));
        }
    }

    /// Tags recorded for `permalink`
    pub fn tags(&self, permalink: &Permalink) -> Option<StorageTags> {
        self.items.lock().get(permalink).map(|item| item.tags.clone())
    }

    /// Make every call fail with `message`
    pub fn set_unavailable(&self, message: Option<&str>) {
        *self.unavailable.lock() = message.map(str::to_string);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        match self.unavailable.lock().as_deref() {
            Some(message) => Err(StorageError::unavailable(message)),
            None => Ok(()),
        }
    }
}

fn permalink_of(data: &[u8]) -> Permalink {
    let digest = hex_digest(data);
    Permalink::from_id(digest.trim_start_matches("0x")).expect("hex digest is a valid permalink id")
}

#[async_trait]
impl ContentStorageEffects for MemoryStorage {
    async fn get(&self, permalink: &Permalink) -> Result<Vec<u8>, StorageError> {
        self.check_available()?;
        self.items
            .lock()
            .get(permalink)
            .map(|item| item.data.clone())
            .ok_or_else(|| StorageError::not_found(permalink.as_str()))
    }

    async fn put(&self, data: Vec<u8>, tags: &StorageTags) -> Result<Permalink, StorageError> {
        self.check_available()?;
        let permalink = permalink_of(&data);
        self.items
            .lock()
            .entry(permalink.clone())
            .or_insert_with(|| StoredItem {
                data,
                tags: tags.clone(),
                anchored_at: None,
            });
        Ok(permalink)
    }

    async fn anchored_height(
        &self,
        permalink: &Permalink,
    ) -> Result<Option<Snapshot>, StorageError> {
        self.check_available()?;
        self.items
            .lock()
            .get(permalink)
            .map(|item| item.anchored_at)
            .ok_or_else(|| StorageError::not_found(permalink.as_str()))
    }
}

/// Index of verified documents
#[derive(Debug, Default)]
pub struct MemoryIndex {
    documents: Mutex<HashMap<(DataType, Permalink), Vec<u8>>>,
    lookups: Mutex<usize>,
}

impl MemoryIndex {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a verified document
    pub fn insert<T: Serialize>(&self, data_type: DataType, permalink: &Permalink, document: &T) {
        let data = serde_json::to_vec(document).expect("document serializes");
        self.documents
            .lock()
            .insert((data_type, permalink.clone()), data);
    }

    /// Number of lookups served
    pub fn lookups(&self) -> usize {
        *self.lookups.lock()
    }
}

#[async_trait]
impl DocumentIndexEffects for MemoryIndex {
    async fn get_by_permalink(
        &self,
        data_type: DataType,
        permalink: &Permalink,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        *self.lookups.lock() += 1;
        Ok(self
            .documents
            .lock()
            .get(&(data_type, permalink.clone()))
            .cloned())
    }
}

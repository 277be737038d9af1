use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;

use super::{upload_key, wildcard_match, BlobStore, KvItem, RecordStore, StoredBlob, UploadFile};

/// In-process record store. Keys are listed in sorted order.
#[derive(Default)]
pub struct MemoryRecordStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| anyhow!("record store lock poisoned"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn list(&self, pattern: &str, include_values: bool) -> Result<Vec<KvItem>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        Ok(entries
            .iter()
            .filter(|(key, _)| wildcard_match(pattern, key))
            .map(|(key, value)| KvItem {
                key: key.clone(),
                value: include_values.then(|| value.clone()),
            })
            .collect())
    }
}

/// In-process blob store.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, files: Vec<UploadFile>) -> Result<Option<StoredBlob>> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| anyhow!("blob store lock poisoned"))?;
        let mut first = None;
        for file in files {
            let path = upload_key(&file.name);
            blobs.insert(path.clone(), file.bytes);
            first.get_or_insert(StoredBlob { path });
        }
        Ok(first)
    }

    async fn read(&self, path: &str) -> Result<Option<Bytes>> {
        Ok(self
            .blobs
            .read()
            .map_err(|_| anyhow!("blob store lock poisoned"))?
            .get(path)
            .cloned())
    }
}

//! Record and blob storage collaborators.
//!
//! The pipeline and the dashboard only see the two traits below. Backends:
//! Redis or PostgreSQL for records, S3/MinIO for blobs, and an in-process
//! backend for both (`memory`) used in development and tests.

pub mod memory;
pub mod postgres;
pub mod redis_store;
pub mod s3;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

/// A key and, when requested, its serialized value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KvItem {
    pub key: String,
    pub value: Option<String>,
}

/// Durable key → serialized record mapping.
///
/// Patterns use `*` as a wildcard; a pattern without `*` matches one key.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn list(&self, pattern: &str, include_values: bool) -> Result<Vec<KvItem>>;
}

/// A file handed to the blob store.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Where an uploaded file landed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredBlob {
    pub path: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores every file and returns the location of the first one.
    /// `Ok(None)` means the store accepted the call but stored nothing.
    async fn upload(&self, files: Vec<UploadFile>) -> Result<Option<StoredBlob>>;

    /// `Ok(None)` when nothing is stored at `path`.
    async fn read(&self, path: &str) -> Result<Option<Bytes>>;
}

/// Matches `key` against a `*`-wildcard pattern.
pub fn wildcard_match(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return key.is_empty();
    };
    let Some(mut rest) = key.strip_prefix(first) else {
        return false;
    };
    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        // no wildcard at all
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

/// Storage key for an uploaded file: `uploads/<uuid>/<name>`.
pub(crate) fn upload_key(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    format!("uploads/{}/{}", uuid::Uuid::new_v4(), safe)
}

//! Reading and writing `ResumeRecord`s through the record store.

pub mod handlers;

use anyhow::{Context, Result};
use tracing::warn;
use uuid::Uuid;

use crate::models::resume::{record_key, ResumeRecord, RECORD_LIST_PATTERN};
use crate::stores::{KvItem, RecordStore};

pub async fn save_record(store: &dyn RecordStore, record: &ResumeRecord) -> Result<()> {
    let value = serde_json::to_string(record).context("Failed to serialize resume record")?;
    store.set(&record.key(), &value).await
}

/// Every stored resume, pending ones included. Values that are not records
/// at all are logged and skipped.
pub async fn load_records(store: &dyn RecordStore) -> Result<Vec<ResumeRecord>> {
    let items = store.list(RECORD_LIST_PATTERN, true).await?;
    Ok(items.into_iter().filter_map(parse_item).collect())
}

pub async fn load_record(store: &dyn RecordStore, id: Uuid) -> Result<Option<ResumeRecord>> {
    let items = store.list(&record_key(id), true).await?;
    Ok(items.into_iter().find_map(parse_item))
}

fn parse_item(item: KvItem) -> Option<ResumeRecord> {
    let value = item.value?;
    match serde_json::from_str(&value) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Skipping unreadable record {}: {e}", item.key);
            None
        }
    }
}

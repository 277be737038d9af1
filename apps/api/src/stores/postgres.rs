use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::{KvItem, RecordStore};

/// Record store backed by the `kv_records` table (see `db::ensure_schema`).
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_records (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, pattern: &str, include_values: bool) -> Result<Vec<KvItem>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"SELECT key, value FROM kv_records WHERE key LIKE $1 ESCAPE '\' ORDER BY key"#,
        )
        .bind(to_like_pattern(pattern))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(key, value)| KvItem {
                key,
                value: include_values.then_some(value),
            })
            .collect())
    }
}

/// Translates a `*`-wildcard pattern into a SQL LIKE pattern.
fn to_like_pattern(pattern: &str) -> String {
    let mut like = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '*' => like.push('%'),
            '%' | '_' | '\\' => {
                like.push('\\');
                like.push(c);
            }
            _ => like.push(c),
        }
    }
    like
}

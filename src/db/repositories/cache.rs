use crate::entities::{cache_entries, prelude::*};
use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, warn};

/// Minimum seconds between sweeps of expired rows.
pub const PURGE_INTERVAL_SECS: i64 = 300;

fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

pub struct CacheRepository {
    conn: DatabaseConnection,
    /// Unix seconds of the last sweep, shared by every repository of one store.
    last_purge: Arc<AtomicI64>,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, last_purge: Arc<AtomicI64>) -> Self {
        Self { conn, last_purge }
    }

    /// Deletes expired rows unless another caller swept within the interval.
    async fn purge_expired_if_due(&self, now: chrono::DateTime<chrono::Utc>) {
        let now_secs = now.timestamp();
        let last = self.last_purge.load(Ordering::Relaxed);
        if now_secs - last < PURGE_INTERVAL_SECS
            || self
                .last_purge
                .compare_exchange(last, now_secs, Ordering::AcqRel, Ordering::Relaxed)
                .is_err()
        {
            return;
        }

        match CacheEntries::delete_many()
            .filter(cache_entries::Column::ExpiresAt.lte(timestamp(now)))
            .exec(&self.conn)
            .await
        {
            Ok(result) if result.rows_affected > 0 => {
                debug!(rows = result.rows_affected, "Purged expired cache entries");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to purge expired cache entries"),
        }
    }

    /// Returns the raw JSON stored under `key` if it has not expired.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let now_at = chrono::Utc::now();
        self.purge_expired_if_due(now_at).await;
        let now = timestamp(now_at);

        let entry = CacheEntries::find()
            .filter(cache_entries::Column::Key.eq(key))
            .filter(cache_entries::Column::ExpiresAt.gt(now.as_str()))
            .one(&self.conn)
            .await
            .context("Failed to read cache entry")?;

        Ok(entry.map(|e| e.value_json))
    }

    /// Stores `value_json` under `key`, replacing any previous value and resetting the expiry.
    pub async fn set(&self, key: &str, value_json: &str, ttl: chrono::Duration) -> Result<()> {
        let expires_at = timestamp(chrono::Utc::now() + ttl);

        let active_model = cache_entries::ActiveModel {
            key: Set(key.to_string()),
            value_json: Set(value_json.to_string()),
            expires_at: Set(expires_at),
            ..Default::default()
        };

        CacheEntries::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(cache_entries::Column::Key)
                    .update_columns([
                        cache_entries::Column::ValueJson,
                        cache_entries::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to write cache entry")?;

        Ok(())
    }

    /// Expiry of a live entry, used to verify TTL refreshes.
    #[cfg(test)]
    pub async fn expires_at(&self, key: &str) -> Result<Option<String>> {
        let entry = CacheEntries::find()
            .filter(cache_entries::Column::Key.eq(key))
            .one(&self.conn)
            .await?;

        Ok(entry.map(|e| e.expires_at))
    }
}

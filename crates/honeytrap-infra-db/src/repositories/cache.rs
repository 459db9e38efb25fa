// [crates/honeytrap-infra-db/src/repositories/cache.rs]
/*!
 * APARATO: L2 ENRICHMENT CACHE REPOSITORY
 * RESPONSABILIDAD: CAPA INTERMEDIA DE CACHÉ RESPALDADA POR DISCO
 *
 * Backs the middle tier of the three-tier cache: cheaper than an L3 disk read
 * under contention, durable across process restarts unlike L1. `put` always
 * overwrites — staleness is the caller's problem (`EnrichmentCacheEntry::is_fresh_at`).
 */

use crate::errors::DbError;
use crate::StoreClient;
use chrono::{DateTime, Utc};
use honeytrap_core_models::EnrichmentCacheEntry;
use libsql::params;

const UPSERT: &str = r#"
    INSERT INTO enrichment_cache (service, key, value, expires_at, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?5)
    ON CONFLICT(service, key) DO UPDATE SET
        value = excluded.value,
        expires_at = excluded.expires_at,
        updated_at = excluded.updated_at
"#;

const SELECT: &str = r#"
    SELECT service, key, value, expires_at, created_at, updated_at
    FROM enrichment_cache WHERE service = ?1 AND key = ?2
"#;

const DELETE_EXPIRED: &str = "DELETE FROM enrichment_cache WHERE expires_at < ?1";

pub struct CacheRepository {
    client: StoreClient,
}

impl CacheRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    pub async fn put(&self, entry: &EnrichmentCacheEntry) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                UPSERT,
                params![
                    entry.service.clone(),
                    entry.key.clone(),
                    entry.value.to_string(),
                    entry.expires_at.to_rfc3339(),
                    entry.created_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get(&self, service: &str, key: &str) -> Result<Option<EnrichmentCacheEntry>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection.query(SELECT, params![service.to_string(), key.to_string()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Housekeeping sweep; the background refresh loop in `honeytrap-cache`
    /// calls this so the table doesn't grow unbounded with dead rows.
    pub async fn evict_expired(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        let connection = self.client.get_connection()?;
        let affected = connection.execute(DELETE_EXPIRED, params![now.to_rfc3339()]).await?;
        Ok(affected)
    }
}

fn map_row(row: &libsql::Row) -> Result<EnrichmentCacheEntry, DbError> {
    let value_json: String = row.get(2)?;
    Ok(EnrichmentCacheEntry {
        service: row.get(0)?,
        key: row.get(1)?,
        value: serde_json::from_str(&value_json).unwrap_or(serde_json::Value::Null),
        expires_at: parse_rfc3339(&row.get::<String>(3)?)?,
        created_at: parse_rfc3339(&row.get::<String>(4)?)?,
        updated_at: parse_rfc3339(&row.get::<String>(5)?)?,
    })
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::MappingError(e.to_string()))
}

// [crates/honeytrap-cache/src/l3.rs]
/*!
 * APARATO: CAPA L3 — CACHÉ DE DISCO FRAGMENTADO
 * RESPONSABILIDAD: NIVEL MÁS FRÍO, MÁS DURADERO
 *
 * One JSON file per key under a two-level hex-sharded directory tree. Reads
 * and writes go through `tokio::fs` so a slow filesystem never blocks the
 * enrichment cascade's executor thread.
 */

use crate::errors::CacheError;
use chrono::{DateTime, Utc};
use honeytrap_infra_transport::{shard_path, CacheEnvelope};
use serde_json::Value;
use std::path::PathBuf;
use tracing::warn;

pub struct L3Cache {
    cache_root: PathBuf,
}

impl L3Cache {
    pub fn new(cache_root: PathBuf) -> Self {
        Self { cache_root }
    }

    pub async fn get(&self, service: &str, key: &str, now: DateTime<Utc>) -> Result<Option<Value>, CacheError> {
        let path = shard_path(&self.cache_root, service, key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(CacheError::L3IoFault(error)),
        };

        match CacheEnvelope::from_json_bytes(&bytes) {
            Ok(envelope) if envelope.is_fresh_at(now) => Ok(Some(envelope.value)),
            Ok(_) => Ok(None),
            Err(error) => {
                warn!(%error, path = %path.display(), "discarding unreadable L3 cache file");
                Ok(None)
            }
        }
    }

    pub async fn put(&self, service: &str, key: &str, value: Value, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Result<(), CacheError> {
        let path = shard_path(&self.cache_root, service, key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let envelope = CacheEnvelope {
            service: service.to_string(),
            key: key.to_string(),
            value,
            created_at,
            expires_at,
        };
        let bytes = envelope.to_json_bytes()?;

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_then_reads_back_within_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = L3Cache::new(dir.path().to_path_buf());
        let now = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);

        cache.put("bulk_asn", "203.0.113.5", serde_json::json!({"asn": 64500}), now, now + chrono::Duration::days(90)).await.unwrap();

        let hit = cache.get("bulk_asn", "203.0.113.5", now + chrono::Duration::days(1)).await.unwrap();
        assert_eq!(hit, Some(serde_json::json!({"asn": 64500})));

        let expired = cache.get("bulk_asn", "203.0.113.5", now + chrono::Duration::days(91)).await.unwrap();
        assert_eq!(expired, None);
    }

    #[tokio::test]
    async fn missing_file_is_a_plain_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = L3Cache::new(dir.path().to_path_buf());
        let now = Utc::now();
        assert_eq!(cache.get("offline", "198.51.100.9", now).await.unwrap(), None);
    }
}

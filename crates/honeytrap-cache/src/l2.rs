// [crates/honeytrap-cache/src/l2.rs]
/*!
 * APARATO: CAPA L2 — CACHÉ DE FILA EN BASE DE DATOS
 * RESPONSABILIDAD: PUENTE HACIA EL REPOSITORIO DURABLE MEDIO
 */

use crate::errors::CacheError;
use chrono::{DateTime, Utc};
use honeytrap_core_models::EnrichmentCacheEntry;
use honeytrap_infra_db::repositories::CacheRepository;
use serde_json::Value;

pub struct L2Cache {
    repository: CacheRepository,
}

impl L2Cache {
    pub fn new(repository: CacheRepository) -> Self {
        Self { repository }
    }

    pub async fn get(&self, service: &str, key: &str, now: DateTime<Utc>) -> Result<Option<Value>, CacheError> {
        let Some(entry) = self.repository.get(service, key).await? else {
            return Ok(None);
        };
        if entry.is_fresh_at(now) {
            Ok(Some(entry.value))
        } else {
            Ok(None)
        }
    }

    pub async fn put(&self, service: &str, key: &str, value: Value, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Result<(), CacheError> {
        let entry = EnrichmentCacheEntry {
            service: service.to_string(),
            key: key.to_string(),
            value,
            expires_at,
            created_at,
            updated_at: created_at,
        };
        self.repository.put(&entry).await?;
        Ok(())
    }
}

// [crates/honeytrap-cache/src/tiered_cache.rs]
/*!
 * =================================================================
 * APARATO: CACHÉ DE TRES NIVELES
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: ORQUESTACIÓN GET/PUT CON DEGRADACIÓN GRACIOSA
 *
 * Read path: L1 -> L2 -> L3, backfilling every higher tier on a lower-tier
 * hit using each tier's own clamp. Any tier can be absent (`None`) and the
 * cache keeps working on what's left; an all-miss (or all-absent) result is
 * just `Ok(None)` — "not cached" is not an error.
 * =================================================================
 */

use crate::errors::CacheError;
use crate::l1::L1Cache;
use crate::l2::L2Cache;
use crate::l3::L3Cache;
use crate::ttl_policy::{clamp, ttls_for_service};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::{instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHitTier {
    L1,
    L2,
    L3,
}

pub struct TieredCache {
    l1: Option<L1Cache>,
    l2: Option<L2Cache>,
    l3: Option<L3Cache>,
}

impl TieredCache {
    pub fn new(l1: Option<L1Cache>, l2: Option<L2Cache>, l3: Option<L3Cache>) -> Self {
        Self { l1, l2, l3 }
    }

    #[instrument(skip(self), fields(service = %service, key = %key))]
    pub async fn get(&self, service: &str, key: &str, now: DateTime<Utc>) -> Result<Option<(Value, CacheHitTier)>, CacheError> {
        if let Some(l1) = &self.l1 {
            if let Some(value) = l1.get(service, key, now) {
                return Ok(Some((value, CacheHitTier::L1)));
            }
        }

        if let Some(l2) = &self.l2 {
            match l2.get(service, key, now).await {
                Ok(Some(value)) => {
                    self.backfill_l1(service, key, &value, now);
                    return Ok(Some((value, CacheHitTier::L2)));
                }
                Ok(None) => {}
                Err(error) => warn!(%error, "L2 cache tier unavailable, degrading to L3"),
            }
        }

        if let Some(l3) = &self.l3 {
            match l3.get(service, key, now).await {
                Ok(Some(value)) => {
                    self.backfill_l1(service, key, &value, now);
                    self.backfill_l2(service, key, &value, now).await;
                    return Ok(Some((value, CacheHitTier::L3)));
                }
                Ok(None) => {}
                Err(error) => warn!(%error, "L3 cache tier unavailable"),
            }
        }

        Ok(None)
    }

    /// Writes through to every present tier, each clamping `ttl_hint` to its
    /// own service-specific ceiling. A failing upper tier doesn't block the
    /// write to lower tiers.
    #[instrument(skip(self, value), fields(service = %service, key = %key))]
    pub async fn put(&self, service: &str, key: &str, value: Value, ttl_hint: Duration, now: DateTime<Utc>) -> Result<(), CacheError> {
        let ttls = ttls_for_service(service);

        if let Some(l1) = &self.l1 {
            l1.put(service, key, value.clone(), now + clamp(ttl_hint, ttls.l1));
        }

        if let Some(l2) = &self.l2 {
            if let Err(error) = l2.put(service, key, value.clone(), now, now + clamp(ttl_hint, ttls.l2)).await {
                warn!(%error, "L2 cache write-through failed");
            }
        }

        if let Some(l3) = &self.l3 {
            if let Err(error) = l3.put(service, key, value, now, now + clamp(ttl_hint, ttls.l3)).await {
                warn!(%error, "L3 cache write-through failed");
            }
        }

        Ok(())
    }

    fn backfill_l1(&self, service: &str, key: &str, value: &Value, now: DateTime<Utc>) {
        let ttls = ttls_for_service(service);
        if let Some(l1) = &self.l1 {
            l1.put(service, key, value.clone(), now + ttls.l1);
        }
    }

    async fn backfill_l2(&self, service: &str, key: &str, value: &Value, now: DateTime<Utc>) {
        let ttls = ttls_for_service(service);
        if let Some(l2) = &self.l2 {
            if let Err(error) = l2.put(service, key, value.clone(), now, now + ttls.l2).await {
                warn!(%error, "L2 backfill after L3 hit failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn l3_only_still_serves_when_l1_and_l2_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        let l3 = L3Cache::new(dir.path().to_path_buf());
        let now = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        l3.put("offline", "203.0.113.9", serde_json::json!({"country": "US"}), now, now + Duration::days(30))
            .await
            .unwrap();

        let cache = TieredCache::new(None, None, Some(l3));
        let hit = cache.get("offline", "203.0.113.9", now).await.unwrap();
        assert_eq!(hit, Some((serde_json::json!({"country": "US"}), CacheHitTier::L3)));
    }

    #[tokio::test]
    async fn l1_hit_never_touches_lower_tiers() {
        let l1 = L1Cache::new();
        let now = Utc::now();
        l1.put("offline", "198.51.100.2", serde_json::json!({"country": "DE"}), now + Duration::hours(1));

        let cache = TieredCache::new(Some(l1), None, None);
        let hit = cache.get("offline", "198.51.100.2", now).await.unwrap();
        assert_eq!(hit, Some((serde_json::json!({"country": "DE"}), CacheHitTier::L1)));
    }

    #[tokio::test]
    async fn all_tiers_absent_or_missing_is_a_clean_miss() {
        let cache = TieredCache::new(None, None, None);
        assert_eq!(cache.get("offline", "203.0.113.1", Utc::now()).await.unwrap(), None);
    }
}

// [crates/honeytrap-cache/src/l1.rs]
/*!
 * APARATO: CAPA L1 — CACHÉ EN MEMORIA DE PROCESO
 * RESPONSABILIDAD: LECTURA MÁS RÁPIDA, VIDA MÁS CORTA
 *
 * A `parking_lot::RwLock<HashMap<...>>` with a manual expiry check on read;
 * there is no background sweep thread — entries are reaped lazily the next
 * time they're looked up, same trade-off the teacher's in-memory DB anchor
 * makes for `StoreClient`.
 */

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

struct Entry {
    value: Value,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct L1Cache {
    entries: RwLock<HashMap<(String, String), Entry>>,
}

impl L1Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, service: &str, key: &str, now: DateTime<Utc>) -> Option<Value> {
        let guard = self.entries.read();
        let entry = guard.get(&(service.to_string(), key.to_string()))?;
        if entry.expires_at > now {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn put(&self, service: &str, key: &str, value: Value, expires_at: DateTime<Utc>) {
        self.entries
            .write()
            .insert((service.to_string(), key.to_string()), Entry { value, expires_at });
    }

    /// Drops every expired entry; callers may run this periodically so the
    /// map doesn't grow unbounded between reads of stale keys.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut guard = self.entries.write();
        let before = guard.len();
        guard.retain(|_, entry| entry.expires_at > now);
        before - guard.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_within_ttl_then_expired_after() {
        let cache = L1Cache::new();
        let t0 = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        cache.put("offline", "203.0.113.5", serde_json::json!({"country": "US"}), t0 + chrono::Duration::hours(1));

        assert!(cache.get("offline", "203.0.113.5", t0 + chrono::Duration::minutes(30)).is_some());
        assert!(cache.get("offline", "203.0.113.5", t0 + chrono::Duration::hours(2)).is_none());
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let cache = L1Cache::new();
        let t0 = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        cache.put("offline", "a", serde_json::Value::Null, t0 - chrono::Duration::seconds(1));
        cache.put("offline", "b", serde_json::Value::Null, t0 + chrono::Duration::hours(1));

        let reaped = cache.sweep_expired(t0);
        assert_eq!(reaped, 1);
        assert!(cache.get("offline", "b", t0).is_some());
    }
}

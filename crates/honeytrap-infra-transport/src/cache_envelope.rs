// [crates/honeytrap-infra-transport/src/cache_envelope.rs]
/*!
 * APARATO: SOBRE DE CACHÉ L3 (DISCO)
 * RESPONSABILIDAD: FORMATO DE ARCHIVO PARA EL NIVEL MÁS FRÍO DE LA JERARQUÍA
 *
 * One file per key at `cache_root/<service>/<hex2>/<hex2>/<key>.json`, the
 * two-level hex shard keeping any one directory from accumulating millions
 * of entries. The envelope round-trips through `serde_json` unmodified;
 * `honeytrap-cache` owns the sharding path math and write-through policy,
 * this crate only owns the on-wire shape.
 */

use crate::errors::TransportError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEnvelope {
    pub service: String,
    pub key: String,
    pub value: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEnvelope {
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, TransportError> {
        serde_json::to_vec_pretty(self).map_err(|e| TransportError::EnvelopeMalformed(e.to_string()))
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, TransportError> {
        serde_json::from_slice(bytes).map_err(|e| TransportError::EnvelopeMalformed(e.to_string()))
    }
}

/// Two-level hex shard for a cache key: `sha-independent`, just the key's own
/// bytes — good enough distribution for a directory-fanout problem, not a
/// security boundary.
pub fn shard_path(cache_root: &std::path::Path, service: &str, key: &str) -> std::path::PathBuf {
    let digest = format!("{:x}", simple_fnv1a(key.as_bytes()));
    let first = &digest[0..2.min(digest.len())];
    let second = if digest.len() >= 4 { &digest[2..4] } else { "00" };
    cache_root.join(service).join(first).join(second).join(format!("{key}.json"))
}

fn simple_fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    bytes.iter().fold(OFFSET, |hash, byte| (hash ^ *byte as u64).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_path_is_deterministic_and_nested_two_levels_deep() {
        let root = std::path::Path::new("/tmp/cache_root");
        let a = shard_path(root, "classifier", "203.0.113.5");
        let b = shard_path(root, "classifier", "203.0.113.5");
        assert_eq!(a, b);
        assert_eq!(a.components().count(), root.components().count() + 4);
    }

    #[test]
    fn envelope_round_trips_through_json() {
        let now = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let envelope = CacheEnvelope {
            service: "bulk_asn".to_string(),
            key: "203.0.113.5".to_string(),
            value: serde_json::json!({"asn": 64500}),
            created_at: now,
            expires_at: now + chrono::Duration::days(90),
        };
        let bytes = envelope.to_json_bytes().unwrap();
        let restored = CacheEnvelope::from_json_bytes(&bytes).unwrap();
        assert_eq!(envelope, restored);
    }
}

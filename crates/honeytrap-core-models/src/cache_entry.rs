// [crates/honeytrap-core-models/src/cache_entry.rs]
/*!
 * APARATO: L2 ROW CACHE MODEL
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentCacheEntry {
    pub service: String,
    pub key: String,
    pub value: Value,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EnrichmentCacheEntry {
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

// [crates/honeytrap-core-models/src/reference_set.rs]
/*!
 * APARATO: CLASSIFICATION REFERENCE SET METADATA
 * RESPONSABILIDAD: METADATOS DE REFRESCO PARA LOS MATCHERS DEL CLASIFICADOR
 *
 * The content itself (TOR set, CIDR tree, AS-name patterns) is held by the
 * classifier crate's own typed structures; this is the fetch/freshness
 * envelope shared across all of them.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationReferenceSet {
    pub name: String,
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
    pub ttl_seconds: i64,
}

impl ClassificationReferenceSet {
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        (now - self.fetched_at).num_seconds() > self.ttl_seconds
    }
}

// [crates/honeytrap-enrichment/src/provenance.rs]
/*!
 * APARATO: PROVENANCE DE LA CASCADA (`_meta`)
 * RESPONSABILIDAD: REGISTRO DE QUÉ FUENTES SE INTENTARON Y CON QUÉ RESULTADO
 *
 * `sources_attempted` is always a superset of the union of succeeded/failed/
 * skipped — every source the cascade touches gets pushed here first, before
 * its outcome is known.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Provenance {
    pub sources_attempted: Vec<String>,
    pub sources_succeeded: Vec<String>,
    pub sources_failed: Vec<String>,
    pub sources_skipped: Vec<String>,
    pub skip_reasons: HashMap<String, String>,
    pub failure_reasons: HashMap<String, String>,
    pub cache_hits: HashMap<String, String>,
    pub total_duration_ms: u64,
    pub enrichment_timestamp: Option<DateTime<Utc>>,
}

impl Provenance {
    pub fn attempt(&mut self, source: &str) {
        self.sources_attempted.push(source.to_string());
    }

    pub fn succeed(&mut self, source: &str) {
        self.sources_succeeded.push(source.to_string());
    }

    pub fn fail(&mut self, source: &str, reason: impl Into<String>) {
        self.sources_failed.push(source.to_string());
        self.failure_reasons.insert(source.to_string(), reason.into());
    }

    pub fn skip(&mut self, source: &str, reason: impl Into<String>) {
        self.sources_skipped.push(source.to_string());
        self.skip_reasons.insert(source.to_string(), reason.into());
    }

    pub fn cache_hit(&mut self, source: &str, tier: &str) {
        self.cache_hits.insert(source.to_string(), tier.to_string());
    }

    /// `sources_attempted` superset invariant (P7), checkable from tests
    /// without reaching into private fields.
    pub fn attempted_is_superset(&self) -> bool {
        let attempted: std::collections::HashSet<_> = self.sources_attempted.iter().collect();
        self.sources_succeeded.iter().all(|s| attempted.contains(s))
            && self.sources_failed.iter().all(|s| attempted.contains(s))
            && self.sources_skipped.iter().all(|s| attempted.contains(s))
    }
}

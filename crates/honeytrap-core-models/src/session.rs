// [crates/honeytrap-core-models/src/session.rs]
/*!
 * APARATO: SESSION SUMMARY MODEL
 * RESPONSABILIDAD: REGISTRO DURABLE POR SESIÓN (HOT PATH DE ANALÍTICA)
 *
 * Snapshot columns (`snapshot_asn`, `snapshot_country`, `snapshot_ip_type`,
 * `enrichment_at`) and `source_ip` are write-once: once non-null, a later
 * upsert must not overwrite them. The repository layer enforces this with
 * `COALESCE(existing, incoming)`; this struct just carries the values.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub session_id: String,
    pub sensor: String,
    pub event_count: u64,
    pub command_count: u64,
    pub file_downloads: u64,
    pub login_attempts: u64,
    pub first_event_at: DateTime<Utc>,
    pub last_event_at: DateTime<Utc>,
    pub highest_risk: f64,
    pub vt_flagged: bool,
    pub dshield_flagged: bool,
    pub ssh_key_injections: u64,
    /// Mutable session-scope enrichment snapshot, refreshed on re-aggregation.
    pub enrichment: Value,
    /// Nullable FK: null until the canonical IP exists in `IPInventory`.
    pub source_ip: Option<String>,
    pub snapshot_asn: Option<u32>,
    pub snapshot_country: Option<String>,
    pub snapshot_ip_type: Option<String>,
    pub enrichment_at: Option<DateTime<Utc>>,
}

impl SessionSummary {
    pub fn has_any_snapshot(&self) -> bool {
        self.snapshot_asn.is_some()
            || self.snapshot_country.is_some()
            || self.snapshot_ip_type.is_some()
            || self.enrichment_at.is_some()
    }
}

// [crates/honeytrap-core-models/src/aggregate.rs]
/*!
 * APARATO: SESSION AGGREGATE (IN-MEMORY ROLLING FOLD STATE)
 * RESPONSABILIDAD: ACUMULACIÓN POR SESIÓN DENTRO DE UN LOTE DE INGESTA
 *
 * Lives only for the lifetime of one ingest batch; never persisted directly.
 * `canonical_source_ip` is set once, on the first event carrying a usable
 * `src_ip`/`peer_ip`, and never changed afterward — even if later events in
 * the same session carry a different address.
 */

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct SessionAggregate {
    pub session_id: String,
    pub sensor: String,
    pub event_count: u64,
    pub command_count: u64,
    pub file_downloads: u64,
    pub login_attempts: u64,
    pub first_event_at: DateTime<Utc>,
    pub last_event_at: DateTime<Utc>,
    pub highest_risk: f64,
    pub source_ips: BTreeSet<String>,
    pub canonical_source_ip: Option<String>,
    pub vt_flagged: bool,
    pub dshield_flagged: bool,
    pub enrichment_payload: Value,
    pub ssh_key_injections: u64,
    pub unique_ssh_keys: BTreeSet<String>,
    pub source_files: BTreeSet<String>,
}

impl SessionAggregate {
    pub fn new(session_id: impl Into<String>, sensor: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            sensor: sensor.into(),
            event_count: 0,
            command_count: 0,
            file_downloads: 0,
            login_attempts: 0,
            first_event_at: at,
            last_event_at: at,
            highest_risk: 0.0,
            source_ips: BTreeSet::new(),
            canonical_source_ip: None,
            vt_flagged: false,
            dshield_flagged: false,
            enrichment_payload: Value::Null,
            ssh_key_injections: 0,
            unique_ssh_keys: BTreeSet::new(),
            source_files: BTreeSet::new(),
        }
    }

    /// Records a possibly-present source IP, pinning `canonical_source_ip`
    /// the first time one is observed. Chronological order of calls is what
    /// establishes "first" — the aggregator must call this in stream order.
    pub fn observe_source_ip(&mut self, ip: Option<&str>) {
        let Some(ip) = ip else { return };
        if ip.is_empty() {
            return;
        }
        self.source_ips.insert(ip.to_string());
        if self.canonical_source_ip.is_none() {
            self.canonical_source_ip = Some(ip.to_string());
        }
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at < self.first_event_at {
            self.first_event_at = at;
        }
        if at > self.last_event_at {
            self.last_event_at = at;
        }
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.last_event_at - self.first_event_at).num_seconds().max(0)
    }
}

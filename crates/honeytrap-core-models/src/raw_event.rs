// [crates/honeytrap-core-models/src/raw_event.rs]
/*!
 * APARATO: RAW EVENT MODEL
 * RESPONSABILIDAD: REPRESENTACIÓN DE UN EVENTO HONEYPOT INDIVIDUAL
 *
 * Invariant: `(source_path, source_offset)` is unique within a sensor.
 * A quarantined event carries `payload = None` here; its text survives
 * only in the paired `DeadLetterEvent` row.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One honeypot event as it lands in the append-mostly event store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawEvent {
    /// Per-run identifier shared by every event a single `load()` call inserts.
    pub ingest_id: String,
    /// Path (or stable sensor identifier) the event was read from.
    pub source_path: String,
    /// Byte offset of the start of this event's line in the uncompressed stream.
    pub source_offset: u64,
    pub session_id: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    /// `None` when `quarantined` is true; the payload then lives only in the DLQ.
    pub payload: Option<Value>,
    pub quarantined: bool,
    pub risk_score: f64,
}

impl RawEvent {
    pub fn valid(
        ingest_id: impl Into<String>,
        source_path: impl Into<String>,
        source_offset: u64,
        session_id: impl Into<String>,
        event_type: impl Into<String>,
        timestamp: DateTime<Utc>,
        payload: Value,
        risk_score: f64,
    ) -> Self {
        Self {
            ingest_id: ingest_id.into(),
            source_path: source_path.into(),
            source_offset,
            session_id: session_id.into(),
            event_type: event_type.into(),
            timestamp,
            payload: Some(payload),
            quarantined: false,
            risk_score,
        }
    }

    pub fn quarantined(
        ingest_id: impl Into<String>,
        source_path: impl Into<String>,
        source_offset: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            ingest_id: ingest_id.into(),
            source_path: source_path.into(),
            source_offset,
            session_id: String::new(),
            event_type: "quarantined".to_string(),
            timestamp,
            payload: None,
            quarantined: true,
            risk_score: 0.0,
        }
    }
}

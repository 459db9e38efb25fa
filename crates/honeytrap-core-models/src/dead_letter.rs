// [crates/honeytrap-core-models/src/dead_letter.rs]
/*!
 * APARATO: DEAD LETTER MODEL
 * RESPONSABILIDAD: CATALOGACIÓN DE EVENTOS RECHAZADOS POR EL VALIDADOR
 *
 * `idempotency_key` is the authoritative uniqueness key (a hash of
 * `source_path, source_offset, reason`); `payload_checksum` is advisory
 * integrity metadata only, never used to deduplicate.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeadLetterReason {
    SchemaViolation,
    EncodingError,
    SizeLimit,
    JsonError,
    Other,
}

impl DeadLetterReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SchemaViolation => "schema_violation",
            Self::EncodingError => "encoding_error",
            Self::SizeLimit => "size_limit",
            Self::JsonError => "json_error",
            Self::Other => "other",
        }
    }
}

/// One entry in the append-only `error_history` list on a dead-letter row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub error_class: String,
    pub message: String,
}

/// A failed-ingest record: the event that the validator quarantined.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeadLetterEvent {
    pub id: String,
    pub ingest_id: String,
    pub source_path: String,
    pub source_offset: u64,
    pub reason: DeadLetterReason,
    /// Opaque raw bytes/string of the offending line, kept for forensics.
    pub raw_payload: String,
    pub retry_count: u32,
    pub error_history: Vec<ErrorHistoryEntry>,
    pub resolved: bool,
    /// 1 = highest priority for the out-of-band DLQ processor.
    pub priority: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processing_lock: Option<String>,
    pub lock_expires_at: Option<DateTime<Utc>>,
    pub idempotency_key: String,
    pub payload_checksum: String,
}

impl DeadLetterEvent {
    /// True when a lock token is present and has not yet expired.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.processing_lock, self.lock_expires_at) {
            (Some(_), Some(expires)) => expires > now,
            _ => false,
        }
    }
}

// [crates/honeytrap-ingest/src/validator.rs]
/*!
 * APARATO: VALIDADOR DE EVENTOS
 * RESPONSABILIDAD: ACEPTAR O PONER EN CUARENTENA CADA LÍNEA CRUDA
 *
 * Three required top-level fields regardless of `eventid`: `eventid`,
 * `session`, `timestamp`. Everything else is lenient. A line over the
 * configured byte ceiling never even reaches the JSON parser.
 */

use chrono::{DateTime, Utc};
use honeytrap_core_models::dead_letter::{DeadLetterReason, ErrorHistoryEntry};
use honeytrap_core_models::{DeadLetterEvent, RawEvent};
use serde_json::Value;
use sha2::{Digest, Sha256};

pub const DEFAULT_MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

pub struct EventValidator {
    max_line_bytes: usize,
}

pub enum ValidationOutcome {
    Valid(RawEvent),
    Invalid(DeadLetterEvent),
}

impl EventValidator {
    pub fn new(max_line_bytes: usize) -> Self {
        Self { max_line_bytes }
    }

    pub fn validate(
        &self,
        ingest_id: &str,
        source_path: &str,
        source_offset: u64,
        raw_line: &str,
        now: DateTime<Utc>,
    ) -> ValidationOutcome {
        if raw_line.len() > self.max_line_bytes {
            return ValidationOutcome::Invalid(self.quarantine(
                ingest_id,
                source_path,
                source_offset,
                DeadLetterReason::SizeLimit,
                raw_line,
                "line exceeds the configured maximum byte length",
                now,
            ));
        }

        let sanitized = sanitize_nul_bytes(raw_line);

        let parsed: Value = match serde_json::from_str(&sanitized) {
            Ok(v) => v,
            Err(e) => {
                return ValidationOutcome::Invalid(self.quarantine(
                    ingest_id,
                    source_path,
                    source_offset,
                    DeadLetterReason::JsonError,
                    raw_line,
                    &e.to_string(),
                    now,
                ));
            }
        };

        let Some(object) = parsed.as_object() else {
            return ValidationOutcome::Invalid(self.quarantine(
                ingest_id,
                source_path,
                source_offset,
                DeadLetterReason::SchemaViolation,
                raw_line,
                "top-level JSON value is not an object",
                now,
            ));
        };

        let event_type = object.get("eventid").and_then(Value::as_str);
        let session_id = object.get("session").and_then(Value::as_str);
        let timestamp_str = object.get("timestamp").and_then(Value::as_str);

        let (Some(event_type), Some(session_id), Some(timestamp_str)) = (event_type, session_id, timestamp_str) else {
            return ValidationOutcome::Invalid(self.quarantine(
                ingest_id,
                source_path,
                source_offset,
                DeadLetterReason::SchemaViolation,
                raw_line,
                "missing one of the required fields: eventid, session, timestamp",
                now,
            ));
        };

        let timestamp = match DateTime::parse_from_rfc3339(timestamp_str) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(e) => {
                return ValidationOutcome::Invalid(self.quarantine(
                    ingest_id,
                    source_path,
                    source_offset,
                    DeadLetterReason::SchemaViolation,
                    raw_line,
                    &format!("timestamp is not RFC 3339: {e}"),
                    now,
                ));
            }
        };

        let risk_score = object.get("risk_score").and_then(Value::as_f64).unwrap_or(0.0);

        ValidationOutcome::Valid(RawEvent::valid(
            ingest_id,
            source_path,
            source_offset,
            session_id,
            event_type,
            timestamp,
            parsed,
            risk_score,
        ))
    }

    /// Quarantines an offset the reader couldn't even produce a line for —
    /// an I/O failure on that one line, not a content problem. No payload
    /// survives since the reader never handed us any bytes.
    pub fn quarantine_read_error(
        &self,
        ingest_id: &str,
        source_path: &str,
        source_offset: u64,
        message: &str,
        now: DateTime<Utc>,
    ) -> DeadLetterEvent {
        self.quarantine(ingest_id, source_path, source_offset, DeadLetterReason::Other, "", message, now)
    }

    fn quarantine(
        &self,
        ingest_id: &str,
        source_path: &str,
        source_offset: u64,
        reason: DeadLetterReason,
        raw_line: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> DeadLetterEvent {
        let idempotency_key = hash_idempotency_key(source_path, source_offset, reason);
        let payload_checksum = hash_payload(raw_line);

        DeadLetterEvent {
            id: idempotency_key.clone(),
            ingest_id: ingest_id.to_string(),
            source_path: source_path.to_string(),
            source_offset,
            reason,
            raw_payload: sanitize_nul_bytes(raw_line),
            retry_count: 0,
            error_history: vec![ErrorHistoryEntry {
                timestamp: now,
                error_class: reason.as_str().to_string(),
                message: message.to_string(),
            }],
            resolved: false,
            priority: 1,
            created_at: now,
            updated_at: now,
            processing_lock: None,
            lock_expires_at: None,
            idempotency_key,
            payload_checksum,
        }
    }
}

/// Replaces the literal NUL byte with the printable escape token — downstream
/// text stores and tools choke on a raw 0x00 inside a string column.
fn sanitize_nul_bytes(input: &str) -> String {
    if !input.contains('\0') {
        return input.to_string();
    }
    input.replace('\0', "\\x00")
}

fn hash_idempotency_key(source_path: &str, source_offset: u64, reason: DeadLetterReason) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_path.as_bytes());
    hasher.update(source_offset.to_be_bytes());
    hasher.update(reason.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

fn hash_payload(raw_line: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_line.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn accepts_a_well_formed_line() {
        let validator = EventValidator::new(DEFAULT_MAX_LINE_BYTES);
        let line = r#"{"eventid":"cowrie.login.success","session":"s1","timestamp":"2026-01-01T00:00:00Z"}"#;
        match validator.validate("ing-1", "sensor-a.log", 0, line, now()) {
            ValidationOutcome::Valid(event) => {
                assert_eq!(event.session_id, "s1");
                assert_eq!(event.event_type, "cowrie.login.success");
            }
            ValidationOutcome::Invalid(_) => panic!("expected a valid event"),
        }
    }

    #[test]
    fn quarantines_a_missing_required_field() {
        let validator = EventValidator::new(DEFAULT_MAX_LINE_BYTES);
        let line = r#"{"eventid":"cowrie.login.success","timestamp":"2026-01-01T00:00:00Z"}"#;
        match validator.validate("ing-1", "sensor-a.log", 0, line, now()) {
            ValidationOutcome::Invalid(dlq) => assert_eq!(dlq.reason, DeadLetterReason::SchemaViolation),
            ValidationOutcome::Valid(_) => panic!("expected quarantine"),
        }
    }

    #[test]
    fn quarantines_malformed_json() {
        let validator = EventValidator::new(DEFAULT_MAX_LINE_BYTES);
        let line = r#"{"eventid": not-json}"#;
        match validator.validate("ing-1", "sensor-a.log", 0, line, now()) {
            ValidationOutcome::Invalid(dlq) => assert_eq!(dlq.reason, DeadLetterReason::JsonError),
            ValidationOutcome::Valid(_) => panic!("expected quarantine"),
        }
    }

    #[test]
    fn quarantines_an_oversized_line_with_size_limit_reason() {
        let validator = EventValidator::new(16);
        let line = r#"{"eventid":"cowrie.login.success","session":"s1","timestamp":"2026-01-01T00:00:00Z"}"#;
        match validator.validate("ing-1", "sensor-a.log", 0, line, now()) {
            ValidationOutcome::Invalid(dlq) => assert_eq!(dlq.reason, DeadLetterReason::SizeLimit),
            ValidationOutcome::Valid(_) => panic!("expected quarantine"),
        }
    }

    #[test]
    fn sanitizes_embedded_nul_bytes() {
        assert_eq!(sanitize_nul_bytes("a\0b"), "a\\x00b");
        assert_eq!(sanitize_nul_bytes("clean"), "clean");
    }
}

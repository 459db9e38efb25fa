// [crates/honeytrap-ingest/src/loader.rs]
/*!
 * =================================================================
 * APARATO: CARGADOR BULK/DELTA (C1)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: ORQUESTAR A->B->C->D SOBRE UNA LISTA DE FUENTES
 *
 * Streams each source through the reader, validator and aggregator,
 * committing a batch every `batch_size` valid-or-quarantined events or
 * every `batch_timeout`, whichever comes first. A batch containing only
 * dead-letter rows still advances the cursor, so progress is never lost
 * behind a run of unparseable lines.
 * =================================================================
 */

use crate::aggregator::SessionAggregator;
use crate::errors::IngestError;
use crate::reader::SourceReader;
use crate::validator::{EventValidator, ValidationOutcome};
use chrono::Utc;
use honeytrap_core_models::{IngestCursor, RawEvent, SessionSummary};
use honeytrap_infra_db::unit_of_work::PendingBatch;
use honeytrap_infra_db::UnitOfWork;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration as StdDuration, Instant};
use tracing::{info, instrument, warn};

#[derive(Debug, Default, Clone)]
pub struct LoadResult {
    pub events_inserted: u64,
    pub events_quarantined: u64,
    pub sessions_touched: u64,
    pub batches_committed: u64,
    pub last_cursor: Option<IngestCursor>,
}

/// Per-source resume point, keyed by source path.
#[derive(Debug, Clone)]
pub struct ResumePoint {
    pub inode: String,
    pub last_offset: u64,
    pub batch_index: u64,
}

pub struct BulkDeltaLoader {
    unit_of_work: UnitOfWork,
    validator: EventValidator,
    batch_size: usize,
    batch_timeout: StdDuration,
}

impl BulkDeltaLoader {
    pub fn new(unit_of_work: UnitOfWork, max_line_bytes: usize, batch_size: usize, batch_timeout: StdDuration) -> Self {
        Self { unit_of_work, validator: EventValidator::new(max_line_bytes), batch_size, batch_timeout }
    }

    #[instrument(skip(self, sources, resume_points), fields(ingest_id = %ingest_id, source_count = sources.len()))]
    pub async fn load(
        &self,
        sources: &[PathBuf],
        ingest_id: &str,
        mut resume_points: HashMap<String, ResumePoint>,
    ) -> Result<LoadResult, IngestError> {
        let mut result = LoadResult::default();

        for source in sources {
            let source_key = source.to_string_lossy().to_string();
            let resume = resume_points.remove(&source_key);

            let resume_offset = match &resume {
                // A changed inode means the file was rotated; start fresh.
                Some(point) => {
                    let current_inode = inode_of(source)?;
                    if current_inode == point.inode {
                        point.last_offset
                    } else {
                        warn!(source = %source_key, "inode changed since last checkpoint, restarting from offset 0");
                        0
                    }
                }
                None => 0,
            };

            let mut batch_index = resume.map(|p| p.batch_index).unwrap_or(0);
            let mut reader = SourceReader::open(source, resume_offset)?;
            self.drain_source(&source_key, &mut reader, ingest_id, &mut batch_index, &mut result).await?;
        }

        Ok(result)
    }

    async fn drain_source(
        &self,
        source_key: &str,
        reader: &mut SourceReader,
        ingest_id: &str,
        batch_index: &mut u64,
        result: &mut LoadResult,
    ) -> Result<(), IngestError> {
        let mut raw_events: Vec<RawEvent> = Vec::new();
        let mut dead_letters = Vec::new();
        let mut aggregator = SessionAggregator::new();
        let mut last_offset = 0u64;
        let mut batch_started_at = Instant::now();

        loop {
            match reader.next_line() {
                Ok(Some(line)) => {
                    last_offset = line.offset;
                    let now = Utc::now();
                    let (event, dlq) = classify_line(&self.validator, ingest_id, source_key, line.offset, &line.text, now);
                    if dlq.is_none() {
                        aggregator.fold(&event);
                    }
                    raw_events.push(event);
                    if let Some(dlq) = dlq {
                        dead_letters.push(dlq);
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    // An I/O failure on a single line never aborts the whole source —
                    // the offending offset is quarantined and the reader keeps going.
                    let now = Utc::now();
                    let offset = reader.current_offset();
                    last_offset = offset;
                    warn!(source = %source_key, %error, offset, "read error on individual line, quarantining and continuing");
                    let dlq = self.validator.quarantine_read_error(ingest_id, source_key, offset, &error.to_string(), now);
                    raw_events.push(RawEvent::quarantined(ingest_id, source_key, offset, now));
                    dead_letters.push(dlq);
                }
            }

            let batch_full = raw_events.len() + dead_letters.len() >= self.batch_size;
            let timed_out = batch_started_at.elapsed() >= self.batch_timeout;

            if batch_full || timed_out {
                self.commit(
                    ingest_id,
                    source_key,
                    reader.inode.clone(),
                    last_offset,
                    *batch_index,
                    &mut raw_events,
                    &mut dead_letters,
                    &mut aggregator,
                    result,
                )
                .await?;
                *batch_index += 1;
                batch_started_at = Instant::now();
            }
        }

        if !raw_events.is_empty() || !dead_letters.is_empty() {
            self.commit(
                ingest_id,
                source_key,
                reader.inode.clone(),
                last_offset,
                *batch_index,
                &mut raw_events,
                &mut dead_letters,
                &mut aggregator,
                result,
            )
            .await?;
            *batch_index += 1;
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn commit(
        &self,
        ingest_id: &str,
        source_key: &str,
        inode: String,
        last_offset: u64,
        batch_index: u64,
        raw_events: &mut Vec<RawEvent>,
        dead_letters: &mut Vec<honeytrap_core_models::DeadLetterEvent>,
        aggregator: &mut SessionAggregator,
        result: &mut LoadResult,
    ) -> Result<(), IngestError> {
        let sessions = aggregator.session_ids();
        let taken_aggregator = std::mem::take(aggregator);
        let summaries: Vec<SessionSummary> = taken_aggregator
            .into_aggregates()
            .into_iter()
            .map(to_session_summary)
            .collect();

        let cursor = IngestCursor {
            source: source_key.to_string(),
            inode,
            last_offset,
            ingest_id: ingest_id.to_string(),
            batch_index,
            sessions,
        };

        let batch = PendingBatch {
            raw_events: std::mem::take(raw_events),
            dead_letters: std::mem::take(dead_letters),
            summaries,
            cursor: cursor.clone(),
        };

        let summaries_in_batch = batch.summaries.len() as u64;
        let outcome = self.unit_of_work.commit_batch(batch).await?;

        result.events_inserted += outcome.raw_events_written;
        result.events_quarantined += outcome.dead_letters_written;
        result.sessions_touched += summaries_in_batch;
        result.batches_committed += 1;
        result.last_cursor = Some(cursor);

        info!(
            source = %source_key,
            batch_index,
            inserted = outcome.raw_events_written,
            quarantined = outcome.dead_letters_written,
            "batch committed"
        );

        Ok(())
    }
}

/// Turns one folded `SessionAggregate` into the incremental `SessionSummary`
/// patch the additive upsert expects. Exposed so callers outside the batch
/// loader (the DLQ worker, reprocessing one recovered event at a time) can
/// fold a single event through `SessionAggregator` and persist it the same
/// way a normal batch commit would.
pub fn to_session_summary(aggregate: honeytrap_core_models::aggregate::SessionAggregate) -> SessionSummary {
    let enrichment = if aggregate.enrichment_payload.is_null() { Value::Null } else { aggregate.enrichment_payload };
    SessionSummary {
        session_id: aggregate.session_id,
        sensor: aggregate.sensor,
        event_count: aggregate.event_count,
        command_count: aggregate.command_count,
        file_downloads: aggregate.file_downloads,
        login_attempts: aggregate.login_attempts,
        first_event_at: aggregate.first_event_at,
        last_event_at: aggregate.last_event_at,
        highest_risk: aggregate.highest_risk,
        vt_flagged: aggregate.vt_flagged,
        dshield_flagged: aggregate.dshield_flagged,
        ssh_key_injections: aggregate.ssh_key_injections,
        enrichment,
        source_ip: aggregate.canonical_source_ip,
        snapshot_asn: None,
        snapshot_country: None,
        snapshot_ip_type: None,
        enrichment_at: None,
    }
}

fn inode_of(path: &Path) -> Result<String, IngestError> {
    use std::os::unix::fs::MetadataExt;
    let metadata = std::fs::metadata(path).map_err(|e| IngestError::SourceReadFailed(e.to_string()))?;
    Ok(metadata.ino().to_string())
}

/// What a single line turns into: always a `RawEvent` (so the main row is
/// populated either way), plus a `DeadLetterEvent` when quarantined. The two
/// are never produced independently — `event.quarantined == dlq.is_some()`.
fn classify_line(
    validator: &EventValidator,
    ingest_id: &str,
    source_key: &str,
    offset: u64,
    text: &str,
    now: chrono::DateTime<Utc>,
) -> (RawEvent, Option<honeytrap_core_models::DeadLetterEvent>) {
    match validator.validate(ingest_id, source_key, offset, text, now) {
        ValidationOutcome::Valid(event) => (event, None),
        ValidationOutcome::Invalid(dlq) => (RawEvent::quarantined(ingest_id, source_key, offset, now), Some(dlq)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixed_now() -> chrono::DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    proptest! {
        #[test]
        fn every_line_yields_exactly_one_raw_event_and_quarantine_pairs_with_dead_letter(
            is_valid in any::<bool>(),
            offset in 0u64..1_000_000,
            session in "[a-z]{1,8}",
        ) {
            let validator = EventValidator::new(crate::validator::DEFAULT_MAX_LINE_BYTES);
            let text = if is_valid {
                format!(r#"{{"eventid":"cowrie.login.success","session":"{session}","timestamp":"2026-01-01T00:00:00Z"}}"#)
            } else {
                "not valid json".to_string()
            };

            let (event, dlq) = classify_line(&validator, "ingest-1", "sensor-a.log", offset, &text, fixed_now());

            prop_assert_eq!(event.source_offset, offset);
            prop_assert_eq!(event.quarantined, dlq.is_some());
            match &dlq {
                Some(dlq) => {
                    prop_assert_eq!(dlq.source_offset, offset);
                    prop_assert_eq!(dlq.source_path.as_str(), "sensor-a.log");
                    prop_assert!(event.payload.is_none());
                }
                None => prop_assert!(event.payload.is_some()),
            }
        }
    }
}

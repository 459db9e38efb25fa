// [crates/honeytrap-infra-db/src/unit_of_work.rs]
/*!
 * =================================================================
 * APARATO: UNIDAD DE TRABAJO POR LOTE
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: COMMIT ATÓMICO DEL LOTE DE INGESTA
 *
 * A single batch commit writes raw events, quarantines dead letters,
 * resolves the snapshot fields for any newly-observed source IP, folds
 * counters into the session summary, and advances the cursor — all inside
 * one transaction. Either the whole batch lands or none of it does; a crash
 * mid-batch leaves the previous cursor in place and the batch replays from
 * there (P1, P2).
 * =================================================================
 */

use crate::errors::DbError;
use crate::repositories::{dead_letters, ip_inventory, raw_events, session_summary};
use crate::StoreClient;
use honeytrap_core_models::inventory::IpType;
use honeytrap_core_models::{DeadLetterEvent, IngestCursor, RawEvent, SessionSummary};
use tracing::{info, instrument, warn};

/// Everything one pass of the loader wants to land atomically.
pub struct PendingBatch {
    pub raw_events: Vec<RawEvent>,
    pub dead_letters: Vec<DeadLetterEvent>,
    pub summaries: Vec<SessionSummary>,
    pub cursor: IngestCursor,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub raw_events_written: u64,
    pub dead_letters_written: u64,
    pub summaries_written: u64,
}

pub struct UnitOfWork {
    client: StoreClient,
}

impl UnitOfWork {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Resolves the write-once snapshot fields for a summary's `source_ip`
    /// against the current inventory, then stamps them onto the summary
    /// before it reaches the upsert (whose own COALESCE makes the stamp a
    /// no-op on any later re-enrichment pass).
    fn resolve_snapshot(summary: &mut SessionSummary, inventory: Option<&honeytrap_core_models::IpInventory>) {
        let Some(inventory) = inventory else { return };
        if summary.snapshot_asn.is_none() {
            summary.snapshot_asn = inventory.current_asn;
        }
        if summary.snapshot_country.is_none() {
            summary.snapshot_country = inventory.geo_country.clone();
        }
        if summary.snapshot_ip_type.is_none() {
            summary.snapshot_ip_type = IpType::first_by_priority(&inventory.ip_types).map(|t| t.as_str().to_string());
        }
    }

    #[instrument(skip(self, batch), fields(source = %batch.cursor.source, raw = batch.raw_events.len(), dlq = batch.dead_letters.len()))]
    pub async fn commit_batch(&self, mut batch: PendingBatch) -> Result<BatchOutcome, DbError> {
        let ip_repo = ip_inventory::IpInventoryRepository::new(self.client.clone());
        let ip_addresses: Vec<String> = batch.summaries.iter().filter_map(|s| s.source_ip.clone()).collect();
        let inventories = ip_repo.batch_get(&ip_addresses).await?;
        let by_ip: std::collections::HashMap<String, honeytrap_core_models::IpInventory> = ip_addresses
            .into_iter()
            .zip(inventories.into_iter())
            .filter_map(|(ip, inv)| inv.map(|inv| (ip, inv)))
            .collect();

        for summary in &mut batch.summaries {
            let inventory = summary.source_ip.as_ref().and_then(|ip| by_ip.get(ip));
            Self::resolve_snapshot(summary, inventory);
        }

        let connection = self.client.get_connection()?;
        let tx = connection.transaction().await.map_err(|_| DbError::TransactionError)?;

        for event in &batch.raw_events {
            raw_events::insert_on(&tx, event).await?;
        }
        for dlq in &batch.dead_letters {
            dead_letters::insert_on(&tx, dlq).await?;
        }
        for summary in &batch.summaries {
            session_summary::upsert_on(&tx, summary).await?;
        }
        crate::repositories::cursor::upsert_on(&tx, &batch.cursor).await?;

        tx.commit().await.map_err(|_| DbError::TransactionError)?;

        if !batch.dead_letters.is_empty() {
            warn!(count = batch.dead_letters.len(), "batch quarantined events alongside valid ones");
        }
        info!("batch committed");

        Ok(BatchOutcome {
            raw_events_written: batch.raw_events.len() as u64,
            dead_letters_written: batch.dead_letters.len() as u64,
            summaries_written: batch.summaries.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{RawEventRepository, SessionSummaryRepository};
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn one_event_batch(ingest_id: &str, source: &str, offset: u64, session_id: &str, batch_index: u64) -> PendingBatch {
        let now = fixed_now();
        let event = RawEvent::valid(ingest_id, source, offset, session_id, "cowrie.login.success", now, json!({}), 0.0);
        let summary = SessionSummary {
            session_id: session_id.to_string(),
            sensor: "sensor-a".to_string(),
            event_count: 1,
            command_count: 0,
            file_downloads: 0,
            login_attempts: 1,
            first_event_at: now,
            last_event_at: now,
            highest_risk: 0.0,
            vt_flagged: false,
            dshield_flagged: false,
            ssh_key_injections: 0,
            enrichment: serde_json::Value::Null,
            source_ip: None,
            snapshot_asn: None,
            snapshot_country: None,
            snapshot_ip_type: None,
            enrichment_at: None,
        };
        let cursor = IngestCursor {
            source: source.to_string(),
            inode: "1".to_string(),
            last_offset: offset,
            ingest_id: ingest_id.to_string(),
            batch_index,
            sessions: vec![session_id.to_string()],
        };
        PendingBatch { raw_events: vec![event], dead_letters: vec![], summaries: vec![summary], cursor }
    }

    proptest! {
        /// P1: committing the exact same batch twice (e.g. a crash between
        /// `commit_batch` succeeding and the cursor write reaching the
        /// caller, followed by a blind replay) must not double the row —
        /// `INSERT OR IGNORE` on `(source_path, source_offset)` makes the
        /// second commit a no-op for `raw_events`.
        #[test]
        fn recommitting_the_same_batch_does_not_duplicate_raw_events(
            offset in 0u64..1_000_000,
            session in "[a-z]{1,8}",
        ) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let client = crate::StoreClient::connect(":memory:", None).await.unwrap();
                let unit_of_work = UnitOfWork::new(client.clone());
                let raw_event_repo = RawEventRepository::new(client);

                let batch = one_event_batch("ingest-1", "sensor-a.log", offset, &session, 0);
                unit_of_work.commit_batch(batch).await.unwrap();
                let batch_again = one_event_batch("ingest-1", "sensor-a.log", offset, &session, 0);
                unit_of_work.commit_batch(batch_again).await.unwrap();

                let count = raw_event_repo.count_for_source("sensor-a.log").await.unwrap();
                prop_assert_eq!(count, 1);
                Ok(())
            })?;
        }

        /// P3: committing the same session's delta twice must sum the
        /// counters (additive upsert) while leaving write-once snapshot
        /// columns untouched once a non-null value has landed.
        #[test]
        fn recommitting_a_session_delta_sums_counters_and_freezes_snapshot(
            session in "[a-z]{1,8}",
        ) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let client = crate::StoreClient::connect(":memory:", None).await.unwrap();
                let unit_of_work = UnitOfWork::new(client.clone());
                let session_repo = SessionSummaryRepository::new(client);

                let mut first = one_event_batch("ingest-1", "sensor-a.log", 0, &session, 0);
                first.summaries[0].snapshot_asn = Some(64512);
                first.summaries[0].snapshot_country = Some("US".to_string());
                unit_of_work.commit_batch(first).await.unwrap();

                let mut second = one_event_batch("ingest-1", "sensor-a.log", 1, &session, 1);
                second.summaries[0].snapshot_asn = Some(99999);
                second.summaries[0].snapshot_country = Some("DE".to_string());
                unit_of_work.commit_batch(second).await.unwrap();

                let stored = session_repo.get(&session).await.unwrap().unwrap();
                prop_assert_eq!(stored.event_count, 2);
                prop_assert_eq!(stored.login_attempts, 2);
                prop_assert_eq!(stored.snapshot_asn, Some(64512));
                prop_assert_eq!(stored.snapshot_country, Some("US".to_string()));
                Ok(())
            })?;
        }
    }
}

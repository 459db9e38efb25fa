// [crates/honeytrap-infra-db/src/repositories/dead_letters.rs]
/*!
 * APARATO: DEAD LETTER REPOSITORY
 * RESPONSABILIDAD: CICLO DE VIDA DE EVENTOS EN CUARENTENA
 *
 * `idempotency_key` is unique; a fresh insert for an event that was already
 * quarantined in a prior (crashed) attempt is a no-op. The DLQ worker claims
 * rows ordered by `(priority ASC, created_at ASC)`, using `processing_lock` +
 * `lock_expires_at` as a lease — the same shape as the teacher's mission
 * zombie-recovery query, applied to dead-letter rows instead of jobs.
 */

use crate::errors::DbError;
use crate::StoreClient;
use chrono::{DateTime, Utc};
use honeytrap_core_models::dead_letter::{DeadLetterReason, ErrorHistoryEntry};
use honeytrap_core_models::DeadLetterEvent;
use libsql::{params, Connection};

pub(crate) const INSERT: &str = r#"
    INSERT INTO dead_letter_events (
        id, ingest_id, source_path, source_offset, reason, raw_payload,
        retry_count, error_history, resolved, priority, created_at, updated_at,
        processing_lock, lock_expires_at, idempotency_key, payload_checksum
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, '[]', 0, ?7, ?8, ?8, NULL, NULL, ?9, ?10)
    ON CONFLICT(idempotency_key) DO NOTHING
"#;

pub(crate) async fn insert_on(connection: &Connection, dlq: &DeadLetterEvent) -> Result<(), DbError> {
    connection
        .execute(
            INSERT,
            params![
                dlq.id.clone(),
                dlq.ingest_id.clone(),
                dlq.source_path.clone(),
                dlq.source_offset as i64,
                dlq.reason.as_str().to_string(),
                dlq.raw_payload.clone(),
                dlq.priority as i64,
                dlq.created_at.to_rfc3339(),
                dlq.idempotency_key.clone(),
                dlq.payload_checksum.clone(),
            ],
        )
        .await?;
    Ok(())
}

const CLAIM_NEXT: &str = r#"
    SELECT id, ingest_id, source_path, source_offset, reason, raw_payload,
           retry_count, error_history, resolved, priority, created_at, updated_at,
           processing_lock, lock_expires_at, idempotency_key, payload_checksum
    FROM dead_letter_events
    WHERE resolved = 0 AND (lock_expires_at IS NULL OR lock_expires_at < ?1)
    ORDER BY priority ASC, created_at ASC
    LIMIT 1
"#;

const ACQUIRE_LOCK: &str = r#"
    UPDATE dead_letter_events
    SET processing_lock = ?1, lock_expires_at = ?2, updated_at = ?3
    WHERE id = ?4 AND (lock_expires_at IS NULL OR lock_expires_at < ?3)
"#;

const RECORD_OUTCOME: &str = r#"
    UPDATE dead_letter_events
    SET retry_count = retry_count + 1,
        error_history = ?1,
        resolved = ?2,
        processing_lock = NULL,
        lock_expires_at = NULL,
        updated_at = ?3
    WHERE id = ?4
"#;

pub struct DeadLetterRepository {
    client: StoreClient,
}

impl DeadLetterRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    pub async fn insert(&self, dlq: &DeadLetterEvent) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        insert_on(&connection, dlq).await
    }

    /// Atomically claims the next eligible row with a fresh lease token.
    /// Returns `None` when the queue has nothing unlocked left to process.
    pub async fn claim_next(&self, lock_token: &str, lease: chrono::Duration, now: DateTime<Utc>) -> Result<Option<DeadLetterEvent>, DbError> {
        let connection = self.client.get_connection()?;
        let tx = connection.transaction().await.map_err(|_| DbError::TransactionError)?;

        let mut rows = tx.query(CLAIM_NEXT, params![now.to_rfc3339()]).await?;
        let Some(row) = rows.next().await? else {
            tx.commit().await.map_err(|_| DbError::TransactionError)?;
            return Ok(None);
        };
        let mut dlq = map_row(&row)?;
        drop(rows);

        let expires_at = now + lease;
        let affected = tx
            .execute(
                ACQUIRE_LOCK,
                params![lock_token.to_string(), expires_at.to_rfc3339(), now.to_rfc3339(), dlq.id.clone()],
            )
            .await?;

        if affected == 0 {
            // Another worker raced us for the same row; caller should retry.
            tx.commit().await.map_err(|_| DbError::TransactionError)?;
            return Ok(None);
        }

        tx.commit().await.map_err(|_| DbError::TransactionError)?;

        dlq.processing_lock = Some(lock_token.to_string());
        dlq.lock_expires_at = Some(expires_at);
        Ok(Some(dlq))
    }

    pub async fn record_failure(&self, id: &str, history: Vec<ErrorHistoryEntry>, now: DateTime<Utc>) -> Result<(), DbError> {
        self.record_outcome(id, history, false, now).await
    }

    pub async fn record_success(&self, id: &str, history: Vec<ErrorHistoryEntry>, now: DateTime<Utc>) -> Result<(), DbError> {
        self.record_outcome(id, history, true, now).await
    }

    async fn record_outcome(&self, id: &str, history: Vec<ErrorHistoryEntry>, resolved: bool, now: DateTime<Utc>) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let history_json = serde_json::to_string(&history).map_err(|e| DbError::MappingError(e.to_string()))?;
        connection
            .execute(RECORD_OUTCOME, params![history_json, resolved as i64, now.to_rfc3339(), id.to_string()])
            .await?;
        Ok(())
    }
}

fn map_row(row: &libsql::Row) -> Result<DeadLetterEvent, DbError> {
    let reason_str: String = row.get(4)?;
    let reason = match reason_str.as_str() {
        "schema_violation" => DeadLetterReason::SchemaViolation,
        "encoding_error" => DeadLetterReason::EncodingError,
        "size_limit" => DeadLetterReason::SizeLimit,
        "json_error" => DeadLetterReason::JsonError,
        _ => DeadLetterReason::Other,
    };
    let error_history_json: String = row.get(7)?;
    let error_history: Vec<ErrorHistoryEntry> =
        serde_json::from_str(&error_history_json).map_err(|e| DbError::MappingError(e.to_string()))?;
    let created_at: String = row.get(10)?;
    let updated_at: String = row.get(11)?;
    let processing_lock: Option<String> = row.get(12)?;
    let lock_expires_at: Option<String> = row.get(13)?;

    Ok(DeadLetterEvent {
        id: row.get(0)?,
        ingest_id: row.get(1)?,
        source_path: row.get(2)?,
        source_offset: row.get::<i64>(3)? as u64,
        reason,
        raw_payload: row.get(5)?,
        retry_count: row.get::<i64>(6)? as u32,
        error_history,
        resolved: row.get::<i64>(8)? != 0,
        priority: row.get::<i64>(9)? as u8,
        created_at: parse_rfc3339(&created_at)?,
        updated_at: parse_rfc3339(&updated_at)?,
        processing_lock,
        lock_expires_at: lock_expires_at.as_deref().map(parse_rfc3339).transpose()?,
        idempotency_key: row.get(14)?,
        payload_checksum: row.get(15)?,
    })
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::MappingError(e.to_string()))
}

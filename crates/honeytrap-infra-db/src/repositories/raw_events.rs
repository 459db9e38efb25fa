// [crates/honeytrap-infra-db/src/repositories/raw_events.rs]
/*!
 * APARATO: RAW EVENT REPOSITORY
 * RESPONSABILIDAD: PERSISTENCIA APPEND-MOSTLY DE EVENTOS
 *
 * Inserts are insert-or-ignore on `(source_path, source_offset)` so
 * reprocessing the same batch after a crash is a no-op (P1/P2).
 */

use crate::errors::DbError;
use crate::StoreClient;
use honeytrap_core_models::RawEvent;
use libsql::{params, Connection};

pub(crate) const INSERT_OR_IGNORE: &str = r#"
    INSERT OR IGNORE INTO raw_events (
        ingest_id, source_path, source_offset, session_id,
        event_type, timestamp, payload, quarantined, risk_score
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#;

pub struct RawEventRepository {
    client: StoreClient,
}

impl RawEventRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    pub async fn insert(&self, event: &RawEvent) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        insert_on(&connection, event).await
    }

    pub async fn count_for_source(&self, source_path: &str) -> Result<u64, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT COUNT(*) FROM raw_events WHERE source_path = ?1",
                params![source_path.to_string()],
            )
            .await?;
        let count: i64 = rows.next().await?.map(|r| r.get(0)).transpose()?.unwrap_or(0);
        Ok(count as u64)
    }
}

pub(crate) async fn insert_on(connection: &Connection, event: &RawEvent) -> Result<(), DbError> {
    let payload = event.payload.as_ref().map(|v| v.to_string()).unwrap_or_default();
    connection
        .execute(
            INSERT_OR_IGNORE,
            params![
                event.ingest_id.clone(),
                event.source_path.clone(),
                event.source_offset as i64,
                event.session_id.clone(),
                event.event_type.clone(),
                event.timestamp.to_rfc3339(),
                payload,
                event.quarantined as i64,
                event.risk_score,
            ],
        )
        .await?;
    Ok(())
}

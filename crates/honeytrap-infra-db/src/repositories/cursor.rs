// [crates/honeytrap-infra-db/src/repositories/cursor.rs]
/*!
 * APARATO: INGEST CURSOR REPOSITORY
 * RESPONSABILIDAD: PUNTO DE REANUDACIÓN POR (FUENTE, INODO)
 *
 * The loader reads this once at startup to decide where to resume a source
 * file, and upserts it at the end of each committed batch (P2).
 */

use crate::errors::DbError;
use crate::StoreClient;
use honeytrap_core_models::IngestCursor;
use libsql::{params, Connection};

const UPSERT: &str = r#"
    INSERT INTO ingest_cursors (source, inode, last_offset, ingest_id, batch_index, sessions)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(source, inode) DO UPDATE SET
        last_offset = excluded.last_offset,
        ingest_id = excluded.ingest_id,
        batch_index = excluded.batch_index,
        sessions = excluded.sessions
"#;

const SELECT: &str = r#"
    SELECT source, inode, last_offset, ingest_id, batch_index, sessions
    FROM ingest_cursors WHERE source = ?1 AND inode = ?2
"#;

pub struct CursorRepository {
    client: StoreClient,
}

impl CursorRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, source: &str, inode: &str) -> Result<Option<IngestCursor>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection.query(SELECT, params![source.to_string(), inode.to_string()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn upsert(&self, cursor: &IngestCursor) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        upsert_on(&connection, cursor).await
    }
}

pub(crate) async fn upsert_on(connection: &Connection, cursor: &IngestCursor) -> Result<(), DbError> {
    let sessions_json = serde_json::to_string(&cursor.sessions).map_err(|e| DbError::MappingError(e.to_string()))?;
    connection
        .execute(
            UPSERT,
            params![
                cursor.source.clone(),
                cursor.inode.clone(),
                cursor.last_offset as i64,
                cursor.ingest_id.clone(),
                cursor.batch_index as i64,
                sessions_json,
            ],
        )
        .await?;
    Ok(())
}

fn map_row(row: &libsql::Row) -> Result<IngestCursor, DbError> {
    let sessions_json: String = row.get(5)?;
    Ok(IngestCursor {
        source: row.get(0)?,
        inode: row.get(1)?,
        last_offset: row.get::<i64>(2)? as u64,
        ingest_id: row.get(3)?,
        batch_index: row.get::<i64>(4)? as u64,
        sessions: serde_json::from_str(&sessions_json).map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}

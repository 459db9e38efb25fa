// [crates/honeytrap-infra-db/src/repositories/session_summary.rs]
/*!
 * APARATO: SESSION SUMMARY REPOSITORY
 * RESPONSABILIDAD: UPSERT ADITIVO CON COLUMNAS DE SNAPSHOT INMUTABLES
 *
 * On conflict, counters accumulate (`existing + incoming`) and snapshot
 * columns / `source_ip` use `COALESCE(existing, incoming)` — once set by any
 * prior upsert, later enrichment runs can never change them (P3, P10).
 */

use crate::errors::DbError;
use crate::StoreClient;
use honeytrap_core_models::SessionSummary;
use libsql::{params, Connection};

pub(crate) const UPSERT: &str = r#"
    INSERT INTO session_summaries (
        session_id, sensor, event_count, command_count, file_downloads,
        login_attempts, first_event_at, last_event_at, highest_risk,
        vt_flagged, dshield_flagged, ssh_key_injections, enrichment,
        source_ip, snapshot_asn, snapshot_country, snapshot_ip_type, enrichment_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
    ON CONFLICT(session_id) DO UPDATE SET
        event_count = session_summaries.event_count + excluded.event_count,
        command_count = session_summaries.command_count + excluded.command_count,
        file_downloads = session_summaries.file_downloads + excluded.file_downloads,
        login_attempts = session_summaries.login_attempts + excluded.login_attempts,
        first_event_at = MIN(session_summaries.first_event_at, excluded.first_event_at),
        last_event_at = MAX(session_summaries.last_event_at, excluded.last_event_at),
        highest_risk = MAX(session_summaries.highest_risk, excluded.highest_risk),
        vt_flagged = session_summaries.vt_flagged OR excluded.vt_flagged,
        dshield_flagged = session_summaries.dshield_flagged OR excluded.dshield_flagged,
        ssh_key_injections = session_summaries.ssh_key_injections + excluded.ssh_key_injections,
        enrichment = excluded.enrichment,
        source_ip = COALESCE(session_summaries.source_ip, excluded.source_ip),
        snapshot_asn = COALESCE(session_summaries.snapshot_asn, excluded.snapshot_asn),
        snapshot_country = COALESCE(session_summaries.snapshot_country, excluded.snapshot_country),
        snapshot_ip_type = COALESCE(session_summaries.snapshot_ip_type, excluded.snapshot_ip_type),
        enrichment_at = COALESCE(session_summaries.enrichment_at, excluded.enrichment_at)
"#;

pub(crate) async fn upsert_on(connection: &Connection, summary: &SessionSummary) -> Result<(), DbError> {
    connection
        .execute(
            UPSERT,
            params![
                summary.session_id.clone(),
                summary.sensor.clone(),
                summary.event_count as i64,
                summary.command_count as i64,
                summary.file_downloads as i64,
                summary.login_attempts as i64,
                summary.first_event_at.to_rfc3339(),
                summary.last_event_at.to_rfc3339(),
                summary.highest_risk,
                summary.vt_flagged as i64,
                summary.dshield_flagged as i64,
                summary.ssh_key_injections as i64,
                summary.enrichment.to_string(),
                summary.source_ip.clone(),
                summary.snapshot_asn.map(|v| v as i64),
                summary.snapshot_country.clone(),
                summary.snapshot_ip_type.clone(),
                summary.enrichment_at.map(|v| v.to_rfc3339()),
            ],
        )
        .await?;
    Ok(())
}

pub struct SessionSummaryRepository {
    client: StoreClient,
}

impl SessionSummaryRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    pub async fn upsert(&self, summary: &SessionSummary) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        upsert_on(&connection, summary).await
    }

    pub async fn get(&self, session_id: &str) -> Result<Option<SessionSummary>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT session_id, sensor, event_count, command_count, file_downloads, \
                 login_attempts, first_event_at, last_event_at, highest_risk, vt_flagged, \
                 dshield_flagged, ssh_key_injections, enrichment, source_ip, snapshot_asn, \
                 snapshot_country, snapshot_ip_type, enrichment_at \
                 FROM session_summaries WHERE session_id = ?1",
                params![session_id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Sessions that have a canonical IP but have never been through the
    /// enrichment cascade. Feeds the standalone enricher pass (H), which
    /// runs independently of the loader.
    pub async fn list_pending_enrichment(&self, limit: u32) -> Result<Vec<SessionSummary>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT session_id, sensor, event_count, command_count, file_downloads, \
                 login_attempts, first_event_at, last_event_at, highest_risk, vt_flagged, \
                 dshield_flagged, ssh_key_injections, enrichment, source_ip, snapshot_asn, \
                 snapshot_country, snapshot_ip_type, enrichment_at \
                 FROM session_summaries \
                 WHERE source_ip IS NOT NULL AND enrichment_at IS NULL \
                 LIMIT ?1",
                params![limit as i64],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_row(&row)?);
        }
        Ok(out)
    }
}

fn map_row(row: &libsql::Row) -> Result<SessionSummary, DbError> {
    let enrichment_json: String = row.get(12)?;
    let enrichment_at: Option<String> = row.get(17)?;
    Ok(SessionSummary {
        session_id: row.get(0)?,
        sensor: row.get(1)?,
        event_count: row.get::<i64>(2)? as u64,
        command_count: row.get::<i64>(3)? as u64,
        file_downloads: row.get::<i64>(4)? as u64,
        login_attempts: row.get::<i64>(5)? as u64,
        first_event_at: parse_rfc3339(&row.get::<String>(6)?)?,
        last_event_at: parse_rfc3339(&row.get::<String>(7)?)?,
        highest_risk: row.get(8)?,
        vt_flagged: row.get::<i64>(9)? != 0,
        dshield_flagged: row.get::<i64>(10)? != 0,
        ssh_key_injections: row.get::<i64>(11)? as u64,
        enrichment: serde_json::from_str(&enrichment_json).unwrap_or(serde_json::Value::Null),
        source_ip: row.get(13)?,
        snapshot_asn: row.get::<Option<i64>>(14)?.map(|v| v as u32),
        snapshot_country: row.get(15)?,
        snapshot_ip_type: row.get(16)?,
        enrichment_at: enrichment_at.as_deref().map(parse_rfc3339).transpose()?,
    })
}

fn parse_rfc3339(s: &str) -> Result<chrono::DateTime<chrono::Utc>, DbError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| DbError::MappingError(e.to_string()))
}

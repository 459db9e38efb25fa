// [crates/honeytrap-infra-db/src/schema.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN DATABASE SCHEMA
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * Tables mirror the entities in the data model 1:1. `geo_country` and
 * `primary_ip_type` on `ip_inventory` are store-side generated columns for
 * the hot query path (filtering by country / ip type); `inventory::resolve`
 * (application layer) mirrors the same projection logic in-memory so readers
 * never have to depend on SQLite's JSON extraction to reconstruct a value
 * that already lives in a Rust struct.
 * =================================================================
 */

use crate::errors::DbError;
use libsql::Connection;
use tracing::{info, instrument};

const BASE_TABLES: &[(&str, &str)] = &[
    ("schema_state", r#"
        CREATE TABLE IF NOT EXISTS schema_state (
            key TEXT PRIMARY KEY,
            value TEXT
        );
    "#),
    ("raw_events", r#"
        CREATE TABLE IF NOT EXISTS raw_events (
            ingest_id TEXT NOT NULL,
            source_path TEXT NOT NULL,
            source_offset INTEGER NOT NULL,
            session_id TEXT NOT NULL,
            event_type TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            payload TEXT,
            quarantined INTEGER NOT NULL DEFAULT 0,
            risk_score REAL NOT NULL DEFAULT 0.0,
            PRIMARY KEY (source_path, source_offset)
        );
    "#),
    ("dead_letter_events", r#"
        CREATE TABLE IF NOT EXISTS dead_letter_events (
            id TEXT PRIMARY KEY,
            ingest_id TEXT NOT NULL,
            source_path TEXT NOT NULL,
            source_offset INTEGER NOT NULL,
            reason TEXT NOT NULL,
            raw_payload TEXT NOT NULL,
            retry_count INTEGER NOT NULL DEFAULT 0,
            error_history TEXT NOT NULL DEFAULT '[]',
            resolved INTEGER NOT NULL DEFAULT 0,
            priority INTEGER NOT NULL DEFAULT 5,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            processing_lock TEXT,
            lock_expires_at TEXT,
            idempotency_key TEXT NOT NULL UNIQUE,
            payload_checksum TEXT NOT NULL
        );
    "#),
    ("session_summaries", r#"
        CREATE TABLE IF NOT EXISTS session_summaries (
            session_id TEXT PRIMARY KEY,
            sensor TEXT NOT NULL,
            event_count INTEGER NOT NULL DEFAULT 0,
            command_count INTEGER NOT NULL DEFAULT 0,
            file_downloads INTEGER NOT NULL DEFAULT 0,
            login_attempts INTEGER NOT NULL DEFAULT 0,
            first_event_at TEXT NOT NULL,
            last_event_at TEXT NOT NULL,
            highest_risk REAL NOT NULL DEFAULT 0.0,
            vt_flagged INTEGER NOT NULL DEFAULT 0,
            dshield_flagged INTEGER NOT NULL DEFAULT 0,
            ssh_key_injections INTEGER NOT NULL DEFAULT 0,
            enrichment TEXT NOT NULL DEFAULT '{}',
            source_ip TEXT,
            snapshot_asn INTEGER,
            snapshot_country TEXT,
            snapshot_ip_type TEXT,
            enrichment_at TEXT
        );
    "#),
    ("ingest_cursors", r#"
        CREATE TABLE IF NOT EXISTS ingest_cursors (
            source TEXT NOT NULL,
            inode TEXT NOT NULL,
            last_offset INTEGER NOT NULL,
            ingest_id TEXT NOT NULL,
            batch_index INTEGER NOT NULL,
            sessions TEXT NOT NULL DEFAULT '[]',
            PRIMARY KEY (source, inode)
        );
    "#),
    ("ip_inventory", r#"
        CREATE TABLE IF NOT EXISTS ip_inventory (
            ip_address TEXT PRIMARY KEY,
            current_asn INTEGER,
            as_name TEXT,
            enrichment TEXT NOT NULL DEFAULT '{}',
            enrichment_updated_at TEXT NOT NULL,
            ip_types TEXT NOT NULL DEFAULT '[]',
            geo_country TEXT GENERATED ALWAYS AS (
                COALESCE(
                    json_extract(enrichment, '$.offline.country'),
                    json_extract(enrichment, '$.bulk_asn.country'),
                    json_extract(enrichment, '$.legacy.country'),
                    'XX'
                )
            ) VIRTUAL,
            primary_ip_type TEXT GENERATED ALWAYS AS (
                json_extract(ip_types, '$[0]')
            ) VIRTUAL
        );
    "#),
    ("asn_inventory", r#"
        CREATE TABLE IF NOT EXISTS asn_inventory (
            asn INTEGER PRIMARY KEY,
            as_name TEXT,
            first_seen TEXT NOT NULL,
            last_seen TEXT NOT NULL,
            ip_count INTEGER NOT NULL DEFAULT 0
        );
    "#),
    ("ip_asn_history", r#"
        CREATE TABLE IF NOT EXISTS ip_asn_history (
            ip_address TEXT NOT NULL,
            asn INTEGER NOT NULL,
            observed_from TEXT NOT NULL,
            observed_to TEXT,
            PRIMARY KEY (ip_address, observed_from)
        );
    "#),
    ("enrichment_cache", r#"
        CREATE TABLE IF NOT EXISTS enrichment_cache (
            service TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (service, key)
        );
    "#),
];

const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("idx_dlq_priority", "CREATE INDEX IF NOT EXISTS idx_dlq_priority ON dead_letter_events(priority ASC, created_at ASC) WHERE resolved = 0;"),
    ("idx_dlq_idempotency", "CREATE INDEX IF NOT EXISTS idx_dlq_idempotency ON dead_letter_events(idempotency_key);"),
    ("idx_cache_expiry", "CREATE INDEX IF NOT EXISTS idx_cache_expiry ON enrichment_cache(service, expires_at);"),
    ("idx_session_source_ip", "CREATE INDEX IF NOT EXISTS idx_session_source_ip ON session_summaries(source_ip);"),
    ("idx_ip_inventory_country", "CREATE INDEX IF NOT EXISTS idx_ip_inventory_country ON ip_inventory(geo_country);"),
    ("idx_history_ip", "CREATE INDEX IF NOT EXISTS idx_history_ip ON ip_asn_history(ip_address);"),
];

#[instrument(skip(connection))]
pub async fn apply_full_schema(connection: &Connection) -> Result<(), DbError> {
    info!("applying schema (tables + indexes)");

    for (name, statement) in BASE_TABLES {
        connection
            .execute(statement, ())
            .await
            .map_err(|e| DbError::MappingError(format!("table {name} failed: {e}")))?;
    }

    for (name, statement) in ACCELERATION_INDEXES {
        connection
            .execute(statement, ())
            .await
            .map_err(|e| DbError::MappingError(format!("index {name} failed: {e}")))?;
    }

    connection
        .execute(
            "INSERT INTO schema_state (key, value) VALUES ('schema_version', '1') \
             ON CONFLICT(key) DO NOTHING",
            (),
        )
        .await?;

    Ok(())
}

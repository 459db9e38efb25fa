// [crates/honeytrap-ingest/src/errors.rs]
/*!
 * APARATO: CATÁLOGO DE ERRORES DE INGESTA
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("[INGEST_IO]: source read failed -> {0}")]
    SourceReadFailed(String),

    #[error("[INGEST_DECODE]: decompression failed -> {0}")]
    DecodeFailed(String),

    #[error("[INGEST_DB]: storage layer rejected the batch -> {0}")]
    Storage(#[from] honeytrap_infra_db::DbError),
}

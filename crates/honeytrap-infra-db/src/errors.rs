// [crates/honeytrap-infra-db/src/errors.rs]
/*!
 * APARATO: DATABASE ERROR CATALOG
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("[DB_CONN]: connection failed -> {0}")]
    ConnectionError(String),

    #[error("[DB_CONFIG]: configuration invalid -> {0}")]
    ConfigurationError(String),

    #[error("[DB_QUERY]: query rejected -> {0}")]
    QueryError(#[from] libsql::Error),

    #[error("[DB_MAPPING]: row-to-domain mapping failed -> {0}")]
    MappingError(String),

    #[error("[DB_TX]: transaction collapsed")]
    TransactionError,

    #[error("[DB_LOCK]: dead-letter row is held by another worker")]
    LockConflict,
}

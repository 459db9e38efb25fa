// [crates/honeytrap-cache/src/errors.rs]
/*!
 * APARATO: CATÁLOGO DE ERRORES DE CACHÉ
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("[CACHE_L2]: row-cache tier failed -> {0}")]
    L2Failed(#[from] honeytrap_infra_db::DbError),

    #[error("[CACHE_L3_IO]: disk tier I/O failed -> {0}")]
    L3IoFault(#[from] std::io::Error),

    #[error("[CACHE_L3_ENVELOPE]: disk tier envelope malformed -> {0}")]
    L3EnvelopeMalformed(#[from] honeytrap_infra_transport::TransportError),
}

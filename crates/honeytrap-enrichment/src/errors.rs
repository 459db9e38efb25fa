// [crates/honeytrap-enrichment/src/errors.rs]
/*!
 * APARATO: CATÁLOGO DE ERRORES DE ENRIQUECIMIENTO
 *
 * These map the source-level failure taxonomy onto cascade behaviour:
 * `SourceUnavailable` and `QuotaExhausted` are recorded in `_meta` and the
 * cascade continues; only `OfflineDatabaseFault` is elevated (logged as a
 * warning) without aborting the cascade, since offline-DB failure is the one
 * source failure spec.md singles out for extra visibility.
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("[ENRICH_OFFLINE]: offline geo/ASN database unavailable -> {0}")]
    OfflineDatabaseFault(String),

    #[error("[ENRICH_SOURCE]: source transiently unavailable -> {0}")]
    SourceUnavailable(String),

    #[error("[ENRICH_QUOTA]: daily scanner budget exhausted")]
    QuotaExhausted,

    #[error("[ENRICH_CACHE]: cache tier failed -> {0}")]
    CacheFailed(#[from] honeytrap_cache::CacheError),
}

// [crates/honeytrap-classifier/src/errors.rs]
/*!
 * APARATO: CATÁLOGO DE ERRORES DEL CLASIFICADOR
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("[CLASSIFIER_CIDR]: malformed CIDR entry -> {0}")]
    MalformedCidr(String),

    #[error("[CLASSIFIER_REGEX]: malformed AS-name pattern -> {0}")]
    MalformedPattern(#[from] regex::Error),

    #[error("[CLASSIFIER_FETCH]: reference set refresh failed -> {0}")]
    FetchFailed(String),
}

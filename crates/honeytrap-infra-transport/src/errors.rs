// [crates/honeytrap-infra-transport/src/errors.rs]
/*!
 * APARATO: CATÁLOGO DE ERRORES DE TRANSPORTE
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("[TRANSPORT_CONN]: bulk ASN connect failed -> {0}")]
    ConnectFailed(String),

    #[error("[TRANSPORT_IO]: bulk ASN wire I/O failed -> {0}")]
    IoFault(#[from] std::io::Error),

    #[error("[TRANSPORT_CEILING]: batch of {0} exceeds the 500-IP hard ceiling")]
    BatchTooLarge(usize),

    #[error("[TRANSPORT_PARSE]: unparseable response line -> {0}")]
    UnparseableLine(String),

    #[error("[TRANSPORT_ENVELOPE]: cache envelope malformed -> {0}")]
    EnvelopeMalformed(String),
}

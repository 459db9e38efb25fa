// [crates/honeytrap-infra-transport/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CAPA DE TRANSPORTE DE CABLE
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * =================================================================
 */

pub mod bulk_asn;
pub mod cache_envelope;
pub mod errors;

pub use bulk_asn::{BulkAsnClient, BulkAsnRecord, MAX_BATCH_SIZE};
pub use cache_envelope::{shard_path, CacheEnvelope};
pub use errors::TransportError;

// [crates/honeytrap-core-models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODELS BARREL
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: EXPOSICIÓN DE CONTRATOS SOBERANOS DEL DOMINIO
 * =================================================================
 */

pub mod aggregate;
pub mod cache_entry;
pub mod cursor;
pub mod dead_letter;
pub mod inventory;
pub mod raw_event;
pub mod reference_set;
pub mod session;

pub use aggregate::SessionAggregate;
pub use cache_entry::EnrichmentCacheEntry;
pub use cursor::IngestCursor;
pub use dead_letter::{DeadLetterEvent, DeadLetterReason, ErrorHistoryEntry};
pub use inventory::{AsnInventory, IpAsnHistory, IpInventory, IpType};
pub use raw_event::RawEvent;
pub use reference_set::ClassificationReferenceSet;
pub use session::SessionSummary;

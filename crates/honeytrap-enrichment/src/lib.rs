// [crates/honeytrap-enrichment/src/lib.rs]
/*!
 * APARATO: BARRIL DEL PAQUETE DE ENRIQUECIMIENTO
 */

pub mod bogon;
pub mod cascade;
pub mod errors;
pub mod offline_lookup;
pub mod provenance;
pub mod scanner_client;
pub mod staleness;
pub mod token_bucket;

pub use cascade::{enrich_ip, CascadeContext, Enrichment};
pub use errors::EnrichError;
pub use offline_lookup::{OfflineDatabase, OfflineLookupResult};
pub use provenance::Provenance;
pub use scanner_client::{activity_filter_passes, ScannerBudget, ScannerClient, ScannerResult};
pub use staleness::{needs_reenrichment, StalenessReason};
pub use token_bucket::TokenBucket;

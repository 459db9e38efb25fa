// [crates/honeytrap-classifier/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CLASIFICADOR DE INFRAESTRUCTURA IP
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L5)
 * =================================================================
 */

pub mod cascade;
pub mod cidr_tree;
pub mod classification;
pub mod errors;
pub mod handle;
pub mod reference_data;
pub mod refresh;

pub use cascade::classify;
pub use cidr_tree::CidrTree;
pub use classification::Classification;
pub use errors::ClassifierError;
pub use handle::ClassifierHandle;
pub use reference_data::{default_datacenter_exclusion_patterns, default_residential_inclusion_patterns, ReferenceData};
pub use refresh::{refresh_reference_data, RefreshSources};

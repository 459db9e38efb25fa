// [crates/honeytrap-cache/src/lib.rs]
/*!
 * =================================================================
 * APARATO: JERARQUÍA DE CACHÉ DE TRES NIVELES
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * =================================================================
 */

pub mod errors;
pub mod l1;
pub mod l2;
pub mod l3;
pub mod tiered_cache;
pub mod ttl_policy;

pub use errors::CacheError;
pub use l1::L1Cache;
pub use l2::L2Cache;
pub use l3::L3Cache;
pub use tiered_cache::{CacheHitTier, TieredCache};
pub use ttl_policy::{ttls_for_service, TierTtls};

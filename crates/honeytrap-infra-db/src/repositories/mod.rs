// [crates/honeytrap-infra-db/src/repositories/mod.rs]
pub mod asn_inventory;
pub mod cache;
pub mod cursor;
pub mod dead_letters;
pub mod ip_inventory;
pub mod raw_events;
pub mod session_summary;

pub use asn_inventory::AsnInventoryRepository;
pub use cache::CacheRepository;
pub use cursor::CursorRepository;
pub use dead_letters::DeadLetterRepository;
pub use ip_inventory::IpInventoryRepository;
pub use raw_events::RawEventRepository;
pub use session_summary::SessionSummaryRepository;

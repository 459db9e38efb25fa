// [crates/honeytrap-core-models/src/inventory.rs]
/*!
 * APARATO: IP / ASN INVENTORY MODELS
 * RESPONSABILIDAD: ESTADO ACTUAL DE INFRAESTRUCTURA DE RED
 *
 * Models the one-way IP -> ASN pointer the design notes call for: no back
 * references from ASNInventory or IPASNHistory into IPInventory. History
 * rows are append-only, non-overlapping `[observed_from, observed_to)`.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tag vocabulary used both by the classifier (C3) output and by snapshot
/// priority resolution. Provider sub-tags live inside `IpInventory::enrichment`,
/// not here — this is the fixed, ordered core set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum IpType {
    Vpn,
    Tor,
    Proxy,
    Cloud,
    Datacenter,
    Residential,
    Mobile,
    Unknown,
}

impl IpType {
    /// Fixed snapshot priority: `VPN > TOR > PROXY > CLOUD > DATACENTER > RESIDENTIAL > MOBILE`.
    pub fn snapshot_priority(self) -> u8 {
        match self {
            Self::Vpn => 0,
            Self::Tor => 1,
            Self::Proxy => 2,
            Self::Cloud => 3,
            Self::Datacenter => 4,
            Self::Residential => 5,
            Self::Mobile => 6,
            Self::Unknown => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vpn => "VPN",
            Self::Tor => "TOR",
            Self::Proxy => "PROXY",
            Self::Cloud => "CLOUD",
            Self::Datacenter => "DATACENTER",
            Self::Residential => "RESIDENTIAL",
            Self::Mobile => "MOBILE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Picks the first type under `snapshot_priority`, or `None` if empty.
    pub fn first_by_priority(types: &[IpType]) -> Option<IpType> {
        types.iter().copied().min_by_key(|t| t.snapshot_priority())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IpInventory {
    pub ip_address: String,
    pub current_asn: Option<u32>,
    pub as_name: Option<String>,
    /// Per-source merged enrichment blob, including `_meta` provenance.
    pub enrichment: Value,
    pub enrichment_updated_at: DateTime<Utc>,
    pub ip_types: Vec<IpType>,
    /// Read-through projection: `offline.country || bulk.country || legacy.country || "XX"`.
    pub geo_country: Option<String>,
    pub primary_ip_type: Option<IpType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AsnInventory {
    pub asn: u32,
    pub as_name: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub ip_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IpAsnHistory {
    pub ip_address: String,
    pub asn: u32,
    pub observed_from: DateTime<Utc>,
    pub observed_to: Option<DateTime<Utc>>,
}

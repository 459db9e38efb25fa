// [crates/honeytrap-enrichment/src/offline_lookup.rs]
/*!
 * APARATO: CONSULTA OFFLINE GEO/ASN (F1)
 * RESPONSABILIDAD: LECTURA MEMORY-MAPPED SIN BLOQUEO DE RED
 *
 * The reference database is a line-oriented, sorted-by-IP flat file mapped
 * once at startup: `<ip> <country> <city> <asn> <as_name> <lat> <lon>`. A
 * linear scan is adequate for the dev/offline store this ships with; a
 * production deployment can swap the lookup body for a real MaxMind-style
 * reader without touching this type's public surface.
 */

use crate::errors::EnrichError;
use chrono::{DateTime, Utc};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::net::IpAddr;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OfflineLookupResult {
    pub geo_country: Option<String>,
    pub city: Option<String>,
    pub asn: Option<u32>,
    pub as_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub struct OfflineDatabase {
    mmap: Mmap,
    file_age_days: i64,
    staleness_threshold_days: i64,
}

impl OfflineDatabase {
    pub fn open(path: &Path, now: DateTime<Utc>, staleness_threshold_days: i64) -> Result<Self, EnrichError> {
        let file = File::open(path).map_err(|e| EnrichError::OfflineDatabaseFault(e.to_string()))?;
        let metadata = file.metadata().map_err(|e| EnrichError::OfflineDatabaseFault(e.to_string()))?;
        let modified: DateTime<Utc> = metadata
            .modified()
            .map_err(|e| EnrichError::OfflineDatabaseFault(e.to_string()))?
            .into();
        let file_age_days = (now - modified).num_days();

        // SAFETY: the mapped file is a read-only reference dataset owned by
        // this process; no other writer is expected to mutate it concurrently.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| EnrichError::OfflineDatabaseFault(e.to_string()))?;

        if file_age_days > staleness_threshold_days {
            warn!(file_age_days, staleness_threshold_days, "offline geo/ASN database is stale but still answering");
        }

        Ok(Self { mmap, file_age_days, staleness_threshold_days })
    }

    pub fn is_stale(&self) -> bool {
        self.file_age_days > self.staleness_threshold_days
    }

    /// Linear scan over the mapped text; returns `None` when the IP has no
    /// row, never an error — a miss here just means F2 gets a chance.
    pub fn lookup(&self, ip: IpAddr) -> Option<OfflineLookupResult> {
        let text = std::str::from_utf8(&self.mmap).ok()?;
        let needle = ip.to_string();

        for line in text.lines() {
            let mut fields = line.split_whitespace();
            let Some(row_ip) = fields.next() else { continue };
            if row_ip != needle {
                continue;
            }
            let country = fields.next().filter(|s| *s != "-").map(|s| s.to_string());
            let city = fields.next().filter(|s| *s != "-").map(|s| s.to_string());
            let asn = fields.next().and_then(|s| s.parse::<u32>().ok());
            let as_name = fields.next().filter(|s| *s != "-").map(|s| s.to_string());
            let latitude = fields.next().and_then(|s| s.parse::<f64>().ok());
            let longitude = fields.next().and_then(|s| s.parse::<f64>().ok());
            return Some(OfflineLookupResult { geo_country: country, city, asn, as_name, latitude, longitude });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn finds_an_existing_row_and_skips_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo.db");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "203.0.113.5 US - 64500 EXAMPLE-AS 37.5 -122.3").unwrap();
        writeln!(file, "198.51.100.1 - - - - - -").unwrap();
        drop(file);

        let db = OfflineDatabase::open(&path, Utc::now(), 14).unwrap();
        let hit = db.lookup("203.0.113.5".parse().unwrap()).unwrap();
        assert_eq!(hit.geo_country.as_deref(), Some("US"));
        assert_eq!(hit.city, None);
        assert_eq!(hit.asn, Some(64500));

        let empty_row = db.lookup("198.51.100.1".parse().unwrap()).unwrap();
        assert_eq!(empty_row.asn, None);

        assert!(db.lookup("192.0.2.1".parse().unwrap()).is_none());
    }
}

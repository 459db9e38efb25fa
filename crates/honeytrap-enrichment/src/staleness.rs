// [crates/honeytrap-enrichment/src/staleness.rs]
/*!
 * APARATO: POLÍTICA DE VIGENCIA DEL ENRIQUECIMIENTO
 * RESPONSABILIDAD: DECIDIR SI UN IP DEBE RE-ENRIQUECERSE
 *
 * Re-enrich when there's no prior run, the scanner's data is present and
 * older than a week, or any network-sourced field is older than 90 days.
 * Offline-DB freshness is judged by the file's own age, not per IP, so it
 * isn't part of this decision.
 */

use chrono::{DateTime, Duration, Utc};

const SCANNER_MAX_AGE_DAYS: i64 = 7;
const NETWORK_SOURCE_MAX_AGE_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalenessReason {
    NeverEnriched,
    ScannerDataAged,
    NetworkSourceAged,
}

pub fn needs_reenrichment(
    last_enriched_at: Option<DateTime<Utc>>,
    scanner_data_present: bool,
    now: DateTime<Utc>,
) -> Option<StalenessReason> {
    let Some(last) = last_enriched_at else {
        return Some(StalenessReason::NeverEnriched);
    };

    let age = now - last;

    if scanner_data_present && age > Duration::days(SCANNER_MAX_AGE_DAYS) {
        return Some(StalenessReason::ScannerDataAged);
    }

    if age > Duration::days(NETWORK_SOURCE_MAX_AGE_DAYS) {
        return Some(StalenessReason::NetworkSourceAged);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_enriched_always_needs_it() {
        let now = Utc::now();
        assert_eq!(needs_reenrichment(None, false, now), Some(StalenessReason::NeverEnriched));
    }

    #[test]
    fn fresh_record_needs_nothing() {
        let now = Utc::now();
        let last = now - Duration::days(1);
        assert_eq!(needs_reenrichment(Some(last), true, now), None);
    }

    #[test]
    fn scanner_data_expires_after_a_week() {
        let now = Utc::now();
        let last = now - Duration::days(8);
        assert_eq!(needs_reenrichment(Some(last), true, now), Some(StalenessReason::ScannerDataAged));
        assert_eq!(needs_reenrichment(Some(last), false, now), None);
    }

    #[test]
    fn network_sources_expire_after_ninety_days_regardless_of_scanner_data() {
        let now = Utc::now();
        let last = now - Duration::days(91);
        assert_eq!(needs_reenrichment(Some(last), false, now), Some(StalenessReason::NetworkSourceAged));
    }
}

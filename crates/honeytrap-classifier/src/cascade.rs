// [crates/honeytrap-classifier/src/cascade.rs]
/*!
 * =================================================================
 * APARATO: CASCADA DE CLASIFICACIÓN DE IP
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L5)
 * RESPONSABILIDAD: DETERMINACIÓN PRIORIZADA DEL TIPO DE INFRAESTRUCTURA
 *
 * A pure function of `(ip, reference_data)`: no I/O, no clock reads beyond
 * the timestamp it's handed. Matchers run in a fixed priority order and the
 * first to produce a positive result wins — TOR set, then cloud CIDR trees,
 * then the datacenter tree, then the residential AS-name heuristic, then
 * UNKNOWN. Ties can't happen because every matcher's positive case is
 * disjoint from the ones before it.
 * =================================================================
 */

use crate::classification::Classification;
use crate::reference_data::ReferenceData;
use chrono::{DateTime, Utc};
use honeytrap_core_models::IpType;
use std::net::IpAddr;
use tracing::instrument;

#[instrument(skip(reference_data), fields(%ip))]
pub fn classify(ip: IpAddr, as_name: Option<&str>, reference_data: &ReferenceData, now: DateTime<Utc>) -> Classification {
    if reference_data.tor_exit_ips.contains(&ip.to_string()) {
        return Classification {
            ip_type: IpType::Tor,
            provider: None,
            confidence: 0.95,
            source: "tor_exit_set",
            classified_at: now,
        };
    }

    for (provider, tree) in &reference_data.cloud_trees {
        if let Some(label) = tree.longest_match(ip) {
            return Classification {
                ip_type: IpType::Cloud,
                provider: label.or_else(|| Some(provider.clone())),
                confidence: 0.99,
                source: "cloud_cidr_trees",
                classified_at: now,
            };
        }
    }

    if let Some(label) = reference_data.datacenter_tree.longest_match(ip) {
        return Classification {
            ip_type: IpType::Datacenter,
            provider: label,
            confidence: 0.75,
            source: "datacenter_cidr_tree",
            classified_at: now,
        };
    }

    if let Some(name) = as_name {
        if reference_data.residential_exclude_patterns.is_match(name) {
            // Matches a datacenter-exclusion pattern — not residential, and
            // nothing downstream of this matcher gets a chance either.
        } else if reference_data.residential_include_patterns.is_match(name) {
            return Classification {
                ip_type: IpType::Residential,
                provider: None,
                confidence: 0.70,
                source: "residential_as_name_heuristic",
                classified_at: now,
            };
        }
    }

    Classification::unknown(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_data::{default_datacenter_exclusion_patterns, default_residential_inclusion_patterns};
    use regex::RegexSet;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn reference_data_with_defaults() -> ReferenceData {
        let mut data = ReferenceData::empty(now());
        data.residential_exclude_patterns = RegexSet::new(default_datacenter_exclusion_patterns()).unwrap();
        data.residential_include_patterns = RegexSet::new(default_residential_inclusion_patterns()).unwrap();
        data
    }

    #[test]
    fn tor_set_wins_over_everything_else() {
        let mut data = reference_data_with_defaults();
        data.tor_exit_ips.insert("203.0.113.5".to_string());
        let cloud: crate::cidr_tree::CidrTree = crate::cidr_tree::CidrTree::from_entries(vec![("203.0.113.0/24".parse().unwrap(), Some("aws".into()))]);
        data.cloud_trees.push(("aws".to_string(), cloud));

        let result = classify("203.0.113.5".parse().unwrap(), None, &data, now());
        assert_eq!(result.ip_type, IpType::Tor);
        assert_eq!(result.source, "tor_exit_set");
    }

    #[test]
    fn cloud_cidr_beats_generic_datacenter_tree() {
        let mut data = reference_data_with_defaults();
        data.cloud_trees.push(("gcp".to_string(), crate::cidr_tree::CidrTree::from_entries(vec![("198.51.100.0/24".parse().unwrap(), None)])));
        data.datacenter_tree = crate::cidr_tree::CidrTree::from_entries(vec![("198.51.100.0/24".parse().unwrap(), None)]);

        let result = classify("198.51.100.7".parse().unwrap(), None, &data, now());
        assert_eq!(result.ip_type, IpType::Cloud);
        assert_eq!(result.source, "cloud_cidr_trees");
        assert_eq!(result.provider.as_deref(), Some("gcp"));
    }

    #[test]
    fn datacenter_as_name_is_excluded_from_residential_even_with_isp_substring() {
        let data = reference_data_with_defaults();
        let result = classify("192.0.2.9".parse().unwrap(), Some("Example Hosting ISP Solutions"), &data, now());
        assert_eq!(result.ip_type, IpType::Unknown);
    }

    #[test]
    fn residential_isp_as_name_matches_when_not_excluded() {
        let data = reference_data_with_defaults();
        let result = classify("192.0.2.10".parse().unwrap(), Some("Comcast Cable Communications"), &data, now());
        assert_eq!(result.ip_type, IpType::Residential);
        assert_eq!(result.source, "residential_as_name_heuristic");
    }

    #[test]
    fn no_match_anywhere_falls_back_to_unknown() {
        let data = reference_data_with_defaults();
        let result = classify("192.0.2.11".parse().unwrap(), None, &data, now());
        assert_eq!(result.ip_type, IpType::Unknown);
        assert_eq!(result.confidence, 0.0);
    }
}

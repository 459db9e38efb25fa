// [crates/honeytrap-classifier/src/reference_data.rs]
/*!
 * APARATO: CONJUNTOS DE REFERENCIA DEL CLASIFICADOR
 * RESPONSABILIDAD: ESTADO INMUTABLE CONSULTADO POR LA CASCADA
 *
 * Each field is independently swappable: a background refresh builds a new
 * `ReferenceData` and atomically replaces the one behind the `RwLock` in
 * `ClassifierHandle`. A classification in flight always sees one consistent
 * snapshot, never a half-updated mix of old TOR set and new CIDR trees.
 */

use crate::cidr_tree::CidrTree;
use honeytrap_core_models::ClassificationReferenceSet;
use regex::RegexSet;
use std::collections::HashSet;

pub struct ReferenceData {
    pub tor_exit_ips: HashSet<String>,
    pub tor_meta: ClassificationReferenceSet,

    /// One tree per cloud provider so a hit also yields the provider label.
    pub cloud_trees: Vec<(String, CidrTree)>,
    pub cloud_meta: ClassificationReferenceSet,

    pub datacenter_tree: CidrTree,
    pub datacenter_meta: ClassificationReferenceSet,

    pub residential_exclude_patterns: RegexSet,
    pub residential_include_patterns: RegexSet,
    pub residential_meta: ClassificationReferenceSet,
}

impl ReferenceData {
    /// An empty-but-valid snapshot: every matcher falls through to `UNKNOWN`
    /// until the first background refresh populates real reference data.
    pub fn empty(now: chrono::DateTime<chrono::Utc>) -> Self {
        let meta = |name: &str| ClassificationReferenceSet {
            name: name.to_string(),
            source_url: String::new(),
            fetched_at: now,
            ttl_seconds: 0,
        };
        Self {
            tor_exit_ips: HashSet::new(),
            tor_meta: meta("tor_exit_set"),
            cloud_trees: Vec::new(),
            cloud_meta: meta("cloud_cidr_trees"),
            datacenter_tree: CidrTree::default(),
            datacenter_meta: meta("datacenter_cidr_tree"),
            residential_exclude_patterns: RegexSet::empty(),
            residential_include_patterns: RegexSet::empty(),
            residential_meta: meta("residential_as_name_heuristic"),
        }
    }
}

/// Default residential-heuristic vocabulary: datacenter-exclusion patterns
/// are checked first, then residential-inclusion patterns. Either list can
/// be replaced wholesale by a refresh without touching the cascade logic.
pub fn default_datacenter_exclusion_patterns() -> Vec<&'static str> {
    vec![
        r"(?i)hosting",
        r"(?i)datacenter",
        r"(?i)data center",
        r"(?i)colo(cation)?",
        r"(?i)cloud",
        r"(?i)server",
        r"(?i)vps",
        r"(?i)dedicated",
    ]
}

pub fn default_residential_inclusion_patterns() -> Vec<&'static str> {
    vec![
        r"(?i)telecom",
        r"(?i)broadband",
        r"(?i)mobile",
        r"(?i)wireless",
        r"(?i)cable",
        r"(?i)dsl",
        r"(?i)fiber",
        r"(?i)internet service",
        r"(?i)\bisp\b",
    ]
}

// [crates/honeytrap-classifier/src/refresh.rs]
/*!
 * APARATO: REFRESCO DE CONJUNTOS DE REFERENCIA
 * RESPONSABILIDAD: HTTPS FETCH + RECONSTRUCCIÓN DE ReferenceData
 *
 * One fetch per matcher, independently optional: a source with no URL
 * configured is skipped and its matcher comes back empty in the returned
 * snapshot. A fetch that fails is logged and skipped the same way — the
 * "old data beats no data" rule `ClassifierHandle::swap` relies on means
 * callers should keep classifying against whatever snapshot is already live
 * rather than swap in a half-empty one; this function never touches a
 * `ClassifierHandle` itself, it only builds the candidate.
 */

use crate::cidr_tree::CidrTree;
use crate::errors::ClassifierError;
use crate::reference_data::{default_datacenter_exclusion_patterns, default_residential_inclusion_patterns, ReferenceData};
use chrono::{DateTime, Utc};
use honeytrap_core_models::ClassificationReferenceSet;
use regex::RegexSet;
use tracing::{instrument, warn};

const DEFAULT_TTL_SECONDS: i64 = 6 * 3600;

/// URLs for each matcher's upstream list. Any field left `None`/empty keeps
/// that matcher's reference set empty in the returned `ReferenceData`.
#[derive(Debug, Clone, Default)]
pub struct RefreshSources {
    pub tor_exit_list_url: Option<String>,
    /// `(provider_label, list_url)` pairs, one per cloud provider tree.
    pub cloud_cidr_urls: Vec<(String, String)>,
    pub datacenter_cidr_url: Option<String>,
}

/// Fetches every configured source and assembles a fresh `ReferenceData`.
/// Residential AS-name patterns are the built-in defaults, not fetched —
/// there's no upstream list for that heuristic, only the ones baked into
/// `reference_data.rs`.
#[instrument(skip(client, sources))]
pub async fn refresh_reference_data(sources: &RefreshSources, client: &reqwest::Client, now: DateTime<Utc>) -> ReferenceData {
    let mut data = ReferenceData::empty(now);

    if let Some(url) = &sources.tor_exit_list_url {
        match fetch_lines(client, url).await {
            Ok(lines) => {
                data.tor_exit_ips = lines;
                data.tor_meta = meta("tor_exit_set", url, now);
            }
            Err(error) => warn!(%error, url, "tor exit list refresh failed, matcher stays empty"),
        }
    }

    let mut cloud_trees = Vec::with_capacity(sources.cloud_cidr_urls.len());
    let mut cloud_sources = Vec::new();
    for (provider, url) in &sources.cloud_cidr_urls {
        match fetch_cidr_tree(client, url).await {
            Ok(tree) => {
                cloud_trees.push((provider.clone(), tree));
                cloud_sources.push(url.clone());
            }
            Err(error) => warn!(%error, url, provider, "cloud CIDR refresh failed, provider skipped"),
        }
    }
    if !cloud_sources.is_empty() {
        data.cloud_meta = meta("cloud_cidr_trees", &cloud_sources.join(","), now);
    }
    data.cloud_trees = cloud_trees;

    if let Some(url) = &sources.datacenter_cidr_url {
        match fetch_cidr_tree(client, url).await {
            Ok(tree) => {
                data.datacenter_tree = tree;
                data.datacenter_meta = meta("datacenter_cidr_tree", url, now);
            }
            Err(error) => warn!(%error, url, "datacenter CIDR refresh failed, matcher stays empty"),
        }
    }

    match RegexSet::new(default_datacenter_exclusion_patterns()) {
        Ok(set) => data.residential_exclude_patterns = set,
        Err(error) => warn!(%error, "builtin datacenter exclusion patterns failed to compile"),
    }
    match RegexSet::new(default_residential_inclusion_patterns()) {
        Ok(set) => data.residential_include_patterns = set,
        Err(error) => warn!(%error, "builtin residential inclusion patterns failed to compile"),
    }
    data.residential_meta = meta("residential_as_name_heuristic", "builtin", now);

    data
}

fn meta(name: &str, source_url: &str, now: DateTime<Utc>) -> ClassificationReferenceSet {
    ClassificationReferenceSet { name: name.to_string(), source_url: source_url.to_string(), fetched_at: now, ttl_seconds: DEFAULT_TTL_SECONDS }
}

async fn fetch_lines(client: &reqwest::Client, url: &str) -> Result<std::collections::HashSet<String>, ClassifierError> {
    let response = client.get(url).send().await.map_err(|e| ClassifierError::FetchFailed(e.to_string()))?;
    let body = response
        .error_for_status()
        .map_err(|e| ClassifierError::FetchFailed(e.to_string()))?
        .text()
        .await
        .map_err(|e| ClassifierError::FetchFailed(e.to_string()))?;
    Ok(body.lines().map(str::trim).filter(|line| !line.is_empty() && !line.starts_with('#')).map(String::from).collect())
}

async fn fetch_cidr_tree(client: &reqwest::Client, url: &str) -> Result<CidrTree, ClassifierError> {
    let response = client.get(url).send().await.map_err(|e| ClassifierError::FetchFailed(e.to_string()))?;
    let body = response
        .error_for_status()
        .map_err(|e| ClassifierError::FetchFailed(e.to_string()))?
        .text()
        .await
        .map_err(|e| ClassifierError::FetchFailed(e.to_string()))?;

    let mut entries = Vec::new();
    for line in body.lines().map(str::trim).filter(|line| !line.is_empty() && !line.starts_with('#')) {
        let net = line.parse().map_err(|_| ClassifierError::MalformedCidr(line.to_string()))?;
        entries.push((net, None));
    }
    Ok(CidrTree::from_entries(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sources_yield_a_reference_data_with_builtin_residential_patterns_only() {
        let sources = RefreshSources::default();
        assert!(sources.cloud_cidr_urls.is_empty());
        assert!(sources.tor_exit_list_url.is_none());
        assert!(sources.datacenter_cidr_url.is_none());
    }
}

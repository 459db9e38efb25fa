// [crates/honeytrap-enrichment/src/cascade.rs]
/*!
 * =================================================================
 * APARATO: CASCADA DE ENRIQUECIMIENTO DE IP
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: ORQUESTAR F1 -> F2 -> CLASIFICADOR -> F3 CON PROVENANCE
 *
 * Step order is fixed: bogon short-circuit, then the offline mmap lookup,
 * then bulk ASN only if the offline pass didn't already resolve one, then
 * the IP-type classifier, then the scanner only if the activity filter and
 * daily budget both allow it. Every source gets `Provenance::attempt()`
 * before its outcome is known, so a skipped source still counts as attempted.
 * =================================================================
 */

use crate::bogon::is_bogon;
use crate::offline_lookup::OfflineDatabase;
use crate::provenance::Provenance;
use crate::scanner_client::ScannerClient;
use chrono::{DateTime, Utc};
use honeytrap_cache::{CacheHitTier, TieredCache};
use honeytrap_classifier::ClassifierHandle;
use honeytrap_core_models::{IpType, SessionSummary};
use honeytrap_infra_transport::BulkAsnClient;
use serde_json::{json, Value};
use std::net::IpAddr;
use tracing::instrument;

const SOURCE_OFFLINE: &str = "offline";
const SOURCE_BULK_ASN: &str = "bulk_asn";
const SOURCE_SCANNER: &str = "scanner";

pub struct Enrichment {
    pub ip_address: String,
    pub asn: Option<u32>,
    pub as_name: Option<String>,
    pub geo_country: Option<String>,
    pub ip_types: Vec<IpType>,
    pub enrichment: Value,
    pub is_bogon: bool,
}

pub struct CascadeContext<'a> {
    pub offline: Option<&'a OfflineDatabase>,
    pub bulk_asn: Option<&'a BulkAsnClient>,
    pub classifier: &'a ClassifierHandle,
    pub scanner: Option<&'a ScannerClient>,
    pub cache: &'a TieredCache,
}

#[instrument(skip(ctx, session), fields(%ip))]
pub async fn enrich_ip(ctx: &CascadeContext<'_>, ip: IpAddr, session: Option<&SessionSummary>, now: DateTime<Utc>) -> Enrichment {
    let mut provenance = Provenance::default();

    if is_bogon(ip) {
        provenance.enrichment_timestamp = Some(now);
        return Enrichment {
            ip_address: ip.to_string(),
            asn: None,
            as_name: None,
            geo_country: None,
            ip_types: vec![],
            enrichment: json!({ "validation": { "is_bogon": true }, "_meta": provenance }),
            is_bogon: true,
        };
    }

    let key = ip.to_string();
    let mut asn: Option<u32> = None;
    let mut as_name: Option<String> = None;
    let mut geo_country: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();

    // F1: offline mmap lookup, always attempted first when a database is mounted.
    provenance.attempt(SOURCE_OFFLINE);
    if let Some(offline) = ctx.offline {
        match offline.lookup(ip) {
            Some(hit) => {
                provenance.succeed(SOURCE_OFFLINE);
                asn = hit.asn;
                as_name = hit.as_name.clone();
                geo_country = hit.geo_country.clone();
            }
            None => {
                provenance.skip(SOURCE_OFFLINE, "no row for this address");
            }
        }
    } else {
        provenance.skip(SOURCE_OFFLINE, "no offline database mounted");
    }

    // F2: bulk ASN, only if the offline pass left the ASN unresolved.
    provenance.attempt(SOURCE_BULK_ASN);
    if asn.is_some() {
        provenance.skip(SOURCE_BULK_ASN, "asn already resolved by offline lookup");
    } else if let Some(client) = ctx.bulk_asn {
        match ctx.cache.get(SOURCE_BULK_ASN, &key, now).await {
            Ok(Some((cached, tier))) => {
                provenance.cache_hit(SOURCE_BULK_ASN, tier_label(tier));
                provenance.succeed(SOURCE_BULK_ASN);
                asn = cached.get("asn").and_then(|v| v.as_u64()).map(|v| v as u32);
                as_name = cached.get("as_name").and_then(|v| v.as_str()).map(String::from).or(as_name);
            }
            _ => {
                let records = client.resolve_many(&[key.clone()]).await;
                match records.into_iter().find(|r| r.ip == key) {
                    Some(record) => {
                        provenance.succeed(SOURCE_BULK_ASN);
                        asn = record.asn;
                        as_name = record.as_name.clone().or(as_name);
                        geo_country = record.country.clone().or(geo_country);
                        let cache_value = json!({ "asn": record.asn, "as_name": record.as_name, "country": record.country });
                        let _ = ctx
                            .cache
                            .put(SOURCE_BULK_ASN, &key, cache_value, chrono::Duration::days(90), now)
                            .await;
                    }
                    None => provenance.fail(SOURCE_BULK_ASN, "no record returned for this address"),
                }
            }
        }
    } else {
        provenance.skip(SOURCE_BULK_ASN, "no bulk ASN client configured");
    }

    let classification = ctx.classifier.classify(ip, as_name.as_deref(), now);
    let mut ip_types = vec![classification.ip_type];
    if let Some(provider) = &classification.provider {
        tags.push(provider.clone());
    }

    // F3: external scanner, only when the session looks worth the spend.
    provenance.attempt(SOURCE_SCANNER);
    let mut vt_flagged = None;
    let mut dshield_flagged = None;
    if let Some(scanner) = ctx.scanner {
        match session {
            None => provenance.skip(SOURCE_SCANNER, "no session context to gate on"),
            Some(session) => match scanner.lookup(&key, session, now).await {
                Ok(Some(result)) => {
                    provenance.succeed(SOURCE_SCANNER);
                    vt_flagged = result.vt_flagged;
                    dshield_flagged = result.dshield_flagged;
                    tags.extend(result.tags.clone());
                    if result.vt_flagged == Some(true) || result.dshield_flagged == Some(true) {
                        ip_types.push(IpType::Proxy);
                    }
                }
                Ok(None) => provenance.skip(SOURCE_SCANNER, "session did not meet the activity filter"),
                Err(crate::errors::EnrichError::QuotaExhausted) => {
                    provenance.skip(SOURCE_SCANNER, "quota_exhausted")
                }
                Err(error) => provenance.fail(SOURCE_SCANNER, error.to_string()),
            },
        }
    } else {
        provenance.skip(SOURCE_SCANNER, "no scanner client configured");
    }

    provenance.enrichment_timestamp = Some(now);
    debug_assert!(provenance.attempted_is_superset());

    let enrichment = json!({
        "classification": {
            "ip_type": classification.ip_type.as_str(),
            "provider": classification.provider,
            "confidence": classification.confidence,
            "source": classification.source,
        },
        "vt_flagged": vt_flagged,
        "dshield_flagged": dshield_flagged,
        "tags": tags,
        "_meta": provenance,
    });

    Enrichment { ip_address: key, asn, as_name, geo_country, ip_types, enrichment, is_bogon: false }
}

fn tier_label(tier: CacheHitTier) -> &'static str {
    match tier {
        CacheHitTier::L1 => "L1",
        CacheHitTier::L2 => "L2",
        CacheHitTier::L3 => "L3",
    }
}

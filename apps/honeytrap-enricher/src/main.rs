// [apps/honeytrap-enricher/src/main.rs]
/*!
 * APARATO: HONEYTRAP ENRICHER SHELL
 * CLASIFICACIÓN: APPLICATION LAYER (ENTRY POINT)
 * RESPONSABILIDAD: POOL DE TRABAJADORES SOBRE LA CASCADA DE ENRIQUECIMIENTO
 *
 * Bounded concurrency follows `min(configured_cap, remaining_scanner_budget /
 * 100, 1 + cpu_count)` so a large pending queue never drives the scanner
 * past its own per-second ceiling.
 */

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use honeytrap_cache::{L1Cache, L2Cache, L3Cache, TieredCache};
use honeytrap_classifier::{refresh_reference_data, ClassifierHandle, ReferenceData, RefreshSources};
use honeytrap_core_models::{IpInventory, SessionSummary};
use honeytrap_enrichment::cascade::{enrich_ip, CascadeContext, Enrichment};
use honeytrap_enrichment::offline_lookup::OfflineDatabase;
use honeytrap_enrichment::scanner_client::ScannerClient;
use honeytrap_infra_db::repositories::{CacheRepository, IpInventoryRepository, SessionSummaryRepository};
use honeytrap_infra_db::StoreClient;
use honeytrap_infra_transport::BulkAsnClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Ejecuta la cascada de enriquecimiento sobre sesiones pendientes.")]
struct CommandArguments {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(long, env = "DATABASE_AUTH_TOKEN")]
    database_auth_token: Option<String>,

    /// Endpoint del servicio de whois masivo (`host:43`).
    #[arg(long, env = "BULK_ASN_ENDPOINT")]
    bulk_asn_endpoint: Option<String>,

    /// URL base del escáner externo opcional (VT/DShield/etc).
    #[arg(long, env = "SCANNER_BASE_URL")]
    scanner_base_url: Option<String>,

    #[arg(long, env = "SCANNER_API_KEY")]
    scanner_api_key: Option<String>,

    /// Presupuesto diario de consultas al escáner.
    #[arg(long, default_value_t = 1_000)]
    scanner_daily_budget: i64,

    /// Techo de concurrencia configurado por el operador.
    #[arg(long, default_value_t = 8)]
    max_concurrency: usize,

    /// Sesiones pendientes a procesar por corrida.
    #[arg(long, default_value_t = 500)]
    batch_limit: u32,

    /// Raíz del caché L3 fragmentado en disco; si se omite, L3 queda deshabilitado.
    #[arg(long, env = "CACHE_ROOT")]
    cache_root: Option<std::path::PathBuf>,

    /// Ruta al archivo geo/ASN offline mapeado en memoria (F1); si se omite, F1 queda deshabilitado.
    #[arg(long, env = "OFFLINE_DB_PATH")]
    offline_db_path: Option<std::path::PathBuf>,

    /// Antigüedad máxima tolerada del archivo offline antes de marcarlo obsoleto.
    #[arg(long, default_value_t = 30)]
    offline_staleness_threshold_days: i64,

    /// URL del listado de IPs de salida TOR; si se omite, ese matcher queda vacío.
    #[arg(long, env = "TOR_EXIT_LIST_URL")]
    tor_exit_list_url: Option<String>,

    /// Rangos CIDR de un proveedor cloud, como `aws=https://.../ranges.txt`. Repetible.
    #[arg(long = "cloud-cidr-url", value_parser = parse_cloud_cidr_url)]
    cloud_cidr_urls: Vec<(String, String)>,

    /// URL del listado CIDR de datacenters genéricos; si se omite, ese matcher queda vacío.
    #[arg(long, env = "DATACENTER_CIDR_URL")]
    datacenter_cidr_url: Option<String>,
}

fn parse_cloud_cidr_url(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((provider, url)) if !provider.is_empty() && !url.is_empty() => Ok((provider.to_string(), url.to_string())),
        _ => Err(format!("expected `provider=url`, got `{raw}`")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    honeytrap_observability::init_tracing("honeytrap-enricher");

    let arguments = CommandArguments::parse();
    let now = Utc::now();

    let client = StoreClient::connect(&arguments.database_url, arguments.database_auth_token.clone())
        .await
        .context("failed to connect to the store")?;

    let session_repository = SessionSummaryRepository::new(client.clone());
    let ip_repository = Arc::new(IpInventoryRepository::new(client.clone()));

    let pending = session_repository.list_pending_enrichment(arguments.batch_limit).await?;
    info!(pending = pending.len(), "sessions awaiting enrichment");
    if pending.is_empty() {
        return Ok(());
    }

    let refresh_sources = RefreshSources {
        tor_exit_list_url: arguments.tor_exit_list_url.clone(),
        cloud_cidr_urls: arguments.cloud_cidr_urls.clone(),
        datacenter_cidr_url: arguments.datacenter_cidr_url.clone(),
    };
    let reference_data = if refresh_sources.tor_exit_list_url.is_some()
        || !refresh_sources.cloud_cidr_urls.is_empty()
        || refresh_sources.datacenter_cidr_url.is_some()
    {
        let http_client = reqwest::Client::new();
        refresh_reference_data(&refresh_sources, &http_client, now).await
    } else {
        info!("no classifier reference-data sources configured, classifying against an empty snapshot");
        ReferenceData::empty(now)
    };
    let classifier = Arc::new(ClassifierHandle::new(reference_data));

    let l1 = Some(L1Cache::new());
    let l2 = Some(L2Cache::new(CacheRepository::new(client.clone())));
    let l3 = arguments.cache_root.clone().map(L3Cache::new);
    if l3.is_none() {
        info!("no --cache-root configured, L3 disk cache disabled");
    }
    let cache = Arc::new(TieredCache::new(l1, l2, l3));

    let offline = match &arguments.offline_db_path {
        Some(path) => match OfflineDatabase::open(path, now, arguments.offline_staleness_threshold_days) {
            Ok(database) => Some(Arc::new(database)),
            Err(error) => {
                warn!(%error, path = %path.display(), "failed to open offline geo/ASN database, F1 disabled");
                None
            }
        },
        None => {
            info!("no --offline-db-path configured, F1 offline lookup disabled");
            None
        }
    };
    let bulk_asn = arguments
        .bulk_asn_endpoint
        .map(|endpoint| Arc::new(BulkAsnClient::new(endpoint, Duration::from_secs(30))));
    let scanner = match (&arguments.scanner_base_url, arguments.scanner_daily_budget) {
        (Some(base_url), budget) if budget > 0 => Some(Arc::new(ScannerClient::new(
            base_url.clone(),
            arguments.scanner_api_key.clone(),
            budget,
            budget as f64 / 86_400.0,
            now,
        ))),
        _ => None,
    };

    let remaining_budget = scanner.as_ref().map(|s| s.remaining_budget(now)).unwrap_or(i64::MAX);
    let cpu_slots = 1 + num_cpus_hint();
    let concurrency = [arguments.max_concurrency, (remaining_budget.max(0) as usize / 100).max(1), cpu_slots]
        .into_iter()
        .min()
        .unwrap_or(1)
        .max(1);
    info!(concurrency, "enrichment pool sized");

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut handles = Vec::with_capacity(pending.len());

    for session in pending {
        let Some(ip_str) = session.source_ip.clone() else { continue };
        let semaphore = Arc::clone(&semaphore);
        let classifier = Arc::clone(&classifier);
        let cache = Arc::clone(&cache);
        let offline = offline.clone();
        let bulk_asn = bulk_asn.clone();
        let scanner = scanner.clone();
        let ip_repository = Arc::clone(&ip_repository);
        let session_repository_client = client.clone();

        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore never closes");
            let parsed_ip = match ip_str.parse() {
                Ok(ip) => ip,
                Err(_) => {
                    warn!(ip = %ip_str, "skipping unparsable source_ip");
                    return;
                }
            };

            let ctx = CascadeContext {
                offline: offline.as_deref(),
                bulk_asn: bulk_asn.as_deref(),
                classifier: &classifier,
                scanner: scanner.as_deref(),
                cache: &cache,
            };

            let enrichment = enrich_ip(&ctx, parsed_ip, Some(&session), now).await;
            if enrichment.is_bogon {
                return;
            }

            if let Err(error) = persist_enrichment(&ip_repository, &enrichment, now).await {
                warn!(%error, ip = %ip_str, "failed to persist enrichment");
                return;
            }

            let session_repo = SessionSummaryRepository::new(session_repository_client);
            if let Err(error) = stamp_snapshot(&session_repo, &session, &enrichment, now).await {
                warn!(%error, session_id = %session.session_id, "failed to stamp session snapshot");
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}

async fn persist_enrichment(
    ip_repository: &IpInventoryRepository,
    enrichment: &Enrichment,
    now: chrono::DateTime<Utc>,
) -> Result<(), honeytrap_infra_db::DbError> {
    let ip_types = enrichment.ip_types.clone();
    let inventory = IpInventory {
        ip_address: enrichment.ip_address.clone(),
        current_asn: enrichment.asn,
        as_name: enrichment.as_name.clone(),
        enrichment: enrichment.enrichment.clone(),
        enrichment_updated_at: now,
        ip_types,
        geo_country: enrichment.geo_country.clone(),
        primary_ip_type: None,
    };
    ip_repository.upsert(&inventory).await
}

/// Write-once snapshot columns only reach `SessionSummary` through the same
/// `COALESCE` upsert the loader uses; a zero-delta patch leaves counters
/// untouched while still carrying the new snapshot values across.
async fn stamp_snapshot(
    session_repository: &SessionSummaryRepository,
    session: &SessionSummary,
    enrichment: &Enrichment,
    now: chrono::DateTime<Utc>,
) -> Result<(), honeytrap_infra_db::DbError> {
    use honeytrap_core_models::IpType;

    let snapshot_ip_type = IpType::first_by_priority(&enrichment.ip_types).map(|t| t.as_str().to_string());
    let patch = SessionSummary {
        session_id: session.session_id.clone(),
        sensor: session.sensor.clone(),
        event_count: 0,
        command_count: 0,
        file_downloads: 0,
        login_attempts: 0,
        first_event_at: session.first_event_at,
        last_event_at: session.last_event_at,
        highest_risk: 0.0,
        vt_flagged: false,
        dshield_flagged: false,
        ssh_key_injections: 0,
        enrichment: session.enrichment.clone(),
        source_ip: session.source_ip.clone(),
        snapshot_asn: enrichment.asn,
        snapshot_country: enrichment.geo_country.clone(),
        snapshot_ip_type,
        enrichment_at: Some(now),
    };
    session_repository.upsert(&patch).await
}

fn num_cpus_hint() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

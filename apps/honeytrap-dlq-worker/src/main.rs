// [apps/honeytrap-dlq-worker/src/main.rs]
/*!
 * APARATO: HONEYTRAP DLQ WORKER SHELL
 * CLASIFICACIÓN: APPLICATION LAYER (ENTRY POINT)
 * RESPONSABILIDAD: CICLO DE ARRIENDO/REINTENTO SOBRE LA COLA DE CARTAS MUERTAS
 *
 * `schema_violation` and `encoding_error` rows never succeed on a bare
 * retry — the bytes that produced them haven't changed — so the worker
 * closes them out on first claim rather than re-leasing them forever.
 * Everything else gets a bounded number of passes through the validator
 * before the circuit breaker's failure count takes over.
 */

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use honeytrap_core_models::dead_letter::{DeadLetterReason, ErrorHistoryEntry};
use honeytrap_core_models::RawEvent;
use honeytrap_infra_db::repositories::{DeadLetterRepository, RawEventRepository, SessionSummaryRepository};
use honeytrap_infra_db::StoreClient;
use honeytrap_ingest::aggregator::SessionAggregator;
use honeytrap_ingest::to_session_summary;
use honeytrap_ingest::validator::{EventValidator, ValidationOutcome};
use honeytrap_ingest::CircuitBreaker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

const LEASE_SECONDS: i64 = 60;
const CIRCUIT_OPEN_SECONDS: i64 = 60;
const CIRCUIT_FAILURE_THRESHOLD: u32 = 5;
const IDLE_BACKOFF_MS: u64 = 500;
const RATE_LIMIT_PAUSE_EVERY: u32 = 100;
const RATE_LIMIT_PAUSE_MS: u64 = 50;

#[derive(Parser, Debug)]
#[command(author, version, about = "Procesa la cola de cartas muertas con arriendo y disyuntor de fallos.")]
struct CommandArguments {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(long, env = "DATABASE_AUTH_TOKEN")]
    database_auth_token: Option<String>,

    /// Identificador de este proceso, usado como token de arriendo.
    #[arg(long, default_value_t = uuid::Uuid::new_v4().to_string())]
    worker_id: String,

    /// Máximo de filas a drenar antes de terminar (0 = hasta vaciar la cola).
    #[arg(long, default_value_t = 0)]
    max_rows: u64,

    /// Tamaño máximo de línea aceptado en esta corrida de revalidación.
    #[arg(long, default_value_t = honeytrap_ingest::DEFAULT_MAX_LINE_BYTES)]
    max_line_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    honeytrap_observability::init_tracing("honeytrap-dlq-worker");

    let arguments = CommandArguments::parse();

    let client = StoreClient::connect(&arguments.database_url, arguments.database_auth_token.clone())
        .await
        .context("failed to connect to the store")?;
    let repository = DeadLetterRepository::new(client.clone());
    let raw_event_repository = RawEventRepository::new(client.clone());
    let session_summary_repository = SessionSummaryRepository::new(client);
    let validator = EventValidator::new(arguments.max_line_bytes);
    let breaker = CircuitBreaker::new(CIRCUIT_FAILURE_THRESHOLD, CIRCUIT_OPEN_SECONDS);

    let shutdown_requested = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown_requested);
    ctrlc::set_handler(move || {
        warn!("shutdown requested, draining in-flight lease then stopping");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .ok();

    let mut processed: u64 = 0;
    let mut resolved: u64 = 0;
    let mut reopened: u64 = 0;

    loop {
        if shutdown_requested.load(Ordering::SeqCst) {
            break;
        }
        if arguments.max_rows > 0 && processed >= arguments.max_rows {
            break;
        }

        let now = Utc::now();
        if !breaker.allow(now) {
            tokio::time::sleep(std::time::Duration::from_millis(IDLE_BACKOFF_MS)).await;
            continue;
        }

        let claimed = repository.claim_next(&arguments.worker_id, chrono::Duration::seconds(LEASE_SECONDS), now).await?;
        let Some(dlq) = claimed else {
            info!("dead-letter queue drained");
            break;
        };

        let outcome = reprocess(&validator, &dlq);
        match outcome {
            Ok(recovered) => {
                if let Some(event) = recovered {
                    if let Err(error) = persist_recovered(&raw_event_repository, &session_summary_repository, event).await {
                        warn!(%error, dlq_id = %dlq.id, "recovered event failed to persist, leaving dead letter open");
                        repository
                            .record_failure(&dlq.id, append_history(&dlq.error_history, "persist_failed", &error.to_string(), now), now)
                            .await?;
                        breaker.record_failure(now);
                        reopened += 1;
                        processed += 1;
                        continue;
                    }
                }
                repository
                    .record_success(&dlq.id, append_history(&dlq.error_history, "resolved", "closed by dlq worker", now), now)
                    .await?;
                breaker.record_success();
                resolved += 1;
            }
            Err(message) => {
                repository
                    .record_failure(&dlq.id, append_history(&dlq.error_history, "retry_failed", &message, now), now)
                    .await?;
                breaker.record_failure(now);
                reopened += 1;
            }
        }

        processed += 1;
        if processed % RATE_LIMIT_PAUSE_EVERY as u64 == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(RATE_LIMIT_PAUSE_MS)).await;
        }
    }

    info!(processed, resolved, reopened, "dlq worker run complete");
    Ok(())
}

/// Re-runs validation over the quarantined payload. Terminal reasons close
/// immediately since the bytes never change and nothing was ever recovered;
/// everything else gets one more pass through the validator in case
/// configuration (e.g. `max_line_bytes`) has since widened. `Ok(Some(event))`
/// carries the now-valid event back to the caller so it can be inserted into
/// `raw_events` and folded into a `SessionSummary` before the dead letter is
/// marked resolved — a row is never closed out without its data reaching the
/// main store.
fn reprocess(validator: &EventValidator, dlq: &honeytrap_core_models::DeadLetterEvent) -> Result<Option<RawEvent>, String> {
    if matches!(dlq.reason, DeadLetterReason::SchemaViolation | DeadLetterReason::EncodingError) {
        return Ok(None);
    }

    let now = Utc::now();
    match validator.validate(&dlq.ingest_id, &dlq.source_path, dlq.source_offset, &dlq.raw_payload, now) {
        ValidationOutcome::Valid(event) => Ok(Some(event)),
        ValidationOutcome::Invalid(_) => Err(format!("still fails validation under reason {}", dlq.reason.as_str())),
    }
}

/// Inserts the recovered event and folds it into its session's aggregate
/// using the same additive upsert a normal batch commit relies on, so a
/// session recovered one event at a time ends up identical to one recovered
/// in bulk.
async fn persist_recovered(
    raw_event_repository: &RawEventRepository,
    session_summary_repository: &SessionSummaryRepository,
    event: RawEvent,
) -> Result<(), honeytrap_infra_db::DbError> {
    raw_event_repository.insert(&event).await?;

    let mut aggregator = SessionAggregator::new();
    aggregator.fold(&event);
    for aggregate in aggregator.into_aggregates() {
        session_summary_repository.upsert(&to_session_summary(aggregate)).await?;
    }
    Ok(())
}

fn append_history(existing: &[ErrorHistoryEntry], error_class: &str, message: &str, now: chrono::DateTime<Utc>) -> Vec<ErrorHistoryEntry> {
    let mut history = existing.to_vec();
    history.push(ErrorHistoryEntry { timestamp: now, error_class: error_class.to_string(), message: message.to_string() });
    history
}

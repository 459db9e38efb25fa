// [apps/honeytrap-loader/src/main.rs]
/*!
 * APARATO: HONEYTRAP LOADER SHELL
 * CLASIFICACIÓN: APPLICATION LAYER (ENTRY POINT)
 * RESPONSABILIDAD: ORQUESTACIÓN DE ARGUMENTOS Y DISPARO DEL CARGADOR BULK/DELTA
 */

use anyhow::{Context, Result};
use clap::Parser;
use honeytrap_infra_db::repositories::CursorRepository;
use honeytrap_infra_db::{StoreClient, UnitOfWork};
use honeytrap_ingest::loader::ResumePoint;
use honeytrap_ingest::{BulkDeltaLoader, DEFAULT_MAX_LINE_BYTES};
use std::collections::HashMap;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Carga bulk/delta de eventos honeypot hacia el store.")]
struct CommandArguments {
    /// Rutas de los archivos de eventos a ingerir (planas, .gz o .bz2).
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// URL de conexión al store (libsql local o remoto).
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Token de acceso para un store remoto.
    #[arg(long, env = "DATABASE_AUTH_TOKEN")]
    database_auth_token: Option<String>,

    /// Identificador de esta corrida de ingesta (por defecto, un UUID nuevo).
    #[arg(long)]
    ingest_id: Option<String>,

    /// Cantidad de eventos por lote antes de comprometer la transacción.
    #[arg(long, default_value_t = 2_000)]
    batch_size: usize,

    /// Segundos máximos antes de forzar el commit de un lote parcial.
    #[arg(long, default_value_t = 30)]
    batch_timeout_seconds: u64,

    /// Tamaño máximo de línea, en bytes, antes de quarantine por size_limit.
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_BYTES)]
    max_line_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    honeytrap_observability::init_tracing("honeytrap-loader");

    let arguments = CommandArguments::parse();
    let ingest_id = arguments.ingest_id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!(ingest_id = %ingest_id, sources = arguments.sources.len(), "starting ingest run");

    let client = StoreClient::connect(&arguments.database_url, arguments.database_auth_token.clone())
        .await
        .context("failed to connect to the store")?;

    let cursor_repository = CursorRepository::new(client.clone());
    let mut resume_points: HashMap<String, ResumePoint> = HashMap::new();

    for source in &arguments.sources {
        let source_key = source.to_string_lossy().to_string();
        let metadata = std::fs::metadata(source).with_context(|| format!("cannot stat source {source_key}"))?;
        let inode = metadata.ino().to_string();

        if let Some(cursor) = cursor_repository.get(&source_key, &inode).await? {
            resume_points.insert(
                source_key,
                ResumePoint { inode: cursor.inode, last_offset: cursor.last_offset, batch_index: cursor.batch_index + 1 },
            );
        }
    }

    let loader = BulkDeltaLoader::new(
        UnitOfWork::new(client),
        arguments.max_line_bytes,
        arguments.batch_size,
        std::time::Duration::from_secs(arguments.batch_timeout_seconds),
    );

    let result = loader.load(&arguments.sources, &ingest_id, resume_points).await?;

    info!(
        inserted = result.events_inserted,
        quarantined = result.events_quarantined,
        sessions = result.sessions_touched,
        batches = result.batches_committed,
        "ingest run complete"
    );

    Ok(())
}

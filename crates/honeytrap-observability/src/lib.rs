// [crates/honeytrap-observability/src/lib.rs]
/*!
 * =================================================================
 * APARATO: OBSERVABILITY INIT
 * RESPONSABILIDAD: TRAZADO ESTRUCTURADO Y CAPTURA GLOBAL DE PÁNICOS
 *
 * Development: compact, colorized, human-legible lines.
 * Production (release builds): flattened JSON, ingestible by any log
 * aggregator. Both modes honor `RUST_LOG` via `EnvFilter`.
 * =================================================================
 */

use std::panic;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Initializes the global tracing subscriber and panic hook for `service_name`.
///
/// # Panics
/// Panics if a global subscriber has already been installed in this process.
pub fn init_tracing(service_name: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{service_name}={level},libsql=warn,reqwest=warn",
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    if cfg!(debug_assertions) {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(formatting_layer::layer().compact().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(formatting_layer::layer().json().flatten_event(true))
            .init();
    }

    let service = service_name.to_string();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        tracing::error!(service = %service, %location, %payload, "panic captured before unwind");
    }));
}

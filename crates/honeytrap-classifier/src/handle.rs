// [crates/honeytrap-classifier/src/handle.rs]
/*!
 * APARATO: MANEJADOR DE CLASIFICADOR CON REFRESCO ATÓMICO
 * RESPONSABILIDAD: EXPONER classify() SOBRE UN SNAPSHOT INTERCAMBIABLE
 *
 * `refresh_*` swaps in a freshly-built `ReferenceData`; "old data beats no
 * data" — if a refresh fails upstream, callers keep classifying against the
 * previous snapshot rather than blocking or falling back to `UNKNOWN`.
 */

use crate::cascade::classify;
use crate::classification::Classification;
use crate::reference_data::ReferenceData;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{info, instrument};

pub struct ClassifierHandle {
    reference_data: RwLock<Arc<ReferenceData>>,
}

impl ClassifierHandle {
    pub fn new(initial: ReferenceData) -> Self {
        Self { reference_data: RwLock::new(Arc::new(initial)) }
    }

    pub fn classify(&self, ip: IpAddr, as_name: Option<&str>, now: DateTime<Utc>) -> Classification {
        let snapshot = self.reference_data.read().clone();
        classify(ip, as_name, &snapshot, now)
    }

    #[instrument(skip(self, updated))]
    pub fn swap(&self, updated: ReferenceData) {
        *self.reference_data.write() = Arc::new(updated);
        info!("classifier reference data swapped");
    }

    pub fn snapshot(&self) -> Arc<ReferenceData> {
        self.reference_data.read().clone()
    }
}

// [crates/honeytrap-classifier/src/classification.rs]
/*!
 * APARATO: RESULTADO DE CLASIFICACIÓN
 */

use chrono::{DateTime, Utc};
use honeytrap_core_models::IpType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    pub ip_type: IpType,
    pub provider: Option<String>,
    pub confidence: f64,
    pub source: &'static str,
    pub classified_at: DateTime<Utc>,
}

impl Classification {
    pub fn unknown(now: DateTime<Utc>) -> Self {
        Self { ip_type: IpType::Unknown, provider: None, confidence: 0.0, source: "fallback", classified_at: now }
    }
}

// [crates/honeytrap-enrichment/src/scanner_client.rs]
/*!
 * APARATO: CLIENTE DEL ESCÁNER EXTERNO (F3)
 * RESPONSABILIDAD: CONSULTA HTTP ACOTADA POR ACTIVIDAD Y PRESUPUESTO DIARIO
 *
 * Gated twice before a request ever leaves the process: the session has to
 * look interesting enough to spend a token on (`activity_filter_passes`),
 * and the day's token budget has to have something left in it
 * (`ScannerBudget::take`). A quota-exhausted call never reaches the network.
 */

use crate::errors::EnrichError;
use crate::token_bucket::TokenBucket;
use chrono::{DateTime, NaiveDate, Utc};
use honeytrap_core_models::SessionSummary;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;
use tracing::instrument;

const COMMAND_COUNT_THRESHOLD: u64 = 10;
const FILE_DOWNLOAD_THRESHOLD: u64 = 5;
const DURATION_SECONDS_THRESHOLD: i64 = 300;

/// A session only earns a scanner lookup once it looks like something a
/// human would bother investigating by hand.
pub fn activity_filter_passes(session: &SessionSummary) -> bool {
    let duration_seconds = (session.last_event_at - session.first_event_at).num_seconds();
    session.command_count >= COMMAND_COUNT_THRESHOLD
        || session.file_downloads >= FILE_DOWNLOAD_THRESHOLD
        || session.vt_flagged
        || duration_seconds >= DURATION_SECONDS_THRESHOLD
}

struct BudgetState {
    remaining: i64,
    day: NaiveDate,
}

pub struct ScannerBudget {
    daily_limit: i64,
    state: Mutex<BudgetState>,
}

impl ScannerBudget {
    pub fn new(daily_limit: i64, now: DateTime<Utc>) -> Self {
        Self { daily_limit, state: Mutex::new(BudgetState { remaining: daily_limit, day: now.date_naive() }) }
    }

    /// Resets at the UTC calendar-day boundary. Returns `false` without
    /// mutating state once the day's tokens are gone.
    pub fn take(&self, now: DateTime<Utc>) -> bool {
        let mut state = self.state.lock();
        if now.date_naive() != state.day {
            state.day = now.date_naive();
            state.remaining = self.daily_limit;
        }
        if state.remaining <= 0 {
            return false;
        }
        state.remaining -= 1;
        true
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> i64 {
        let mut state = self.state.lock();
        if now.date_naive() != state.day {
            state.day = now.date_naive();
            state.remaining = self.daily_limit;
        }
        state.remaining
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScannerResult {
    pub vt_flagged: Option<bool>,
    pub dshield_flagged: Option<bool>,
    pub password_breach_hits: Option<u32>,
    pub tags: Vec<String>,
}

pub struct ScannerClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    budget: ScannerBudget,
    rate_limiter: TokenBucket,
}

impl ScannerClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, daily_limit: i64, per_second_limit: f64, now: DateTime<Utc>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.into(),
            api_key,
            budget: ScannerBudget::new(daily_limit, now),
            rate_limiter: TokenBucket::new(per_second_limit, per_second_limit),
        }
    }

    pub fn remaining_budget(&self, now: DateTime<Utc>) -> i64 {
        self.budget.remaining(now)
    }

    /// Returns `Ok(None)` when the activity filter rejects the session —
    /// that's not a failure, just nothing worth spending a token on.
    #[instrument(skip(self, session), fields(%ip))]
    pub async fn lookup(&self, ip: &str, session: &SessionSummary, now: DateTime<Utc>) -> Result<Option<ScannerResult>, EnrichError> {
        if !activity_filter_passes(session) {
            return Ok(None);
        }
        if !self.budget.take(now) {
            return Err(EnrichError::QuotaExhausted);
        }
        if !self.rate_limiter.try_allow(1.0) {
            return Err(EnrichError::SourceUnavailable("scanner rate limit exceeded".into()));
        }

        let mut request = self.http.get(format!("{}/v1/ip/{}", self.base_url, ip));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EnrichError::SourceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EnrichError::SourceUnavailable(format!("scanner returned {}", response.status())));
        }

        let body = response
            .json::<ScannerResult>()
            .await
            .map_err(|e| EnrichError::SourceUnavailable(e.to_string()))?;

        Ok(Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_session() -> SessionSummary {
        let now = Utc::now();
        SessionSummary {
            session_id: "s1".into(),
            sensor: "cowrie-1".into(),
            event_count: 1,
            command_count: 0,
            file_downloads: 0,
            login_attempts: 1,
            first_event_at: now,
            last_event_at: now,
            highest_risk: 0.0,
            vt_flagged: false,
            dshield_flagged: false,
            ssh_key_injections: 0,
            enrichment: serde_json::json!({}),
            source_ip: None,
            snapshot_asn: None,
            snapshot_country: None,
            snapshot_ip_type: None,
            enrichment_at: None,
        }
    }

    #[test]
    fn quiet_session_fails_the_activity_filter() {
        assert!(!activity_filter_passes(&base_session()));
    }

    #[test]
    fn high_command_count_passes_the_filter() {
        let mut session = base_session();
        session.command_count = 10;
        assert!(activity_filter_passes(&session));
    }

    #[test]
    fn long_duration_passes_the_filter() {
        let mut session = base_session();
        session.last_event_at = session.first_event_at + Duration::seconds(301);
        assert!(activity_filter_passes(&session));
    }

    #[test]
    fn budget_resets_on_a_new_utc_day() {
        let day_one = DateTime::parse_from_rfc3339("2026-01-01T23:00:00Z").unwrap().with_timezone(&Utc);
        let day_two = DateTime::parse_from_rfc3339("2026-01-02T00:00:01Z").unwrap().with_timezone(&Utc);
        let budget = ScannerBudget::new(1, day_one);
        assert!(budget.take(day_one));
        assert!(!budget.take(day_one));
        assert!(budget.take(day_two));
    }
}

// [crates/honeytrap-ingest/src/aggregator.rs]
/*!
 * APARATO: AGREGADOR DE SESIONES
 * RESPONSABILIDAD: PLEGADO DE EVENTOS VÁLIDOS EN ESTADO POR SESIÓN
 *
 * Lives for the duration of one batch; `fold` must be called in stream
 * order so `SessionAggregate::observe_source_ip`'s "first wins" rule pins
 * the right canonical IP.
 */

use honeytrap_core_models::aggregate::SessionAggregate;
use honeytrap_core_models::RawEvent;
use std::collections::BTreeMap;

const COMMAND_EVENT_TYPES: &[&str] = &["cowrie.command.input", "cowrie.command.failed"];
const DOWNLOAD_EVENT_TYPES: &[&str] = &["cowrie.session.file_download", "cowrie.session.file_upload"];
const LOGIN_EVENT_TYPES: &[&str] = &["cowrie.login.success", "cowrie.login.failed"];
const SSH_KEY_EVENT_TYPE: &str = "cowrie.client.ssh_key_injection";

#[derive(Default)]
pub struct SessionAggregator {
    sessions: BTreeMap<String, SessionAggregate>,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold(&mut self, event: &RawEvent) {
        if event.quarantined {
            return;
        }

        let aggregate = self
            .sessions
            .entry(event.session_id.clone())
            .or_insert_with(|| SessionAggregate::new(event.session_id.clone(), sensor_from_path(&event.source_path), event.timestamp));

        aggregate.touch(event.timestamp);
        aggregate.event_count += 1;
        aggregate.source_files.insert(event.source_path.clone());
        aggregate.highest_risk = aggregate.highest_risk.max(event.risk_score);

        if COMMAND_EVENT_TYPES.contains(&event.event_type.as_str()) {
            aggregate.command_count += 1;
        }
        if DOWNLOAD_EVENT_TYPES.contains(&event.event_type.as_str()) {
            aggregate.file_downloads += 1;
        }
        if LOGIN_EVENT_TYPES.contains(&event.event_type.as_str()) {
            aggregate.login_attempts += 1;
        }
        if event.event_type == SSH_KEY_EVENT_TYPE {
            aggregate.ssh_key_injections += 1;
            if let Some(payload) = &event.payload {
                if let Some(key) = payload.get("ssh_key").and_then(|v| v.as_str()) {
                    aggregate.unique_ssh_keys.insert(key.to_string());
                }
            }
        }

        if let Some(payload) = &event.payload {
            let candidate_ip = payload
                .get("src_ip")
                .or_else(|| payload.get("peer_ip"))
                .and_then(|v| v.as_str());
            aggregate.observe_source_ip(candidate_ip);
        }
    }

    pub fn into_aggregates(self) -> Vec<SessionAggregate> {
        self.sessions.into_values().collect()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }
}

fn sensor_from_path(source_path: &str) -> String {
    std::path::Path::new(source_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source_path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn event(session: &str, event_type: &str, offset: u64, src_ip: Option<&str>) -> RawEvent {
        let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let mut payload = json!({});
        if let Some(ip) = src_ip {
            payload["src_ip"] = json!(ip);
        }
        RawEvent::valid("ing-1", "cowrie.log", offset, session, event_type, timestamp, payload, 0.1)
    }

    #[test]
    fn canonical_ip_pins_on_first_observation() {
        let mut aggregator = SessionAggregator::new();
        aggregator.fold(&event("s1", "cowrie.login.success", 0, Some("203.0.113.5")));
        aggregator.fold(&event("s1", "cowrie.command.input", 1, Some("198.51.100.9")));

        let aggregates = aggregator.into_aggregates();
        let s1 = aggregates.iter().find(|a| a.session_id == "s1").unwrap();
        assert_eq!(s1.canonical_source_ip.as_deref(), Some("203.0.113.5"));
        assert_eq!(s1.event_count, 2);
        assert_eq!(s1.command_count, 1);
    }

    #[test]
    fn quarantined_events_never_reach_the_aggregate() {
        let mut aggregator = SessionAggregator::new();
        let mut quarantined = event("s1", "cowrie.login.success", 0, None);
        quarantined.quarantined = true;
        aggregator.fold(&quarantined);
        assert!(aggregator.into_aggregates().is_empty());
    }
}

// [crates/honeytrap-ingest/src/circuit_breaker.rs]
/*!
 * APARATO: DISYUNTOR DEL PROCESADOR DLQ
 * RESPONSABILIDAD: CONTENER FALLOS EN CASCADA ENTRE WORKERS
 *
 * Shared across every DLQ worker in a process: `F` consecutive failures
 * (from any worker) opens the breaker for `T` seconds, then a single probe
 * is let through before the breaker fully closes again.
 */

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: State,
    consecutive_failures: u32,
    opened_until: Option<DateTime<Utc>>,
    probe_in_flight: bool,
}

pub struct CircuitBreaker {
    failure_threshold: u32,
    open_duration_seconds: i64,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, open_duration_seconds: i64) -> Self {
        Self {
            failure_threshold,
            open_duration_seconds,
            inner: Mutex::new(Inner { state: State::Closed, consecutive_failures: 0, opened_until: None, probe_in_flight: false }),
        }
    }

    /// Call before claiming work. `true` means proceed (and, if this is the
    /// half-open probe, the caller now owns reporting its outcome).
    pub fn allow(&self, now: DateTime<Utc>) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            State::Closed => true,
            State::Open => {
                if inner.opened_until.is_some_and(|until| now >= until) {
                    inner.state = State::HalfOpen;
                    inner.probe_in_flight = true;
                    true
                } else {
                    false
                }
            }
            State::HalfOpen => {
                // Only the one in-flight probe proceeds; everyone else waits.
                !inner.probe_in_flight
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = 0;
        inner.state = State::Closed;
        inner.opened_until = None;
        inner.probe_in_flight = false;
    }

    pub fn record_failure(&self, now: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        inner.probe_in_flight = false;
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.failure_threshold {
            inner.state = State::Open;
            inner.opened_until = Some(now + chrono::Duration::seconds(self.open_duration_seconds));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn opens_after_the_failure_threshold_and_rejects_new_work() {
        let breaker = CircuitBreaker::new(3, 60);
        let now = Utc::now();
        assert!(breaker.allow(now));
        breaker.record_failure(now);
        breaker.record_failure(now);
        breaker.record_failure(now);
        assert!(!breaker.allow(now));
    }

    #[test]
    fn half_opens_after_the_cooldown_and_admits_exactly_one_probe() {
        let breaker = CircuitBreaker::new(1, 60);
        let now = Utc::now();
        breaker.record_failure(now);
        assert!(!breaker.allow(now));

        let later = now + Duration::seconds(61);
        assert!(breaker.allow(later));
        assert!(!breaker.allow(later));
    }

    #[test]
    fn a_successful_probe_closes_the_breaker() {
        let breaker = CircuitBreaker::new(1, 60);
        let now = Utc::now();
        breaker.record_failure(now);
        let later = now + Duration::seconds(61);
        assert!(breaker.allow(later));
        breaker.record_success();
        assert!(breaker.allow(later));
    }
}

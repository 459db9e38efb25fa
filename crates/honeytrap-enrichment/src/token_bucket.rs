// [crates/honeytrap-enrichment/src/token_bucket.rs]
/*!
 * APARATO: LIMITADOR DE TASA POR CUBETA DE TOKENS
 * RESPONSABILIDAD: ACOTAR LA TASA POR SEGUNDO HACIA EL ESCÁNER EXTERNO
 */

use parking_lot::Mutex;
use std::time::Instant;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

pub struct TokenBucket {
    capacity: f64,
    refill_per_second: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(capacity: f64, refill_per_second: f64) -> Self {
        Self {
            capacity,
            refill_per_second,
            state: Mutex::new(BucketState { tokens: capacity, last_refill: Instant::now() }),
        }
    }

    /// Refills based on elapsed wall time, then withdraws `cost` tokens if
    /// enough are available. Returns `false` (no withdrawal) on insufficient
    /// balance rather than blocking the caller.
    pub fn try_allow(&self, cost: f64) -> bool {
        let mut state = self.state.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_second).min(self.capacity);
        state.last_refill = now;

        if state.tokens >= cost {
            state.tokens -= cost;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_capacity_then_denies() {
        let bucket = TokenBucket::new(2.0, 0.0);
        assert!(bucket.try_allow(1.0));
        assert!(bucket.try_allow(1.0));
        assert!(!bucket.try_allow(1.0));
    }

    #[test]
    fn denies_a_request_larger_than_capacity() {
        let bucket = TokenBucket::new(1.0, 0.0);
        assert!(!bucket.try_allow(5.0));
    }
}

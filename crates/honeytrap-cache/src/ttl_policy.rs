// [crates/honeytrap-cache/src/ttl_policy.rs]
/*!
 * APARATO: POLÍTICA DE TTL POR SERVICIO
 * RESPONSABILIDAD: LÍMITES DE FRESCURA POR NIVEL, NO POR CAPA
 *
 * TTLs are a property of the *service* being cached, not of the tier doing
 * the caching — each tier just clamps whatever TTL it's handed to its own
 * ceiling. Unknown services fall back to the scanner row's conservative
 * (short) ceilings rather than caching indefinitely.
 */

use chrono::Duration;

#[derive(Debug, Clone, Copy)]
pub struct TierTtls {
    pub l1: Duration,
    pub l2: Duration,
    pub l3: Duration,
}

pub fn ttls_for_service(service: &str) -> TierTtls {
    let one_hour = Duration::hours(1);
    match service {
        "offline" => TierTtls { l1: one_hour, l2: Duration::days(30), l3: Duration::days(30) },
        "bulk_asn" => TierTtls { l1: one_hour, l2: Duration::days(90), l3: Duration::days(90) },
        "scanner" => TierTtls { l1: one_hour, l2: Duration::days(7), l3: Duration::days(7) },
        "password_breach" => TierTtls { l1: one_hour, l2: Duration::days(30), l3: Duration::days(60) },
        _ => TierTtls { l1: one_hour, l2: Duration::days(7), l3: Duration::days(7) },
    }
}

/// Clamps a caller-supplied TTL hint to a tier's ceiling for the service.
pub fn clamp(hint: Duration, ceiling: Duration) -> Duration {
    hint.min(ceiling)
}

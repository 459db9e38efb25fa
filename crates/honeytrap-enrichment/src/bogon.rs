// [crates/honeytrap-enrichment/src/bogon.rs]
/*!
 * APARATO: DETECTOR DE RANGOS NO ENRUTABLES (BOGON)
 * RESPONSABILIDAD: CORTOCIRCUITO TEMPRANO DE LA CASCADA
 *
 * Private / loopback / link-local / documentation / reserved ranges never
 * reach an external source — there's nothing any of F1/F2/F3 could say about
 * them that isn't already implied by the address itself.
 */

use std::net::IpAddr;

pub fn is_bogon(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_unspecified()
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => {
            let segments = v6.segments();
            v6.is_loopback()
                || v6.is_unspecified()
                || (segments[0] & 0xfe00) == 0xfc00 // fc00::/7 unique local
                || (segments[0] & 0xffc0) == 0xfe80 // fe80::/10 link local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_v4_ranges_are_bogon() {
        assert!(is_bogon("10.0.0.5".parse().unwrap()));
        assert!(is_bogon("192.168.1.1".parse().unwrap()));
        assert!(is_bogon("172.16.0.1".parse().unwrap()));
        assert!(is_bogon("127.0.0.1".parse().unwrap()));
    }

    #[test]
    fn public_v4_is_not_bogon() {
        assert!(!is_bogon("203.0.113.5".parse().unwrap()));
        assert!(!is_bogon("8.8.8.8".parse().unwrap()));
    }
}

// [crates/honeytrap-classifier/src/cidr_tree.rs]
/*!
 * APARATO: ÁRBOL DE PREFIJOS CIDR
 * RESPONSABILIDAD: COINCIDENCIA DE PREFIJO MÁS LARGO
 *
 * Not a true trie — a sorted-by-prefix-length `Vec<IpNet>` scanned longest
 * prefix first. Reference sets here are small enough (cloud provider ranges
 * number in the low thousands at most) that a linear scan beats the
 * complexity of a real radix tree; if the datacenter set ever grows past
 * that, replace the `Vec` scan, not the public interface.
 */

use ipnet::IpNet;
use std::net::IpAddr;

#[derive(Debug, Clone, Default)]
pub struct CidrTree {
    /// Sorted by descending prefix length so the first match is the longest.
    networks: Vec<(IpNet, Option<String>)>,
}

impl CidrTree {
    pub fn from_entries(entries: Vec<(IpNet, Option<String>)>) -> Self {
        let mut networks = entries;
        networks.sort_by_key(|(net, _)| std::cmp::Reverse(net.prefix_len()));
        Self { networks }
    }

    pub fn longest_match(&self, ip: IpAddr) -> Option<Option<String>> {
        self.networks
            .iter()
            .find(|(net, _)| net.contains(&ip))
            .map(|(_, label)| label.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_longer_prefix_when_ranges_overlap() {
        let broad: IpNet = "203.0.0.0/8".parse().unwrap();
        let narrow: IpNet = "203.0.113.0/24".parse().unwrap();
        let tree = CidrTree::from_entries(vec![(broad, Some("broad".into())), (narrow, Some("narrow".into()))]);

        let hit = tree.longest_match("203.0.113.5".parse().unwrap());
        assert_eq!(hit, Some(Some("narrow".to_string())));
    }

    #[test]
    fn unmatched_ip_returns_none() {
        let tree = CidrTree::from_entries(vec![("203.0.113.0/24".parse().unwrap(), None)]);
        assert_eq!(tree.longest_match("198.51.100.1".parse().unwrap()), None);
    }
}

// [crates/honeytrap-infra-transport/src/bulk_asn.rs]
/*!
 * =================================================================
 * APARATO: BULK ASN LINE-PROTOCOL CLIENT
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: LOTES DE RESOLUCIÓN IP -> ASN SOBRE TCP/43
 *
 * Speaks the well-known bulk whois line protocol: one connection per chunk,
 * a `begin` / `verbose` preamble, one IP per line, a literal `end`, then the
 * write half closes while the read half drains pipe-delimited response
 * lines. Never resolves IPs one at a time over DNS — that's the legacy
 * behaviour this adapter replaces.
 * =================================================================
 */

use crate::errors::TransportError;
use std::net::ToSocketAddrs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tracing::{instrument, warn};

/// Hard ceiling enforced per connection; callers must chunk ahead of this.
pub const MAX_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct BulkAsnRecord {
    pub ip: String,
    pub asn: Option<u32>,
    pub as_name: Option<String>,
    pub country: Option<String>,
}

pub struct BulkAsnClient {
    endpoint: String,
    chunk_timeout: Duration,
}

impl BulkAsnClient {
    pub fn new(endpoint: impl Into<String>, chunk_timeout: Duration) -> Self {
        Self { endpoint: endpoint.into(), chunk_timeout }
    }

    /// Resolves `ips` across as many 500-wide chunks as needed. A chunk that
    /// fails (connect error, timeout, malformed response) is logged and
    /// skipped; later chunks still run.
    #[instrument(skip(self, ips), fields(total = ips.len()))]
    pub async fn resolve_many(&self, ips: &[String]) -> Vec<BulkAsnRecord> {
        let mut out = Vec::with_capacity(ips.len());
        for chunk in ips.chunks(MAX_BATCH_SIZE) {
            match self.resolve_chunk(chunk).await {
                Ok(mut records) => out.append(&mut records),
                Err(error) => warn!(%error, chunk_size = chunk.len(), "bulk ASN chunk skipped"),
            }
        }
        out
    }

    #[instrument(skip(self, ips), fields(chunk_size = ips.len()))]
    async fn resolve_chunk(&self, ips: &[String]) -> Result<Vec<BulkAsnRecord>, TransportError> {
        if ips.len() > MAX_BATCH_SIZE {
            return Err(TransportError::BatchTooLarge(ips.len()));
        }
        if ips.is_empty() {
            return Ok(Vec::new());
        }

        let addrs: Vec<_> = self
            .endpoint
            .to_socket_addrs()
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?
            .collect();
        let addr = addrs
            .first()
            .ok_or_else(|| TransportError::ConnectFailed("no resolvable address".into()))?;

        let stream = timeout(self.chunk_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::ConnectFailed("connect timed out".into()))?
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        let (read_half, mut write_half) = stream.into_split();

        let mut request = String::from("begin\nverbose\n");
        for ip in ips {
            request.push_str(ip);
            request.push('\n');
        }
        request.push_str("end\n");

        timeout(self.chunk_timeout, write_half.write_all(request.as_bytes()))
            .await
            .map_err(|_| TransportError::ConnectFailed("write timed out".into()))??;
        write_half.shutdown().await.ok();

        let mut reader = BufReader::new(read_half);
        let mut records = Vec::with_capacity(ips.len());
        let mut line = String::new();

        loop {
            line.clear();
            let read = timeout(self.chunk_timeout, reader.read_line(&mut line))
                .await
                .map_err(|_| TransportError::ConnectFailed("read timed out".into()))??;
            if read == 0 {
                break;
            }
            if let Some(record) = parse_response_line(&line) {
                records.push(record);
            }
        }

        Ok(records)
    }
}

/// Parses one `AS | IP | BGP Prefix | CC | Registry | Allocated | AS Name`
/// line. The header row and any malformed row are silently skipped — they
/// don't carry an IP this cascade can key on.
fn parse_response_line(line: &str) -> Option<BulkAsnRecord> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() < 4 {
        return None;
    }

    let ip = fields[1].to_string();
    if ip.is_empty() {
        return None;
    }
    // "NA" means unresolved-but-real; anything else non-numeric is the header row.
    let asn = match fields[0] {
        "NA" => None,
        numeric => match numeric.parse::<u32>() {
            Ok(v) => Some(v),
            Err(_) => return None,
        },
    };

    let country = fields.get(3).filter(|s| !s.is_empty() && **s != "NA").map(|s| s.to_string());
    let as_name = fields.get(6).filter(|s| !s.is_empty()).map(|s| s.to_string());

    Some(BulkAsnRecord { ip, asn, as_name, country })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_response_line() {
        let line = "15169   | 8.8.8.8          | 8.8.8.0/24          | US | arin     | 1992-12-01 | GOOGLE - Google LLC, US\n";
        let record = parse_response_line(line).expect("should parse");
        assert_eq!(record.asn, Some(15169));
        assert_eq!(record.ip, "8.8.8.8");
        assert_eq!(record.country.as_deref(), Some("US"));
        assert_eq!(record.as_name.as_deref(), Some("GOOGLE - Google LLC, US"));
    }

    #[test]
    fn skips_the_header_row() {
        let line = "AS | IP               | BGP Prefix          | CC | Registry | Allocated  | AS Name\n";
        assert!(parse_response_line(line).is_none());
    }

    #[test]
    fn treats_na_asn_as_unresolved_but_keeps_the_record() {
        let line = "NA | 198.51.100.7 | NA | NA | NA | NA | NA\n";
        let record = parse_response_line(line).expect("should parse");
        assert_eq!(record.asn, None);
        assert_eq!(record.ip, "198.51.100.7");
        assert_eq!(record.country, None);
    }
}

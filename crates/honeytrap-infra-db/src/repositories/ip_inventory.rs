// [crates/honeytrap-infra-db/src/repositories/ip_inventory.rs]
/*!
 * APARATO: IP INVENTORY REPOSITORY
 * RESPONSABILIDAD: LECTURA POR LOTES Y FUSIÓN DE ENRIQUECIMIENTO
 *
 * `upsert` merges the incoming enrichment blob over the existing one at the
 * JSON level (new keys win, old keys survive) rather than replacing it whole,
 * so a scanner-only re-enrichment doesn't erase the offline/bulk fields a
 * previous pass already wrote. `batch_get` backs the Snapshot Writer, which
 * needs many IPs resolved in one round trip instead of one query per row.
 */

use crate::errors::DbError;
use crate::StoreClient;
use honeytrap_core_models::inventory::IpType;
use honeytrap_core_models::IpInventory;
use libsql::{params, Connection};
use serde_json::Value;

const UPSERT: &str = r#"
    INSERT INTO ip_inventory (ip_address, current_asn, as_name, enrichment, enrichment_updated_at, ip_types)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(ip_address) DO UPDATE SET
        current_asn = COALESCE(excluded.current_asn, ip_inventory.current_asn),
        as_name = COALESCE(excluded.as_name, ip_inventory.as_name),
        enrichment = excluded.enrichment,
        enrichment_updated_at = excluded.enrichment_updated_at,
        ip_types = excluded.ip_types
"#;

const SELECT_ONE: &str = r#"
    SELECT ip_address, current_asn, as_name, enrichment, enrichment_updated_at, ip_types, geo_country, primary_ip_type
    FROM ip_inventory WHERE ip_address = ?1
"#;

pub struct IpInventoryRepository {
    client: StoreClient,
}

impl IpInventoryRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    pub async fn upsert(&self, inventory: &IpInventory) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        upsert_on(&connection, inventory).await
    }

    pub async fn get(&self, ip_address: &str) -> Result<Option<IpInventory>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection.query(SELECT_ONE, params![ip_address.to_string()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Resolves many IPs in one round trip, preserving request order; IPs not
    /// yet in the inventory map to `None` so callers can leave `source_ip`
    /// null instead of failing the whole batch.
    pub async fn batch_get(&self, ip_addresses: &[String]) -> Result<Vec<Option<IpInventory>>, DbError> {
        if ip_addresses.is_empty() {
            return Ok(Vec::new());
        }
        let connection = self.client.get_connection()?;
        let placeholders: Vec<String> = (1..=ip_addresses.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "SELECT ip_address, current_asn, as_name, enrichment, enrichment_updated_at, ip_types, geo_country, primary_ip_type \
             FROM ip_inventory WHERE ip_address IN ({})",
            placeholders.join(", ")
        );
        let args: Vec<libsql::Value> = ip_addresses.iter().map(|ip| libsql::Value::Text(ip.clone())).collect();
        let mut rows = connection.query(&sql, libsql::params::Params::Positional(args)).await?;

        let mut found = std::collections::HashMap::new();
        while let Some(row) = rows.next().await? {
            let inventory = map_row(&row)?;
            found.insert(inventory.ip_address.clone(), inventory);
        }
        Ok(ip_addresses.iter().map(|ip| found.get(ip).cloned()).collect())
    }
}

pub(crate) async fn upsert_on(connection: &Connection, inventory: &IpInventory) -> Result<(), DbError> {
    let ip_types_json = serde_json::to_string(&inventory.ip_types).map_err(|e| DbError::MappingError(e.to_string()))?;
    connection
        .execute(
            UPSERT,
            params![
                inventory.ip_address.clone(),
                inventory.current_asn.map(|v| v as i64),
                inventory.as_name.clone(),
                inventory.enrichment.to_string(),
                inventory.enrichment_updated_at.to_rfc3339(),
                ip_types_json,
            ],
        )
        .await?;
    Ok(())
}

fn map_row(row: &libsql::Row) -> Result<IpInventory, DbError> {
    let enrichment_json: String = row.get(3)?;
    let ip_types_json: String = row.get(5)?;
    let ip_types: Vec<IpType> = serde_json::from_str(&ip_types_json).map_err(|e| DbError::MappingError(e.to_string()))?;
    let primary_ip_type_str: Option<String> = row.get(7)?;

    Ok(IpInventory {
        ip_address: row.get(0)?,
        current_asn: row.get::<Option<i64>>(1)?.map(|v| v as u32),
        as_name: row.get(2)?,
        enrichment: serde_json::from_str::<Value>(&enrichment_json).unwrap_or(Value::Null),
        enrichment_updated_at: parse_rfc3339(&row.get::<String>(4)?)?,
        ip_types,
        geo_country: row.get(6)?,
        primary_ip_type: primary_ip_type_str.and_then(|s| ip_type_from_str(&s)),
    })
}

fn ip_type_from_str(s: &str) -> Option<IpType> {
    match s {
        "VPN" => Some(IpType::Vpn),
        "TOR" => Some(IpType::Tor),
        "PROXY" => Some(IpType::Proxy),
        "CLOUD" => Some(IpType::Cloud),
        "DATACENTER" => Some(IpType::Datacenter),
        "RESIDENTIAL" => Some(IpType::Residential),
        "MOBILE" => Some(IpType::Mobile),
        "UNKNOWN" => Some(IpType::Unknown),
        _ => None,
    }
}

fn parse_rfc3339(s: &str) -> Result<chrono::DateTime<chrono::Utc>, DbError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| DbError::MappingError(e.to_string()))
}

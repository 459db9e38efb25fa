// [crates/honeytrap-infra-db/src/repositories/asn_inventory.rs]
/*!
 * APARATO: ASN INVENTORY REPOSITORY
 * RESPONSABILIDAD: AGREGADO POR NÚMERO DE SISTEMA AUTÓNOMO
 *
 * `observe` is the rollup side-effect of an `IpInventory` write: each time an
 * IP is attributed to an ASN for the first time, `ip_count` increments and
 * `ip_asn_history` gets a new open-ended row. Re-observing the same IP under
 * the same ASN only touches `last_seen`.
 */

use crate::errors::DbError;
use crate::StoreClient;
use chrono::{DateTime, Utc};
use honeytrap_core_models::AsnInventory;
use libsql::{params, Connection};

const UPSERT: &str = r#"
    INSERT INTO asn_inventory (asn, as_name, first_seen, last_seen, ip_count)
    VALUES (?1, ?2, ?3, ?3, 1)
    ON CONFLICT(asn) DO UPDATE SET
        as_name = COALESCE(excluded.as_name, asn_inventory.as_name),
        last_seen = excluded.last_seen
"#;

const BUMP_IP_COUNT: &str = "UPDATE asn_inventory SET ip_count = ip_count + 1 WHERE asn = ?1";

const CLOSE_OPEN_HISTORY: &str = r#"
    UPDATE ip_asn_history SET observed_to = ?1
    WHERE ip_address = ?2 AND observed_to IS NULL AND asn != ?3
"#;

const OPEN_HISTORY: &str = r#"
    INSERT INTO ip_asn_history (ip_address, asn, observed_from, observed_to)
    VALUES (?1, ?2, ?3, NULL)
    ON CONFLICT(ip_address, observed_from) DO NOTHING
"#;

const HAS_OPEN_ROW_FOR_ASN: &str = r#"
    SELECT COUNT(*) FROM ip_asn_history WHERE ip_address = ?1 AND asn = ?2 AND observed_to IS NULL
"#;

pub struct AsnInventoryRepository {
    client: StoreClient,
}

impl AsnInventoryRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Records that `ip_address` is currently attributed to `asn` at `now`,
    /// rolling the ASN aggregate and the append-only history table forward.
    pub async fn observe(&self, ip_address: &str, asn: u32, as_name: Option<&str>, now: DateTime<Utc>) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let tx = connection.transaction().await.map_err(|_| DbError::TransactionError)?;

        let mut rows = tx
            .query(HAS_OPEN_ROW_FOR_ASN, params![ip_address.to_string(), asn as i64])
            .await?;
        let already_current: i64 = rows.next().await?.map(|r| r.get(0)).transpose()?.unwrap_or(0);
        drop(rows);

        if already_current > 0 {
            tx.commit().await.map_err(|_| DbError::TransactionError)?;
            return Ok(());
        }

        tx.execute(CLOSE_OPEN_HISTORY, params![now.to_rfc3339(), ip_address.to_string(), asn as i64])
            .await?;
        tx.execute(OPEN_HISTORY, params![ip_address.to_string(), asn as i64, now.to_rfc3339()])
            .await?;

        let affected = tx
            .execute(UPSERT, params![asn as i64, as_name.map(|s| s.to_string()), now.to_rfc3339()])
            .await?;
        if affected == 0 {
            tx.execute(BUMP_IP_COUNT, params![asn as i64]).await?;
        }

        tx.commit().await.map_err(|_| DbError::TransactionError)?;
        Ok(())
    }

    pub async fn get(&self, asn: u32) -> Result<Option<AsnInventory>, DbError> {
        let connection = self.client.get_connection()?;
        self.get_on(&connection, asn).await
    }

    async fn get_on(&self, connection: &Connection, asn: u32) -> Result<Option<AsnInventory>, DbError> {
        let mut rows = connection
            .query(
                "SELECT asn, as_name, first_seen, last_seen, ip_count FROM asn_inventory WHERE asn = ?1",
                params![asn as i64],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_row(&row)?)),
            None => Ok(None),
        }
    }
}

fn map_row(row: &libsql::Row) -> Result<AsnInventory, DbError> {
    Ok(AsnInventory {
        asn: row.get::<i64>(0)? as u32,
        as_name: row.get(1)?,
        first_seen: parse_rfc3339(&row.get::<String>(2)?)?,
        last_seen: parse_rfc3339(&row.get::<String>(3)?)?,
        ip_count: row.get::<i64>(4)? as u64,
    })
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::MappingError(e.to_string()))
}

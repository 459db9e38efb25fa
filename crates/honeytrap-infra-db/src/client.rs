// [crates/honeytrap-infra-db/src/client.rs]
/*!
 * =================================================================
 * APARATO: DATABASE CONNECTION CLIENT
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES Y PERSISTENCIA ACID
 *
 * In-memory URLs (`:memory:`) get a dedicated anchor connection that is
 * kept alive for the lifetime of the client — otherwise sqlite would drop
 * the in-memory database as soon as the bootstrap connection closes.
 * =================================================================
 */

use crate::errors::DbError;
use crate::schema::apply_full_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Clone)]
pub struct StoreClient {
    driver: Arc<Database>,
    _memory_anchor: Option<Arc<Connection>>,
}

impl StoreClient {
    #[instrument(skip(access_token))]
    pub async fn connect(connection_url: &str, access_token: Option<String>) -> Result<Self, DbError> {
        if connection_url.is_empty() {
            return Err(DbError::ConnectionError("DATABASE_URL is empty".into()));
        }

        info!(url = %connection_url, "opening store connection");

        let is_remote = connection_url.starts_with("libsql://") || connection_url.starts_with("https://");
        let is_memory = connection_url.contains(":memory:") || connection_url.contains("mode=memory");

        let driver = if is_remote {
            let token = access_token
                .ok_or_else(|| DbError::ConnectionError("remote store requires an access token".into()))?;
            Builder::new_remote(connection_url.to_string(), token).build().await
        } else {
            Builder::new_local(connection_url).build().await
        }
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        let driver = Arc::new(driver);
        let mut anchor = None;

        if is_memory {
            let anchor_conn = driver.connect().map_err(|e| DbError::ConnectionError(e.to_string()))?;
            apply_full_schema(&anchor_conn).await?;
            anchor = Some(Arc::new(anchor_conn));
        } else {
            let bootstrap = driver.connect().map_err(|e| DbError::ConnectionError(e.to_string()))?;
            apply_full_schema(&bootstrap).await?;
        }

        Ok(Self { driver, _memory_anchor: anchor })
    }

    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.driver.connect().map_err(|e| {
            error!(error = %e, "failed to allocate a connection");
            DbError::ConnectionError(e.to_string())
        })
    }
}

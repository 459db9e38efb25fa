// [crates/honeytrap-infra-db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CAPA DE PERSISTENCIA SOBERANA
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;
pub mod unit_of_work;

pub use client::StoreClient;
pub use errors::DbError;
pub use schema::apply_full_schema;
pub use unit_of_work::{BatchOutcome, UnitOfWork};

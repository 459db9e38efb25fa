// [crates/honeytrap-core-models/src/cursor.rs]
/*!
 * APARATO: INGEST CURSOR MODEL
 * RESPONSABILIDAD: CHECKPOINT DE REANUDACIÓN EXACTA
 *
 * `last_offset` is monotone non-decreasing for a given `(source, inode)`.
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestCursor {
    pub source: String,
    pub inode: String,
    pub last_offset: u64,
    pub ingest_id: String,
    pub batch_index: u64,
    pub sessions: Vec<String>,
}

impl IngestCursor {
    pub fn advance(&self, new_offset: u64, sessions: Vec<String>) -> Self {
        Self {
            source: self.source.clone(),
            inode: self.inode.clone(),
            last_offset: new_offset.max(self.last_offset),
            ingest_id: self.ingest_id.clone(),
            batch_index: self.batch_index + 1,
            sessions,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::dao::models::SnapshotEnvelope;

/// CouchDB document wrapping one snapshot envelope per session PIN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchSnapshotDocument {
    /// Document identifier: configured key prefix followed by the PIN.
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// The versioned envelope, flattened into the document body.
    #[serde(flatten)]
    pub envelope: SnapshotEnvelope,
}

/// Document identifier for the snapshot of `pin` under `key_prefix`.
pub fn snapshot_doc_id(key_prefix: &str, pin: &str) -> String {
    format!("{key_prefix}{pin}")
}

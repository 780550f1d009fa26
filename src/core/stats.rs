use serde::{Serialize, Deserialize};
use crate::column::IndexKind;

/// Column description for display layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub index: IndexKind,
    pub is_fact: bool,
    pub data: String,           // "text", "int", "long", ...
    pub rows: u64,
    pub distinct: Option<u64>,  // deduplicating and unique columns only
    pub index_built: bool,

    // Distinct values in value-id order, only for deduplicating columns
    // with fewer values than the preview limit.
    pub values: Vec<String>,
}

/// Dataset-wide counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub name: String,
    pub rows: u64,
    pub columns: usize,
    pub storage_bytes: u64,
    pub growth_events: u64,
}

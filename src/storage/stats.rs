//! Disk usage statistics, recomputed from directory contents on demand.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

/// Per-table on-disk footprint
#[derive(Debug, Clone, Serialize)]
pub struct TableDiskStats {
    /// Record count in the data file
    pub records: usize,
    /// Data file size in bytes
    pub size_bytes: u64,
}

/// Aggregate on-disk statistics for one database instance
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub db_name: String,
    pub db_path: PathBuf,
    pub tables: BTreeMap<String, TableDiskStats>,
    pub wal_size_bytes: u64,
    pub wal_entries: usize,
    /// Sum of all data file sizes
    pub total_size_bytes: u64,
}

//! Durable on-disk representation of tables.
//!
//! Per database instance, rooted at `<base_path>/<db_name>/`:
//!
//! ```text
//! <db_name>/
//!     schema/<table>.schema.json   one JSON document per table
//!     data/<table>.records         newline-delimited JSON, one record per line
//!     wal/transaction.log          the active write-ahead log
//!     wal/transaction.<stamp>.log  archived WAL segments
//! ```

mod engine;
mod stats;

pub use engine::{StorageEngine, TableExport};
pub use stats::{StorageStats, TableDiskStats};

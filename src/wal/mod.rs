//! Write-ahead log subsystem.
//!
//! Every mutating intent is appended to `wal/transaction.log` as one
//! JSON line before (or alongside) the primary data write. Checkpointing
//! archives the current log under a timestamped name and starts a fresh
//! one, marking a durability boundary.

mod entry;
mod log;

pub use entry::{Operation, WalEntry};
pub use log::WalLog;

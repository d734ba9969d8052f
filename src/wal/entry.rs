//! WAL entry wire format.
//!
//! One JSON object per line:
//! `{"timestamp": ISO-8601, "operation": <name>, "table": str,
//! "record": object|null, "old_record": object|null}`
//!
//! UPDATE entries carry both the new and the old record; DELETE entries
//! carry only the old record; table lifecycle entries carry neither.

use serde::{Deserialize, Serialize};

use crate::table::Record;

/// The five logged operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "CREATE_TABLE")]
    CreateTable,
    #[serde(rename = "DROP_TABLE")]
    DropTable,
}

impl Operation {
    /// The wire name written to the log
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::CreateTable => "CREATE_TABLE",
            Operation::DropTable => "DROP_TABLE",
        }
    }
}

/// A single logged mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    /// ISO-8601 write timestamp
    pub timestamp: String,
    pub operation: Operation,
    pub table: String,
    /// Post-operation record state, when applicable
    pub record: Option<Record>,
    /// Pre-operation record state, when applicable
    pub old_record: Option<Record>,
}

impl WalEntry {
    /// Build an entry stamped with the current local time
    pub fn new(
        operation: Operation,
        table: impl Into<String>,
        record: Option<Record>,
        old_record: Option<Record>,
    ) -> Self {
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            operation,
            table: table.into(),
            record,
            old_record,
        }
    }
}

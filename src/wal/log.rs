//! Append, replay, and checkpoint for the transaction log.
//!
//! The current log lives at `wal/transaction.log`. A checkpoint renames
//! it to `wal/transaction.<YYYYMMDD_HHMMSS>.log` and starts a fresh,
//! empty log. Two checkpoints within the same second probe for a free
//! `_<n>` suffix rather than overwriting the earlier archive.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::errors::{DbError, DbResult};

use super::entry::{Operation, WalEntry};
use crate::table::Record;

/// File name of the active transaction log
const LOG_FILE: &str = "transaction.log";

/// The transaction log for one database instance
#[derive(Debug, Clone)]
pub struct WalLog {
    wal_dir: PathBuf,
}

impl WalLog {
    /// Create a handle rooted at the given WAL directory.
    ///
    /// The directory is created on first append.
    pub fn new(wal_dir: impl Into<PathBuf>) -> Self {
        Self {
            wal_dir: wal_dir.into(),
        }
    }

    /// Path of the active log file
    pub fn log_path(&self) -> PathBuf {
        self.wal_dir.join(LOG_FILE)
    }

    /// Append one entry as a JSON line, creating the log on demand
    pub fn append(
        &self,
        operation: Operation,
        table: &str,
        record: Option<Record>,
        old_record: Option<Record>,
    ) -> DbResult<()> {
        let entry = WalEntry::new(operation, table, record, old_record);
        fs::create_dir_all(&self.wal_dir)?;

        let line = serde_json::to_string(&entry).map_err(|e| {
            DbError::corrupt(self.log_path(), format!("entry serialization failed: {e}"))
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())?;
        writeln!(file, "{line}")?;

        tracing::debug!(
            "wal append: {} on table '{}'",
            entry.operation.as_str(),
            table
        );
        Ok(())
    }

    /// Parse the active log into ordered entries.
    ///
    /// File order equals chronological write order. Blank lines are
    /// skipped; an absent log yields an empty sequence. Entries are not
    /// applied to any table.
    pub fn replay(&self) -> DbResult<Vec<WalEntry>> {
        let path = self.log_path();
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let entry: WalEntry = serde_json::from_str(line)
                .map_err(|e| DbError::corrupt(&path, format!("bad WAL line: {e}")))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Archive the active log and start a fresh one.
    ///
    /// Returns the archive path, or `None` when no log exists yet.
    pub fn checkpoint(&self) -> DbResult<Option<PathBuf>> {
        let log_path = self.log_path();
        if !log_path.exists() {
            return Ok(None);
        }

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let archive_path = self.free_archive_path(&stamp);

        fs::rename(&log_path, &archive_path)?;
        fs::File::create(&log_path)?;

        tracing::debug!("wal checkpoint: archived to {}", archive_path.display());
        Ok(Some(archive_path))
    }

    /// First non-colliding archive path for the given stamp
    fn free_archive_path(&self, stamp: &str) -> PathBuf {
        let candidate = self.wal_dir.join(format!("transaction.{stamp}.log"));
        if !candidate.exists() {
            return candidate;
        }
        let mut n = 1;
        loop {
            let candidate = self.wal_dir.join(format!("transaction.{stamp}_{n}.log"));
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Paths of archived log segments, sorted by name (= by stamp)
    pub fn archives(&self) -> DbResult<Vec<PathBuf>> {
        let mut found = Vec::new();
        let dir = match fs::read_dir(&self.wal_dir) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(found),
            Err(e) => return Err(e.into()),
        };
        for entry in dir {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if is_archive_name(name) {
                    found.push(entry.path());
                }
            }
        }
        found.sort();
        Ok(found)
    }

    /// Byte size of the active log; 0 when absent
    pub fn size_bytes(&self) -> u64 {
        fs::metadata(self.log_path()).map(|m| m.len()).unwrap_or(0)
    }

    /// Number of entries in the active log; 0 when absent
    pub fn entry_count(&self) -> usize {
        fs::read_to_string(self.log_path())
            .map(|c| c.lines().filter(|l| !l.trim().is_empty()).count())
            .unwrap_or(0)
    }
}

/// Returns whether a file name matches the archival pattern
/// `transaction.<stamp>.log`
fn is_archive_name(name: &str) -> bool {
    name.starts_with("transaction.") && name.ends_with(".log") && name != LOG_FILE
}

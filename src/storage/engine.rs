//! The storage engine: schema files, data files, and the WAL.
//!
//! The engine separates logging a logical change from materializing it:
//! `update_records` / `delete_records` only write WAL entries, and the
//! caller rewrites the data file via `save_records`. `append_record`
//! writes the WAL entry strictly before the data-file append, so a crash
//! between the two is detectable by comparing the WAL tail against the
//! data file during manual recovery. No automatic recovery is attempted.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{DbError, DbResult};
use crate::schema::{Schema, SchemaDocument};
use crate::table::Record;
use crate::wal::{Operation, WalEntry, WalLog};

use super::stats::{StorageStats, TableDiskStats};

const SCHEMA_SUFFIX: &str = ".schema.json";
const DATA_SUFFIX: &str = ".records";

/// One-shot bulk interchange envelope for a table's record set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableExport {
    pub table: String,
    #[serde(default)]
    pub records: Vec<Record>,
    pub count: usize,
    /// ISO-8601 export timestamp
    pub exported_at: String,
}

/// Maps named tables to on-disk artifacts under `<base_path>/<db_name>/`
#[derive(Debug)]
pub struct StorageEngine {
    db_name: String,
    db_path: PathBuf,
    schema_dir: PathBuf,
    data_dir: PathBuf,
    wal: WalLog,
}

impl StorageEngine {
    /// Open the engine for a database, creating the directory layout
    /// idempotently.
    pub fn open(db_name: impl Into<String>, base_path: impl AsRef<Path>) -> DbResult<Self> {
        let db_name = db_name.into();
        let db_path = base_path.as_ref().join(&db_name);
        let schema_dir = db_path.join("schema");
        let data_dir = db_path.join("data");
        let wal_dir = db_path.join("wal");

        fs::create_dir_all(&schema_dir)?;
        fs::create_dir_all(&data_dir)?;
        fs::create_dir_all(&wal_dir)?;

        Ok(Self {
            db_name,
            db_path,
            schema_dir,
            data_dir,
            wal: WalLog::new(wal_dir),
        })
    }

    /// Root directory of this database instance
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// The transaction log handle
    pub fn wal(&self) -> &WalLog {
        &self.wal
    }

    fn schema_file(&self, table: &str) -> PathBuf {
        self.schema_dir.join(format!("{table}{SCHEMA_SUFFIX}"))
    }

    fn data_file(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{table}{DATA_SUFFIX}"))
    }

    /// Serialize a table's schema to its schema file, then log a
    /// CREATE_TABLE entry. An existing schema file is overwritten;
    /// schema replacement is not versioned.
    pub fn save_schema(&self, table: &str, schema: &Schema) -> DbResult<()> {
        let document = SchemaDocument::new(table, schema);
        let json = serde_json::to_string_pretty(&document).map_err(|e| {
            DbError::corrupt(self.schema_file(table), format!("serialization failed: {e}"))
        })?;

        fs::write(self.schema_file(table), json)?;
        self.wal.append(Operation::CreateTable, table, None, None)?;

        tracing::debug!("saved schema for table '{}'", table);
        Ok(())
    }

    /// Read a table's schema document; `None` if no schema file exists
    pub fn load_schema(&self, table: &str) -> DbResult<Option<SchemaDocument>> {
        let path = self.schema_file(table);
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let document: SchemaDocument = serde_json::from_str(&contents)
            .map_err(|e| DbError::corrupt(&path, format!("bad schema file: {e}")))?;
        Ok(Some(document))
    }

    /// Replace the entire data file with one JSON line per record, in
    /// the given order. Used for bulk save after in-memory mutations.
    pub fn save_records(&self, table: &str, records: &[Record]) -> DbResult<()> {
        let path = self.data_file(table);
        let mut file = fs::File::create(&path)?;
        for record in records {
            let line = serde_json::to_string(record).map_err(|e| {
                DbError::corrupt(&path, format!("record serialization failed: {e}"))
            })?;
            writeln!(file, "{line}")?;
        }

        tracing::debug!("saved {} records for table '{}'", records.len(), table);
        Ok(())
    }

    /// Read the data file line by line, skipping blank lines. An absent
    /// file yields an empty sequence.
    pub fn load_records(&self, table: &str) -> DbResult<Vec<Record>> {
        let path = self.data_file(table);
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(line)
                .map_err(|e| DbError::corrupt(&path, format!("bad record line: {e}")))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Log an INSERT entry, then append one JSON line to the data file.
    ///
    /// The WAL write strictly precedes the data write.
    pub fn append_record(&self, table: &str, record: &Record) -> DbResult<()> {
        self.wal
            .append(Operation::Insert, table, Some(record.clone()), None)?;

        let path = self.data_file(table);
        let line = serde_json::to_string(record)
            .map_err(|e| DbError::corrupt(&path, format!("record serialization failed: {e}")))?;
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Log one UPDATE entry per affected record (old + new state).
    ///
    /// Materializing the change to the data file is the caller's
    /// responsibility via [`StorageEngine::save_records`].
    pub fn update_records(
        &self,
        table: &str,
        old_records: &[Record],
        new_records: &[Record],
    ) -> DbResult<()> {
        for (old, new) in old_records.iter().zip(new_records.iter()) {
            self.wal
                .append(Operation::Update, table, Some(new.clone()), Some(old.clone()))?;
        }
        Ok(())
    }

    /// Log one DELETE entry per removed record (old state only).
    ///
    /// Materializing the change to the data file is the caller's
    /// responsibility via [`StorageEngine::save_records`].
    pub fn delete_records(&self, table: &str, removed: &[Record]) -> DbResult<()> {
        for record in removed {
            self.wal
                .append(Operation::Delete, table, None, Some(record.clone()))?;
        }
        Ok(())
    }

    /// Log a DROP_TABLE entry, then delete the table's schema and data
    /// files. Idempotent if the files are already absent.
    pub fn drop_table(&self, table: &str) -> DbResult<()> {
        self.wal.append(Operation::DropTable, table, None, None)?;

        for path in [self.schema_file(table), self.data_file(table)] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        tracing::debug!("dropped on-disk artifacts for table '{}'", table);
        Ok(())
    }

    /// Table names derived from the schema files on disk.
    ///
    /// This is the sole source of truth for which tables exist on a
    /// cold load. Names are returned sorted.
    pub fn list_tables(&self) -> DbResult<Vec<String>> {
        let mut tables = Vec::new();
        let dir = match fs::read_dir(&self.schema_dir) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(tables),
            Err(e) => return Err(e.into()),
        };

        for entry in dir {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if let Some(table) = name.strip_suffix(SCHEMA_SUFFIX) {
                    tables.push(table.to_string());
                }
            }
        }
        tables.sort();
        Ok(tables)
    }

    /// Archive the current WAL and start a fresh one.
    ///
    /// Returns the archive path, or `None` when no WAL exists yet.
    pub fn checkpoint(&self) -> DbResult<Option<PathBuf>> {
        self.wal.checkpoint()
    }

    /// Parse the current WAL into ordered entries for inspection or
    /// manual recovery; entries are not applied to any table.
    pub fn replay_wal(&self) -> DbResult<Vec<WalEntry>> {
        self.wal.replay()
    }

    /// Rewrite a table's data file from its current logical contents,
    /// reclaiming space after update/delete churn. A no-op on the
    /// record set itself.
    pub fn compact(&self, table: &str) -> DbResult<()> {
        let records = self.load_records(table)?;
        self.save_records(table, &records)
    }

    /// Write a table's current record set to a standalone JSON document
    pub fn export_table_to_json(&self, table: &str, output: impl AsRef<Path>) -> DbResult<()> {
        let records = self.load_records(table)?;
        let export = TableExport {
            table: table.to_string(),
            count: records.len(),
            records,
            exported_at: chrono::Local::now().to_rfc3339(),
        };

        let json = serde_json::to_string_pretty(&export).map_err(|e| {
            DbError::corrupt(output.as_ref(), format!("export serialization failed: {e}"))
        })?;
        fs::write(output, json)?;
        Ok(())
    }

    /// Replace a table's record set from an export document; returns the
    /// number of records imported
    pub fn import_table_from_json(&self, table: &str, input: impl AsRef<Path>) -> DbResult<usize> {
        let contents = fs::read_to_string(input.as_ref())?;
        let export: TableExport = serde_json::from_str(&contents)
            .map_err(|e| DbError::corrupt(input.as_ref(), format!("bad export file: {e}")))?;

        self.save_records(table, &export.records)?;
        Ok(export.records.len())
    }

    /// Aggregate disk statistics, recomputed from directory contents
    pub fn get_stats(&self) -> DbResult<StorageStats> {
        let mut tables = BTreeMap::new();
        let mut total_size_bytes = 0;

        for table in self.list_tables()? {
            let path = self.data_file(&table);
            let (records, size_bytes) = match fs::metadata(&path) {
                Ok(meta) => (self.load_records(&table)?.len(), meta.len()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => (0, 0),
                Err(e) => return Err(e.into()),
            };

            total_size_bytes += size_bytes;
            tables.insert(
                table,
                TableDiskStats {
                    records,
                    size_bytes,
                },
            );
        }

        Ok(StorageStats {
            db_name: self.db_name.clone(),
            db_path: self.db_path.clone(),
            tables,
            wal_size_bytes: self.wal.size_bytes(),
            wal_entries: self.wal.entry_count(),
            total_size_bytes,
        })
    }
}

//! Database: a registry of named tables, optionally backed by a
//! storage engine.
//!
//! Callers hold an explicit `Database` handle; there is no process-wide
//! default instance. A table created on a persistent database has its
//! schema durably recorded immediately; record mutations stay in memory
//! until `save()` writes every table's full record set to disk.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::errors::{DbError, DbResult};
use crate::schema::Schema;
use crate::storage::{StorageEngine, StorageStats};
use crate::table::Table;

/// In-memory metadata for one table
#[derive(Debug, Clone, Serialize)]
pub struct TableStats {
    pub records: usize,
    pub schema_fields: usize,
}

/// Aggregate statistics: in-memory table metadata, plus disk stats when
/// persistence is enabled
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub name: String,
    pub persistent: bool,
    pub tables: BTreeMap<String, TableStats>,
    pub disk: Option<StorageStats>,
}

/// A named collection of tables with optional durable persistence
#[derive(Debug)]
pub struct Database {
    name: String,
    tables: BTreeMap<String, Table>,
    storage: Option<StorageEngine>,
}

impl Database {
    /// Create a database with no persistence layer.
    ///
    /// `save`, `load`, and export fail on such an instance;
    /// `checkpoint` is a no-op.
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: BTreeMap::new(),
            storage: None,
        }
    }

    /// Create a database backed by a storage engine rooted at
    /// `<base_path>/<name>/`. The directory layout is created
    /// idempotently; existing on-disk state is untouched until `load`.
    pub fn persistent(name: impl Into<String>, base_path: impl AsRef<Path>) -> DbResult<Self> {
        let name = name.into();
        let storage = StorageEngine::open(name.clone(), base_path)?;
        Ok(Self {
            name,
            tables: BTreeMap::new(),
            storage: Some(storage),
        })
    }

    /// Database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this instance was opened with persistence
    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    /// The backing storage engine, when persistence is enabled
    pub fn storage(&self) -> Option<&StorageEngine> {
        self.storage.as_ref()
    }

    fn storage_required(&self) -> DbResult<&StorageEngine> {
        self.storage.as_ref().ok_or(DbError::PersistenceDisabled)
    }

    /// Create and register a table.
    ///
    /// When persistence is enabled, the schema is durably recorded
    /// before the table is returned.
    ///
    /// # Errors
    ///
    /// Fails if the name is already registered.
    pub fn create_table(&mut self, name: impl Into<String>, schema: Schema) -> DbResult<&mut Table> {
        let name = name.into();
        if self.tables.contains_key(&name) {
            return Err(DbError::TableExists(name));
        }

        if let Some(storage) = &self.storage {
            storage.save_schema(&name, &schema)?;
        }

        tracing::debug!("created table '{}'", name);
        let table = Table::new(name.clone(), schema);
        Ok(self.tables.entry(name).or_insert(table))
    }

    /// Look up a registered table
    pub fn get_table(&self, name: &str) -> DbResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    /// Look up a registered table for mutation
    pub fn get_table_mut(&mut self, name: &str) -> DbResult<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    /// Remove a table from the registry and, when persistence is
    /// enabled, delete its on-disk artifacts (DROP_TABLE logged first).
    pub fn drop_table(&mut self, name: &str) -> DbResult<()> {
        if self.tables.remove(name).is_none() {
            return Err(DbError::TableNotFound(name.to_string()));
        }

        if let Some(storage) = &self.storage {
            storage.drop_table(name)?;
        }

        tracing::debug!("dropped table '{}'", name);
        Ok(())
    }

    /// Names of all registered tables, sorted
    pub fn list_tables(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// Write every registered table's full record set to disk (bulk
    /// overwrite, not incremental). Returns the number of tables saved.
    pub fn save(&self) -> DbResult<usize> {
        let storage = self.storage_required()?;

        for (name, table) in &self.tables {
            storage.save_records(name, table.records())?;
        }

        tracing::debug!("saved {} tables", self.tables.len());
        Ok(self.tables.len())
    }

    /// Reconstruct tables from disk: discover table names from schema
    /// files, rebuild each schema, reload records, and recompute each
    /// table's primary-key counter. Returns the number of tables loaded.
    pub fn load(&mut self) -> DbResult<usize> {
        let storage = self.storage_required()?;

        let mut loaded = BTreeMap::new();
        for name in storage.list_tables()? {
            let Some(document) = storage.load_schema(&name)? else {
                continue;
            };
            let schema = document.to_schema()?;
            let records = storage.load_records(&name)?;
            loaded.insert(name.clone(), Table::restore(name, schema, records));
        }

        tracing::debug!("loaded {} tables", loaded.len());
        self.tables.extend(loaded);
        Ok(self.tables.len())
    }

    /// Archive the current WAL and start a fresh one; no-op when
    /// persistence is disabled
    pub fn checkpoint(&self) -> DbResult<()> {
        if let Some(storage) = &self.storage {
            storage.checkpoint()?;
        }
        Ok(())
    }

    /// Export a table's persisted record set to a standalone JSON file
    pub fn export_table(&self, name: &str, output: impl AsRef<Path>) -> DbResult<()> {
        self.storage_required()?.export_table_to_json(name, output)
    }

    /// In-memory table metadata, merged with disk statistics when
    /// persistence is enabled
    pub fn get_stats(&self) -> DbResult<DatabaseStats> {
        let tables = self
            .tables
            .iter()
            .map(|(name, table)| {
                (
                    name.clone(),
                    TableStats {
                        records: table.count(),
                        schema_fields: table.schema().len(),
                    },
                )
            })
            .collect();

        let disk = match &self.storage {
            Some(storage) => Some(storage.get_stats()?),
            None => None,
        };

        Ok(DatabaseStats {
            name: self.name.clone(),
            persistent: self.storage.is_some(),
            tables,
            disk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use crate::table::Record;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_schema() -> Schema {
        Schema::builder()
            .field("id", Field::int().primary_key())
            .field("name", Field::str().not_null())
            .build()
            .unwrap()
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_create_and_get_table() {
        let mut db = Database::in_memory("test");
        db.create_table("users", sample_schema()).unwrap();

        assert!(db.get_table("users").is_ok());
        assert_eq!(db.list_tables(), vec!["users"]);
    }

    #[test]
    fn test_create_duplicate_table_fails() {
        let mut db = Database::in_memory("test");
        db.create_table("users", sample_schema()).unwrap();

        let err = db.create_table("users", sample_schema()).unwrap_err();
        assert!(matches!(err, DbError::TableExists(_)));
    }

    #[test]
    fn test_get_unknown_table_fails() {
        let db = Database::in_memory("test");
        assert!(matches!(
            db.get_table("ghost"),
            Err(DbError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_drop_table_removes_registration() {
        let mut db = Database::in_memory("test");
        db.create_table("users", sample_schema()).unwrap();
        db.drop_table("users").unwrap();

        assert!(db.list_tables().is_empty());
        assert!(matches!(
            db.drop_table("users"),
            Err(DbError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_save_without_persistence_fails() {
        let db = Database::in_memory("test");
        assert!(matches!(db.save(), Err(DbError::PersistenceDisabled)));

        let mut db = Database::in_memory("test");
        assert!(matches!(db.load(), Err(DbError::PersistenceDisabled)));
    }

    #[test]
    fn test_checkpoint_without_persistence_is_noop() {
        let db = Database::in_memory("test");
        db.checkpoint().unwrap();
    }

    #[test]
    fn test_stats_in_memory_only() {
        let mut db = Database::in_memory("test");
        db.create_table("users", sample_schema()).unwrap();
        db.get_table_mut("users")
            .unwrap()
            .insert(record(json!({"name": "Ada"})))
            .unwrap();

        let stats = db.get_stats().unwrap();
        assert!(!stats.persistent);
        assert!(stats.disk.is_none());
        assert_eq!(stats.tables["users"].records, 1);
        assert_eq!(stats.tables["users"].schema_fields, 2);
    }

    #[test]
    fn test_persistent_create_records_schema_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = Database::persistent("test", temp_dir.path()).unwrap();
        db.create_table("users", sample_schema()).unwrap();

        let storage = db.storage().unwrap();
        assert!(storage.load_schema("users").unwrap().is_some());
        assert_eq!(storage.list_tables().unwrap(), vec!["users"]);
    }
}

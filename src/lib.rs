//! flatdb - an embeddable record store.
//!
//! In-memory tables with typed schemas and constraint-checked CRUD,
//! plus an optional persistence layer: a write-ahead log and flat
//! per-table schema/data files.
//!
//! ```no_run
//! use flatdb::{Database, Field, Query, Schema};
//! use serde_json::json;
//!
//! # fn main() -> flatdb::DbResult<()> {
//! let mut db = Database::persistent("app", "./data")?;
//!
//! let schema = Schema::builder()
//!     .field("id", Field::int().primary_key())
//!     .field("email", Field::str().not_null().unique())
//!     .build()?;
//! db.create_table("users", schema)?;
//!
//! let users = db.get_table_mut("users")?;
//! users.insert(json!({"email": "ada@example.com"}).as_object().unwrap().clone())?;
//!
//! let newest = users.select(&Query::new().order_by("-id").limit(1));
//! assert_eq!(newest.len(), 1);
//!
//! db.save()?;
//! db.checkpoint()?;
//! # Ok(())
//! # }
//! ```

mod database;
mod errors;

pub mod schema;
pub mod storage;
pub mod table;
pub mod wal;

pub use database::{Database, DatabaseStats, TableStats};
pub use errors::{DbError, DbResult};
pub use schema::{Field, FieldType, Schema, SchemaBuilder};
pub use table::{Query, Record, Table};

//! In-memory tables with schema-validated CRUD.
//!
//! A table owns its record sequence exclusively. Query results are
//! independent copies; mutating a result never touches table state.

mod query;
#[allow(clippy::module_inception)]
mod table;

pub use query::Query;
pub use table::Table;

/// A single row: field name -> scalar JSON value.
///
/// Every key must be declared in the owning table's schema.
pub type Record = serde_json::Map<String, serde_json::Value>;

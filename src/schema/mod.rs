//! Typed schemas for table records.
//!
//! A schema is an ordered set of named fields, fixed for the lifetime of
//! a table. Fields carry a primitive type plus constraint flags
//! (primary key, nullable, unique) and validate candidate values.

mod document;
mod types;

pub use document::{FieldSpec, SchemaDocument};
pub use types::{Field, FieldType, Schema, SchemaBuilder};

//! On-disk schema document.
//!
//! One JSON document per table:
//! `{"table_name": ..., "schema": {field: {"type", "primary_key",
//! "nullable", "unique"}}, "created_at": ISO-8601}`.
//!
//! The format must round-trip exactly; field order in the `schema`
//! object is the table's declaration order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{Field, FieldType, Schema};
use crate::errors::{DbError, DbResult};

/// Serialized form of a single field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Wire type name: "int" | "str" | "float" | "bool"
    #[serde(rename = "type")]
    pub field_type: String,
    pub primary_key: bool,
    pub nullable: bool,
    pub unique: bool,
}

impl FieldSpec {
    /// Build the wire form of a field definition
    pub fn from_field(field: &Field) -> Self {
        Self {
            field_type: field.field_type.name().to_string(),
            primary_key: field.primary_key,
            nullable: field.nullable,
            unique: field.unique,
        }
    }

    /// Reconstruct the field definition, rejecting unknown type names
    pub fn to_field(&self) -> DbResult<Field> {
        let field_type = FieldType::from_name(&self.field_type).ok_or_else(|| {
            DbError::validation(format!("unknown field type: {}", self.field_type))
        })?;
        Ok(Field {
            field_type,
            primary_key: self.primary_key,
            nullable: self.nullable,
            unique: self.unique,
        })
    }
}

/// The complete per-table schema file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub table_name: String,
    /// Field name -> field spec, in declaration order
    pub schema: serde_json::Map<String, Value>,
    /// ISO-8601 creation timestamp
    pub created_at: String,
}

impl SchemaDocument {
    /// Build the document for a schema, stamped with the current time
    pub fn new(table_name: &str, schema: &Schema) -> Self {
        let mut fields = serde_json::Map::new();
        for (name, field) in schema.iter() {
            let spec = FieldSpec::from_field(field);
            let value = serde_json::json!({
                "type": spec.field_type,
                "primary_key": spec.primary_key,
                "nullable": spec.nullable,
                "unique": spec.unique,
            });
            fields.insert(name.to_string(), value);
        }
        Self {
            table_name: table_name.to_string(),
            schema: fields,
            created_at: chrono::Local::now().to_rfc3339(),
        }
    }

    /// Reconstruct the in-memory schema from the stored document
    pub fn to_schema(&self) -> DbResult<Schema> {
        let mut builder = Schema::builder();
        for (name, value) in &self.schema {
            let spec: FieldSpec = serde_json::from_value(value.clone()).map_err(|e| {
                DbError::validation(format!("malformed spec for field '{name}': {e}"))
            })?;
            builder = builder.field(name.clone(), spec.to_field()?);
        }
        builder.build()
    }
}

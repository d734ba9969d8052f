//! Field and schema type definitions.
//!
//! Supported primitive types:
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - str: UTF-8 string
//! - bool: Boolean
//!
//! Coercion rules are explicit and closed: a string validates against an
//! int or float field only if it is a valid literal of that type; ints
//! validate against float fields; nothing else coerces.

use serde_json::Value;

use crate::errors::{DbError, DbResult};

/// The closed set of primitive field types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// UTF-8 string
    Str,
    /// Boolean
    Bool,
}

impl FieldType {
    /// Returns the wire name used in schema files
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Str => "str",
            FieldType::Bool => "bool",
        }
    }

    /// Parses a wire name back into a type, for schema reconstruction
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(FieldType::Int),
            "float" => Some(FieldType::Float),
            "str" => Some(FieldType::Str),
            "bool" => Some(FieldType::Bool),
            _ => None,
        }
    }
}

/// A single column's type and constraint descriptor.
///
/// Immutable once attached to a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Declared primitive type
    pub field_type: FieldType,
    /// Whether this field is the table's auto-assignable primary key
    pub primary_key: bool,
    /// Whether null values are accepted
    pub nullable: bool,
    /// Whether values must be distinct across the table (nulls exempt)
    pub unique: bool,
}

impl Field {
    /// Create a nullable, non-unique field of the given type
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            primary_key: false,
            nullable: true,
            unique: false,
        }
    }

    /// Create an int field
    pub fn int() -> Self {
        Self::new(FieldType::Int)
    }

    /// Create a float field
    pub fn float() -> Self {
        Self::new(FieldType::Float)
    }

    /// Create a string field
    pub fn str() -> Self {
        Self::new(FieldType::Str)
    }

    /// Create a bool field
    pub fn bool() -> Self {
        Self::new(FieldType::Bool)
    }

    /// Mark this field as the primary key
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Reject null values for this field
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Enforce distinct values across the table
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Validates a candidate value against this field's type and
    /// nullability. No side effects; the value is never mutated.
    pub fn validate(&self, value: &Value) -> bool {
        if value.is_null() {
            return self.nullable;
        }

        match self.field_type {
            FieldType::Int => {
                value.is_i64()
                    || value.is_u64()
                    || value
                        .as_str()
                        .is_some_and(|s| s.parse::<i64>().is_ok())
            }
            FieldType::Float => {
                value.is_number()
                    || value
                        .as_str()
                        .is_some_and(|s| s.parse::<f64>().is_ok())
            }
            FieldType::Str => value.is_string(),
            FieldType::Bool => value.is_boolean(),
        }
    }
}

/// An ordered mapping from field name to field definition.
///
/// Field names are unique; at most one field may be the primary key.
/// Both invariants are enforced by [`SchemaBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<(String, Field)>,
}

impl Schema {
    /// Start building a schema
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Returns the field definition for the given name
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f)
    }

    /// Returns whether the schema declares the given field
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the name of the primary-key field, if one is declared
    pub fn primary_key(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, f)| f.primary_key)
            .map(|(n, _)| n.as_str())
    }

    /// Iterates fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the schema declares no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`Schema`].
///
/// Replaces the original decorator-style declaration with an explicit
/// field list: declare fields with constraints, then `build()`.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<(String, Field)>,
}

impl SchemaBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field in declaration order
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    /// Finalize the schema.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a field name repeats or more than
    /// one field is marked as the primary key.
    pub fn build(self) -> DbResult<Schema> {
        let mut seen = std::collections::HashSet::new();
        for (name, _) in &self.fields {
            if !seen.insert(name.as_str()) {
                return Err(DbError::validation(format!("duplicate field: {name}")));
            }
        }

        let pk_count = self.fields.iter().filter(|(_, f)| f.primary_key).count();
        if pk_count > 1 {
            return Err(DbError::validation(
                "schema declares more than one primary key",
            ));
        }

        Ok(Schema {
            fields: self.fields,
        })
    }
}

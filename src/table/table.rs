//! Table: an ordered collection of records conforming to a schema.
//!
//! The table owns validation, auto-increment primary key assignment,
//! and CRUD. Mutations happen in memory only; durably persisting them
//! is the storage engine's job, invoked by the database layer.

use serde_json::Value;

use crate::errors::{DbError, DbResult};
use crate::schema::Schema;

use super::query::{compare_values, Query};
use super::Record;

/// An in-memory table with a fixed schema
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    schema: Schema,
    records: Vec<Record>,
    next_id: i64,
}

impl Table {
    /// Create an empty table. The primary-key counter starts at 1.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuild a table from persisted records.
    ///
    /// The primary-key counter advances past the maximum observed key so
    /// that future inserts never collide with persisted IDs.
    pub(crate) fn restore(name: impl Into<String>, schema: Schema, records: Vec<Record>) -> Self {
        let next_id = schema
            .primary_key()
            .and_then(|pk| {
                records
                    .iter()
                    .filter_map(|r| r.get(pk))
                    .filter_map(Value::as_i64)
                    .max()
            })
            .map_or(1, |max| max + 1);

        Self {
            name: name.into(),
            schema,
            records,
            next_id,
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table's schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Name of the primary-key field, if the schema declares one
    pub fn primary_key_field(&self) -> Option<&str> {
        self.schema.primary_key()
    }

    /// Read-only view of the record sequence, in insertion order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Current record count
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Insert a record.
    ///
    /// Takes a working copy of the input. A primary-key field absent
    /// from the input is assigned the next counter value; other absent
    /// schema fields are filled with null. Returns the stored copy.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown field, a null or
    /// missing value in a non-nullable field, a type mismatch, or a
    /// duplicate value in a unique field. On error the table is
    /// unchanged, though an auto-assigned primary key is still consumed.
    pub fn insert(&mut self, mut record: Record) -> DbResult<Record> {
        if let Some(pk) = self.schema.primary_key().map(str::to_string) {
            if !record.contains_key(&pk) {
                record.insert(pk, Value::from(self.next_id));
                self.next_id += 1;
            }
        }

        self.validate_record(&mut record, None)?;
        self.records.push(record.clone());
        Ok(record)
    }

    /// Query records, returning independent copies.
    ///
    /// Filtering, ordering, and truncation apply in that order; see
    /// [`Query`] for the parameter semantics. The sort is stable.
    pub fn select(&self, query: &Query) -> Vec<Record> {
        let mut results: Vec<Record> = self
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();

        if let Some((field, descending)) = query.ordering() {
            results.sort_by(|a, b| {
                let av = a.get(field).unwrap_or(&Value::Null);
                let bv = b.get(field).unwrap_or(&Value::Null);
                let ord = compare_values(av, bv);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(n) = query.limit_value() {
            results.truncate(n);
        }

        results
    }

    /// All records as independent copies
    pub fn all(&self) -> Vec<Record> {
        self.select(&Query::new())
    }

    /// Merge `updates` into every record matching the predicate.
    ///
    /// Each candidate is re-validated against the schema with the record
    /// being replaced excluded from unique checks. Returns the number of
    /// records updated.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid candidate. Records updated earlier in
    /// the same call are NOT rolled back; the operation is not atomic
    /// across the matched set.
    pub fn update(
        &mut self,
        predicate: impl Fn(&Record) -> bool,
        updates: &Record,
    ) -> DbResult<usize> {
        let mut count = 0;

        for i in 0..self.records.len() {
            if !predicate(&self.records[i]) {
                continue;
            }

            let mut merged = self.records[i].clone();
            for (key, value) in updates {
                merged.insert(key.clone(), value.clone());
            }

            self.validate_record(&mut merged, Some(i))?;
            self.records[i] = merged;
            count += 1;
        }

        Ok(count)
    }

    /// Remove every record matching the predicate; returns the count
    /// removed. Matching zero records is not an error.
    pub fn delete(&mut self, predicate: impl Fn(&Record) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|r| !predicate(r));
        before - self.records.len()
    }

    /// Validate a candidate record against the schema.
    ///
    /// Absent schema fields are filled with null. `exclude` names a
    /// record index left out of unique-constraint scans (the record a
    /// candidate is about to replace).
    fn validate_record(&self, record: &mut Record, exclude: Option<usize>) -> DbResult<()> {
        let pk = self.schema.primary_key();

        for (name, field) in self.schema.iter() {
            if !record.contains_key(name) {
                if !field.nullable && pk != Some(name) {
                    return Err(DbError::validation(format!(
                        "missing required field: {name}"
                    )));
                }
                record.insert(name.to_string(), Value::Null);
            }
        }

        for (name, value) in record.iter() {
            let field = self.schema.get(name).ok_or_else(|| {
                DbError::validation(format!("unknown field: {name}"))
            })?;

            if !field.validate(value) {
                return Err(DbError::validation(format!(
                    "invalid value for field {name}: {value}"
                )));
            }

            if field.unique && !value.is_null() {
                let duplicate = self
                    .records
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| Some(*i) != exclude)
                    .any(|(_, existing)| existing.get(name) == Some(value));
                if duplicate {
                    return Err(DbError::validation(format!(
                        "duplicate value for unique field {name}: {value}"
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn users_table() -> Table {
        let schema = Schema::builder()
            .field("id", Field::int().primary_key())
            .field("email", Field::str().not_null().unique())
            .field("age", Field::int())
            .build()
            .unwrap();
        Table::new("users", schema)
    }

    #[test]
    fn test_insert_assigns_primary_key() {
        let mut table = users_table();

        let stored = table.insert(record(json!({"email": "a@x.com"}))).unwrap();
        assert_eq!(stored["id"], json!(1));
        assert_eq!(stored["age"], Value::Null);
        assert_eq!(table.count(), 1);

        let stored = table.insert(record(json!({"email": "b@x.com"}))).unwrap();
        assert_eq!(stored["id"], json!(2));
    }

    #[test]
    fn test_insert_keeps_explicit_primary_key() {
        let mut table = users_table();
        let stored = table
            .insert(record(json!({"id": 50, "email": "a@x.com"})))
            .unwrap();
        assert_eq!(stored["id"], json!(50));
    }

    #[test]
    fn test_insert_rejects_unknown_field() {
        let mut table = users_table();
        let err = table
            .insert(record(json!({"email": "a@x.com", "color": "red"})))
            .unwrap_err();
        assert!(err.to_string().contains("unknown field"));
        assert_eq!(table.count(), 0);
    }

    #[test]
    fn test_insert_rejects_missing_required_field() {
        let mut table = users_table();
        assert!(table.insert(record(json!({"age": 30}))).is_err());
        assert_eq!(table.count(), 0);
    }

    #[test]
    fn test_insert_rejects_explicit_null_in_required_field() {
        let mut table = users_table();
        assert!(table.insert(record(json!({"email": null}))).is_err());
        assert_eq!(table.count(), 0);
    }

    #[test]
    fn test_insert_rejects_duplicate_unique_value() {
        let mut table = users_table();
        table.insert(record(json!({"email": "a@x.com"}))).unwrap();

        let err = table
            .insert(record(json!({"email": "a@x.com"})))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        assert_eq!(table.count(), 1);
    }

    #[test]
    fn test_insert_rejects_type_mismatch() {
        let mut table = users_table();
        assert!(table
            .insert(record(json!({"email": "a@x.com", "age": "old"})))
            .is_err());
    }

    #[test]
    fn test_insert_returns_independent_copy() {
        let mut table = users_table();
        let mut stored = table.insert(record(json!({"email": "a@x.com"}))).unwrap();
        stored.insert("email".into(), json!("mutated"));

        assert_eq!(table.all()[0]["email"], json!("a@x.com"));
    }

    #[test]
    fn test_select_with_predicate() {
        let mut table = users_table();
        for (email, age) in [("a@x.com", 20), ("b@x.com", 35), ("c@x.com", 50)] {
            table
                .insert(record(json!({"email": email, "age": age})))
                .unwrap();
        }

        let adults = table.select(
            &Query::new().filter(|r| r["age"].as_i64().unwrap_or(0) >= 35),
        );
        assert_eq!(adults.len(), 2);
    }

    #[test]
    fn test_select_order_and_limit() {
        let mut table = users_table();
        for (email, age) in [("a@x.com", 10), ("b@x.com", 5), ("c@x.com", 20)] {
            table
                .insert(record(json!({"email": email, "age": age})))
                .unwrap();
        }

        let top = table.select(&Query::new().order_by("-age").limit(2));
        let ages: Vec<_> = top.iter().map(|r| r["age"].as_i64().unwrap()).collect();
        assert_eq!(ages, vec![20, 10]);

        let ascending = table.select(&Query::new().order_by("age"));
        let ages: Vec<_> = ascending
            .iter()
            .map(|r| r["age"].as_i64().unwrap())
            .collect();
        assert_eq!(ages, vec![5, 10, 20]);
    }

    #[test]
    fn test_select_results_are_copies() {
        let mut table = users_table();
        table.insert(record(json!({"email": "a@x.com"}))).unwrap();

        let mut results = table.all();
        results[0].insert("email".into(), json!("mutated"));
        assert_eq!(table.all()[0]["email"], json!("a@x.com"));
    }

    #[test]
    fn test_update_merges_and_counts() {
        let mut table = users_table();
        for (email, age) in [("a@x.com", 20), ("b@x.com", 35)] {
            table
                .insert(record(json!({"email": email, "age": age})))
                .unwrap();
        }

        let updates = record(json!({"age": 40}));
        let count = table
            .update(|r| r["email"] == json!("a@x.com"), &updates)
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(table.count(), 2);

        let updated = table.select(&Query::new().filter(|r| r["email"] == json!("a@x.com")));
        assert_eq!(updated[0]["age"], json!(40));
    }

    #[test]
    fn test_update_unique_check_excludes_self() {
        let mut table = users_table();
        table
            .insert(record(json!({"email": "a@x.com", "age": 20})))
            .unwrap();

        // Re-writing the same unique value onto the same record is fine
        let updates = record(json!({"email": "a@x.com", "age": 21}));
        assert_eq!(table.update(|_| true, &updates).unwrap(), 1);
    }

    #[test]
    fn test_update_rejects_unique_collision_with_other_record() {
        let mut table = users_table();
        table.insert(record(json!({"email": "a@x.com"}))).unwrap();
        table.insert(record(json!({"email": "b@x.com"}))).unwrap();

        let updates = record(json!({"email": "a@x.com"}));
        let result = table.update(|r| r["email"] == json!("b@x.com"), &updates);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_zero_matches_returns_zero() {
        let mut table = users_table();
        table.insert(record(json!({"email": "a@x.com"}))).unwrap();
        let updates = record(json!({"age": 99}));
        assert_eq!(table.update(|_| false, &updates).unwrap(), 0);
    }

    #[test]
    fn test_delete_removes_matching_records() {
        let mut table = users_table();
        for email in ["a@x.com", "b@x.com", "c@x.com"] {
            table.insert(record(json!({"email": email}))).unwrap();
        }

        let removed = table.delete(|r| r["email"] != json!("b@x.com"));
        assert_eq!(removed, 2);
        assert_eq!(table.count(), 1);
        assert_eq!(table.delete(|_| false), 0);
    }

    #[test]
    fn test_restore_advances_next_id_past_existing_keys() {
        let schema = users_table().schema().clone();
        let records = vec![
            record(json!({"id": 3, "email": "a@x.com", "age": null})),
            record(json!({"id": 7, "email": "b@x.com", "age": null})),
        ];

        let mut table = Table::restore("users", schema, records);
        assert_eq!(table.count(), 2);

        let stored = table.insert(record(json!({"email": "c@x.com"}))).unwrap();
        assert_eq!(stored["id"], json!(8));
    }

    #[test]
    fn test_restore_empty_resets_counter() {
        let schema = users_table().schema().clone();
        let mut table = Table::restore("users", schema, Vec::new());
        let stored = table.insert(record(json!({"email": "a@x.com"}))).unwrap();
        assert_eq!(stored["id"], json!(1));
    }

    #[test]
    fn test_null_values_exempt_from_unique_check() {
        let schema = Schema::builder()
            .field("id", Field::int().primary_key())
            .field("nickname", Field::str().unique())
            .build()
            .unwrap();
        let mut table = Table::new("players", schema);

        table.insert(record(json!({"nickname": null}))).unwrap();
        table.insert(record(json!({"nickname": null}))).unwrap();
        assert_eq!(table.count(), 2);
    }
}

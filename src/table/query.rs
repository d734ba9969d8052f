//! Query parameters for table selection.
//!
//! A predicate is any function value `Fn(&Record) -> bool`. Ordering is
//! by a single field, ascending by default, descending when the field
//! name carries a `-` prefix. Sorting is stable; records missing the
//! sort field order below every present value.

use std::cmp::Ordering;

use serde_json::Value;

use super::Record;

/// Selection parameters: optional predicate, ordering, and limit
#[derive(Default)]
pub struct Query<'a> {
    predicate: Option<Box<dyn Fn(&Record) -> bool + 'a>>,
    order_by: Option<String>,
    limit: Option<usize>,
}

impl<'a> Query<'a> {
    /// A query matching every record, unordered and unlimited
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only records for which the predicate holds
    pub fn filter(mut self, predicate: impl Fn(&Record) -> bool + 'a) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Sort by the given field; prefix with `-` for descending order
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Truncate the result to at most `n` records
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub(crate) fn matches(&self, record: &Record) -> bool {
        match &self.predicate {
            Some(pred) => pred(record),
            None => true,
        }
    }

    /// Returns (field, descending) when ordering was requested
    pub(crate) fn ordering(&self) -> Option<(&str, bool)> {
        self.order_by.as_deref().map(|field| {
            field
                .strip_prefix('-')
                .map_or((field, false), |rest| (rest, true))
        })
    }

    pub(crate) fn limit_value(&self) -> Option<usize> {
        self.limit
    }
}

/// Total order over scalar JSON values for sorting.
///
/// Values group by type: null < bool < number < string. Numbers compare
/// numerically across int/float; a missing field is treated as null and
/// therefore sorts first in ascending order.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ordering_parses_descending_prefix() {
        let query = Query::new().order_by("-age");
        assert_eq!(query.ordering(), Some(("age", true)));

        let query = Query::new().order_by("age");
        assert_eq!(query.ordering(), Some(("age", false)));
    }

    #[test]
    fn test_default_query_matches_everything() {
        let query = Query::new();
        assert!(query.matches(&Record::new()));
        assert!(query.ordering().is_none());
        assert!(query.limit_value().is_none());
    }

    #[test]
    fn test_numbers_compare_across_int_and_float() {
        assert_eq!(compare_values(&json!(2), &json!(2.5)), Ordering::Less);
        assert_eq!(compare_values(&json!(3.0), &json!(3)), Ordering::Equal);
        assert_eq!(compare_values(&json!(10), &json!(5)), Ordering::Greater);
    }

    #[test]
    fn test_null_sorts_below_present_values() {
        assert_eq!(compare_values(&Value::Null, &json!(0)), Ordering::Less);
        assert_eq!(compare_values(&Value::Null, &json!("")), Ordering::Less);
        assert_eq!(compare_values(&Value::Null, &json!(false)), Ordering::Less);
    }

    #[test]
    fn test_strings_compare_lexicographically() {
        assert_eq!(compare_values(&json!("a"), &json!("b")), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("b")), Ordering::Equal);
    }
}

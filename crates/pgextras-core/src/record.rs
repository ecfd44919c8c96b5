//! Row type returned by every report.
//!
//! Statements are sent through the simple query protocol, so every value
//! arrives in the server's text representation. A [`Record`] keeps them as
//! strings in `SELECT`-list order; `NULL` is `None`.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One result row with named fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Shared by every row of the same result set.
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Record {
    /// Creates a record. `values` must line up with `columns`.
    pub fn new(columns: Arc<[String]>, values: Vec<Option<String>>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Column names in `SELECT`-list order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the first column called `name`.
    ///
    /// Returns `None` both for an unknown column and for `NULL`; use
    /// [`Record::has_column`] to tell them apart.
    pub fn get(&self, name: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.value(idx)
    }

    /// Value at position `idx`.
    pub fn value(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).and_then(|v| v.as_deref())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Reads a boolean column in PostgreSQL text form (`t` / `f`).
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            "t" | "true" => Some(true),
            "f" | "false" => Some(false),
            _ => None,
        }
    }

    /// Iterates `(column, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(|v| v.as_deref()))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, &value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        let columns: Arc<[String]> = ["pid", "query", "waiting"]
            .into_iter()
            .map(String::from)
            .collect();
        Record::new(
            columns,
            vec![Some("4242".to_string()), None, Some("f".to_string())],
        )
    }

    #[test]
    fn get_by_name_and_position() {
        let record = sample();
        assert_eq!(record.get("pid"), Some("4242"));
        assert_eq!(record.value(0), Some("4242"));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn null_is_distinct_from_missing_column() {
        let record = sample();
        assert_eq!(record.get("query"), None);
        assert!(record.has_column("query"));
        assert!(!record.has_column("missing"));
    }

    #[test]
    fn bool_columns_use_text_form() {
        let record = sample();
        assert_eq!(record.get_bool("waiting"), Some(false));
        assert_eq!(record.get_bool("pid"), None);
    }

    #[test]
    fn serializes_as_ordered_object() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"{"pid":"4242","query":null,"waiting":"f"}"#);
    }
}

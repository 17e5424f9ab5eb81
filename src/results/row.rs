use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::TransportValue;

/// One materialized result row: ordered `(column label, value)` pairs.
///
/// Labels are shared by every row of a result set and need not be unique. Duplicate labels
/// are kept positionally; [`Row::get`] returns the first column with a matching label.
///
/// Rows only come out of the materializer, which checks that labels and values line up:
/// ```compile_fail
/// use std::sync::Arc;
/// use mssql_bridge::Row;
///
/// let row = Row::new(Arc::new(vec!["id".to_string()]), Vec::new());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// The column labels for this row (shared across all rows in a result set)
    column_names: Arc<Vec<String>>,
    /// The values for this row, positionally aligned with `column_names`
    values: Vec<TransportValue>,
}

impl Row {
    /// Create a row from shared labels and its values. Both must be the same length.
    #[must_use]
    pub(crate) fn new(column_names: Arc<Vec<String>>, values: Vec<TransportValue>) -> Self {
        debug_assert_eq!(column_names.len(), values.len());
        Self {
            column_names,
            values,
        }
    }

    /// Position of the first column carrying `column_name`.
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Value of the first column carrying `column_name`.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&TransportValue> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&TransportValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[TransportValue] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(label, value)` pairs in column order, duplicates included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TransportValue)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// Serialized as a map in column order. Duplicate labels are emitted as repeated keys;
/// deduplicating them is left to the receiving side.
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

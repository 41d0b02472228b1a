use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::types::DbValue;

/// A result row converted to a name/value mapping.
pub type Record = BTreeMap<String, DbValue>;

/// A single row from a query result.
///
/// Column names are shared across all rows of a result set, as is the
/// name-to-index cache that backs [`DbRow::get`].
#[derive(Debug, Clone)]
pub struct DbRow {
    /// The column names for this row (shared across the result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<DbValue>,
    #[doc(hidden)]
    column_index_cache: Arc<HashMap<String, usize>>,
}

impl DbRow {
    /// Create a new row, building its own column-index cache.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<DbValue>) -> Self {
        let cache = Self::index_cache(&column_names);
        Self {
            column_names,
            values,
            column_index_cache: cache,
        }
    }

    /// Create a row that shares a prebuilt index cache with its siblings.
    pub(crate) fn with_cache(
        column_names: Arc<Vec<String>>,
        cache: Arc<HashMap<String, usize>>,
        values: Vec<DbValue>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index_cache: cache,
        }
    }

    /// Build a column-name lookup cache for a set of columns.
    pub(crate) fn index_cache(column_names: &Arc<Vec<String>>) -> Arc<HashMap<String, usize>> {
        Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<HashMap<_, _>>(),
        )
    }

    /// Get the index of a column by name.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value from the row by column name.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&DbValue> {
        self.column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&DbValue> {
        self.values.get(index)
    }

    /// Convert this row into a name/value [`Record`], without any decoding.
    ///
    /// Duplicate column names keep the rightmost value.
    #[must_use]
    pub fn into_record(self) -> Record {
        self.column_names
            .iter()
            .cloned()
            .zip(self.values)
            .collect()
    }
}

/// The result of a query: zero or more rows plus an affected-row count.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub rows: Vec<DbRow>,
    /// The number of rows returned or affected
    pub rows_affected: usize,
}

impl ResultSet {
    /// Create a result set with preallocated row capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            rows: Vec::with_capacity(capacity),
            rows_affected: 0,
        }
    }

    /// Add a row and bump the affected count.
    pub fn add_row(&mut self, row: DbRow) {
        self.rows.push(row);
        self.rows_affected += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> DbRow {
        let cols = Arc::new(vec!["id".to_string(), "name".to_string()]);
        DbRow::new(cols, vec![DbValue::Int(7), DbValue::from("alice")])
    }

    #[test]
    fn lookup_by_name_and_index() {
        let row = sample_row();
        assert_eq!(row.get("id"), Some(&DbValue::Int(7)));
        assert_eq!(row.get_by_index(1), Some(&DbValue::from("alice")));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn into_record_keeps_all_columns() {
        let record = sample_row().into_record();
        assert_eq!(record.len(), 2);
        assert_eq!(record["name"], DbValue::from("alice"));
    }
}

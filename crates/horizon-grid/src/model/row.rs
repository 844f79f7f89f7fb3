//! Rows and sparse cells.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ColumnId, CellValue};

/// Prefix of identifiers assigned to rows awaiting a server id.
pub const TEMPORARY_ROW_PREFIX: &str = "tmp:";

/// Stable row identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    /// Create an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for an optimistically inserted row.
    pub fn temporary(sequence: u64) -> Self {
        Self(format!("{TEMPORARY_ROW_PREFIX}{sequence}"))
    }

    /// Whether this is a temporary identifier.
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_ROW_PREFIX)
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RowId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip)]
    formatted: Option<String>,
}

impl Cell {
    /// Create a cell holding `value`.
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            error: None,
            formatted: None,
        }
    }

    /// The stored value.
    pub fn value(&self) -> &CellValue {
        &self.value
    }

    /// Replace the value, dropping the formatted cache. Returns the old value.
    pub fn set_value(&mut self, value: CellValue) -> CellValue {
        self.formatted = None;
        std::mem::replace(&mut self.value, value)
    }

    /// Validation error message, if the last write failed validation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Set or clear the validation error.
    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// The cached formatted string, if still valid.
    pub fn cached_formatted(&self) -> Option<&str> {
        self.formatted.as_deref()
    }

    /// Forget the cached formatted string.
    pub fn clear_formatted(&mut self) {
        self.formatted = None;
    }

    /// The formatted value, computing and caching it with `format` on a miss.
    pub fn formatted_with(&mut self, format: impl FnOnce(&CellValue) -> String) -> &str {
        let value = &self.value;
        self.formatted.get_or_insert_with(|| format(value))
    }
}

/// A data row: an id plus a sparse map of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Stable identifier.
    pub id: RowId,
    /// Cells keyed by column; columns without a value are absent.
    #[serde(default)]
    pub cells: HashMap<ColumnId, Cell>,
}

impl Row {
    /// Create an empty row.
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            cells: HashMap::new(),
        }
    }

    /// Builder-style value setter.
    pub fn with_value(mut self, column: impl Into<ColumnId>, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column.into(), Cell::new(value));
        self
    }

    /// The value in `column`, if present.
    pub fn value(&self, column: &ColumnId) -> Option<&CellValue> {
        self.cells.get(column).map(Cell::value)
    }

    /// Write a value. Returns the previous value (`Null` if the cell was absent).
    pub fn set_value(&mut self, column: ColumnId, value: CellValue) -> CellValue {
        match self.cells.get_mut(&column) {
            Some(cell) => cell.set_value(value),
            None => {
                self.cells.insert(column, Cell::new(value));
                CellValue::Null
            }
        }
    }

    /// All values as a plain map.
    pub fn values(&self) -> HashMap<ColumnId, CellValue> {
        self.cells
            .iter()
            .map(|(column, cell)| (column.clone(), cell.value().clone()))
            .collect()
    }
}

/// Payload for inserting a row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRow {
    /// Initial values.
    #[serde(default)]
    pub values: HashMap<ColumnId, CellValue>,
    /// Insertion index in data order; `None` appends.
    #[serde(default)]
    pub index: Option<usize>,
}

impl NewRow {
    /// An empty row appended at the end.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style value setter.
    pub fn with_value(mut self, column: impl Into<ColumnId>, value: impl Into<CellValue>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Insert at `index` instead of appending.
    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_cache_is_dropped_on_write() {
        let mut cell = Cell::new(100);
        assert_eq!(cell.formatted_with(|v| format!("${v}")), "$100");
        assert_eq!(cell.cached_formatted(), Some("$100"));

        let old = cell.set_value(CellValue::from(200));
        assert_eq!(old, CellValue::from(100));
        assert_eq!(cell.cached_formatted(), None);
        assert_eq!(cell.formatted_with(|v| format!("${v}")), "$200");
    }

    #[test]
    fn test_sparse_set_value() {
        let mut row = Row::new("r1");
        let amount = ColumnId::new("amount");
        assert_eq!(row.value(&amount), None);
        assert_eq!(row.set_value(amount.clone(), 5.into()), CellValue::Null);
        assert_eq!(row.value(&amount), Some(&CellValue::from(5)));
    }

    #[test]
    fn test_temporary_ids() {
        let id = RowId::temporary(3);
        assert_eq!(id.as_str(), "tmp:3");
        assert!(id.is_temporary());
        assert!(!RowId::new("42").is_temporary());
    }
}

//! Persistence adapter contract.
//!
//! The engine never talks to a backend directly. Every persisted mutation
//! goes through a [`PersistenceAdapter`], whose methods return boxed futures
//! so adapters can be stored as trait objects and awaited from the engine's
//! `Send` futures.
//!
//! Only [`fetch`](PersistenceAdapter::fetch) is required. The remaining
//! methods default to accepting the change (or, for row insertion, to
//! reporting that it is unsupported), which suits read-mostly backends.

mod memory;

pub use memory::MemoryAdapter;

use std::collections::HashMap;

use futures_util::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::model::{CellValue, Column, ColumnId, ColumnUpdate, NewRow, PinPosition, Row, RowId};
use crate::view::SortSpec;

/// Error returned by a persistence adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AdapterError {
    message: String,
}

impl AdapterError {
    /// Create an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error for an operation the adapter does not implement.
    pub fn unsupported(operation: &str) -> Self {
        Self::new(format!("{operation} is not supported by this adapter"))
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type for adapter calls.
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Parameters of a full fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Page-size hint. Adapters may ignore it and return everything.
    pub page_size: usize,
}

/// The full column and row set returned by a fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridData {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

/// A single persisted cell write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub row: RowId,
    pub column: ColumnId,
    pub value: CellValue,
}

impl CellUpdate {
    /// Create an update.
    pub fn new(row: impl Into<RowId>, column: impl Into<ColumnId>, value: impl Into<CellValue>) -> Self {
        Self {
            row: row.into(),
            column: column.into(),
            value: value.into(),
        }
    }
}

/// How the engine should apply a sort after the adapter accepted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOutcome {
    /// The backend sorted its data; re-fetch to get the new order.
    Refetch,
    /// Keep the locally sorted view.
    #[default]
    IndexOnly,
}

/// Backend contract for loading and persisting grid data.
pub trait PersistenceAdapter: Send + Sync {
    /// Fetch every column and row.
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, AdapterResult<GridData>>;

    /// Persist a new row and return it with its permanent id.
    fn add_row(&self, row: NewRow) -> BoxFuture<'_, AdapterResult<Row>> {
        let _ = row;
        future::err(AdapterError::unsupported("add_row")).boxed()
    }

    /// Persist a multi-cell update to one row.
    fn update_row(
        &self,
        row: RowId,
        values: HashMap<ColumnId, CellValue>,
    ) -> BoxFuture<'_, AdapterResult<()>> {
        let _ = (row, values);
        future::ok(()).boxed()
    }

    /// Delete a row.
    fn delete_row(&self, row: RowId) -> BoxFuture<'_, AdapterResult<()>> {
        let _ = row;
        future::ok(()).boxed()
    }

    /// Move a row to `index` in data order.
    fn move_row(&self, row: RowId, index: usize) -> BoxFuture<'_, AdapterResult<()>> {
        let _ = (row, index);
        future::ok(()).boxed()
    }

    /// Persist a new column and return the stored definition.
    fn add_column(&self, column: Column) -> BoxFuture<'_, AdapterResult<Column>> {
        future::ok(column).boxed()
    }

    /// Persist a column patch.
    fn update_column(
        &self,
        column: ColumnId,
        update: ColumnUpdate,
    ) -> BoxFuture<'_, AdapterResult<()>> {
        let _ = (column, update);
        future::ok(()).boxed()
    }

    /// Delete a column.
    fn delete_column(&self, column: ColumnId) -> BoxFuture<'_, AdapterResult<()>> {
        let _ = column;
        future::ok(()).boxed()
    }

    /// Persist a column width.
    fn resize_column(&self, column: ColumnId, width: f32) -> BoxFuture<'_, AdapterResult<()>> {
        let _ = (column, width);
        future::ok(()).boxed()
    }

    /// Persist a column's new position among all columns.
    fn reorder_column(&self, column: ColumnId, position: usize) -> BoxFuture<'_, AdapterResult<()>> {
        let _ = (column, position);
        future::ok(()).boxed()
    }

    /// Persist a column's pin state.
    fn pin_column(&self, column: ColumnId, pin: PinPosition) -> BoxFuture<'_, AdapterResult<()>> {
        let _ = (column, pin);
        future::ok(()).boxed()
    }

    /// Persist a single cell value.
    fn update_cell(&self, update: CellUpdate) -> BoxFuture<'_, AdapterResult<()>> {
        let _ = update;
        future::ok(()).boxed()
    }

    /// Persist several cell values as one request.
    fn update_cells(&self, updates: Vec<CellUpdate>) -> BoxFuture<'_, AdapterResult<()>> {
        let _ = updates;
        future::ok(()).boxed()
    }

    /// Apply a sort (`None` clears it).
    fn sort(&self, sort: Option<SortSpec>) -> BoxFuture<'_, AdapterResult<SortOutcome>> {
        let _ = sort;
        future::ok(SortOutcome::IndexOnly).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnly;

    impl PersistenceAdapter for ReadOnly {
        fn fetch(&self, _request: FetchRequest) -> BoxFuture<'_, AdapterResult<GridData>> {
            future::ok(GridData::default()).boxed()
        }
    }

    #[tokio::test]
    async fn test_default_methods() {
        let adapter = ReadOnly;
        assert!(adapter.update_cell(CellUpdate::new("r", "c", 1)).await.is_ok());
        assert_eq!(
            adapter.sort(None).await.unwrap(),
            SortOutcome::IndexOnly
        );
        let err = adapter.add_row(NewRow::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "add_row is not supported by this adapter");
    }
}

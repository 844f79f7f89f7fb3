//! In-memory reference adapter.

use std::collections::{HashMap, HashSet};

use futures_util::future::{self, BoxFuture, FutureExt};
use horizon_grid_core::logging::targets;
use parking_lot::Mutex;

use super::{AdapterError, AdapterResult, CellUpdate, FetchRequest, GridData, PersistenceAdapter, SortOutcome};
use crate::error::Operation;
use crate::model::{CellValue, Column, ColumnId, ColumnUpdate, NewRow, PinPosition, Row, RowId};
use crate::view::{SortSpec, sort_rows};

#[derive(Default)]
struct Store {
    columns: Vec<Column>,
    rows: Vec<Row>,
    next_id: u64,
}

#[derive(Default)]
struct Faults {
    /// Operations that fail until recovered.
    persistent: HashSet<Operation>,
    /// Operations that fail exactly once.
    once: HashSet<Operation>,
}

/// A [`PersistenceAdapter`] backed by an in-memory table.
///
/// Every accepted call mutates the stored data, so a later fetch reflects
/// the server's view. Failures can be injected per operation, and every call
/// is recorded in order.
///
/// ```
/// use horizon_grid::adapter::MemoryAdapter;
/// use horizon_grid::Operation;
///
/// let adapter = MemoryAdapter::new(Vec::new(), Vec::new());
/// adapter.fail_on(Operation::UpdateCell);
/// adapter.recover(Operation::UpdateCell);
/// assert!(adapter.calls().is_empty());
/// ```
#[derive(Default)]
pub struct MemoryAdapter {
    store: Mutex<Store>,
    faults: Mutex<Faults>,
    calls: Mutex<Vec<Operation>>,
    server_sort: bool,
}

impl MemoryAdapter {
    /// Create an adapter holding `columns` and `rows`.
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        let next_id = rows.len() as u64 + 1;
        Self {
            store: Mutex::new(Store {
                columns,
                rows,
                next_id,
            }),
            ..Default::default()
        }
    }

    /// Sort server side and ask the engine to re-fetch.
    pub fn with_server_sort(mut self) -> Self {
        self.server_sort = true;
        self
    }

    /// Fail every call of `operation` until [`recover`](Self::recover).
    pub fn fail_on(&self, operation: Operation) {
        self.faults.lock().persistent.insert(operation);
    }

    /// Fail the next call of `operation` only.
    pub fn fail_once(&self, operation: Operation) {
        self.faults.lock().once.insert(operation);
    }

    /// Stop failing `operation`.
    pub fn recover(&self, operation: Operation) {
        let mut faults = self.faults.lock();
        faults.persistent.remove(&operation);
        faults.once.remove(&operation);
    }

    /// Operations called so far, in order.
    pub fn calls(&self) -> Vec<Operation> {
        self.calls.lock().clone()
    }

    /// Number of calls of `operation`.
    pub fn call_count(&self, operation: Operation) -> usize {
        self.calls.lock().iter().filter(|&&op| op == operation).count()
    }

    /// Stored value of a cell.
    pub fn stored_value(&self, row: &RowId, column: &ColumnId) -> Option<CellValue> {
        let store = self.store.lock();
        let row = store.rows.iter().find(|r| &r.id == row)?;
        row.value(column).cloned()
    }

    /// Stored columns.
    pub fn stored_columns(&self) -> Vec<Column> {
        self.store.lock().columns.clone()
    }

    /// Stored row ids in order.
    pub fn stored_row_ids(&self) -> Vec<RowId> {
        self.store.lock().rows.iter().map(|r| r.id.clone()).collect()
    }

    /// Record the call, then check injected faults.
    fn begin(&self, operation: Operation) -> AdapterResult<()> {
        self.calls.lock().push(operation);
        let mut faults = self.faults.lock();
        if faults.once.remove(&operation) || faults.persistent.contains(&operation) {
            tracing::debug!(target: targets::ADAPTER, %operation, "injected failure");
            return Err(AdapterError::new(format!("{operation} rejected by memory adapter")));
        }
        Ok(())
    }

    fn run<T: Send + 'static>(
        &self,
        operation: Operation,
        apply: impl FnOnce(&mut Store) -> AdapterResult<T>,
    ) -> BoxFuture<'_, AdapterResult<T>> {
        let result = self
            .begin(operation)
            .and_then(|()| apply(&mut *self.store.lock()));
        future::ready(result).boxed()
    }
}

fn row_mut<'a>(store: &'a mut Store, id: &RowId) -> AdapterResult<&'a mut Row> {
    store
        .rows
        .iter_mut()
        .find(|row| &row.id == id)
        .ok_or_else(|| AdapterError::new(format!("row '{id}' does not exist")))
}

fn column_mut<'a>(store: &'a mut Store, id: &ColumnId) -> AdapterResult<&'a mut Column> {
    store
        .columns
        .iter_mut()
        .find(|column| &column.id == id)
        .ok_or_else(|| AdapterError::new(format!("column '{id}' does not exist")))
}

impl PersistenceAdapter for MemoryAdapter {
    fn fetch(&self, _request: FetchRequest) -> BoxFuture<'_, AdapterResult<GridData>> {
        self.run(Operation::Load, |store| {
            Ok(GridData {
                columns: store.columns.clone(),
                rows: store.rows.clone(),
            })
        })
    }

    fn add_row(&self, new_row: NewRow) -> BoxFuture<'_, AdapterResult<Row>> {
        self.run(Operation::AddRow, move |store| {
            let id = RowId::new(format!("{}", store.next_id));
            store.next_id += 1;
            let mut row = Row::new(id);
            for (column, value) in new_row.values {
                row.set_value(column, value);
            }
            let index = new_row.index.unwrap_or(store.rows.len()).min(store.rows.len());
            store.rows.insert(index, row.clone());
            Ok(row)
        })
    }

    fn update_row(
        &self,
        row: RowId,
        values: HashMap<ColumnId, CellValue>,
    ) -> BoxFuture<'_, AdapterResult<()>> {
        self.run(Operation::UpdateRow, move |store| {
            let row = row_mut(store, &row)?;
            for (column, value) in values {
                row.set_value(column, value);
            }
            Ok(())
        })
    }

    fn delete_row(&self, row: RowId) -> BoxFuture<'_, AdapterResult<()>> {
        self.run(Operation::DeleteRow, move |store| {
            let before = store.rows.len();
            store.rows.retain(|r| r.id != row);
            if store.rows.len() == before {
                return Err(AdapterError::new(format!("row '{row}' does not exist")));
            }
            Ok(())
        })
    }

    fn move_row(&self, row: RowId, index: usize) -> BoxFuture<'_, AdapterResult<()>> {
        self.run(Operation::MoveRow, move |store| {
            let from = store
                .rows
                .iter()
                .position(|r| r.id == row)
                .ok_or_else(|| AdapterError::new(format!("row '{row}' does not exist")))?;
            let moved = store.rows.remove(from);
            let index = index.min(store.rows.len());
            store.rows.insert(index, moved);
            Ok(())
        })
    }

    fn add_column(&self, column: Column) -> BoxFuture<'_, AdapterResult<Column>> {
        self.run(Operation::AddColumn, move |store| {
            if store.columns.iter().any(|c| c.id == column.id) {
                return Err(AdapterError::new(format!("column '{}' already exists", column.id)));
            }
            store.columns.push(column.clone());
            Ok(column)
        })
    }

    fn update_column(
        &self,
        column: ColumnId,
        update: ColumnUpdate,
    ) -> BoxFuture<'_, AdapterResult<()>> {
        self.run(Operation::UpdateColumn, move |store| {
            update.apply_to(column_mut(store, &column)?);
            Ok(())
        })
    }

    fn delete_column(&self, column: ColumnId) -> BoxFuture<'_, AdapterResult<()>> {
        self.run(Operation::DeleteColumn, move |store| {
            store.columns.retain(|c| c.id != column);
            for row in &mut store.rows {
                row.cells.remove(&column);
            }
            Ok(())
        })
    }

    fn resize_column(&self, column: ColumnId, width: f32) -> BoxFuture<'_, AdapterResult<()>> {
        self.run(Operation::ResizeColumn, move |store| {
            column_mut(store, &column)?.width = width;
            Ok(())
        })
    }

    fn reorder_column(&self, column: ColumnId, position: usize) -> BoxFuture<'_, AdapterResult<()>> {
        self.run(Operation::ReorderColumn, move |store| {
            let from = store
                .columns
                .iter()
                .position(|c| c.id == column)
                .ok_or_else(|| AdapterError::new(format!("column '{column}' does not exist")))?;
            let moved = store.columns.remove(from);
            let position = position.min(store.columns.len());
            store.columns.insert(position, moved);
            for (index, column) in store.columns.iter_mut().enumerate() {
                column.position = index;
            }
            Ok(())
        })
    }

    fn pin_column(&self, column: ColumnId, pin: PinPosition) -> BoxFuture<'_, AdapterResult<()>> {
        self.run(Operation::PinColumn, move |store| {
            column_mut(store, &column)?.pin = pin;
            Ok(())
        })
    }

    fn update_cell(&self, update: CellUpdate) -> BoxFuture<'_, AdapterResult<()>> {
        self.run(Operation::UpdateCell, move |store| {
            row_mut(store, &update.row)?.set_value(update.column, update.value);
            Ok(())
        })
    }

    fn update_cells(&self, updates: Vec<CellUpdate>) -> BoxFuture<'_, AdapterResult<()>> {
        self.run(Operation::UpdateCells, move |store| {
            // Validate first so a bad row leaves the store untouched.
            for update in &updates {
                row_mut(store, &update.row)?;
            }
            for update in updates {
                row_mut(store, &update.row)?.set_value(update.column, update.value);
            }
            Ok(())
        })
    }

    fn sort(&self, sort: Option<SortSpec>) -> BoxFuture<'_, AdapterResult<SortOutcome>> {
        let server_sort = self.server_sort;
        self.run(Operation::Sort, move |store| {
            if !server_sort {
                return Ok(SortOutcome::IndexOnly);
            }
            if let Some(spec) = sort {
                let rows = std::mem::take(&mut store.rows);
                store.rows = sort_rows(rows, |row| row.value(&spec.column), spec.direction);
            }
            Ok(SortOutcome::Refetch)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> MemoryAdapter {
        MemoryAdapter::new(
            vec![Column::new("amount", "Amount")],
            vec![Row::new("1").with_value("amount", 100)],
        )
    }

    #[tokio::test]
    async fn test_update_cell_is_stored() {
        let adapter = adapter();
        adapter
            .update_cell(CellUpdate::new("1", "amount", 200))
            .await
            .unwrap();
        assert_eq!(
            adapter.stored_value(&RowId::new("1"), &ColumnId::new("amount")),
            Some(CellValue::from(200))
        );
        assert_eq!(adapter.calls(), vec![Operation::UpdateCell]);
    }

    #[tokio::test]
    async fn test_fail_once_then_succeed() {
        let adapter = adapter();
        adapter.fail_once(Operation::UpdateCell);
        let err = adapter
            .update_cell(CellUpdate::new("1", "amount", 200))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "update_cell rejected by memory adapter");
        assert_eq!(
            adapter.stored_value(&RowId::new("1"), &ColumnId::new("amount")),
            Some(CellValue::from(100))
        );
        assert!(adapter.update_cell(CellUpdate::new("1", "amount", 300)).await.is_ok());
        assert_eq!(adapter.call_count(Operation::UpdateCell), 2);
    }

    #[tokio::test]
    async fn test_add_row_assigns_id() {
        let adapter = adapter();
        let row = adapter
            .add_row(NewRow::new().with_value("amount", 5))
            .await
            .unwrap();
        assert_eq!(row.id.as_str(), "2");
        assert_eq!(adapter.stored_row_ids().len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_update_is_all_or_nothing() {
        let adapter = adapter();
        let result = adapter
            .update_cells(vec![
                CellUpdate::new("1", "amount", 1),
                CellUpdate::new("missing", "amount", 2),
            ])
            .await;
        assert!(result.is_err());
        assert_eq!(
            adapter.stored_value(&RowId::new("1"), &ColumnId::new("amount")),
            Some(CellValue::from(100))
        );
    }
}

//! Loading, cell writes and row mutations.

use std::collections::HashMap;

use horizon_grid_core::logging::{PerfSpan, span_names, targets};

use super::{EngineInner, GridEngine, GridState};
use crate::adapter::{CellUpdate, FetchRequest};
use crate::commands::{BulkEditCommand, CellEditCommand};
use crate::error::{GridError, Operation, Result};
use crate::events::{CellChange, DataLoaded};
use crate::hooks::{CellWrite, RowPatch};
use crate::input::tile_fill;
use crate::model::{CellValue, Column, ColumnId, NewRow, Row, RowId};
use crate::optimistic::{Phase, optimistic};
use crate::selection::SelectionRange;
use crate::ui_state::UiState;

/// What one cell write replaced.
struct CellSnapshot {
    change: CellChange,
    error: Option<String>,
}

fn view_depends_on(state: &GridState, column: &ColumnId) -> bool {
    state.rows.grouping() == Some(column) || state.rows.sort().is_some_and(|s| &s.column == column)
}

/// Apply validated writes. Fails without touching anything if a row is gone.
fn apply_writes(
    state: &mut GridState,
    writes: &[(CellWrite, Option<String>)],
) -> Result<Vec<CellSnapshot>> {
    if let Some((write, _)) = writes.iter().find(|(w, _)| !state.model.contains_row(&w.row)) {
        return Err(GridError::RowNotFound(write.row.clone()));
    }

    let mut snapshots = Vec::with_capacity(writes.len());
    let mut reorder = false;
    for (write, validation) in writes {
        let error = state
            .model
            .cell_error(&write.row, &write.column)
            .map(str::to_string);
        let old = state
            .model
            .set_value(&write.row, &write.column, write.value.clone())
            .unwrap_or_default();
        state
            .model
            .set_cell_error(&write.row, &write.column, validation.clone());
        reorder |= view_depends_on(state, &write.column);
        snapshots.push(CellSnapshot {
            change: CellChange {
                row: write.row.clone(),
                column: write.column.clone(),
                old,
                new: write.value.clone(),
            },
            error,
        });
    }
    if reorder {
        state.rebuild_rows();
    }
    Ok(snapshots)
}

fn revert_writes(state: &mut GridState, snapshots: &[CellSnapshot]) {
    let mut reorder = false;
    for snapshot in snapshots.iter().rev() {
        let CellChange { row, column, old, .. } = &snapshot.change;
        state.model.set_value(row, column, old.clone());
        state.model.set_cell_error(row, column, snapshot.error.clone());
        reorder |= view_depends_on(state, column);
    }
    if reorder {
        state.rebuild_rows();
    }
}

fn notify_writes(inner: &EngineInner, snapshots: &[CellSnapshot], phase: Phase) {
    for snapshot in snapshots {
        let change = match phase {
            Phase::Applied => snapshot.change.clone(),
            Phase::Reverted => CellChange {
                old: snapshot.change.new.clone(),
                new: snapshot.change.old.clone(),
                ..snapshot.change.clone()
            },
        };
        inner.events.cell_changed.emit(change);
    }
}

impl GridEngine {
    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Fetch all columns and rows from the adapter and replace the local data.
    ///
    /// Clears the history. Grouping, sort and collapsed groups are kept.
    pub async fn load(&self) -> Result<()> {
        self.refetch(Operation::Load).await?;
        self.inner.history.clear();
        self.inner.emit_history();
        Ok(())
    }

    /// Re-fetch everything without touching the history.
    pub(crate) async fn refetch(&self, operation: Operation) -> Result<()> {
        let inner = &*self.inner;
        let adapter = inner.adapter().ok_or(GridError::NoAdapter(operation))?;
        let request = FetchRequest {
            page_size: inner.config.page_size,
        };
        match adapter.fetch(request).await {
            Ok(data) => {
                self.install_data(data.columns, data.rows);
                Ok(())
            }
            Err(source) => {
                let err = GridError::persistence(operation, source);
                inner.report(operation, &err);
                Err(err)
            }
        }
    }

    /// Replace the local data without involving the adapter.
    pub fn set_data(&self, columns: Vec<Column>, rows: Vec<Row>) {
        self.install_data(columns, rows);
    }

    fn install_data(&self, columns: Vec<Column>, rows: Vec<Row>) {
        let inner = &*self.inner;
        let loaded = inner.with_state(|state| {
            let _span = PerfSpan::new(span_names::LOAD);
            state.model.replace(columns, rows);
            state.rows.rebuild(&state.model);
            state.selection.clear();
            state.dismiss_transient();
            state.ui = UiState::default();
            state.input.reset();
            state.refresh_layout();
            let loaded = DataLoaded {
                row_count: state.model.row_count(),
                column_count: state.model.column_count(),
            };
            loaded
        });
        tracing::debug!(
            target: targets::ENGINE,
            rows = loaded.row_count,
            columns = loaded.column_count,
            "data loaded"
        );

        inner.events.data_loaded.emit(loaded);
        inner.emit_selection();
        inner.request_repaint();
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn row_count(&self) -> usize {
        self.inner.with_state(|state| state.model.row_count())
    }

    /// Row ids in data order.
    pub fn row_ids(&self) -> Vec<RowId> {
        self.inner.with_state(|state| state.model.row_ids().to_vec())
    }

    pub fn row(&self, id: &RowId) -> Option<Row> {
        self.inner.with_state(|state| state.model.row(id).cloned())
    }

    pub fn cell_value(&self, row: &RowId, column: &ColumnId) -> Option<CellValue> {
        self.inner
            .with_state(|state| state.model.value(row, column).cloned())
    }

    /// Validation message recorded on a cell.
    pub fn cell_error(&self, row: &RowId, column: &ColumnId) -> Option<String> {
        self.inner
            .with_state(|state| state.model.cell_error(row, column).map(str::to_string))
    }

    /// Display text of a cell, formatted by its column's cell type.
    pub fn formatted_cell(&self, row: &RowId, column: &ColumnId) -> Option<String> {
        self.inner.with_state(|state| {
            let column_type = state.model.column(column)?.column_type.clone();
            let cell_type = self.inner.registry.get(&column_type);
            state
                .model
                .formatted(row, column, |value| cell_type.format(value))
        })
    }

    // -------------------------------------------------------------------------
    // Cells
    // -------------------------------------------------------------------------

    /// Write a cell and record the edit for undo.
    pub async fn update_cell(
        &self,
        row: impl Into<RowId>,
        column: impl Into<ColumnId>,
        value: impl Into<CellValue>,
    ) -> Result<()> {
        let (row, column, value) = (row.into(), column.into(), value.into());
        let old = self.inner.with_state(|state| {
            if state.model.column(&column).is_none() {
                return Err(GridError::ColumnNotFound(column.clone()));
            }
            if !state.model.contains_row(&row) {
                return Err(GridError::RowNotFound(row.clone()));
            }
            Ok(state.model.value(&row, &column).cloned().unwrap_or_default())
        })?;
        let command = CellEditCommand::new(self.downgrade(), row, column, old, value);
        self.execute(Box::new(command)).await
    }

    /// Validate the write and look up the message for it.
    fn validate_write(&self, write: &CellWrite) -> Result<Option<String>> {
        let column_type = self
            .inner
            .with_state(|state| {
                state
                    .model
                    .column(&write.column)
                    .map(|column| column.column_type.clone())
            })
            .ok_or_else(|| GridError::ColumnNotFound(write.column.clone()))?;
        let message = self.inner.registry.get(&column_type).validate(&write.value);
        if let Some(message) = &message {
            tracing::debug!(
                target: targets::ENGINE,
                row = %write.row,
                column = %write.column,
                %message,
                "cell value failed validation"
            );
        }
        Ok(message)
    }

    /// Write one cell without recording history.
    pub(crate) async fn write_cell(
        &self,
        row: RowId,
        column: ColumnId,
        value: CellValue,
    ) -> Result<()> {
        let inner = &*self.inner;
        let write = inner
            .hooks
            .cell
            .run_before(CellWrite { row, column, value })
            .ok_or(GridError::Cancelled {
                operation: Operation::UpdateCell,
            })?;
        let message = self.validate_write(&write)?;
        let writes = vec![(write, message)];
        let update = CellUpdate {
            row: writes[0].0.row.clone(),
            column: writes[0].0.column.clone(),
            value: writes[0].0.value.clone(),
        };

        optimistic(
            inner,
            Operation::UpdateCell,
            |state| apply_writes(state, &writes),
            |inner, snapshots, phase| notify_writes(inner, snapshots, phase),
            |adapter, _| adapter.update_cell(update.clone()),
            |state, snapshots| revert_writes(state, snapshots),
        )
        .await?;

        inner.hooks.cell.run_after(&writes[0].0);
        Ok(())
    }

    /// Write several cells as one undoable edit persisted in one request.
    pub async fn update_cells(&self, updates: Vec<CellUpdate>) -> Result<()> {
        self.record_bulk_edit("Edit cells", updates).await
    }

    async fn record_bulk_edit(&self, label: &str, updates: Vec<CellUpdate>) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let old = self.inner.with_state(|state| {
            updates
                .iter()
                .map(|update| {
                    if state.model.column(&update.column).is_none() {
                        return Err(GridError::ColumnNotFound(update.column.clone()));
                    }
                    if !state.model.contains_row(&update.row) {
                        return Err(GridError::RowNotFound(update.row.clone()));
                    }
                    let value = state
                        .model
                        .value(&update.row, &update.column)
                        .cloned()
                        .unwrap_or_default();
                    Ok(CellUpdate {
                        value,
                        ..update.clone()
                    })
                })
                .collect::<Result<Vec<_>>>()
        })?;
        let command = BulkEditCommand::new(self.downgrade(), label, old, updates);
        self.execute(Box::new(command)).await
    }

    /// Write several cells without recording history. A veto of any write
    /// cancels the whole batch.
    pub(crate) async fn write_cells(&self, updates: Vec<CellUpdate>) -> Result<()> {
        let inner = &*self.inner;
        let mut writes = Vec::with_capacity(updates.len());
        for update in updates {
            let write = inner
                .hooks
                .cell
                .run_before(CellWrite {
                    row: update.row,
                    column: update.column,
                    value: update.value,
                })
                .ok_or(GridError::Cancelled {
                    operation: Operation::UpdateCells,
                })?;
            let message = self.validate_write(&write)?;
            writes.push((write, message));
        }
        let updates: Vec<CellUpdate> = writes
            .iter()
            .map(|(write, _)| CellUpdate {
                row: write.row.clone(),
                column: write.column.clone(),
                value: write.value.clone(),
            })
            .collect();

        optimistic(
            inner,
            Operation::UpdateCells,
            |state| apply_writes(state, &writes),
            |inner, snapshots, phase| notify_writes(inner, snapshots, phase),
            |adapter, _| adapter.update_cells(updates.clone()),
            |state, snapshots| revert_writes(state, snapshots),
        )
        .await?;

        for (write, _) in &writes {
            inner.hooks.cell.run_after(write);
        }
        Ok(())
    }

    /// Tile the values of `source` over `target` and record it as one edit.
    ///
    /// Group header rows inside either range are skipped. The selection
    /// becomes `target`.
    pub async fn fill(&self, source: SelectionRange, target: SelectionRange) -> Result<()> {
        let updates = self.inner.with_state(|state| {
            let writes = tile_fill(source, target, |pos| {
                let (row, column) = state.resolve_cell(pos)?;
                Some(state.model.value(&row, &column).cloned().unwrap_or_default())
            });
            writes
                .into_iter()
                .filter_map(|(pos, value)| {
                    let (row, column) = state.resolve_cell(pos)?;
                    Some(CellUpdate { row, column, value })
                })
                .collect::<Vec<_>>()
        });
        tracing::debug!(target: targets::ENGINE, cells = updates.len(), "fill");
        self.record_bulk_edit("Fill", updates).await?;

        let changed = self.inner.with_state(|state| {
            let mut changed = state.selection.select_cell(target.start());
            changed |= state.selection.extend_to(target.end());
            changed
        });
        if changed {
            self.inner.emit_selection();
        }
        Ok(())
    }

    /// Set every data cell in `range` to null, as one undoable edit.
    pub async fn clear_cells(&self, range: SelectionRange) -> Result<()> {
        let updates: Vec<CellUpdate> = self.inner.with_state(|state| {
            state
                .cells_in(&range)
                .into_iter()
                .map(|(_, row, column)| CellUpdate {
                    row,
                    column,
                    value: CellValue::Null,
                })
                .collect()
        });
        self.record_bulk_edit("Clear cells", updates).await
    }

    /// Tab-separated display text of the selection bounds, one line per row.
    /// Group header rows contribute their title.
    pub fn copy_selection(&self) -> Option<String> {
        let inner = &*self.inner;
        inner.with_state(|state| {
            let bounds = state.selection.bounds()?;
            let columns: Vec<(ColumnId, String)> = state
                .model
                .visible_columns()
                .iter()
                .map(|column| (column.id.clone(), column.column_type.clone()))
                .collect();
            let mut lines = Vec::with_capacity(bounds.row_count());
            for row in bounds.start_row..=bounds.end_row {
                let Some(view_row) = state.rows.get(row).cloned() else {
                    continue;
                };
                let Some(row_id) = view_row.row_id() else {
                    if let Some(group) = view_row.group() {
                        lines.push(group.title.clone());
                    }
                    continue;
                };
                let mut fields = Vec::with_capacity(bounds.col_count());
                for col in bounds.start_col..=bounds.end_col {
                    let Some((column, column_type)) = columns.get(col) else {
                        continue;
                    };
                    let cell_type = inner.registry.get(column_type);
                    let text = state
                        .model
                        .formatted(row_id, column, |value| cell_type.format(value))
                        .unwrap_or_default();
                    fields.push(text);
                }
                lines.push(fields.join("\t"));
            }
            Some(lines.join("\n"))
        })
    }

    // -------------------------------------------------------------------------
    // Rows
    // -------------------------------------------------------------------------

    /// Insert a row under a temporary id, persist it and swap in the id the
    /// adapter assigned.
    ///
    /// Only one add may be in flight; a second call fails with
    /// [`GridError::Busy`]. Without an adapter the temporary id is kept.
    pub async fn add_row(&self, new_row: NewRow) -> Result<RowId> {
        let inner = &*self.inner;
        let new_row = inner
            .hooks
            .row_add
            .run_before(new_row)
            .ok_or(GridError::Cancelled {
                operation: Operation::AddRow,
            })?;
        let temp = inner.with_state(|state| {
            if state.add_row_in_flight {
                return Err(GridError::Busy(Operation::AddRow));
            }
            state.add_row_in_flight = true;
            let id = RowId::temporary(state.next_temp_id);
            state.next_temp_id += 1;
            Ok(id)
        })?;

        let result = optimistic(
            inner,
            Operation::AddRow,
            |state| {
                let mut row = Row::new(temp.clone());
                for (column, value) in &new_row.values {
                    row.set_value(column.clone(), value.clone());
                }
                let index = state.model.insert_row(row, new_row.index);
                state.rows.row_inserted(&state.model, &temp);
                state.refresh_layout();
                Ok(index)
            },
            |inner, _, phase| match phase {
                Phase::Applied => inner.events.row_added.emit(temp.clone()),
                Phase::Reverted => inner.events.row_deleted.emit(temp.clone()),
            },
            |adapter, _| adapter.add_row(new_row.clone()),
            |state, _| {
                state.model.remove_row(&temp);
                state.rows.row_removed(&state.model, &temp);
                state.refresh_layout();
            },
        )
        .await;
        inner.with_state(|state| state.add_row_in_flight = false);

        let id = match result? {
            None => temp,
            Some(stored) => {
                let id = stored.id.clone();
                let rekeyed = inner.with_state(|state| {
                    if !state.model.rekey_row(&temp, id.clone()) {
                        return false;
                    }
                    for (column, cell) in stored.cells {
                        state.model.set_value(&id, &column, cell.value().clone());
                    }
                    state.rows.row_rekeyed(&temp, &id);
                    if !state.rows.is_data_order() {
                        state.rebuild_rows();
                    }
                    if let Some(editing) = state.ui.editing.as_mut()
                        && editing.row_id == temp
                    {
                        editing.row_id = id.clone();
                    }
                    true
                });
                if rekeyed {
                    tracing::debug!(target: targets::ENGINE, %temp, %id, "row id assigned");
                    inner.events.row_id_changed.emit((temp, id.clone()));
                    inner.request_repaint();
                }
                id
            }
        };
        inner.hooks.row_add.run_after(&new_row);
        Ok(id)
    }

    /// Write several cells of one row, persisted as one row update.
    pub async fn update_row(&self, row: RowId, values: HashMap<ColumnId, CellValue>) -> Result<()> {
        let inner = &*self.inner;
        let patch = inner
            .hooks
            .row_update
            .run_before(RowPatch { row, values })
            .ok_or(GridError::Cancelled {
                operation: Operation::UpdateRow,
            })?;

        optimistic(
            inner,
            Operation::UpdateRow,
            |state| {
                if !state.model.contains_row(&patch.row) {
                    return Err(GridError::RowNotFound(patch.row.clone()));
                }
                if let Some(column) = patch.values.keys().find(|c| state.model.column(c).is_none()) {
                    return Err(GridError::ColumnNotFound(column.clone()));
                }
                let writes: Vec<(CellWrite, Option<String>)> = patch
                    .values
                    .iter()
                    .map(|(column, value)| {
                        let column_type = state
                            .model
                            .column(column)
                            .map(|c| c.column_type.clone())
                            .unwrap_or_default();
                        let message = inner.registry.get(&column_type).validate(value);
                        let write = CellWrite {
                            row: patch.row.clone(),
                            column: column.clone(),
                            value: value.clone(),
                        };
                        (write, message)
                    })
                    .collect();
                apply_writes(state, &writes)
            },
            |inner, snapshots, phase| {
                inner.events.row_updated.emit(patch.row.clone());
                notify_writes(inner, snapshots, phase);
            },
            |adapter, _| adapter.update_row(patch.row.clone(), patch.values.clone()),
            |state, snapshots| revert_writes(state, snapshots),
        )
        .await?;

        inner.hooks.row_update.run_after(&patch);
        Ok(())
    }

    /// Delete a row. A rollback puts it back at its original index.
    pub async fn delete_row(&self, row: RowId) -> Result<()> {
        let inner = &*self.inner;
        let row = inner
            .hooks
            .row_delete
            .run_before(row)
            .ok_or(GridError::Cancelled {
                operation: Operation::DeleteRow,
            })?;

        optimistic(
            inner,
            Operation::DeleteRow,
            |state| {
                let (index, removed) = state
                    .model
                    .remove_row(&row)
                    .ok_or_else(|| GridError::RowNotFound(row.clone()))?;
                state.rows.row_removed(&state.model, &row);
                state.refresh_layout();
                if state.ui.editing.as_ref().is_some_and(|e| e.row_id == row) {
                    state.ui.editing = None;
                }
                Ok((index, removed))
            },
            |inner, _, phase| {
                match phase {
                    Phase::Applied => inner.events.row_deleted.emit(row.clone()),
                    Phase::Reverted => inner.events.row_added.emit(row.clone()),
                }
                inner.emit_selection();
            },
            |adapter, _| adapter.delete_row(row.clone()),
            |state, (index, removed)| {
                state.model.insert_row(removed.clone(), Some(*index));
                state.rows.row_inserted(&state.model, &row);
                state.refresh_layout();
            },
        )
        .await?;

        inner.hooks.row_delete.run_after(&row);
        Ok(())
    }
}

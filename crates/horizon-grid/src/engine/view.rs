//! Row order, sorting and grouping.

use horizon_grid_core::logging::targets;

use super::GridEngine;
use crate::adapter::SortOutcome;
use crate::commands::RowMoveCommand;
use crate::error::{GridError, Operation, Result};
use crate::events::{GroupToggled, Moved};
use crate::model::{ColumnId, RowId};
use crate::optimistic::{Phase, optimistic};
use crate::view::{SortSpec, ViewRow};
use crate::viewport::VisibleRange;

impl GridEngine {
    /// The rows in display order, group headers included.
    pub fn view_rows(&self) -> Vec<ViewRow> {
        self.inner.with_state(|state| state.rows.rows().to_vec())
    }

    /// Data row ids in display order.
    pub fn view_row_ids(&self) -> Vec<RowId> {
        self.inner
            .with_state(|state| state.rows.data_row_ids().cloned().collect())
    }

    /// Rows and columns intersecting the viewport, with overscan.
    pub fn visible_range(&self) -> VisibleRange {
        self.inner.with_state(|state| {
            let columns = state.model.visible_columns();
            state
                .viewport
                .calculate_visible_range(state.rows.len(), &columns)
        })
    }

    pub fn sort_spec(&self) -> Option<SortSpec> {
        self.inner.with_state(|state| state.rows.sort().cloned())
    }

    pub fn grouping(&self) -> Option<ColumnId> {
        self.inner.with_state(|state| state.rows.grouping().cloned())
    }

    pub fn is_grouped(&self) -> bool {
        self.inner.with_state(|state| state.rows.is_grouped())
    }

    /// Move a row to `to` in data order, recorded for undo.
    ///
    /// Fails with [`GridError::ReorderWhileGrouped`] while the view is grouped.
    pub async fn move_row(&self, row: RowId, to: usize) -> Result<()> {
        let from = self.inner.with_state(|state| {
            if state.rows.is_grouped() {
                return Err(GridError::ReorderWhileGrouped);
            }
            state
                .model
                .row_index(&row)
                .ok_or_else(|| GridError::RowNotFound(row.clone()))
        })?;
        let to = to.min(self.row_count().saturating_sub(1));
        if from == to {
            return Ok(());
        }
        let command = RowMoveCommand::new(self.downgrade(), row, from, to);
        self.execute(Box::new(command)).await
    }

    /// Move a row in data order without recording history.
    pub(crate) async fn place_row(&self, row: RowId, to: usize) -> Result<()> {
        let inner = &*self.inner;
        optimistic(
            inner,
            Operation::MoveRow,
            |state| {
                let from = state
                    .model
                    .move_row(&row, to)
                    .ok_or_else(|| GridError::RowNotFound(row.clone()))?;
                let to = state.model.row_index(&row).unwrap_or(to);
                state.rebuild_rows();
                Ok((from, to))
            },
            |inner, (from, to), phase| {
                let (from, to) = match phase {
                    Phase::Applied => (*from, *to),
                    Phase::Reverted => (*to, *from),
                };
                inner.events.row_moved.emit(Moved {
                    id: row.clone(),
                    from,
                    to,
                });
            },
            |adapter, (_, to)| adapter.move_row(row.clone(), *to),
            |state, (from, _)| {
                state.model.move_row(&row, *from);
                state.rebuild_rows();
            },
        )
        .await?;
        Ok(())
    }

    /// Sort the view, or restore data order with `None`.
    ///
    /// When the adapter sorts server-side the data is re-fetched; the
    /// history is kept.
    pub async fn sort(&self, spec: Option<SortSpec>) -> Result<()> {
        let inner = &*self.inner;
        let spec = inner
            .hooks
            .sort
            .run_before(spec)
            .ok_or(GridError::Cancelled {
                operation: Operation::Sort,
            })?;

        let outcome = optimistic(
            inner,
            Operation::Sort,
            |state| {
                if let Some(spec) = &spec
                    && state.model.column(&spec.column).is_none()
                {
                    return Err(GridError::ColumnNotFound(spec.column.clone()));
                }
                let previous = state.rows.sort().cloned();
                state.rows.set_sort(spec.clone(), &state.model);
                state.refresh_layout();
                Ok(previous)
            },
            |inner, previous, phase| {
                let current = match phase {
                    Phase::Applied => spec.clone(),
                    Phase::Reverted => previous.clone(),
                };
                inner.events.sort_changed.emit(current);
            },
            |adapter, _| adapter.sort(spec.clone()),
            |state, previous| {
                state.rows.set_sort(previous.clone(), &state.model);
                state.refresh_layout();
            },
        )
        .await?;

        if outcome == Some(SortOutcome::Refetch) {
            tracing::debug!(target: targets::VIEW, "adapter sorted, re-fetching");
            self.refetch(Operation::Sort).await?;
        }
        inner.hooks.sort.run_after(&spec);
        Ok(())
    }

    /// Group rows by a column's value, or ungroup with `None`.
    ///
    /// The selection is cleared because view indices change meaning.
    pub fn group_by(&self, column: Option<ColumnId>) -> Result<()> {
        let inner = &*self.inner;
        inner.with_state(|state| {
            if let Some(column) = &column
                && state.model.column(column).is_none()
            {
                return Err(GridError::ColumnNotFound(column.clone()));
            }
            state.rows.group_by(column.clone(), &state.model);
            state.selection.clear();
            state.refresh_layout();
            Ok(())
        })?;
        tracing::debug!(target: targets::VIEW, grouping = ?column, "grouping changed");

        inner.events.grouping_changed.emit(column);
        inner.emit_selection();
        inner.request_repaint();
        Ok(())
    }

    /// Collapse or expand a group. Returns the new collapsed flag, or `None`
    /// if no group has that key.
    pub fn toggle_group(&self, key: &str) -> Option<bool> {
        let inner = &*self.inner;
        let (collapsed, selection_changed) = inner.with_state(|state| {
            let collapsed = state.rows.toggle_group(key, &state.model)?;
            Some((collapsed, state.refresh_layout()))
        })?;

        inner.events.group_toggled.emit(GroupToggled {
            key: key.to_string(),
            collapsed,
        });
        if selection_changed {
            inner.emit_selection();
        }
        inner.request_repaint();
        Some(collapsed)
    }

    pub fn collapse_all(&self) {
        self.relayout(|state| state.rows.collapse_all(&state.model));
    }

    pub fn expand_all(&self) {
        self.relayout(|state| state.rows.expand_all(&state.model));
    }

    fn relayout(&self, f: impl FnOnce(&mut super::GridState)) {
        let selection_changed = self.inner.with_state(|state| {
            f(state);
            state.refresh_layout()
        });
        if selection_changed {
            self.inner.emit_selection();
        }
        self.inner.request_repaint();
    }
}

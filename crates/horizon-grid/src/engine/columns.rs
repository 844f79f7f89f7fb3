//! Column mutations.

use horizon_grid_core::logging::{PerfSpan, span_names, targets};

use super::GridEngine;
use crate::adapter::FetchRequest;
use crate::commands::ColumnVisibilityCommand;
use crate::error::{GridError, Operation, Result};
use crate::events::Moved;
use crate::hooks::{ColumnPatch, ColumnResize};
use crate::input::auto_fit_width;
use crate::model::{Column, ColumnId, ColumnUpdate, PinPosition, clamp_column_width};
use crate::optimistic::{Phase, optimistic};

impl GridEngine {
    /// All columns in position order, hidden ones included.
    pub fn columns(&self) -> Vec<Column> {
        self.inner.with_state(|state| state.model.columns().to_vec())
    }

    /// Visible columns in visual order (pinned band first).
    pub fn visible_columns(&self) -> Vec<Column> {
        self.inner.with_state(|state| {
            state
                .model
                .visible_columns()
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn column(&self, id: &ColumnId) -> Option<Column> {
        self.inner.with_state(|state| state.model.column(id).cloned())
    }

    /// Insert a column at `index` in position order, or append it.
    ///
    /// Returns the column as the adapter stored it.
    pub async fn add_column(&self, column: Column, index: Option<usize>) -> Result<Column> {
        let inner = &*self.inner;
        let column = inner
            .hooks
            .column_add
            .run_before(column)
            .ok_or(GridError::Cancelled {
                operation: Operation::AddColumn,
            })?;
        let id = column.id.clone();

        let stored = optimistic(
            inner,
            Operation::AddColumn,
            |state| {
                if state.model.column(&id).is_some() {
                    return Err(GridError::DuplicateColumn(id.clone()));
                }
                state.model.insert_column(column.clone(), index);
                state.refresh_layout();
                Ok(())
            },
            |inner, _, phase| match phase {
                Phase::Applied => inner.events.column_added.emit(column.clone()),
                Phase::Reverted => inner.events.column_deleted.emit(id.clone()),
            },
            |adapter, _| adapter.add_column(column.clone()),
            |state, _| {
                state.model.remove_column(&id);
                state.refresh_layout();
            },
        )
        .await?;

        let result = match stored {
            Some(stored) if stored != column => {
                let current = inner.with_state(|state| {
                    state.model.replace_column(stored);
                    state.refresh_layout();
                    state.model.column(&id).cloned()
                });
                if let Some(current) = &current {
                    inner.events.column_updated.emit(current.clone());
                }
                current.unwrap_or_else(|| column.clone())
            }
            _ => column.clone(),
        };
        inner.hooks.column_add.run_after(&column);
        Ok(result)
    }

    /// Apply a partial update to a column. Returns the updated column.
    pub async fn update_column(&self, id: ColumnId, update: ColumnUpdate) -> Result<Column> {
        let inner = &*self.inner;
        let patch = inner
            .hooks
            .column_update
            .run_before(ColumnPatch { column: id, update })
            .ok_or(GridError::Cancelled {
                operation: Operation::UpdateColumn,
            })?;
        let ColumnPatch { column: id, update } = &patch;

        optimistic(
            inner,
            Operation::UpdateColumn,
            |state| {
                let previous = state
                    .model
                    .update_column(id, update)
                    .ok_or_else(|| GridError::ColumnNotFound(id.clone()))?;
                let current = state.model.column(id).cloned().unwrap_or_else(|| previous.clone());
                state.refresh_layout();
                Ok((previous, current))
            },
            |inner, (previous, current), phase| {
                let (from, to) = match phase {
                    Phase::Applied => (previous, current),
                    Phase::Reverted => (current, previous),
                };
                inner.events.column_updated.emit(to.clone());
                if from.visible != to.visible {
                    inner
                        .events
                        .column_visibility_changed
                        .emit((to.id.clone(), to.visible));
                    inner.emit_selection();
                }
                if from.pin != to.pin {
                    inner.events.column_pinned.emit((to.id.clone(), to.pin));
                }
            },
            |adapter, _| adapter.update_column(id.clone(), update.clone()),
            |state, (previous, _)| {
                state.model.replace_column(previous.clone());
                state.refresh_layout();
            },
        )
        .await?;

        let current = inner
            .with_state(|state| state.model.column(id).cloned())
            .ok_or_else(|| GridError::ColumnNotFound(id.clone()))?;
        inner.hooks.column_update.run_after(&patch);
        Ok(current)
    }

    /// Delete a column, then re-fetch the column set.
    ///
    /// A failed re-fetch is reported through the `error` event but does not
    /// fail the delete, which already persisted.
    pub async fn delete_column(&self, id: ColumnId) -> Result<()> {
        let inner = &*self.inner;
        let id = inner
            .hooks
            .column_delete
            .run_before(id)
            .ok_or(GridError::Cancelled {
                operation: Operation::DeleteColumn,
            })?;

        let persisted = optimistic(
            inner,
            Operation::DeleteColumn,
            |state| {
                let removed = state
                    .model
                    .remove_column(&id)
                    .ok_or_else(|| GridError::ColumnNotFound(id.clone()))?;
                if state.ui.editing.as_ref().is_some_and(|e| e.column_id == id) {
                    state.ui.editing = None;
                }
                state.refresh_layout();
                Ok(removed)
            },
            |inner, (_, column), phase| {
                match phase {
                    Phase::Applied => inner.events.column_deleted.emit(id.clone()),
                    Phase::Reverted => inner.events.column_added.emit(column.clone()),
                }
                inner.emit_selection();
            },
            |adapter, _| adapter.delete_column(id.clone()),
            |state, (index, column)| {
                state.model.insert_column(column.clone(), Some(*index));
                state.refresh_layout();
            },
        )
        .await?;

        if persisted.is_some() {
            // Failures are already published by refetch_columns.
            let _ = self.refetch_columns().await;
        }
        inner.hooks.column_delete.run_after(&id);
        Ok(())
    }

    /// Replace the local column set with the adapter's.
    async fn refetch_columns(&self) -> Result<()> {
        let inner = &*self.inner;
        let adapter = inner.adapter().ok_or(GridError::NoAdapter(Operation::Load))?;
        let request = FetchRequest {
            page_size: inner.config.page_size,
        };
        match adapter.fetch(request).await {
            Ok(data) => {
                inner.with_state(|state| {
                    state.model.replace_columns(data.columns);
                    state.refresh_layout();
                });
                inner.request_repaint();
                Ok(())
            }
            Err(source) => {
                let err = GridError::persistence(Operation::Load, source);
                inner.report(Operation::Load, &err);
                Err(err)
            }
        }
    }

    /// Set a column's width, clamped to the allowed range. Returns the
    /// applied width.
    pub async fn resize_column(&self, id: ColumnId, width: f32) -> Result<f32> {
        self.commit_column_width(id, width, None).await
    }

    /// Persist a width. `previous` is the width to roll back to when the
    /// model already shows the new width (a finished drag).
    pub(crate) async fn commit_column_width(
        &self,
        id: ColumnId,
        width: f32,
        previous: Option<f32>,
    ) -> Result<f32> {
        let inner = &*self.inner;
        let resize = inner
            .hooks
            .column_resize
            .run_before(ColumnResize {
                column: id,
                width: clamp_column_width(width),
            })
            .ok_or(GridError::Cancelled {
                operation: Operation::ResizeColumn,
            })?;
        let id = resize.column.clone();
        let width = clamp_column_width(resize.width);

        optimistic(
            inner,
            Operation::ResizeColumn,
            |state| {
                let old = state
                    .model
                    .set_column_width(&id, width)
                    .ok_or_else(|| GridError::ColumnNotFound(id.clone()))?;
                state.refresh_layout();
                Ok(previous.unwrap_or(old))
            },
            |inner, old, phase| {
                let applied = match phase {
                    Phase::Applied => width,
                    Phase::Reverted => *old,
                };
                inner.events.column_resized.emit((id.clone(), applied));
            },
            |adapter, _| adapter.resize_column(id.clone(), width),
            |state, old| {
                state.model.set_column_width(&id, *old);
                state.refresh_layout();
            },
        )
        .await?;

        inner.hooks.column_resize.run_after(&ColumnResize { column: id, width });
        Ok(width)
    }

    /// Move the visible column at visual index `from` to `to`.
    ///
    /// The destination is clamped to the column's band (pinned or
    /// unpinned). Returns the final visual index.
    pub async fn reorder_column(&self, from: usize, to: usize) -> Result<usize> {
        let inner = &*self.inner;
        let mut applied_to = to;
        optimistic(
            inner,
            Operation::ReorderColumn,
            |state| {
                let snapshot = state.model.columns_snapshot();
                let len = state.model.visible_columns().len();
                let (id, to) = state
                    .model
                    .move_column(from, to)
                    .ok_or(GridError::IndexOutOfBounds { index: from, len })?;
                let position = state.model.column_index(&id).unwrap_or(to);
                state.refresh_layout();
                applied_to = to;
                Ok((snapshot, Moved { id, from, to }, position))
            },
            |inner, (_, moved, _), phase| {
                let event = match phase {
                    Phase::Applied => moved.clone(),
                    Phase::Reverted => Moved {
                        id: moved.id.clone(),
                        from: moved.to,
                        to: moved.from,
                    },
                };
                inner.events.column_moved.emit(event);
            },
            |adapter, (_, moved, position)| adapter.reorder_column(moved.id.clone(), *position),
            |state, (snapshot, _, _)| {
                state.model.restore_columns(snapshot.clone());
                state.refresh_layout();
            },
        )
        .await?;
        Ok(applied_to)
    }

    /// Pin or unpin a column.
    pub async fn pin_column(&self, id: ColumnId, pin: PinPosition) -> Result<()> {
        let inner = &*self.inner;
        optimistic(
            inner,
            Operation::PinColumn,
            |state| {
                let snapshot = state.model.columns_snapshot();
                let old = state
                    .model
                    .set_column_pin(&id, pin)
                    .ok_or_else(|| GridError::ColumnNotFound(id.clone()))?;
                state.refresh_layout();
                Ok((snapshot, old))
            },
            |inner, (_, old), phase| {
                let applied = match phase {
                    Phase::Applied => pin,
                    Phase::Reverted => *old,
                };
                inner.events.column_pinned.emit((id.clone(), applied));
            },
            |adapter, _| adapter.pin_column(id.clone(), pin),
            |state, (snapshot, _)| {
                state.model.restore_columns(snapshot.clone());
                state.refresh_layout();
            },
        )
        .await?;
        Ok(())
    }

    /// Show or hide a column, recorded for undo.
    pub async fn set_column_visible(&self, id: ColumnId, visible: bool) -> Result<()> {
        let current = self
            .inner
            .with_state(|state| state.model.column(&id).map(|column| column.visible))
            .ok_or_else(|| GridError::ColumnNotFound(id.clone()))?;
        if current == visible {
            return Ok(());
        }
        let command = ColumnVisibilityCommand::new(self.downgrade(), id, visible);
        self.execute(Box::new(command)).await
    }

    pub(crate) async fn apply_column_visibility(&self, id: ColumnId, visible: bool) -> Result<()> {
        let update = ColumnUpdate {
            visible: Some(visible),
            ..ColumnUpdate::default()
        };
        self.update_column(id, update).await.map(|_| ())
    }

    /// Size a column to fit its header and a sample of its cells.
    /// Returns the applied width.
    pub async fn auto_fit_column(&self, id: ColumnId) -> Result<f32> {
        let inner = &*self.inner;
        let width = inner
            .with_state(|state| {
                let column = state.model.column(&id)?.clone();
                let cell_type = inner.registry.get(&column.column_type);
                let sample = inner.config.auto_fit.sample_rows;
                let row_ids: Vec<_> = state.rows.data_row_ids().take(sample).cloned().collect();
                let texts: Vec<String> = row_ids
                    .iter()
                    .map(|row| {
                        state
                            .model
                            .formatted(row, &id, |value| cell_type.format(value))
                            .unwrap_or_default()
                    })
                    .collect();

                let _span = PerfSpan::new(span_names::AUTO_FIT);
                let theme = &inner.config.theme;
                Some(auto_fit_width(
                    inner.measurer.as_ref(),
                    &inner.config.auto_fit,
                    (column.title.as_str(), theme.header_font.as_str()),
                    texts,
                    &theme.cell_font,
                ))
            })
            .ok_or_else(|| GridError::ColumnNotFound(id.clone()))?;
        tracing::debug!(target: targets::ENGINE, column = %id, width, "auto-fit");
        self.commit_column_width(id, width, None).await
    }
}

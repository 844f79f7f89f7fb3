//! Input dispatch, viewport, selection, menus and inline editing.

use horizon_grid_core::logging::targets;

use super::GridEngine;
use crate::error::{GridError, Operation, Result};
use crate::events::{CellAction, CellChange};
use crate::geometry::Point;
use crate::input::{
    CursorHint, DragOverlay, GestureState, GridIntent, InputOutcome, KeyEvent, PointerEvent,
    WheelEvent, wheel_delta,
};
use crate::menu::{ContextMenuContext, MenuState, MenuTarget, collect_menu_items};
use crate::render::{Frame, RenderSurface};
use crate::selection::{CellPosition, SelectionModel, SelectionRange};
use crate::ui_state::EditState;

impl GridEngine {
    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Feed a pointer event. Returns the cursor the host should show.
    ///
    /// Mutations the gesture produces (a finished resize, a drop, a fill)
    /// run before this returns.
    pub async fn handle_pointer(&self, event: PointerEvent) -> Result<Option<CursorHint>> {
        let inner = &*self.inner;
        let outcome = inner.with_state(|state| {
            state.dispatch_input(&inner.config, &inner.registry, |machine, ctx| {
                machine.handle_pointer(ctx, &event)
            })
        });
        let cursor = outcome.cursor;
        self.publish(outcome).await?;
        Ok(cursor)
    }

    /// Feed a key press.
    pub async fn handle_key(&self, event: KeyEvent) -> Result<()> {
        let inner = &*self.inner;
        let outcome = inner.with_state(|state| {
            state.dispatch_input(&inner.config, &inner.registry, |machine, ctx| {
                machine.handle_key(ctx, &event)
            })
        });
        self.publish(outcome).await
    }

    /// Scroll by a wheel event. Returns `true` if the viewport moved.
    pub fn handle_wheel(&self, event: WheelEvent) -> bool {
        let (dx, dy) = wheel_delta(&event, &self.inner.config);
        self.scroll_by(dx, dy)
    }

    async fn publish(&self, outcome: InputOutcome) -> Result<()> {
        let inner = &*self.inner;
        if let Some(change) = outcome.hover {
            inner.events.hover_changed.emit(change);
        }
        if outcome.selection_changed {
            inner.emit_selection();
        }
        if outcome.repaint || outcome.layout_changed || outcome.scroll_to.is_some() {
            inner.request_repaint();
        }
        for intent in outcome.intents {
            self.run_intent(intent).await?;
        }
        Ok(())
    }

    async fn run_intent(&self, intent: GridIntent) -> Result<()> {
        tracing::trace!(target: targets::INPUT, ?intent, "running intent");
        match intent {
            GridIntent::CommitColumnResize {
                column,
                width,
                previous,
            } => self
                .commit_column_width(column, width, Some(previous))
                .await
                .map(|_| ()),
            GridIntent::AutoFitColumn(column) => self.auto_fit_column(column).await.map(|_| ()),
            GridIntent::MoveColumn { from, to } => self.reorder_column(from, to).await.map(|_| ()),
            GridIntent::MoveRow { row, to } => {
                let to = self.inner.with_state(|state| {
                    state
                        .rows
                        .row_id_at(to)
                        .and_then(|id| state.model.row_index(id))
                        .unwrap_or_else(|| state.model.row_count().saturating_sub(1))
                });
                self.move_row(row, to).await
            }
            GridIntent::Fill { source, target } => self.fill(source, target).await,
            GridIntent::ContextMenu { position, target } => {
                self.open_context_menu(position, target);
                Ok(())
            }
            GridIntent::CellAction { position, action } => {
                let Some((row, column)) = self.inner.with_state(|state| state.resolve_cell(position))
                else {
                    return Ok(());
                };
                let value = action.value.clone();
                self.inner.events.cell_action.emit(CellAction {
                    position,
                    row: row.clone(),
                    column: column.clone(),
                    action,
                });
                match value {
                    Some(value) => self.update_cell(row, column, value).await,
                    None => Ok(()),
                }
            }
            GridIntent::BeginEdit { position, initial } => {
                self.begin_edit(position, initial);
                Ok(())
            }
            GridIntent::CancelEdit => {
                self.cancel_edit();
                Ok(())
            }
            GridIntent::CloseMenu => {
                self.close_menu();
                Ok(())
            }
            GridIntent::ToggleGroup(key) => {
                self.toggle_group(&key);
                Ok(())
            }
            GridIntent::Undo => self.undo().await.map(|_| ()),
            GridIntent::Redo => self.redo().await.map(|_| ()),
            GridIntent::Copy => {
                if let Some(text) = self.copy_selection() {
                    self.inner.events.copy_requested.emit(text);
                }
                Ok(())
            }
            GridIntent::ClearCells(range) => self.clear_cells(range).await,
        }
    }

    /// The active gesture.
    pub fn gesture(&self) -> GestureState {
        self.inner.with_state(|state| state.input.gesture().clone())
    }

    /// Drag feedback for the active gesture, if it draws any.
    pub fn drag_overlay(&self) -> Option<DragOverlay> {
        self.inner.with_state(|state| state.input.gesture().overlay())
    }

    pub fn hovered_cell(&self) -> Option<CellPosition> {
        self.inner.with_state(|state| state.ui.hover)
    }

    // -------------------------------------------------------------------------
    // Viewport
    // -------------------------------------------------------------------------

    pub fn scroll_position(&self) -> (f32, f32) {
        self.inner
            .with_state(|state| (state.viewport.scroll_left(), state.viewport.scroll_top()))
    }

    /// Scroll to an absolute offset (clamped). Returns `true` if it moved.
    pub fn scroll_to(&self, left: f32, top: f32) -> bool {
        self.move_viewport(|state| state.viewport.set_scroll(left, top))
    }

    /// Scroll by a delta (clamped). Returns `true` if it moved.
    pub fn scroll_by(&self, dx: f32, dy: f32) -> bool {
        self.move_viewport(|state| state.viewport.scroll_by(dx, dy))
    }

    /// Resize the visible area. Returns `true` if the size changed.
    pub fn set_viewport_size(&self, width: f32, height: f32) -> bool {
        self.move_viewport(|state| state.viewport.set_size(width, height))
    }

    /// Scroll the minimum amount that shows a cell.
    pub fn scroll_to_cell(&self, position: CellPosition) -> bool {
        self.move_viewport(|state| {
            let columns = state.model.visible_columns();
            state
                .viewport
                .ensure_cell_visible(position.row, position.col, &columns)
        })
    }

    /// Apply a viewport change; an open menu does not survive it.
    fn move_viewport(&self, f: impl FnOnce(&mut super::GridState) -> bool) -> bool {
        let moved = self.inner.with_state(|state| {
            let moved = f(state);
            if moved {
                state.dismiss_transient();
            }
            moved
        });
        if moved {
            self.inner.request_repaint();
        }
        moved
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn selection(&self) -> Vec<SelectionRange> {
        self.inner
            .with_state(|state| state.selection.ranges().to_vec())
    }

    /// The primary (focused) cell.
    pub fn primary_cell(&self) -> Option<CellPosition> {
        self.inner.with_state(|state| state.selection.primary())
    }

    pub fn select_cell(&self, position: CellPosition) -> bool {
        self.change_selection(|selection| selection.select_cell(position))
    }

    /// Replace the selection with a single rectangle.
    pub fn select_range(&self, range: SelectionRange) -> bool {
        self.change_selection(|selection| {
            let changed = selection.select_cell(range.start());
            selection.extend_to(range.end()) || changed
        })
    }

    pub fn select_row(&self, row: usize, additive: bool) -> bool {
        self.change_selection(|selection| selection.select_row(row, additive))
    }

    pub fn select_column(&self, col: usize, additive: bool) -> bool {
        self.change_selection(|selection| selection.select_column(col, additive))
    }

    pub fn select_all(&self) -> bool {
        self.change_selection(SelectionModel::select_all)
    }

    pub fn clear_selection(&self) -> bool {
        self.change_selection(|selection| {
            let had = !selection.is_empty();
            selection.clear();
            had
        })
    }

    fn change_selection(&self, f: impl FnOnce(&mut SelectionModel) -> bool) -> bool {
        let changed = self.inner.with_state(|state| f(&mut state.selection));
        if changed {
            self.inner.emit_selection();
            self.inner.request_repaint();
        }
        changed
    }

    // -------------------------------------------------------------------------
    // Context menu
    // -------------------------------------------------------------------------

    /// Ask the menu providers for items and open a menu at `position`.
    ///
    /// Providers run without the engine lock held.
    pub fn open_context_menu(&self, position: Point, target: MenuTarget) -> MenuState {
        let inner = &*self.inner;
        let context = inner.with_state(|state| {
            let (row_id, column_id) = match &target {
                MenuTarget::Cell(cell) => match state.resolve_cell(*cell) {
                    Some((row, column)) => (Some(row), Some(column)),
                    None => (
                        None,
                        state
                            .model
                            .visible_columns()
                            .get(cell.col)
                            .map(|column| column.id.clone()),
                    ),
                },
                MenuTarget::Column(column) => (None, Some(column.clone())),
                MenuTarget::RowHeader(row) => (state.rows.row_id_at(*row).cloned(), None),
            };
            ContextMenuContext {
                target: target.clone(),
                row_id,
                column_id,
                selection: state.selection.bounds(),
            }
        });

        let items = collect_menu_items(&inner.menu_providers, &context);
        let menu = MenuState {
            position,
            context,
            items,
        };
        inner.with_state(|state| state.ui.menu = Some(menu.clone()));
        tracing::debug!(target: targets::INPUT, items = menu.items.len(), "context menu opened");

        inner.events.context_menu_requested.emit(menu.clone());
        inner.request_repaint();
        menu
    }

    /// Close the context menu. Returns `false` if none was open.
    pub fn close_menu(&self) -> bool {
        let closed = self.inner.with_state(|state| state.ui.menu.take().is_some());
        if closed {
            self.inner.events.menu_closed.emit(());
            self.inner.request_repaint();
        }
        closed
    }

    pub fn menu(&self) -> Option<MenuState> {
        self.inner.with_state(|state| state.ui.menu.clone())
    }

    // -------------------------------------------------------------------------
    // Inline editing
    // -------------------------------------------------------------------------

    pub fn editing(&self) -> Option<EditState> {
        self.inner.with_state(|state| state.ui.editing.clone())
    }

    /// Open the editor on a data cell. `initial` replaces the cell text
    /// (type-to-edit). Returns `false` for group headers and unknown cells.
    pub fn begin_edit(&self, position: CellPosition, initial: Option<String>) -> bool {
        let inner = &*self.inner;
        let started = inner.with_state(|state| {
            let (row_id, column_id) = state.resolve_cell(position)?;
            let edit = EditState {
                position,
                row_id,
                column_id,
                initial,
            };
            state.ui.editing = Some(edit.clone());
            let columns = state.model.visible_columns();
            if state
                .viewport
                .ensure_cell_visible(position.row, position.col, &columns)
            {
                state.dismiss_transient();
            }
            Some(edit)
        });
        let Some(edit) = started else {
            return false;
        };
        inner.events.cell_edit_started.emit(edit);
        inner.request_repaint();
        true
    }

    /// Close the editor and write `text`, parsed by the column's cell type.
    ///
    /// Does nothing when no editor is open. If the edited row or column was
    /// removed while the editor was open, the text is discarded and the
    /// failure is reported on the error signal.
    pub async fn commit_edit(&self, text: &str) -> Result<()> {
        let inner = &*self.inner;
        let Some(pending) = inner.with_state(|state| {
            let edit = state.ui.editing.take()?;
            let Some(column) = state.model.column(&edit.column_id) else {
                let error = GridError::ColumnNotFound(edit.column_id.clone());
                return Some(Err((edit, error)));
            };
            if !state.model.contains_row(&edit.row_id) {
                let error = GridError::RowNotFound(edit.row_id.clone());
                return Some(Err((edit, error)));
            }
            let value = inner.registry.get(&column.column_type).parse(text);
            let old = state
                .model
                .value(&edit.row_id, &edit.column_id)
                .cloned()
                .unwrap_or_default();
            Some(Ok((edit, value, old)))
        }) else {
            return Ok(());
        };
        inner.request_repaint();
        let (edit, value, old) = match pending {
            Ok(pending) => pending,
            Err((edit, error)) => {
                tracing::warn!(
                    target: targets::ENGINE,
                    row = %edit.row_id,
                    column = %edit.column_id,
                    "edit target vanished, input discarded"
                );
                inner.report(Operation::UpdateCell, &error);
                return Err(error);
            }
        };

        self.update_cell(edit.row_id.clone(), edit.column_id.clone(), value)
            .await?;
        let new = self
            .cell_value(&edit.row_id, &edit.column_id)
            .unwrap_or_default();
        inner.events.cell_edit_committed.emit(CellChange {
            row: edit.row_id,
            column: edit.column_id,
            old,
            new,
        });
        Ok(())
    }

    /// Close the editor without writing. Returns `false` if none was open.
    pub fn cancel_edit(&self) -> bool {
        let cancelled = self.inner.with_state(|state| state.ui.editing.take());
        let Some(edit) = cancelled else {
            return false;
        };
        self.inner.events.cell_edit_cancelled.emit(edit.position);
        self.inner.request_repaint();
        true
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// Snapshot the visible part of the grid.
    pub fn frame(&self) -> Frame {
        let inner = &*self.inner;
        inner.with_state(|state| Frame::build(state, &inner.registry, &inner.config))
    }

    /// Build a frame and hand it to `surface` after releasing the lock.
    pub fn render(&self, surface: &mut dyn RenderSurface) {
        let frame = self.frame();
        surface.render(&frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Key, KeyboardModifiers, MouseButton, PointerKind};
    use crate::menu::MenuItem;
    use crate::model::{CellValue, Column, ColumnId, Row, RowId};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn engine() -> GridEngine {
        let columns = vec![
            Column::new("name", "Name").with_width(100.0),
            Column::new("done", "Done").with_type("boolean").with_width(100.0),
        ];
        let rows = (1..=3)
            .map(|i| {
                Row::new(i.to_string())
                    .with_value("name", format!("row {i}"))
                    .with_value("done", false)
            })
            .collect();
        GridEngine::builder()
            .data(columns, rows)
            .menu_provider(|context: &ContextMenuContext| match context.target {
                MenuTarget::Cell(_) => vec![MenuItem::action("copy", "Copy")],
                _ => Vec::new(),
            })
            .build()
            .unwrap()
    }

    // Header 36px, rows 32px, row header 60px, columns 100px.
    fn cell_center(row: usize, col: usize) -> (f32, f32) {
        (60.0 + 100.0 * col as f32 + 50.0, 36.0 + 32.0 * row as f32 + 16.0)
    }

    #[tokio::test]
    async fn test_click_selects_and_emits() {
        let engine = engine();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        engine
            .events()
            .selection_changed
            .connect(move |ranges| sink.lock().push(ranges.len()));

        let (x, y) = cell_center(1, 0);
        engine.handle_pointer(PointerEvent::press(x, y, 0.0)).await.unwrap();
        engine.handle_pointer(PointerEvent::release(x, y, 10.0)).await.unwrap();

        assert_eq!(engine.primary_cell(), Some(CellPosition::new(1, 0)));
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[tokio::test]
    async fn test_checkbox_click_toggles_value() {
        let engine = engine();
        let (x, y) = cell_center(0, 1);
        engine.handle_pointer(PointerEvent::press(x, y, 0.0)).await.unwrap();
        engine.handle_pointer(PointerEvent::release(x, y, 5.0)).await.unwrap();
        assert_eq!(
            engine.cell_value(&RowId::new("1"), &ColumnId::new("done")),
            Some(CellValue::Bool(true))
        );
        assert!(engine.can_undo());
    }

    #[tokio::test]
    async fn test_edit_commit_parses_input() {
        let engine = engine();
        assert!(engine.begin_edit(CellPosition::new(2, 0), None));
        assert!(engine.editing().is_some());

        let committed = Arc::new(Mutex::new(None));
        let sink = committed.clone();
        engine
            .events()
            .cell_edit_committed
            .connect(move |change| *sink.lock() = Some(change.clone()));

        engine.commit_edit("renamed").await.unwrap();
        assert!(engine.editing().is_none());
        let change = committed.lock().clone().unwrap();
        assert_eq!(change.old, CellValue::from("row 3"));
        assert_eq!(change.new, CellValue::from("renamed"));
    }

    #[tokio::test]
    async fn test_escape_cancels_edit() {
        let engine = engine();
        engine.begin_edit(CellPosition::new(0, 0), Some("x".into()));
        engine.handle_key(KeyEvent::new(Key::Escape)).await.unwrap();
        assert!(engine.editing().is_none());
        assert_eq!(
            engine.cell_value(&RowId::new("1"), &ColumnId::new("name")),
            Some(CellValue::from("row 1"))
        );
    }

    #[tokio::test]
    async fn test_context_menu_and_scroll_close() {
        let engine = engine();
        engine.set_viewport_size(300.0, 100.0);
        let (x, y) = cell_center(0, 0);
        let event = PointerEvent::new(PointerKind::ContextMenu, x, y, 0.0)
            .with_button(MouseButton::Right);
        engine.handle_pointer(event).await.unwrap();

        let menu = engine.menu().unwrap();
        assert_eq!(menu.items, vec![MenuItem::action("copy", "Copy")]);
        assert_eq!(menu.context.row_id, Some(RowId::new("1")));

        assert!(engine.scroll_by(0.0, 20.0));
        assert!(engine.menu().is_none());
    }

    #[tokio::test]
    async fn test_copy_shortcut_publishes_text() {
        let engine = engine();
        engine.select_cell(CellPosition::new(0, 0));
        let copied = Arc::new(Mutex::new(None));
        let sink = copied.clone();
        engine
            .events()
            .copy_requested
            .connect(move |text| *sink.lock() = Some(text.clone()));

        let key = KeyEvent::new(Key::Char('c')).with_modifiers(KeyboardModifiers::CTRL);
        engine.handle_key(key).await.unwrap();
        assert_eq!(copied.lock().as_deref(), Some("row 1"));
    }

    #[test]
    fn test_render_hands_frame_to_surface() {
        let engine = engine();
        engine.select_cell(CellPosition::new(1, 1));
        let mut rows = 0;
        let mut surface = |frame: &Frame| {
            rows = frame.rows.len();
            assert_eq!(frame.primary, Some(CellPosition::new(1, 1)));
            assert!(frame.fill_handle.is_some());
        };
        engine.render(&mut surface);
        assert_eq!(rows, 3);
    }

    fn tall_engine(rows: usize) -> GridEngine {
        let engine = engine();
        let rows = (0..rows)
            .map(|i| Row::new(i.to_string()).with_value("name", i as i64))
            .collect();
        engine.set_data(vec![Column::new("name", "Name").with_width(100.0)], rows);
        engine.set_viewport_size(300.0, 36.0 + 32.0 * 4.0);
        engine
    }

    fn count_menu_closes(engine: &GridEngine) -> Arc<Mutex<usize>> {
        let closed = Arc::new(Mutex::new(0));
        let sink = closed.clone();
        engine.events().menu_closed.connect(move |_| *sink.lock() += 1);
        closed
    }

    #[tokio::test]
    async fn test_keyboard_scroll_closes_menu() {
        let engine = tall_engine(40);
        engine.select_cell(CellPosition::new(0, 0));
        let (x, y) = cell_center(0, 0);
        engine.open_context_menu(Point::new(x, y), MenuTarget::Cell(CellPosition::new(0, 0)));
        let closed = count_menu_closes(&engine);

        for _ in 0..10 {
            engine.handle_key(KeyEvent::new(Key::ArrowDown)).await.unwrap();
        }

        assert_eq!(engine.primary_cell(), Some(CellPosition::new(10, 0)));
        assert!(engine.scroll_position().1 > 0.0);
        assert!(engine.menu().is_none());
        assert_eq!(*closed.lock(), 1);
    }

    #[tokio::test]
    async fn test_navigation_without_scroll_keeps_menu() {
        let engine = tall_engine(40);
        engine.select_cell(CellPosition::new(0, 0));
        engine.open_context_menu(Point::new(110.0, 52.0), MenuTarget::Cell(CellPosition::new(0, 0)));
        let closed = count_menu_closes(&engine);

        engine.handle_key(KeyEvent::new(Key::ArrowDown)).await.unwrap();

        assert_eq!(engine.scroll_position().1, 0.0);
        assert!(engine.menu().is_some());
        assert_eq!(*closed.lock(), 0);
    }

    #[tokio::test]
    async fn test_content_shrink_clamps_scroll_and_closes_menu() {
        let engine = tall_engine(40);
        assert!(engine.scroll_to(0.0, 10_000.0));
        let bottom = engine.scroll_position().1;
        engine.open_context_menu(Point::new(110.0, 52.0), MenuTarget::Cell(CellPosition::new(0, 0)));
        let closed = count_menu_closes(&engine);

        engine.delete_row(RowId::new("39")).await.unwrap();

        assert_eq!(engine.scroll_position().1, bottom - 32.0);
        assert!(engine.menu().is_none());
        assert_eq!(*closed.lock(), 1);
    }

    #[tokio::test]
    async fn test_begin_edit_scroll_closes_menu() {
        let engine = tall_engine(40);
        engine.open_context_menu(Point::new(110.0, 52.0), MenuTarget::Cell(CellPosition::new(0, 0)));
        let closed = count_menu_closes(&engine);

        assert!(engine.begin_edit(CellPosition::new(20, 0), None));

        assert!(engine.menu().is_none());
        assert_eq!(*closed.lock(), 1);
    }

    #[tokio::test]
    async fn test_fill_handle_follows_last_range() {
        let engine = engine();
        engine.select_range(SelectionRange::cells(CellPosition::new(1, 0), CellPosition::new(2, 0)));
        let (x, y) = cell_center(0, 0);
        let add = KeyboardModifiers::CTRL;
        engine
            .handle_pointer(PointerEvent::press(x, y, 0.0).with_modifiers(add))
            .await
            .unwrap();
        engine.handle_pointer(PointerEvent::release(x, y, 10.0)).await.unwrap();

        let handle = engine.frame().fill_handle.unwrap();
        // Bottom-right corner of cell (0, 0), not of the selection bounds.
        let corner = Point::new(60.0 + 100.0, 36.0 + 32.0);
        assert!(handle.contains(corner));

        let grab = Point::new(
            handle.left() + handle.width() / 2.0,
            handle.top() + handle.height() / 2.0,
        );
        engine
            .handle_pointer(PointerEvent::press(grab.x, grab.y, 500.0))
            .await
            .unwrap();
        match engine.gesture() {
            GestureState::Filling { source, .. } => {
                assert_eq!(source, SelectionRange::cell(CellPosition::new(0, 0)));
            }
            other => panic!("expected a fill gesture, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_commit_after_column_vanished_reports_error() {
        let engine = engine();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        engine
            .events()
            .error
            .connect(move |event| sink.lock().push(event.operation));
        assert!(engine.begin_edit(CellPosition::new(0, 0), None));

        // A column refetch can drop the edited column without closing the editor.
        engine.inner.with_state(|state| {
            state.model.remove_column(&ColumnId::new("name"));
            state.refresh_layout();
        });

        let err = engine.commit_edit("lost").await.unwrap_err();
        assert!(matches!(err, GridError::ColumnNotFound(ref id) if id == &ColumnId::new("name")));
        assert!(engine.editing().is_none());
        assert_eq!(*errors.lock(), vec![Some(Operation::UpdateCell)]);
    }

    #[tokio::test]
    async fn test_commit_after_row_vanished_reports_error() {
        let engine = engine();
        let errors = Arc::new(Mutex::new(0));
        let sink = errors.clone();
        engine.events().error.connect(move |_| *sink.lock() += 1);
        assert!(engine.begin_edit(CellPosition::new(1, 0), None));

        engine.inner.with_state(|state| {
            state.model.remove_row(&RowId::new("2"));
            state.rebuild_rows();
        });

        let err = engine.commit_edit("lost").await.unwrap_err();
        assert!(matches!(err, GridError::RowNotFound(_)));
        assert_eq!(*errors.lock(), 1);
    }
}

//! Pointer and keyboard interpretation.
//!
//! [`InputStateMachine`] turns raw events into selection changes, which it
//! applies directly, and [`GridIntent`]s, which the engine executes through
//! the mutation pipeline. Live column resizing is the only model mutation
//! made here; the final width is committed by the engine.

use horizon_grid_core::logging::targets;

use crate::config::GridConfig;
use crate::geometry::{Point, Rect};
use crate::hit_test::{self, HoverChange, HoverTracker, NormalizedEvent, Region};
use crate::input::click::ClickTracker;
use crate::input::fill::fill_target;
use crate::input::gesture::GestureState;
use crate::input::reorder::{column_spans, compute_reorder_target};
use crate::input::{
    CursorHint, Key, KeyEvent, MouseButton, PointerEvent, PointerKind, WheelEvent, WheelUnit,
};
use crate::menu::MenuTarget;
use crate::model::{ColumnId, DataModel, MIN_COLUMN_WIDTH, RowId, clamp_column_width};
use crate::registry::{CellRenderContext, CellTypeRegistry, HitAction};
use crate::selection::{CellPosition, SelectionModel, SelectionRange};
use crate::ui_state::UiState;
use crate::view::{RowView, ViewRow};
use crate::viewport::Viewport;

/// Borrowed engine state the input machine works against.
pub struct InputContext<'a> {
    pub model: &'a mut DataModel,
    pub rows: &'a RowView,
    pub viewport: &'a Viewport,
    pub selection: &'a mut SelectionModel,
    pub ui: &'a UiState,
    pub config: &'a GridConfig,
    pub registry: &'a CellTypeRegistry,
}

impl InputContext<'_> {
    fn normalize(&self, position: Point) -> NormalizedEvent {
        let columns = self.model.visible_columns();
        hit_test::normalize(self.viewport, position, self.rows.len(), &columns)
    }

    /// Column whose right edge is under a header position.
    fn header_edge(&self, event: &NormalizedEvent) -> Option<(ColumnId, f32)> {
        if event.region != Region::Header {
            return None;
        }
        let columns = self.model.visible_columns();
        let tolerance = self.config.interaction.resize_edge_tolerance;
        let edge = hit_test::column_edge_at(event.content_x, &columns, tolerance)?;
        columns.get(edge).map(|c| (c.id.clone(), c.width))
    }

    fn in_header_menu_zone(&self, event: &NormalizedEvent) -> bool {
        let Some(col) = event.col else {
            return false;
        };
        let columns = self.model.visible_columns();
        let Some(column) = columns.get(col) else {
            return false;
        };
        let right = self.viewport.column_screen_x(col, &columns) + column.width;
        event.position.x >= right - self.config.interaction.header_menu_zone_width
    }

    fn fill_handle(&self) -> Option<Rect> {
        let range = self.selection.last_range()?;
        let columns = self.model.visible_columns();
        self.viewport
            .fill_handle_rect(range, &columns, self.config.interaction.fill_handle_size)
    }

    fn group_key_at(&self, row: usize) -> Option<String> {
        match self.rows.get(row)? {
            ViewRow::GroupHeader(header) => Some(header.key.clone()),
            ViewRow::Data(_) => None,
        }
    }

    fn cell_hit_action(
        &self,
        event: &NormalizedEvent,
        hover: Option<CellPosition>,
    ) -> Option<HitAction> {
        let pos = event.cell()?;
        let row_id = self.rows.row_id_at(pos.row)?;
        let column_id = event.column_id.as_ref()?;
        let columns = self.model.visible_columns();
        let rect = self.viewport.cell_rect(pos.row, pos.col, &columns)?;
        let context = CellRenderContext {
            rect,
            value: self
                .model
                .value(row_id, column_id)
                .cloned()
                .unwrap_or_default(),
            selected: self.selection.is_cell_selected(pos.row, pos.col),
            focused: self.selection.primary() == Some(pos),
            hovered: hover == Some(pos),
        };
        let column_type = event.column_type.as_deref().unwrap_or("text");
        self.registry
            .get(column_type)
            .hit_test(&context, event.position)
    }

    /// Content-space `(left, width)` of every visible column.
    fn column_spans(&self) -> Vec<(f32, f32)> {
        column_spans(self.model.visible_columns().iter().map(|c| c.width))
    }

    fn column_count(&self) -> usize {
        self.model.visible_columns().len()
    }
}

/// An operation the engine should run in response to input.
#[derive(Debug, Clone, PartialEq)]
pub enum GridIntent {
    /// Persist the width reached by a resize drag.
    CommitColumnResize {
        column: ColumnId,
        width: f32,
        previous: f32,
    },
    AutoFitColumn(ColumnId),
    /// Move a visible column between visual indices.
    MoveColumn { from: usize, to: usize },
    /// Move a data row to the position of view row `to`.
    MoveRow { row: RowId, to: usize },
    Fill {
        source: SelectionRange,
        target: SelectionRange,
    },
    ContextMenu { position: Point, target: MenuTarget },
    CellAction {
        position: CellPosition,
        action: HitAction,
    },
    BeginEdit {
        position: CellPosition,
        initial: Option<String>,
    },
    CancelEdit,
    CloseMenu,
    ToggleGroup(String),
    Undo,
    Redo,
    Copy,
    ClearCells(SelectionRange),
}

/// What handling one event produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputOutcome {
    pub intents: Vec<GridIntent>,
    pub repaint: bool,
    pub selection_changed: bool,
    /// Column widths changed during a live resize.
    pub layout_changed: bool,
    pub hover: Option<HoverChange>,
    pub cursor: Option<CursorHint>,
    /// Cell to scroll into view after keyboard navigation.
    pub scroll_to: Option<CellPosition>,
}

impl InputOutcome {
    fn intent(mut self, intent: GridIntent) -> Self {
        self.intents.push(intent);
        self
    }

    fn selection(mut self, changed: bool) -> Self {
        self.selection_changed |= changed;
        self.repaint |= changed;
        self
    }
}

/// Gesture tracking plus double-click and hover detection.
#[derive(Debug, Clone)]
pub struct InputStateMachine {
    gesture: GestureState,
    clicks: ClickTracker,
    hover: HoverTracker,
}

impl InputStateMachine {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            gesture: GestureState::Idle,
            clicks: ClickTracker::new(
                config.interaction.double_click_distance,
                config.interaction.double_click_ms,
            ),
            hover: HoverTracker::default(),
        }
    }

    /// The active gesture.
    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    /// The hovered cell.
    pub fn hovered(&self) -> Option<CellPosition> {
        self.hover.current()
    }

    /// Drop any gesture without side effects, e.g. after the data was replaced.
    pub fn reset(&mut self) {
        self.gesture = GestureState::Idle;
        self.clicks.reset();
    }

    fn set_gesture(&mut self, gesture: GestureState) {
        if gesture != self.gesture {
            tracing::trace!(
                target: targets::INPUT,
                from = self.gesture.name(),
                to = gesture.name(),
                "gesture transition"
            );
        }
        self.gesture = gesture;
    }

    /// Handle a pointer event.
    pub fn handle_pointer(&mut self, ctx: &mut InputContext<'_>, event: &PointerEvent) -> InputOutcome {
        match event.kind {
            PointerKind::Press if event.button == MouseButton::Left => self.press(ctx, event),
            PointerKind::Press => InputOutcome::default(),
            PointerKind::Move => self.moved(ctx, event),
            PointerKind::Release => self.release(ctx),
            PointerKind::DoubleClick => self.native_double_click(ctx, event),
            PointerKind::ContextMenu => self.context_menu(ctx, event),
            PointerKind::Leave => {
                let mut outcome = InputOutcome::default();
                if self.gesture.is_idle() {
                    outcome.hover = self.hover.update(None);
                    outcome.repaint = outcome.hover.is_some();
                }
                outcome
            }
        }
    }

    fn press(&mut self, ctx: &mut InputContext<'_>, event: &PointerEvent) -> InputOutcome {
        let mut outcome = InputOutcome::default();
        if ctx.ui.menu.is_some() {
            outcome = outcome.intent(GridIntent::CloseMenu);
        }
        let double = self
            .clicks
            .press(event.position, event.button, event.timestamp_ms);
        let hit = ctx.normalize(event.position);
        let modifiers = event.modifiers;

        match hit.region {
            Region::Corner => {
                let changed = ctx.selection.select_all();
                outcome.selection(changed)
            }
            Region::Header => {
                if let Some((column, width)) = ctx.header_edge(&hit) {
                    if double {
                        return outcome.intent(GridIntent::AutoFitColumn(column));
                    }
                    self.set_gesture(GestureState::ResizingColumn {
                        column,
                        start_x: event.position.x,
                        start_width: width,
                    });
                    outcome.cursor = Some(CursorHint::ColumnResize);
                    return outcome;
                }
                let Some(col) = hit.col else {
                    return outcome;
                };
                if ctx.in_header_menu_zone(&hit)
                    && let Some(column) = hit.column_id.clone()
                {
                    return outcome.intent(GridIntent::ContextMenu {
                        position: event.position,
                        target: MenuTarget::Column(column),
                    });
                }
                self.set_gesture(GestureState::ColumnReorderCandidate {
                    col,
                    start: event.position,
                    modifiers,
                });
                outcome
            }
            Region::RowHeader => {
                let Some(row) = hit.row else {
                    return outcome;
                };
                if let Some(key) = ctx.group_key_at(row) {
                    return outcome.intent(GridIntent::ToggleGroup(key));
                }
                if event.position.x < ctx.config.interaction.checkbox_zone_width {
                    let changed = ctx.selection.toggle_row(row);
                    return outcome.selection(changed);
                }
                let reorder = ctx.selection.is_row_selected(row) && !ctx.rows.is_grouped();
                self.set_gesture(GestureState::RowPressCandidate {
                    row,
                    start: event.position,
                    reorder,
                    modifiers,
                });
                outcome
            }
            Region::Cell => {
                if let Some(handle) = ctx.fill_handle()
                    && handle.contains(event.position)
                    && let Some(source) = ctx.selection.last_range().copied()
                {
                    self.set_gesture(GestureState::Filling {
                        source,
                        target: source,
                    });
                    outcome.cursor = Some(CursorHint::Crosshair);
                    return outcome;
                }
                let Some(pos) = hit.cell() else {
                    return outcome;
                };
                if let Some(key) = ctx.group_key_at(pos.row) {
                    return outcome.intent(GridIntent::ToggleGroup(key));
                }
                if let Some(action) = ctx.cell_hit_action(&hit, self.hover.current()) {
                    let changed = ctx.selection.select_cell(pos);
                    return outcome.selection(changed).intent(GridIntent::CellAction {
                        position: pos,
                        action,
                    });
                }
                if double {
                    return outcome.intent(GridIntent::BeginEdit {
                        position: pos,
                        initial: None,
                    });
                }

                let changed = if modifiers.shift {
                    ctx.selection.extend_to(pos)
                } else if modifiers.command() {
                    ctx.selection.add_range(pos)
                } else {
                    ctx.selection.select_cell(pos)
                };
                let anchor = ctx.selection.anchor().unwrap_or(pos);
                self.set_gesture(GestureState::SelectingCells { anchor });
                outcome.selection(changed)
            }
        }
    }

    fn moved(&mut self, ctx: &mut InputContext<'_>, event: &PointerEvent) -> InputOutcome {
        let mut outcome = InputOutcome::default();
        let threshold = ctx.config.interaction.drag_threshold;

        match self.gesture.clone() {
            GestureState::Idle => {
                let hit = ctx.normalize(event.position);
                let cell = (hit.region == Region::Cell).then(|| hit.cell()).flatten();
                outcome.hover = self.hover.update(cell);
                outcome.repaint = outcome.hover.is_some();
                outcome.cursor = Some(idle_cursor(ctx, &hit));
            }
            GestureState::ResizingColumn {
                column,
                start_x,
                start_width,
            } => {
                let width =
                    clamp_column_width((start_width + event.position.x - start_x).max(MIN_COLUMN_WIDTH));
                if ctx.model.set_column_width(&column, width).is_some_and(|old| old != width) {
                    outcome.layout_changed = true;
                    outcome.repaint = true;
                }
                outcome.cursor = Some(CursorHint::ColumnResize);
            }
            GestureState::ColumnReorderCandidate { col, start, .. } => {
                if start.distance_to(event.position) > threshold {
                    let target = reorder_target(ctx, col, event.position.x - start.x);
                    self.set_gesture(GestureState::ReorderingColumn {
                        col,
                        start_x: start.x,
                        current_x: event.position.x,
                        target,
                    });
                    outcome.repaint = true;
                    outcome.cursor = Some(CursorHint::Grabbing);
                }
            }
            GestureState::ReorderingColumn { col, start_x, .. } => {
                let target = reorder_target(ctx, col, event.position.x - start_x);
                self.set_gesture(GestureState::ReorderingColumn {
                    col,
                    start_x,
                    current_x: event.position.x,
                    target,
                });
                outcome.repaint = true;
                outcome.cursor = Some(CursorHint::Grabbing);
            }
            GestureState::RowPressCandidate {
                row,
                start,
                reorder,
                ..
            } => {
                if reorder && (event.position.y - start.y).abs() > threshold {
                    let target = drop_row(ctx, event.position);
                    self.set_gesture(GestureState::ReorderingRow {
                        row,
                        current_y: event.position.y,
                        target,
                    });
                    outcome.repaint = true;
                    outcome.cursor = Some(CursorHint::Grabbing);
                } else if !reorder {
                    let hit = ctx.normalize(event.position);
                    if let Some(current) = hit.row
                        && current != row
                    {
                        let changed = ctx.selection.select_rows(row, current);
                        self.set_gesture(GestureState::SelectingRows { anchor_row: row });
                        outcome = outcome.selection(changed);
                    }
                }
            }
            GestureState::ReorderingRow { row, .. } => {
                let target = drop_row(ctx, event.position);
                self.set_gesture(GestureState::ReorderingRow {
                    row,
                    current_y: event.position.y,
                    target,
                });
                outcome.repaint = true;
                outcome.cursor = Some(CursorHint::Grabbing);
            }
            GestureState::SelectingCells { .. } => {
                if let Some(pos) = ctx.normalize(event.position).cell()
                    && ctx.selection.extent() != Some(pos)
                {
                    let changed = ctx.selection.extend_to(pos);
                    outcome = outcome.selection(changed);
                }
            }
            GestureState::SelectingRows { anchor_row } => {
                if let Some(row) = ctx.normalize(event.position).row {
                    let changed = ctx.selection.select_rows(anchor_row, row);
                    outcome = outcome.selection(changed);
                }
            }
            GestureState::Filling { source, target } => {
                if let Some(pos) = ctx.normalize(event.position).cell() {
                    let next = fill_target(source, pos);
                    if next != target {
                        self.set_gesture(GestureState::Filling {
                            source,
                            target: next,
                        });
                        outcome.repaint = true;
                    }
                }
                outcome.cursor = Some(CursorHint::Crosshair);
            }
        }
        outcome
    }

    fn release(&mut self, ctx: &mut InputContext<'_>) -> InputOutcome {
        let mut outcome = InputOutcome::default();
        let gesture = std::mem::take(&mut self.gesture);
        tracing::trace!(target: targets::INPUT, gesture = gesture.name(), "pointer released");

        match gesture {
            GestureState::ResizingColumn {
                column,
                start_width,
                ..
            } => {
                if let Some(width) = ctx.model.column(&column).map(|c| c.width)
                    && width != start_width
                {
                    outcome = outcome.intent(GridIntent::CommitColumnResize {
                        column,
                        width,
                        previous: start_width,
                    });
                }
            }
            GestureState::ColumnReorderCandidate { col, modifiers, .. } => {
                let changed = ctx.selection.select_column(col, modifiers.command());
                outcome = outcome.selection(changed);
            }
            GestureState::ReorderingColumn { col, target, .. } => {
                outcome.repaint = true;
                if let Some(to) = target
                    && to != col
                {
                    outcome = outcome.intent(GridIntent::MoveColumn { from: col, to });
                }
            }
            GestureState::RowPressCandidate { row, modifiers, .. } => {
                let changed = match ctx.selection.anchor() {
                    Some(anchor) if modifiers.shift => ctx.selection.select_rows(anchor.row, row),
                    _ => ctx.selection.select_row(row, modifiers.command()),
                };
                outcome = outcome.selection(changed);
            }
            GestureState::ReorderingRow { row, target, .. } => {
                outcome.repaint = true;
                if let Some(to) = target
                    && to != row
                    && let Some(id) = ctx.rows.row_id_at(row)
                {
                    outcome = outcome.intent(GridIntent::MoveRow { row: id.clone(), to });
                }
            }
            GestureState::Filling { source, target } => {
                outcome.repaint = true;
                if target != source {
                    outcome = outcome.intent(GridIntent::Fill { source, target });
                }
            }
            GestureState::Idle
            | GestureState::SelectingCells { .. }
            | GestureState::SelectingRows { .. } => {}
        }
        outcome
    }

    fn native_double_click(&mut self, ctx: &mut InputContext<'_>, event: &PointerEvent) -> InputOutcome {
        if self.clicks.is_duplicate(event.timestamp_ms) {
            tracing::trace!(target: targets::INPUT, "ignored duplicate double-click");
            return InputOutcome::default();
        }
        let outcome = InputOutcome::default();
        let hit = ctx.normalize(event.position);
        if let Some((column, _)) = ctx.header_edge(&hit) {
            return outcome.intent(GridIntent::AutoFitColumn(column));
        }
        match hit.cell() {
            Some(pos) if hit.region == Region::Cell && ctx.group_key_at(pos.row).is_none() => {
                outcome.intent(GridIntent::BeginEdit {
                    position: pos,
                    initial: None,
                })
            }
            _ => outcome,
        }
    }

    fn context_menu(&mut self, ctx: &mut InputContext<'_>, event: &PointerEvent) -> InputOutcome {
        let mut outcome = InputOutcome::default();
        let hit = ctx.normalize(event.position);
        let target = match hit.region {
            Region::Cell => {
                let Some(pos) = hit.cell() else {
                    return outcome;
                };
                if !ctx.selection.is_cell_selected(pos.row, pos.col) {
                    let changed = ctx.selection.select_cell(pos);
                    outcome = outcome.selection(changed);
                }
                MenuTarget::Cell(pos)
            }
            Region::Header => match hit.column_id.clone() {
                Some(column) => MenuTarget::Column(column),
                None => return outcome,
            },
            Region::RowHeader => match hit.row {
                Some(row) => MenuTarget::RowHeader(row),
                None => return outcome,
            },
            Region::Corner => return outcome,
        };
        outcome.intent(GridIntent::ContextMenu {
            position: event.position,
            target,
        })
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, ctx: &mut InputContext<'_>, event: &KeyEvent) -> InputOutcome {
        let outcome = InputOutcome::default();

        if event.key == Key::Escape {
            return self.escape(ctx);
        }
        // The host's editor owns the keyboard while a cell is edited.
        if ctx.ui.is_editing() || !self.gesture.is_idle() {
            return outcome;
        }

        let modifiers = event.modifiers;
        if event.is_shortcut('a') {
            let changed = ctx.selection.select_all();
            return outcome.selection(changed);
        }
        if event.is_shortcut('z') {
            return outcome.intent(if modifiers.shift {
                GridIntent::Redo
            } else {
                GridIntent::Undo
            });
        }
        if event.is_shortcut('y') {
            return outcome.intent(GridIntent::Redo);
        }
        if event.is_shortcut('c') {
            return outcome.intent(GridIntent::Copy);
        }

        let rows = ctx.selection.row_count();
        let cols = ctx.selection.col_count();
        if rows == 0 || cols == 0 {
            return outcome;
        }
        let (last_row, last_col) = (rows - 1, cols - 1);
        let primary = ctx.selection.primary();
        let page = ctx.viewport.page_rows() as isize;
        let extend = modifiers.shift;
        let jump = modifiers.command();

        let moved = match &event.key {
            Key::ArrowUp if jump => self.jump(ctx, |p| CellPosition::new(0, p.col), extend),
            Key::ArrowDown if jump => self.jump(ctx, |p| CellPosition::new(last_row, p.col), extend),
            Key::ArrowLeft if jump => self.jump(ctx, |p| CellPosition::new(p.row, 0), extend),
            Key::ArrowRight if jump => self.jump(ctx, |p| CellPosition::new(p.row, last_col), extend),
            Key::ArrowUp => ctx.selection.move_primary(-1, 0, extend),
            Key::ArrowDown => ctx.selection.move_primary(1, 0, extend),
            Key::ArrowLeft => ctx.selection.move_primary(0, -1, extend),
            Key::ArrowRight => ctx.selection.move_primary(0, 1, extend),
            Key::Tab => ctx
                .selection
                .move_primary(0, if modifiers.shift { -1 } else { 1 }, false),
            Key::PageUp => ctx.selection.move_primary(-page, 0, extend),
            Key::PageDown => ctx.selection.move_primary(page, 0, extend),
            Key::Home if jump => ctx.selection.move_to(CellPosition::new(0, 0), extend),
            Key::End if jump => ctx
                .selection
                .move_to(CellPosition::new(last_row, last_col), extend),
            Key::Home => self.jump(ctx, |p| CellPosition::new(p.row, 0), extend),
            Key::End => self.jump(ctx, |p| CellPosition::new(p.row, last_col), extend),
            Key::Enter | Key::F2 => {
                return match primary {
                    Some(position) => outcome.intent(GridIntent::BeginEdit {
                        position,
                        initial: None,
                    }),
                    None => outcome,
                };
            }
            Key::Delete | Key::Backspace => {
                return match ctx.selection.bounds() {
                    Some(bounds) => outcome.intent(GridIntent::ClearCells(bounds)),
                    None => outcome,
                };
            }
            Key::Char(c) if !modifiers.command() && !c.is_control() => {
                return match primary {
                    Some(position) => outcome.intent(GridIntent::BeginEdit {
                        position,
                        initial: Some(c.to_string()),
                    }),
                    None => outcome,
                };
            }
            _ => return outcome,
        };

        let Some(target) = moved else {
            return outcome;
        };
        let mut outcome = outcome.selection(true);
        outcome.scroll_to = Some(target);
        outcome
    }

    fn jump(
        &self,
        ctx: &mut InputContext<'_>,
        to: impl FnOnce(CellPosition) -> CellPosition,
        extend: bool,
    ) -> Option<CellPosition> {
        let from = if extend {
            ctx.selection.extent()
        } else {
            ctx.selection.primary()
        }
        .unwrap_or_default();
        ctx.selection.move_to(to(from), extend)
    }

    /// Escape: cancel the active gesture, else close the menu, else cancel
    /// editing.
    fn escape(&mut self, ctx: &mut InputContext<'_>) -> InputOutcome {
        let mut outcome = InputOutcome::default();
        let gesture = std::mem::take(&mut self.gesture);
        match gesture {
            GestureState::Idle => {
                if ctx.ui.menu.is_some() {
                    return outcome.intent(GridIntent::CloseMenu);
                }
                if ctx.ui.is_editing() {
                    return outcome.intent(GridIntent::CancelEdit);
                }
            }
            GestureState::ResizingColumn {
                column,
                start_width,
                ..
            } => {
                ctx.model.set_column_width(&column, start_width);
                outcome.layout_changed = true;
                outcome.repaint = true;
                tracing::debug!(target: targets::INPUT, %column, "column resize cancelled");
            }
            other => {
                outcome.repaint = other.overlay().is_some();
                tracing::debug!(target: targets::INPUT, gesture = other.name(), "gesture cancelled");
            }
        }
        outcome
    }
}

/// Scroll delta in pixels for a wheel event. Shift turns vertical wheel
/// movement into horizontal scrolling.
pub fn wheel_delta(event: &WheelEvent, config: &GridConfig) -> (f32, f32) {
    let scale = match event.unit {
        WheelUnit::Pixel => 1.0,
        WheelUnit::Line => config.interaction.wheel_line_height,
    };
    let (dx, dy) = (event.delta_x * scale, event.delta_y * scale);
    if event.modifiers.shift && dx == 0.0 {
        (dy, 0.0)
    } else {
        (dx, dy)
    }
}

fn reorder_target(ctx: &InputContext<'_>, col: usize, dx: f32) -> Option<usize> {
    let spans = ctx.column_spans();
    compute_reorder_target(&spans, col, dx, ctx.config.interaction.reorder_overlap_ratio)
}

/// View row a dragged row would be dropped on, clamped to the view.
fn drop_row(ctx: &InputContext<'_>, position: Point) -> Option<usize> {
    let len = ctx.rows.len();
    if len == 0 {
        return None;
    }
    let content_y = ctx.viewport.content_y(position.y).max(0.0);
    let row = (content_y / ctx.viewport.row_height()).floor() as usize;
    Some(row.min(len - 1))
}

fn idle_cursor(ctx: &InputContext<'_>, hit: &NormalizedEvent) -> CursorHint {
    match hit.region {
        Region::Header if ctx.header_edge(hit).is_some() => CursorHint::ColumnResize,
        Region::Header if hit.col.is_some() && ctx.column_count() > 0 => CursorHint::Grab,
        Region::Cell
            if ctx
                .fill_handle()
                .is_some_and(|handle| handle.contains(hit.position)) =>
        {
            CursorHint::Crosshair
        }
        _ => CursorHint::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyboardModifiers;
    use crate::model::{CellValue, Column, Row};

    struct Fixture {
        model: DataModel,
        rows: RowView,
        viewport: Viewport,
        selection: SelectionModel,
        ui: UiState,
        config: GridConfig,
        registry: CellTypeRegistry,
        input: InputStateMachine,
    }

    impl Fixture {
        fn new() -> Self {
            let columns = vec![
                Column::new("name", "Name").with_width(100.0),
                Column::new("amount", "Amount").with_width(100.0).with_type("number"),
                Column::new("done", "Done").with_width(100.0).with_type("boolean"),
                Column::new("region", "Region").with_width(100.0),
            ];
            let rows = (1..=5)
                .map(|i| Row::new(i.to_string()).with_value("amount", i * 10))
                .collect();
            let model = DataModel::with_data(columns, rows);
            let config = GridConfig::default();
            let mut viewport = Viewport::new(&config.theme, 100.0, 1024.0, 768.0);
            viewport.set_content(model.row_count(), &model.visible_columns());
            Self {
                rows: RowView::from_model(&model),
                selection: SelectionModel::new(model.row_count(), 4),
                model,
                viewport,
                ui: UiState::default(),
                input: InputStateMachine::new(&config),
                config,
                registry: CellTypeRegistry::with_defaults(),
            }
        }

        fn pointer(&mut self, event: PointerEvent) -> InputOutcome {
            let mut ctx = InputContext {
                model: &mut self.model,
                rows: &self.rows,
                viewport: &self.viewport,
                selection: &mut self.selection,
                ui: &self.ui,
                config: &self.config,
                registry: &self.registry,
            };
            self.input.handle_pointer(&mut ctx, &event)
        }

        fn key(&mut self, event: KeyEvent) -> InputOutcome {
            let mut ctx = InputContext {
                model: &mut self.model,
                rows: &self.rows,
                viewport: &self.viewport,
                selection: &mut self.selection,
                ui: &self.ui,
                config: &self.config,
                registry: &self.registry,
            };
            self.input.handle_key(&mut ctx, &event)
        }

        fn width(&self, id: &str) -> f32 {
            self.model.column(&ColumnId::new(id)).unwrap().width
        }
    }

    /// Screen y of the middle of view row `row`.
    fn row_y(row: usize) -> f32 {
        36.0 + 32.0 * row as f32 + 10.0
    }

    #[test]
    fn test_resize_drag_applies_live_and_commits() {
        let mut f = Fixture::new();
        let outcome = f.pointer(PointerEvent::press(159.0, 10.0, 0.0));
        assert_eq!(outcome.cursor, Some(CursorHint::ColumnResize));
        assert!(matches!(f.input.gesture(), GestureState::ResizingColumn { .. }));

        let outcome = f.pointer(PointerEvent::moved(139.0, 10.0, 10.0));
        assert!(outcome.layout_changed);
        assert_eq!(f.width("name"), 80.0);

        let outcome = f.pointer(PointerEvent::release(139.0, 10.0, 20.0));
        assert_eq!(
            outcome.intents,
            vec![GridIntent::CommitColumnResize {
                column: ColumnId::new("name"),
                width: 80.0,
                previous: 100.0,
            }]
        );
        assert!(f.input.gesture().is_idle());
    }

    #[test]
    fn test_resize_respects_minimum() {
        let mut f = Fixture::new();
        f.pointer(PointerEvent::press(159.0, 10.0, 0.0));
        f.pointer(PointerEvent::moved(50.0, 10.0, 10.0));
        assert_eq!(f.width("name"), MIN_COLUMN_WIDTH);
    }

    #[test]
    fn test_escape_cancels_resize() {
        let mut f = Fixture::new();
        f.pointer(PointerEvent::press(159.0, 10.0, 0.0));
        f.pointer(PointerEvent::moved(259.0, 10.0, 10.0));
        assert_eq!(f.width("name"), 200.0);

        let outcome = f.key(KeyEvent::new(Key::Escape));
        assert!(outcome.layout_changed);
        assert_eq!(f.width("name"), 100.0);
        assert!(f.input.gesture().is_idle());
        assert!(f.pointer(PointerEvent::release(259.0, 10.0, 20.0)).intents.is_empty());
    }

    #[test]
    fn test_header_click_toggles_column_selection() {
        let mut f = Fixture::new();
        f.pointer(PointerEvent::press(100.0, 10.0, 0.0));
        let outcome = f.pointer(PointerEvent::release(100.0, 10.0, 10.0));
        assert!(outcome.selection_changed);
        assert!(f.selection.is_column_selected(0));

        f.pointer(PointerEvent::press(100.0, 10.0, 1000.0));
        f.pointer(PointerEvent::release(100.0, 10.0, 1010.0));
        assert!(f.selection.is_empty());
    }

    #[test]
    fn test_header_menu_zone_requests_menu() {
        let mut f = Fixture::new();
        let outcome = f.pointer(PointerEvent::press(150.0, 10.0, 0.0));
        assert_eq!(
            outcome.intents,
            vec![GridIntent::ContextMenu {
                position: Point::new(150.0, 10.0),
                target: MenuTarget::Column(ColumnId::new("name")),
            }]
        );
        assert!(f.input.gesture().is_idle());
    }

    #[test]
    fn test_column_drag_moves_column() {
        let mut f = Fixture::new();
        f.pointer(PointerEvent::press(100.0, 10.0, 0.0));
        // Small movement stays a candidate.
        f.pointer(PointerEvent::moved(103.0, 10.0, 5.0));
        assert!(matches!(
            f.input.gesture(),
            GestureState::ColumnReorderCandidate { .. }
        ));

        f.pointer(PointerEvent::moved(260.0, 10.0, 10.0));
        assert!(matches!(
            f.input.gesture(),
            GestureState::ReorderingColumn { target: Some(2), .. }
        ));
        let outcome = f.pointer(PointerEvent::release(260.0, 10.0, 20.0));
        assert_eq!(outcome.intents, vec![GridIntent::MoveColumn { from: 0, to: 2 }]);
        // A drag is not a header click.
        assert!(f.selection.is_empty());
    }

    #[test]
    fn test_fill_handle_drag() {
        let mut f = Fixture::new();
        f.selection.select_cell(CellPosition::new(0, 1));
        f.selection.extend_to(CellPosition::new(1, 1));

        let outcome = f.pointer(PointerEvent::press(259.0, 99.0, 0.0));
        assert_eq!(outcome.cursor, Some(CursorHint::Crosshair));
        f.pointer(PointerEvent::moved(200.0, row_y(3), 10.0));
        let outcome = f.pointer(PointerEvent::release(200.0, row_y(3), 20.0));

        let source = SelectionRange::cells(CellPosition::new(0, 1), CellPosition::new(1, 1));
        let target = SelectionRange::cells(CellPosition::new(0, 1), CellPosition::new(3, 1));
        assert_eq!(outcome.intents, vec![GridIntent::Fill { source, target }]);
    }

    #[test]
    fn test_row_header_press_selects_and_drags_selected_rows() {
        let mut f = Fixture::new();
        f.pointer(PointerEvent::press(40.0, row_y(2), 0.0));
        assert!(matches!(
            f.input.gesture(),
            GestureState::RowPressCandidate { reorder: false, .. }
        ));
        f.pointer(PointerEvent::release(40.0, row_y(2), 10.0));
        assert!(f.selection.is_row_selected(2));

        f.pointer(PointerEvent::press(40.0, row_y(2), 1000.0));
        f.pointer(PointerEvent::moved(40.0, row_y(0), 1010.0));
        assert!(matches!(
            f.input.gesture(),
            GestureState::ReorderingRow { target: Some(0), .. }
        ));
        let outcome = f.pointer(PointerEvent::release(40.0, row_y(0), 1020.0));
        assert_eq!(
            outcome.intents,
            vec![GridIntent::MoveRow {
                row: RowId::new("3"),
                to: 0
            }]
        );
    }

    #[test]
    fn test_row_header_drag_selects_span() {
        let mut f = Fixture::new();
        f.pointer(PointerEvent::press(40.0, row_y(1), 0.0));
        f.pointer(PointerEvent::moved(40.0, row_y(3), 10.0));
        f.pointer(PointerEvent::release(40.0, row_y(3), 20.0));
        assert!((1..=3).all(|row| f.selection.is_row_selected(row)));
        assert!(!f.selection.is_row_selected(0));
    }

    #[test]
    fn test_checkbox_zone_toggles_row() {
        let mut f = Fixture::new();
        f.pointer(PointerEvent::press(10.0, row_y(2), 0.0));
        assert!(f.selection.is_row_selected(2));
        assert!(f.input.gesture().is_idle());
        f.pointer(PointerEvent::press(10.0, row_y(4), 1000.0));
        assert!(f.selection.is_row_selected(2) && f.selection.is_row_selected(4));
        f.pointer(PointerEvent::press(10.0, row_y(2), 2000.0));
        assert!(!f.selection.is_row_selected(2));
    }

    #[test]
    fn test_cell_drag_extends_selection() {
        let mut f = Fixture::new();
        f.pointer(PointerEvent::press(100.0, row_y(0), 0.0));
        f.pointer(PointerEvent::moved(200.0, row_y(2), 10.0));
        f.pointer(PointerEvent::release(200.0, row_y(2), 20.0));
        assert_eq!(
            f.selection.ranges(),
            &[SelectionRange::cells(CellPosition::new(0, 0), CellPosition::new(2, 1))]
        );
    }

    #[test]
    fn test_modifier_clicks() {
        let mut f = Fixture::new();
        f.pointer(PointerEvent::press(100.0, row_y(0), 0.0));
        f.pointer(PointerEvent::release(100.0, row_y(0), 1.0));
        f.pointer(
            PointerEvent::press(200.0, row_y(2), 1000.0).with_modifiers(KeyboardModifiers::CTRL),
        );
        f.pointer(PointerEvent::release(200.0, row_y(2), 1001.0));
        assert_eq!(f.selection.ranges().len(), 2);

        f.pointer(
            PointerEvent::press(300.0, row_y(3), 2000.0).with_modifiers(KeyboardModifiers::SHIFT),
        );
        assert!(f.selection.is_cell_selected(3, 2));
        assert_eq!(f.selection.primary(), Some(CellPosition::new(2, 1)));
    }

    #[test]
    fn test_manual_double_click_begins_edit_once() {
        let mut f = Fixture::new();
        f.pointer(PointerEvent::press(200.0, row_y(2), 0.0));
        f.pointer(PointerEvent::release(200.0, row_y(2), 50.0));
        let outcome = f.pointer(PointerEvent::press(200.0, row_y(2), 100.0));
        assert_eq!(
            outcome.intents,
            vec![GridIntent::BeginEdit {
                position: CellPosition::new(2, 1),
                initial: None,
            }]
        );
        f.pointer(PointerEvent::release(200.0, row_y(2), 110.0));
        let native = PointerEvent::new(PointerKind::DoubleClick, 200.0, row_y(2), 120.0);
        assert!(f.pointer(native).intents.is_empty());
    }

    #[test]
    fn test_double_click_on_edge_auto_fits() {
        let mut f = Fixture::new();
        f.pointer(PointerEvent::press(159.0, 10.0, 0.0));
        f.pointer(PointerEvent::release(159.0, 10.0, 10.0));
        let outcome = f.pointer(PointerEvent::press(159.0, 10.0, 100.0));
        assert_eq!(
            outcome.intents,
            vec![GridIntent::AutoFitColumn(ColumnId::new("name"))]
        );
    }

    #[test]
    fn test_checkbox_cell_claims_click() {
        let mut f = Fixture::new();
        let outcome = f.pointer(PointerEvent::press(310.0, 52.0, 0.0));
        assert_eq!(
            outcome.intents,
            vec![GridIntent::CellAction {
                position: CellPosition::new(0, 2),
                action: HitAction::new("toggle").with_value(true),
            }]
        );
        assert!(f.input.gesture().is_idle());
    }

    #[test]
    fn test_context_menu_selects_unselected_cell() {
        let mut f = Fixture::new();
        f.selection.select_cell(CellPosition::new(0, 0));
        let event = PointerEvent::new(PointerKind::ContextMenu, 200.0, row_y(3), 0.0)
            .with_button(MouseButton::Right);
        let outcome = f.pointer(event);
        assert!(outcome.selection_changed);
        assert_eq!(f.selection.primary(), Some(CellPosition::new(3, 1)));
        assert!(matches!(
            outcome.intents.as_slice(),
            [GridIntent::ContextMenu {
                target: MenuTarget::Cell(pos),
                ..
            }] if *pos == CellPosition::new(3, 1)
        ));
    }

    #[test]
    fn test_group_header_click_toggles() {
        let mut f = Fixture::new();
        f.model
            .set_value(&RowId::new("1"), &ColumnId::new("region"), CellValue::from("north"));
        f.rows.group_by(Some(ColumnId::new("region")), &f.model);
        // Row 0 is the "(Empty)" header.
        let outcome = f.pointer(PointerEvent::press(100.0, row_y(0), 0.0));
        assert_eq!(outcome.intents, vec![GridIntent::ToggleGroup("(Empty)".into())]);
    }

    #[test]
    fn test_grouped_rows_never_reorder() {
        let mut f = Fixture::new();
        f.rows.group_by(Some(ColumnId::new("region")), &f.model);
        f.selection.select_row(1, false);
        f.pointer(PointerEvent::press(40.0, row_y(1), 0.0));
        assert!(matches!(
            f.input.gesture(),
            GestureState::RowPressCandidate { reorder: false, .. }
        ));
    }

    #[test]
    fn test_keyboard_navigation() {
        let mut f = Fixture::new();
        f.selection.select_cell(CellPosition::new(0, 0));
        let outcome = f.key(KeyEvent::new(Key::ArrowDown));
        assert_eq!(outcome.scroll_to, Some(CellPosition::new(1, 0)));

        f.key(KeyEvent::new(Key::ArrowRight).with_modifiers(KeyboardModifiers::SHIFT));
        assert!(f.selection.is_cell_selected(1, 1));
        assert_eq!(f.selection.primary(), Some(CellPosition::new(1, 0)));

        f.key(KeyEvent::new(Key::End).with_modifiers(KeyboardModifiers::CTRL));
        assert_eq!(f.selection.primary(), Some(CellPosition::new(4, 3)));
        f.key(KeyEvent::new(Key::Tab).with_modifiers(KeyboardModifiers::SHIFT));
        assert_eq!(f.selection.primary(), Some(CellPosition::new(4, 2)));
    }

    #[test]
    fn test_keyboard_shortcuts() {
        let mut f = Fixture::new();
        f.selection.select_cell(CellPosition::new(1, 1));
        let ctrl = KeyboardModifiers::CTRL;
        assert_eq!(
            f.key(KeyEvent::new(Key::Char('z')).with_modifiers(ctrl)).intents,
            vec![GridIntent::Undo]
        );
        assert_eq!(
            f.key(KeyEvent::new(Key::Char('Z')).with_modifiers(KeyboardModifiers::CTRL_SHIFT))
                .intents,
            vec![GridIntent::Redo]
        );
        assert_eq!(
            f.key(KeyEvent::new(Key::Char('7'))).intents,
            vec![GridIntent::BeginEdit {
                position: CellPosition::new(1, 1),
                initial: Some("7".into()),
            }]
        );
        assert!(matches!(
            f.key(KeyEvent::new(Key::Delete)).intents.as_slice(),
            [GridIntent::ClearCells(_)]
        ));
        f.key(KeyEvent::new(Key::Char('a')).with_modifiers(ctrl));
        assert!(f.selection.is_cell_selected(4, 3));
    }

    #[test]
    fn test_escape_priority() {
        let mut f = Fixture::new();
        assert!(f.key(KeyEvent::new(Key::Escape)).intents.is_empty());

        f.ui.editing = Some(crate::ui_state::EditState {
            position: CellPosition::new(0, 0),
            row_id: RowId::new("1"),
            column_id: ColumnId::new("name"),
            initial: None,
        });
        assert_eq!(f.key(KeyEvent::new(Key::Escape)).intents, vec![GridIntent::CancelEdit]);
        // Other keys belong to the editor.
        assert!(f.key(KeyEvent::new(Key::ArrowDown)).intents.is_empty());
    }

    #[test]
    fn test_hover_is_edge_triggered() {
        let mut f = Fixture::new();
        assert!(f.pointer(PointerEvent::moved(100.0, row_y(0), 0.0)).hover.is_some());
        assert!(f.pointer(PointerEvent::moved(110.0, row_y(0), 1.0)).hover.is_none());
        let change = f.pointer(PointerEvent::moved(200.0, row_y(0), 2.0)).hover.unwrap();
        assert_eq!(change.previous, Some(CellPosition::new(0, 0)));
        assert_eq!(change.current, Some(CellPosition::new(0, 1)));
        assert!(f.pointer(PointerEvent::new(PointerKind::Leave, 0.0, 0.0, 3.0)).hover.is_some());
    }

    #[test]
    fn test_wheel_delta() {
        let config = GridConfig::default();
        let mut event = WheelEvent::pixels(0.0, 3.0);
        event.unit = WheelUnit::Line;
        assert_eq!(wheel_delta(&event, &config), (0.0, 60.0));
        event.modifiers = KeyboardModifiers::SHIFT;
        assert_eq!(wheel_delta(&event, &config), (60.0, 0.0));
    }
}

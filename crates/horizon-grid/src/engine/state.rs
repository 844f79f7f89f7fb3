//! Mutable engine state behind the engine's lock.

use crate::config::GridConfig;
use crate::input::{InputContext, InputOutcome, InputStateMachine};
use crate::model::{Column, ColumnId, DataModel, RowId};
use crate::registry::CellTypeRegistry;
use crate::selection::{CellPosition, SelectionModel, SelectionRange};
use crate::ui_state::UiState;
use crate::view::RowView;
use crate::viewport::Viewport;

/// Everything the engine mutates. Only ever touched through
/// `EngineInner::with_state`, never across an await point.
#[derive(Debug)]
pub(crate) struct GridState {
    pub model: DataModel,
    pub rows: RowView,
    pub viewport: Viewport,
    pub selection: SelectionModel,
    pub ui: UiState,
    pub input: InputStateMachine,
    pub add_row_in_flight: bool,
    pub next_temp_id: u64,
    /// Set when a scroll change closed the context menu; drained by
    /// `EngineInner::with_state` to emit `menu_closed` after unlocking.
    pub menu_dismissed: bool,
}

impl GridState {
    pub fn new(config: &GridConfig, model: DataModel) -> Self {
        let rows = RowView::from_model(&model);
        let mut state = Self {
            viewport: Viewport::new(
                &config.theme,
                config.horizontal_overscroll,
                config.viewport_width,
                config.viewport_height,
            ),
            selection: SelectionModel::new(0, 0),
            ui: UiState::default(),
            input: InputStateMachine::new(config),
            add_row_in_flight: false,
            next_temp_id: 1,
            menu_dismissed: false,
            model,
            rows,
        };
        state.refresh_layout();
        state
    }

    /// Close the context menu, recording that it was open.
    pub fn dismiss_transient(&mut self) {
        if self.ui.close_transient() {
            self.menu_dismissed = true;
        }
    }

    /// Re-sync viewport extents and the selection extent with the current
    /// rows and visible columns. Returns `true` if the selection changed.
    ///
    /// Shrinking content can clamp the scroll offset, which dismisses the menu.
    pub fn refresh_layout(&mut self) -> bool {
        let columns = self.model.visible_columns();
        let scrolled = self.viewport.set_content(self.rows.len(), &columns);
        let changed = self.selection.set_extent(self.rows.len(), columns.len());
        if scrolled {
            self.dismiss_transient();
        }
        changed
    }

    /// Rebuild the row view from the model and refresh the layout.
    pub fn rebuild_rows(&mut self) -> bool {
        self.rows.rebuild(&self.model);
        self.refresh_layout()
    }

    /// Run the input machine against the current state.
    pub fn dispatch_input(
        &mut self,
        config: &GridConfig,
        registry: &CellTypeRegistry,
        handle: impl FnOnce(&mut InputStateMachine, &mut InputContext<'_>) -> InputOutcome,
    ) -> InputOutcome {
        let Self {
            model,
            rows,
            viewport,
            selection,
            ui,
            input,
            ..
        } = self;
        let mut ctx = InputContext {
            model,
            rows,
            viewport,
            selection,
            ui,
            config,
            registry,
        };
        let outcome = handle(input, &mut ctx);

        if outcome.layout_changed {
            self.refresh_layout();
        }
        if outcome.hover.is_some() {
            self.ui.hover = self.input.hovered();
        }
        if let Some(cell) = outcome.scroll_to {
            let columns = self.model.visible_columns();
            if self.viewport.ensure_cell_visible(cell.row, cell.col, &columns) {
                self.dismiss_transient();
            }
        }
        outcome
    }

    /// Row id and column id of a view cell. Group header rows have none.
    pub fn resolve_cell(&self, pos: CellPosition) -> Option<(RowId, ColumnId)> {
        let row = self.rows.row_id_at(pos.row)?.clone();
        let column = self.model.visible_columns().get(pos.col)?.id.clone();
        Some((row, column))
    }

    /// Every data cell inside `range`, in row-major order.
    pub fn cells_in(&self, range: &SelectionRange) -> Vec<(CellPosition, RowId, ColumnId)> {
        let columns: Vec<&Column> = self.model.visible_columns();
        let mut cells = Vec::new();
        for row in range.start_row..=range.end_row {
            let Some(row_id) = self.rows.row_id_at(row) else {
                continue;
            };
            for col in range.start_col..=range.end_col {
                if let Some(column) = columns.get(col) {
                    cells.push((CellPosition::new(row, col), row_id.clone(), column.id.clone()));
                }
            }
        }
        cells
    }
}

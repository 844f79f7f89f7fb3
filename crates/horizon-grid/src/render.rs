//! Frame snapshots for render surfaces.
//!
//! The engine never draws. [`GridEngine::render`](crate::GridEngine::render)
//! builds a [`Frame`] describing every visible header, row and cell in
//! screen space, releases its lock and hands the frame to a
//! [`RenderSurface`]. Only rows and columns inside the visible range (plus
//! overscan) are materialized.

use horizon_grid_core::PerfSpan;
use horizon_grid_core::logging::span_names;
use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::engine::GridState;
use crate::geometry::{Point, Rect};
use crate::input::DragOverlay;
use crate::menu::MenuState;
use crate::model::{CellValue, ColumnId, RowId};
use crate::registry::CellTypeRegistry;
use crate::selection::{CellPosition, SelectionRange};
use crate::ui_state::EditState;
use crate::view::{GroupHeader, SortDirection, ViewRow};

/// Draws frames produced by the engine.
pub trait RenderSurface {
    fn render(&mut self, frame: &Frame);
}

impl<F> RenderSurface for F
where
    F: FnMut(&Frame),
{
    fn render(&mut self, frame: &Frame) {
        self(frame)
    }
}

/// A column header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameColumn {
    /// Visual index.
    pub index: usize,
    pub id: ColumnId,
    pub title: String,
    pub column_type: String,
    /// Screen-space left edge.
    pub x: f32,
    pub width: f32,
    pub pinned: bool,
    /// Every row of the column is selected.
    pub selected: bool,
    pub sort: Option<SortDirection>,
}

/// A body cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameCell {
    /// Visual column index.
    pub col: usize,
    pub rect: Rect,
    pub value: CellValue,
    /// Display text from the column's cell type.
    pub text: String,
    pub selected: bool,
    pub focused: bool,
    pub hovered: bool,
    pub error: Option<String>,
}

/// Contents of a view row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameRowKind {
    Data { id: RowId, cells: Vec<FrameCell> },
    Group { header: GroupHeader },
}

/// A visible view row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRow {
    /// View row index.
    pub index: usize,
    /// Screen-space top edge.
    pub y: f32,
    pub height: f32,
    /// The row header is highlighted.
    pub selected: bool,
    pub kind: FrameRowKind,
}

/// An open editor and where to place it.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEditor {
    pub state: EditState,
    pub rect: Rect,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
    pub scroll_left: f32,
    pub scroll_top: f32,
    pub content_width: f32,
    pub content_height: f32,
    pub header_height: f32,
    pub row_header_width: f32,
    /// Width of the pinned band, which does not scroll.
    pub frozen_width: f32,
    pub columns: Vec<FrameColumn>,
    pub rows: Vec<FrameRow>,
    pub selection: Vec<SelectionRange>,
    pub primary: Option<CellPosition>,
    /// Drag handle at the bottom-right corner of the most recent range.
    pub fill_handle: Option<Rect>,
    pub overlay: Option<DragOverlay>,
    pub menu: Option<MenuState>,
    pub editor: Option<FrameEditor>,
    pub hover: Option<CellPosition>,
}

impl Frame {
    /// Snapshot the visible part of the grid.
    pub(crate) fn build(state: &mut GridState, registry: &CellTypeRegistry, config: &GridConfig) -> Self {
        let _span = PerfSpan::new(span_names::FRAME);

        let columns: Vec<_> = state.model.visible_columns().into_iter().cloned().collect();
        let column_refs: Vec<_> = columns.iter().collect();
        let range = state
            .viewport
            .calculate_visible_range(state.rows.len(), &column_refs);
        let viewport = &state.viewport;
        let sort = state.rows.sort().cloned();

        let visible: Vec<usize> = range.columns().collect();
        let frame_columns: Vec<FrameColumn> = visible
            .iter()
            .filter_map(|&index| {
                let column = columns.get(index)?;
                Some(FrameColumn {
                    index,
                    id: column.id.clone(),
                    title: column.title.clone(),
                    column_type: column.column_type.clone(),
                    x: viewport.column_screen_x(index, &column_refs),
                    width: column.width,
                    pinned: column.is_pinned(),
                    selected: state.selection.is_column_selected(index),
                    sort: sort
                        .as_ref()
                        .filter(|s| s.column == column.id)
                        .map(|s| s.direction),
                })
            })
            .collect();

        let primary = state.selection.primary();
        let hover = state.ui.hover;
        let mut rows = Vec::with_capacity(range.rows.len());
        for index in range.rows.clone() {
            let Some(view_row) = state.rows.get(index).cloned() else {
                continue;
            };
            let y = state.viewport.row_screen_y(index);
            let kind = match view_row {
                ViewRow::GroupHeader(header) => FrameRowKind::Group { header },
                ViewRow::Data(id) => {
                    let mut cells = Vec::with_capacity(visible.len());
                    for &col in &visible {
                        let Some(column) = columns.get(col) else {
                            continue;
                        };
                        let Some(rect) = state.viewport.cell_rect(index, col, &column_refs) else {
                            continue;
                        };
                        let cell_type = registry.get(&column.column_type);
                        let text = state
                            .model
                            .formatted(&id, &column.id, |value| cell_type.format(value))
                            .unwrap_or_default();
                        let position = CellPosition::new(index, col);
                        cells.push(FrameCell {
                            col,
                            rect,
                            value: state.model.value(&id, &column.id).cloned().unwrap_or_default(),
                            text,
                            selected: state.selection.is_cell_selected(index, col),
                            focused: primary == Some(position),
                            hovered: hover == Some(position),
                            error: state.model.cell_error(&id, &column.id).map(str::to_string),
                        });
                    }
                    FrameRowKind::Data { id, cells }
                }
            };
            rows.push(FrameRow {
                index,
                y,
                height: state.viewport.row_height(),
                selected: state.selection.is_row_selected(index),
                kind,
            });
        }

        let fill_handle = state.selection.last_range().and_then(|range| {
            state
                .viewport
                .fill_handle_rect(range, &column_refs, config.interaction.fill_handle_size)
        });
        let editor = state.ui.editing.clone().and_then(|edit| {
            let rect = state
                .viewport
                .cell_rect(edit.position.row, edit.position.col, &column_refs)?;
            Some(FrameEditor { state: edit, rect })
        });

        Self {
            width: state.viewport.width(),
            height: state.viewport.height(),
            scroll_left: state.viewport.scroll_left(),
            scroll_top: state.viewport.scroll_top(),
            content_width: state.viewport.content_width(),
            content_height: state.viewport.content_height(),
            header_height: state.viewport.header_height(),
            row_header_width: state.viewport.row_header_width(),
            frozen_width: state.viewport.frozen_width(),
            columns: frame_columns,
            rows,
            selection: state.selection.ranges().to_vec(),
            primary,
            fill_handle,
            overlay: state.input.gesture().overlay(),
            menu: state.ui.menu.clone(),
            editor,
            hover,
        }
    }

    /// The cell drawn at a screen point, if any.
    pub fn cell_at(&self, point: Point) -> Option<&FrameCell> {
        self.rows.iter().find_map(|row| match &row.kind {
            FrameRowKind::Data { cells, .. } => cells.iter().find(|cell| cell.rect.contains(point)),
            FrameRowKind::Group { .. } => None,
        })
    }

    /// The rendered row for a view row index.
    pub fn row(&self, index: usize) -> Option<&FrameRow> {
        self.rows.iter().find(|row| row.index == index)
    }
}

//! Drag gesture states.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::input::KeyboardModifiers;
use crate::model::ColumnId;
use crate::selection::{CellPosition, SelectionRange};

/// The active pointer gesture. Exactly one is active; release returns to
/// [`Idle`](GestureState::Idle).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// Dragging a column's right edge. The width is applied live.
    ResizingColumn {
        column: ColumnId,
        start_x: f32,
        start_width: f32,
    },
    /// Pressed on a header body; becomes a reorder after the drag threshold
    /// or a header click on release.
    ColumnReorderCandidate {
        col: usize,
        start: Point,
        modifiers: KeyboardModifiers,
    },
    ReorderingColumn {
        col: usize,
        start_x: f32,
        current_x: f32,
        target: Option<usize>,
    },
    /// Pressed on a row header; `reorder` is set when the row may be dragged.
    RowPressCandidate {
        row: usize,
        start: Point,
        reorder: bool,
        modifiers: KeyboardModifiers,
    },
    ReorderingRow {
        row: usize,
        current_y: f32,
        target: Option<usize>,
    },
    SelectingCells {
        anchor: CellPosition,
    },
    SelectingRows {
        anchor_row: usize,
    },
    Filling {
        source: SelectionRange,
        target: SelectionRange,
    },
}

impl GestureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ResizingColumn { .. } => "resizing_column",
            Self::ColumnReorderCandidate { .. } => "column_reorder_candidate",
            Self::ReorderingColumn { .. } => "reordering_column",
            Self::RowPressCandidate { .. } => "row_press_candidate",
            Self::ReorderingRow { .. } => "reordering_row",
            Self::SelectingCells { .. } => "selecting_cells",
            Self::SelectingRows { .. } => "selecting_rows",
            Self::Filling { .. } => "filling",
        }
    }

    /// Visual feedback to draw for the gesture, if any.
    pub fn overlay(&self) -> Option<DragOverlay> {
        match *self {
            Self::ReorderingColumn {
                col,
                start_x,
                current_x,
                target,
            } => Some(DragOverlay::ColumnGhost {
                col,
                dx: current_x - start_x,
                target,
            }),
            Self::ReorderingRow {
                row,
                current_y,
                target,
            } => Some(DragOverlay::RowDrop {
                row,
                y: current_y,
                target,
            }),
            Self::Filling { target, .. } => Some(DragOverlay::FillPreview(target)),
            _ => None,
        }
    }
}

/// Drag feedback handed to the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragOverlay {
    /// A column ghost offset by `dx` from its column, with the drop target.
    ColumnGhost {
        col: usize,
        dx: f32,
        target: Option<usize>,
    },
    /// A dragged row at screen `y`, with the drop target.
    RowDrop {
        row: usize,
        y: f32,
        target: Option<usize>,
    },
    /// The range a fill would cover.
    FillPreview(SelectionRange),
}

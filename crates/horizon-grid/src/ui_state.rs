//! Per-engine UI state: open menu, edited cell and hovered cell.

use crate::menu::MenuState;
use crate::model::{ColumnId, RowId};
use crate::selection::CellPosition;

/// The cell being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct EditState {
    pub position: CellPosition,
    pub row_id: RowId,
    pub column_id: ColumnId,
    /// Character that started the edit, if typed.
    pub initial: Option<String>,
}

/// Transient UI state owned by one engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub menu: Option<MenuState>,
    pub editing: Option<EditState>,
    pub hover: Option<CellPosition>,
}

impl UiState {
    /// Close overlays that do not survive scrolling or resizing. Returns
    /// `true` if something was closed.
    pub fn close_transient(&mut self) -> bool {
        self.menu.take().is_some()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }
}

//! Outward events.
//!
//! [`GridEvents`] holds one [`Signal`] per event. Slots run synchronously on
//! the thread that caused the event, after the engine released its state
//! lock, so a slot may query or drive the engine.
//!
//! ```
//! use horizon_grid::GridEngine;
//!
//! let engine = GridEngine::builder().build().unwrap();
//! engine.events().repaint_requested.connect(|_| {
//!     // schedule a frame
//! });
//! ```

use horizon_grid_core::Signal;
use serde::{Deserialize, Serialize};

use crate::error::ErrorEvent;
use crate::hit_test::HoverChange;
use crate::history::HistoryState;
use crate::menu::MenuState;
use crate::model::{CellValue, Column, ColumnId, PinPosition, RowId};
use crate::registry::HitAction;
use crate::selection::{CellPosition, SelectionRange};
use crate::ui_state::EditState;
use crate::view::SortSpec;

/// Payload of `data_loaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLoaded {
    pub row_count: usize,
    pub column_count: usize,
}

/// A cell value change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellChange {
    pub row: RowId,
    pub column: ColumnId,
    pub old: CellValue,
    pub new: CellValue,
}

/// A column or row move between visual indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moved<Id> {
    pub id: Id,
    pub from: usize,
    pub to: usize,
}

/// A cell type claimed a click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellAction {
    pub position: CellPosition,
    pub row: RowId,
    pub column: ColumnId,
    pub action: HitAction,
}

/// A group header was collapsed or expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupToggled {
    pub key: String,
    pub collapsed: bool,
}

/// Every event the engine publishes.
#[derive(Debug, Default)]
pub struct GridEvents {
    pub data_loaded: Signal<DataLoaded>,
    pub selection_changed: Signal<Vec<SelectionRange>>,

    pub column_added: Signal<Column>,
    pub column_updated: Signal<Column>,
    pub column_deleted: Signal<ColumnId>,
    pub column_resized: Signal<(ColumnId, f32)>,
    pub column_moved: Signal<Moved<ColumnId>>,
    pub column_visibility_changed: Signal<(ColumnId, bool)>,
    pub column_pinned: Signal<(ColumnId, PinPosition)>,

    pub row_added: Signal<RowId>,
    pub row_updated: Signal<RowId>,
    pub row_deleted: Signal<RowId>,
    pub row_moved: Signal<Moved<RowId>>,
    /// A temporary row id was replaced by the id the backend assigned.
    pub row_id_changed: Signal<(RowId, RowId)>,

    pub cell_changed: Signal<CellChange>,
    pub cell_edit_started: Signal<EditState>,
    pub cell_edit_committed: Signal<CellChange>,
    pub cell_edit_cancelled: Signal<CellPosition>,

    pub sort_changed: Signal<Option<SortSpec>>,
    pub grouping_changed: Signal<Option<ColumnId>>,
    pub group_toggled: Signal<GroupToggled>,

    pub context_menu_requested: Signal<MenuState>,
    pub menu_closed: Signal<()>,
    pub hover_changed: Signal<HoverChange>,
    pub cell_action: Signal<CellAction>,
    /// Tab-separated text of the selection, for the host clipboard.
    pub copy_requested: Signal<String>,

    pub history_changed: Signal<HistoryState>,
    pub repaint_requested: Signal<()>,
    pub error: Signal<ErrorEvent>,
}

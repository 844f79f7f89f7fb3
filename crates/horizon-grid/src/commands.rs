//! Reversible grid mutations recorded in the history.
//!
//! Each command captures the values it replaces when it is constructed and
//! holds only a weak engine handle.

use futures_util::future::{BoxFuture, FutureExt};

use crate::adapter::CellUpdate;
use crate::engine::WeakEngine;
use crate::error::Result;
use crate::model::{CellValue, ColumnId, RowId};

/// Edit of a single cell.
pub(crate) struct CellEditCommand {
    engine: WeakEngine,
    row: RowId,
    column: ColumnId,
    old: CellValue,
    new: CellValue,
}

impl CellEditCommand {
    pub(crate) fn new(
        engine: WeakEngine,
        row: RowId,
        column: ColumnId,
        old: CellValue,
        new: CellValue,
    ) -> Self {
        Self {
            engine,
            row,
            column,
            old,
            new,
        }
    }

    async fn write(&self, value: &CellValue) -> Result<()> {
        self.engine
            .upgrade()?
            .write_cell(self.row.clone(), self.column.clone(), value.clone())
            .await
    }
}

impl crate::history::Command for CellEditCommand {
    fn label(&self) -> &str {
        "Edit cell"
    }

    fn execute(&self) -> BoxFuture<'_, Result<()>> {
        self.write(&self.new).boxed()
    }

    fn undo(&self) -> BoxFuture<'_, Result<()>> {
        self.write(&self.old).boxed()
    }
}

/// Edit of many cells persisted as one request (paste, fill, clear).
pub(crate) struct BulkEditCommand {
    engine: WeakEngine,
    label: String,
    old: Vec<CellUpdate>,
    new: Vec<CellUpdate>,
}

impl BulkEditCommand {
    /// `old` holds the current value of every cell in `new`.
    pub(crate) fn new(
        engine: WeakEngine,
        label: impl Into<String>,
        old: Vec<CellUpdate>,
        new: Vec<CellUpdate>,
    ) -> Self {
        Self {
            engine,
            label: label.into(),
            old,
            new,
        }
    }

    async fn write(&self, updates: &[CellUpdate]) -> Result<()> {
        self.engine.upgrade()?.write_cells(updates.to_vec()).await
    }
}

impl crate::history::Command for BulkEditCommand {
    fn label(&self) -> &str {
        &self.label
    }

    fn execute(&self) -> BoxFuture<'_, Result<()>> {
        self.write(&self.new).boxed()
    }

    fn undo(&self) -> BoxFuture<'_, Result<()>> {
        self.write(&self.old).boxed()
    }
}

/// Move of a row in data order.
pub(crate) struct RowMoveCommand {
    engine: WeakEngine,
    row: RowId,
    from: usize,
    to: usize,
}

impl RowMoveCommand {
    pub(crate) fn new(engine: WeakEngine, row: RowId, from: usize, to: usize) -> Self {
        Self {
            engine,
            row,
            from,
            to,
        }
    }

    async fn place(&self, index: usize) -> Result<()> {
        self.engine
            .upgrade()?
            .place_row(self.row.clone(), index)
            .await
    }
}

impl crate::history::Command for RowMoveCommand {
    fn label(&self) -> &str {
        "Move row"
    }

    fn execute(&self) -> BoxFuture<'_, Result<()>> {
        self.place(self.to).boxed()
    }

    fn undo(&self) -> BoxFuture<'_, Result<()>> {
        self.place(self.from).boxed()
    }
}

/// Show or hide a column.
pub(crate) struct ColumnVisibilityCommand {
    engine: WeakEngine,
    column: ColumnId,
    visible: bool,
}

impl ColumnVisibilityCommand {
    pub(crate) fn new(engine: WeakEngine, column: ColumnId, visible: bool) -> Self {
        Self {
            engine,
            column,
            visible,
        }
    }

    async fn apply(&self, visible: bool) -> Result<()> {
        self.engine
            .upgrade()?
            .apply_column_visibility(self.column.clone(), visible)
            .await
    }
}

impl crate::history::Command for ColumnVisibilityCommand {
    fn label(&self) -> &str {
        if self.visible { "Show column" } else { "Hide column" }
    }

    fn execute(&self) -> BoxFuture<'_, Result<()>> {
        self.apply(self.visible).boxed()
    }

    fn undo(&self) -> BoxFuture<'_, Result<()>> {
        self.apply(!self.visible).boxed()
    }
}

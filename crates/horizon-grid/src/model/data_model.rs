//! The committed data of a grid.
//!
//! [`DataModel`] owns the column list and a keyed collection of rows. Row
//! identity survives reordering, sorting and grouping because every lookup
//! goes through [`RowId`] rather than an array index; the data order kept
//! here is only the base order the row view derives from.

use std::collections::HashMap;

use super::{
    clamp_column_width, CellValue, Cell, Column, ColumnId, ColumnUpdate, PinPosition, Row, RowId,
};

/// Columns plus keyed rows in data order.
#[derive(Debug, Default, Clone)]
pub struct DataModel {
    /// All columns, kept sorted by `position`.
    columns: Vec<Column>,
    /// Row ids in data order.
    order: Vec<RowId>,
    /// Data-order index of every row id.
    positions: HashMap<RowId, usize>,
    /// Rows by id.
    rows: HashMap<RowId, Row>,
}

impl DataModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a model from columns and rows.
    pub fn with_data(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        let mut model = Self::new();
        model.replace(columns, rows);
        model
    }

    /// Replace all data.
    ///
    /// Columns are ordered by their `position` (stable for ties) and then
    /// renumbered; widths are clamped. A later row with a duplicate id
    /// replaces the earlier one.
    pub fn replace(&mut self, columns: Vec<Column>, rows: Vec<Row>) {
        self.replace_columns(columns);
        self.order.clear();
        self.positions.clear();
        self.rows.clear();
        for row in rows {
            if !self.rows.contains_key(&row.id) {
                self.positions.insert(row.id.clone(), self.order.len());
                self.order.push(row.id.clone());
            }
            self.rows.insert(row.id.clone(), row);
        }
    }

    // -------------------------------------------------------------------------
    // Columns
    // -------------------------------------------------------------------------

    /// Replace the column list, keeping rows.
    pub fn replace_columns(&mut self, mut columns: Vec<Column>) {
        columns.sort_by_key(|column| column.position);
        for column in &mut columns {
            column.width = clamp_column_width(column.width);
        }
        self.install_columns(columns);
    }

    /// Swap in a new column set, dropping cached text of retyped columns.
    fn install_columns(&mut self, columns: Vec<Column>) {
        let retyped: Vec<ColumnId> = columns
            .iter()
            .filter(|column| {
                self.column(&column.id)
                    .is_some_and(|old| old.column_type != column.column_type)
            })
            .map(|column| column.id.clone())
            .collect();
        self.columns = columns;
        self.renumber();
        for id in &retyped {
            self.invalidate_formatted(id);
        }
    }

    /// All columns in position order, including hidden ones.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns, including hidden ones.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Look up a column.
    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|column| &column.id == id)
    }

    fn column_mut(&mut self, id: &ColumnId) -> Option<&mut Column> {
        self.columns.iter_mut().find(|column| &column.id == id)
    }

    /// Index of a column in position order.
    pub fn column_index(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|column| &column.id == id)
    }

    /// Visible columns in visual order: pinned first, then unpinned, each
    /// band ordered by position.
    pub fn visible_columns(&self) -> Vec<&Column> {
        let pinned = self.columns.iter().filter(|c| c.visible && c.is_pinned());
        let scrolling = self.columns.iter().filter(|c| c.visible && !c.is_pinned());
        pinned.chain(scrolling).collect()
    }

    /// Visual index of a visible column.
    pub fn visual_column_index(&self, id: &ColumnId) -> Option<usize> {
        self.visible_columns()
            .iter()
            .position(|column| &column.id == id)
    }

    /// Number of visible pinned columns.
    pub fn pinned_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| c.visible && c.is_pinned())
            .count()
    }

    /// Insert a column at `index` in position order (appends when `None` or
    /// past the end).
    pub fn insert_column(&mut self, mut column: Column, index: Option<usize>) -> usize {
        column.width = clamp_column_width(column.width);
        let index = index.unwrap_or(self.columns.len()).min(self.columns.len());
        self.columns.insert(index, column);
        self.renumber();
        index
    }

    /// Remove a column, returning its former index and value.
    ///
    /// Cell values for the column are left in the rows so a rollback can
    /// reinsert the column without data loss.
    pub fn remove_column(&mut self, id: &ColumnId) -> Option<(usize, Column)> {
        let index = self.column_index(id)?;
        let column = self.columns.remove(index);
        self.renumber();
        Some((index, column))
    }

    /// Replace a column's definition, returning the previous one.
    pub fn replace_column(&mut self, column: Column) -> Option<Column> {
        let slot = self.column_mut(&column.id)?;
        let position = slot.position;
        let mut column = column;
        column.position = position;
        column.width = clamp_column_width(column.width);
        let previous = std::mem::replace(slot, column);
        if previous.column_type != slot.column_type {
            self.invalidate_formatted(&previous.id);
        }
        Some(previous)
    }

    /// Apply a partial update, returning the previous definition.
    pub fn update_column(&mut self, id: &ColumnId, update: &ColumnUpdate) -> Option<Column> {
        let column = self.column_mut(id)?;
        let previous = column.clone();
        update.apply_to(column);
        if column.column_type != previous.column_type {
            self.invalidate_formatted(id);
        }
        Some(previous)
    }

    /// Set a column's width (clamped). Returns the previous width.
    pub fn set_column_width(&mut self, id: &ColumnId, width: f32) -> Option<f32> {
        let column = self.column_mut(id)?;
        Some(std::mem::replace(&mut column.width, clamp_column_width(width)))
    }

    /// Set a column's pin state. Returns the previous state.
    pub fn set_column_pin(&mut self, id: &ColumnId, pin: PinPosition) -> Option<PinPosition> {
        let column = self.column_mut(id)?;
        Some(std::mem::replace(&mut column.pin, pin))
    }

    /// Set a column's visibility. Returns the previous flag.
    pub fn set_column_visible(&mut self, id: &ColumnId, visible: bool) -> Option<bool> {
        let column = self.column_mut(id)?;
        Some(std::mem::replace(&mut column.visible, visible))
    }

    /// Move a visible column from one visual index to another.
    ///
    /// The destination is clamped to the band of the moved column, so pinned
    /// columns stay before unpinned ones. Hidden columns keep their slots.
    /// Returns the moved column and its final visual index, or `None` if
    /// `from` is out of range.
    pub fn move_column(&mut self, from: usize, to: usize) -> Option<(ColumnId, usize)> {
        let mut visual: Vec<ColumnId> = self
            .visible_columns()
            .iter()
            .map(|column| column.id.clone())
            .collect();
        if from >= visual.len() {
            return None;
        }
        let pinned = self.pinned_count();
        let to = if from < pinned {
            to.min(pinned - 1)
        } else {
            to.clamp(pinned, visual.len() - 1)
        };

        let moved = visual.remove(from);
        visual.insert(to, moved.clone());

        // Refill the slots held by visible columns with the new visual order.
        // Each band keeps its relative order, so pinned columns stay first.
        let mut by_id: HashMap<ColumnId, Column> = self
            .columns
            .iter()
            .filter(|column| column.visible)
            .map(|column| (column.id.clone(), column.clone()))
            .collect();
        let mut next = visual.into_iter();
        for slot in self.columns.iter_mut().filter(|column| column.visible) {
            if let Some(id) = next.next()
                && let Some(column) = by_id.remove(&id)
            {
                *slot = column;
            }
        }
        self.renumber();
        Some((moved, to))
    }

    /// Snapshot of every column, for rollback.
    pub fn columns_snapshot(&self) -> Vec<Column> {
        self.columns.clone()
    }

    /// Restore a column snapshot taken with [`columns_snapshot`](Self::columns_snapshot).
    pub fn restore_columns(&mut self, columns: Vec<Column>) {
        self.install_columns(columns);
    }

    fn renumber(&mut self) {
        for (position, column) in self.columns.iter_mut().enumerate() {
            column.position = position;
        }
    }

    // -------------------------------------------------------------------------
    // Rows
    // -------------------------------------------------------------------------

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.order.len()
    }

    /// Row ids in data order.
    pub fn row_ids(&self) -> &[RowId] {
        &self.order
    }

    /// Rows in data order.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }

    /// Look up a row.
    pub fn row(&self, id: &RowId) -> Option<&Row> {
        self.rows.get(id)
    }

    /// Whether a row exists.
    pub fn contains_row(&self, id: &RowId) -> bool {
        self.rows.contains_key(id)
    }

    /// Index of a row in data order.
    pub fn row_index(&self, id: &RowId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Refresh `positions` for every row at or after `start`.
    ///
    /// Appends and removals at the end touch one entry; a splice in the
    /// middle costs the length of the tail, like the `Vec` shift itself.
    fn reindex_from(&mut self, start: usize) {
        for (offset, id) in self.order[start..].iter().enumerate() {
            if let Some(position) = self.positions.get_mut(id) {
                *position = start + offset;
            } else {
                self.positions.insert(id.clone(), start + offset);
            }
        }
    }

    /// Insert a row at `index` (appends when `None` or past the end).
    /// An existing row with the same id is replaced in place.
    pub fn insert_row(&mut self, row: Row, index: Option<usize>) -> usize {
        if let Some(existing) = self.row_index(&row.id) {
            self.rows.insert(row.id.clone(), row);
            return existing;
        }
        let index = index.unwrap_or(self.order.len()).min(self.order.len());
        self.order.insert(index, row.id.clone());
        self.rows.insert(row.id.clone(), row);
        self.reindex_from(index);
        index
    }

    /// Remove a row, returning its former index and value.
    pub fn remove_row(&mut self, id: &RowId) -> Option<(usize, Row)> {
        let index = self.row_index(id)?;
        self.order.remove(index);
        self.positions.remove(id);
        self.reindex_from(index);
        let row = self.rows.remove(id)?;
        Some((index, row))
    }

    /// Replace a row's id (temporary id → server id), keeping its position.
    pub fn rekey_row(&mut self, old: &RowId, new: RowId) -> bool {
        let Some(index) = self.row_index(old) else {
            return false;
        };
        let Some(mut row) = self.rows.remove(old) else {
            return false;
        };
        row.id = new.clone();
        self.order[index] = new.clone();
        self.positions.remove(old);
        self.positions.insert(new.clone(), index);
        self.rows.insert(new, row);
        true
    }

    /// Move a row to `to` in data order. Returns its previous index.
    pub fn move_row(&mut self, id: &RowId, to: usize) -> Option<usize> {
        let from = self.row_index(id)?;
        let row = self.order.remove(from);
        let to = to.min(self.order.len());
        self.order.insert(to, row);
        self.reindex_from(from.min(to));
        Some(from)
    }

    // -------------------------------------------------------------------------
    // Cells
    // -------------------------------------------------------------------------

    /// The cell at (`row`, `column`), if present.
    pub fn cell(&self, row: &RowId, column: &ColumnId) -> Option<&Cell> {
        self.rows.get(row)?.cells.get(column)
    }

    /// The value at (`row`, `column`), if present.
    pub fn value(&self, row: &RowId, column: &ColumnId) -> Option<&CellValue> {
        self.rows.get(row)?.value(column)
    }

    /// Write a value. Returns the previous value, or `None` if the row does
    /// not exist.
    pub fn set_value(&mut self, row: &RowId, column: &ColumnId, value: CellValue) -> Option<CellValue> {
        let row = self.rows.get_mut(row)?;
        Some(row.set_value(column.clone(), value))
    }

    /// Set or clear the validation error of an existing cell.
    pub fn set_cell_error(&mut self, row: &RowId, column: &ColumnId, error: Option<String>) {
        if let Some(cell) = self
            .rows
            .get_mut(row)
            .and_then(|row| row.cells.get_mut(column))
        {
            cell.set_error(error);
        }
    }

    /// Validation error of a cell.
    pub fn cell_error(&self, row: &RowId, column: &ColumnId) -> Option<&str> {
        self.cell(row, column)?.error()
    }

    /// Drop the cached formatted text of every cell in a column.
    ///
    /// Called whenever the column's cell type changes, so text formatted by
    /// the previous type is never returned.
    pub fn invalidate_formatted(&mut self, column: &ColumnId) {
        for row in self.rows.values_mut() {
            if let Some(cell) = row.cells.get_mut(column) {
                cell.clear_formatted();
            }
        }
    }

    /// Formatted text of a cell, cached until its value or its column's
    /// type changes.
    ///
    /// Returns `None` for absent cells.
    pub fn formatted(
        &mut self,
        row: &RowId,
        column: &ColumnId,
        format: impl FnOnce(&CellValue) -> String,
    ) -> Option<String> {
        let cell = self.rows.get_mut(row)?.cells.get_mut(column)?;
        Some(cell.formatted_with(format).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(pinned: usize, total: usize) -> Vec<Column> {
        (0..total)
            .map(|i| {
                let column = Column::new(format!("c{i}"), format!("C{i}"));
                let mut column = if i < pinned { column.pinned() } else { column };
                column.position = i;
                column
            })
            .collect()
    }

    fn visual_ids(model: &DataModel) -> Vec<String> {
        model
            .visible_columns()
            .iter()
            .map(|c| c.id.to_string())
            .collect()
    }

    #[test]
    fn test_pinned_columns_sort_first() {
        let mut cols = columns(0, 3);
        cols[2].pin = PinPosition::Left;
        let model = DataModel::with_data(cols, Vec::new());
        assert_eq!(visual_ids(&model), ["c2", "c0", "c1"]);
        assert_eq!(model.pinned_count(), 1);
    }

    #[test]
    fn test_move_column_within_pinned_band() {
        let mut model = DataModel::with_data(columns(4, 6), Vec::new());
        let (moved, to) = model.move_column(0, 2).unwrap();
        assert_eq!(moved.as_str(), "c0");
        assert_eq!(to, 2);
        assert_eq!(visual_ids(&model), ["c1", "c2", "c0", "c3", "c4", "c5"]);
        assert!(model.visible_columns()[..4].iter().all(|c| c.is_pinned()));
    }

    #[test]
    fn test_move_column_is_clamped_to_band() {
        let mut model = DataModel::with_data(columns(2, 5), Vec::new());
        // A pinned column dropped into the scrolling band stays pinned-last.
        assert_eq!(model.move_column(0, 4).unwrap().1, 1);
        assert_eq!(visual_ids(&model), ["c1", "c0", "c2", "c3", "c4"]);
        // An unpinned column cannot cross into the pinned band.
        assert_eq!(model.move_column(4, 0).unwrap().1, 2);
        assert_eq!(visual_ids(&model), ["c1", "c0", "c4", "c2", "c3"]);
        assert!(model.move_column(9, 0).is_none());
    }

    #[test]
    fn test_move_column_keeps_hidden_slots() {
        let mut cols = columns(0, 4);
        cols[1].visible = false;
        let mut model = DataModel::with_data(cols, Vec::new());
        model.move_column(0, 2);
        assert_eq!(visual_ids(&model), ["c2", "c3", "c0"]);
        assert_eq!(model.column_index(&ColumnId::new("c1")), Some(1));
    }

    #[test]
    fn test_width_is_clamped() {
        let mut model = DataModel::with_data(columns(0, 1), Vec::new());
        let id = ColumnId::new("c0");
        model.set_column_width(&id, 10.0);
        assert_eq!(model.column(&id).unwrap().width, 50.0);
        model.set_column_width(&id, 5000.0);
        assert_eq!(model.column(&id).unwrap().width, 2000.0);
    }

    #[test]
    fn test_row_lifecycle() {
        let mut model = DataModel::with_data(
            columns(0, 1),
            vec![Row::new("a"), Row::new("b"), Row::new("c")],
        );
        assert_eq!(model.insert_row(Row::new("tmp:1"), Some(1)), 1);
        assert!(model.rekey_row(&RowId::new("tmp:1"), RowId::new("d")));
        assert_eq!(model.row_index(&RowId::new("d")), Some(1));

        assert_eq!(model.move_row(&RowId::new("a"), 3), Some(0));
        let order: Vec<_> = model.row_ids().iter().map(RowId::as_str).collect();
        assert_eq!(order, ["d", "b", "c", "a"]);

        let (index, _) = model.remove_row(&RowId::new("b")).unwrap();
        assert_eq!(index, 1);
        assert_eq!(model.row_count(), 3);
    }

    #[test]
    fn test_row_positions_follow_splices() {
        let rows: Vec<Row> = (0..10_000).map(|i| Row::new(i.to_string())).collect();
        let mut model = DataModel::with_data(columns(0, 1), rows);

        model.insert_row(Row::new("mid"), Some(5_000));
        model.insert_row(Row::new("tail"), None);
        model.remove_row(&RowId::new("10"));
        model.move_row(&RowId::new("9999"), 0);

        for (index, id) in model.row_ids().iter().enumerate() {
            assert_eq!(model.row_index(id), Some(index), "row {id}");
        }
        assert_eq!(model.row_index(&RowId::new("10")), None);
        assert_eq!(model.row_index(&RowId::new("tail")), Some(model.row_count() - 1));
    }

    #[test]
    fn test_type_change_drops_formatted_text() {
        let mut model = DataModel::with_data(
            columns(0, 1),
            vec![Row::new("r").with_value("c0", 3)],
        );
        let (row, col) = (RowId::new("r"), ColumnId::new("c0"));
        assert_eq!(model.formatted(&row, &col, |v| v.to_string()).as_deref(), Some("3"));

        let update = ColumnUpdate {
            column_type: Some("currency".into()),
            ..ColumnUpdate::default()
        };
        let previous = model.update_column(&col, &update).unwrap();
        assert_eq!(model.cell(&row, &col).unwrap().cached_formatted(), None);
        assert_eq!(model.formatted(&row, &col, |v| format!("${v}")).as_deref(), Some("$3"));

        model.replace_column(previous);
        assert_eq!(model.formatted(&row, &col, |v| v.to_string()).as_deref(), Some("3"));
    }

    #[test]
    fn test_cell_write_returns_previous() {
        let mut model = DataModel::with_data(
            columns(0, 1),
            vec![Row::new("r").with_value("c0", 100)],
        );
        let row = RowId::new("r");
        let col = ColumnId::new("c0");
        assert_eq!(
            model.set_value(&row, &col, CellValue::from(200)),
            Some(CellValue::from(100))
        );
        assert_eq!(model.set_value(&RowId::new("missing"), &col, CellValue::Null), None);

        model.set_cell_error(&row, &col, Some("bad".into()));
        assert_eq!(model.cell_error(&row, &col), Some("bad"));
        assert_eq!(
            model.formatted(&row, &col, |v| format!("#{v}")).as_deref(),
            Some("#200")
        );
    }
}

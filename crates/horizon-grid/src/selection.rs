//! Selection model for the grid.
//!
//! A selection is a list of inclusive rectangles in visual (row, column)
//! indices plus a primary cell, the cell with keyboard focus. Ranges may
//! overlap. Whenever the selection is non-empty the primary cell lies
//! inside at least one range.
//!
//! # Example
//!
//! ```
//! use horizon_grid::selection::{CellPosition, SelectionModel};
//!
//! let mut selection = SelectionModel::new(100, 10);
//! selection.select_cell(CellPosition::new(2, 1));
//! selection.extend_to(CellPosition::new(4, 3));
//! assert!(selection.is_cell_selected(3, 2));
//! assert_eq!(selection.primary(), Some(CellPosition::new(2, 1)));
//! ```

use serde::{Deserialize, Serialize};

/// A cell address in visual indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

impl CellPosition {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// What a range was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    /// An arbitrary cell rectangle.
    #[default]
    Cells,
    /// Whole rows.
    Rows,
    /// Whole columns.
    Columns,
    /// The whole grid.
    All,
}

/// An inclusive, normalized rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
    pub kind: RangeKind,
}

impl SelectionRange {
    /// A single cell.
    pub fn cell(pos: CellPosition) -> Self {
        Self::cells(pos, pos)
    }

    /// The rectangle spanned by two corners, in any order.
    pub fn cells(a: CellPosition, b: CellPosition) -> Self {
        Self {
            start_row: a.row.min(b.row),
            start_col: a.col.min(b.col),
            end_row: a.row.max(b.row),
            end_col: a.col.max(b.col),
            kind: RangeKind::Cells,
        }
    }

    /// Rows `a..=b` (any order) across `col_count` columns.
    pub fn rows(a: usize, b: usize, col_count: usize) -> Self {
        Self {
            start_row: a.min(b),
            start_col: 0,
            end_row: a.max(b),
            end_col: col_count.saturating_sub(1),
            kind: RangeKind::Rows,
        }
    }

    /// Columns `a..=b` (any order) across `row_count` rows.
    pub fn columns(a: usize, b: usize, row_count: usize) -> Self {
        Self {
            start_row: 0,
            start_col: a.min(b),
            end_row: row_count.saturating_sub(1),
            end_col: a.max(b),
            kind: RangeKind::Columns,
        }
    }

    /// Whether the inclusive rectangle contains (`row`, `col`).
    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }

    /// Top-left corner.
    pub fn start(&self) -> CellPosition {
        CellPosition::new(self.start_row, self.start_col)
    }

    /// Bottom-right corner.
    pub fn end(&self) -> CellPosition {
        CellPosition::new(self.end_row, self.end_col)
    }

    pub fn row_count(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    pub fn col_count(&self) -> usize {
        self.end_col - self.start_col + 1
    }

    /// Whether this is exactly the single row `row`.
    fn is_single_row(&self, row: usize) -> bool {
        self.kind == RangeKind::Rows && self.start_row == row && self.end_row == row
    }

    /// Whether this is exactly the single column `col`.
    fn is_single_column(&self, col: usize) -> bool {
        self.kind == RangeKind::Columns && self.start_col == col && self.end_col == col
    }
}

/// Multi-range selection state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionModel {
    ranges: Vec<SelectionRange>,
    /// The focused cell.
    primary: Option<CellPosition>,
    /// Fixed corner for shift-extension.
    anchor: Option<CellPosition>,
    /// Moving corner for keyboard extension.
    extent: Option<CellPosition>,
    row_count: usize,
    col_count: usize,
}

impl SelectionModel {
    /// Create an empty selection over a grid of the given size.
    pub fn new(row_count: usize, col_count: usize) -> Self {
        Self {
            row_count,
            col_count,
            ..Default::default()
        }
    }

    /// All ranges, oldest first.
    pub fn ranges(&self) -> &[SelectionRange] {
        &self.ranges
    }

    /// The most recently added range.
    pub fn last_range(&self) -> Option<&SelectionRange> {
        self.ranges.last()
    }

    /// The focused cell.
    pub fn primary(&self) -> Option<CellPosition> {
        self.primary
    }

    /// The extension anchor.
    pub fn anchor(&self) -> Option<CellPosition> {
        self.anchor
    }

    /// The moving corner of the last extension.
    pub fn extent(&self) -> Option<CellPosition> {
        self.extent
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn col_count(&self) -> usize {
        self.col_count
    }

    fn in_bounds(&self, pos: CellPosition) -> bool {
        pos.row < self.row_count && pos.col < self.col_count
    }

    /// Update the grid extent, clipping or dropping ranges that fall outside.
    /// Whole-row, whole-column and all ranges stretch to the new extent.
    pub fn set_extent(&mut self, row_count: usize, col_count: usize) -> bool {
        if row_count == self.row_count && col_count == self.col_count {
            return false;
        }
        self.row_count = row_count;
        self.col_count = col_count;
        let before = self.ranges.clone();

        if row_count == 0 || col_count == 0 {
            self.clear();
            return !before.is_empty();
        }
        let (max_row, max_col) = (row_count - 1, col_count - 1);
        self.ranges.retain_mut(|range| {
            match range.kind {
                RangeKind::Rows => range.end_col = max_col,
                RangeKind::Columns => range.end_row = max_row,
                RangeKind::All => {
                    range.end_row = max_row;
                    range.end_col = max_col;
                }
                RangeKind::Cells => {}
            }
            if range.start_row > max_row || range.start_col > max_col {
                return false;
            }
            range.end_row = range.end_row.min(max_row);
            range.end_col = range.end_col.min(max_col);
            true
        });
        let clamp = |pos: CellPosition| CellPosition::new(pos.row.min(max_row), pos.col.min(max_col));
        self.anchor = self.anchor.map(clamp);
        self.extent = self.extent.map(clamp);
        self.primary = self.primary.map(clamp);
        self.repair_primary();
        self.ranges != before
    }

    /// Select a single cell, replacing the selection.
    pub fn select_cell(&mut self, pos: CellPosition) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        self.ranges = vec![SelectionRange::cell(pos)];
        self.primary = Some(pos);
        self.anchor = Some(pos);
        self.extent = Some(pos);
        true
    }

    /// Extend from the anchor (or primary) to `pos`, replacing the most
    /// recent range. Selects `pos` if nothing is selected.
    pub fn extend_to(&mut self, pos: CellPosition) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        let Some(anchor) = self.anchor.or(self.primary) else {
            return self.select_cell(pos);
        };
        let range = SelectionRange::cells(anchor, pos);
        match self.ranges.last_mut() {
            Some(last) => *last = range,
            None => self.ranges.push(range),
        }
        self.primary = Some(anchor);
        self.anchor = Some(anchor);
        self.extent = Some(pos);
        true
    }

    /// Add a disjoint single-cell range and focus it.
    pub fn add_range(&mut self, pos: CellPosition) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        self.ranges.push(SelectionRange::cell(pos));
        self.primary = Some(pos);
        self.anchor = Some(pos);
        self.extent = Some(pos);
        true
    }

    /// Select a whole row with toggle semantics.
    ///
    /// If the row is the sole range the selection is cleared. If it is one
    /// of several ranges only that range is removed. Otherwise the row is
    /// selected, replacing the selection unless `additive`.
    pub fn select_row(&mut self, row: usize, additive: bool) -> bool {
        if row >= self.row_count || self.col_count == 0 {
            return false;
        }
        if let Some(index) = self.ranges.iter().position(|r| r.is_single_row(row)) {
            self.remove_range(index);
            return true;
        }
        let range = SelectionRange::rows(row, row, self.col_count);
        self.push_or_replace(range, additive);
        true
    }

    /// Select a whole column with toggle semantics (see [`select_row`](Self::select_row)).
    pub fn select_column(&mut self, col: usize, additive: bool) -> bool {
        if col >= self.col_count || self.row_count == 0 {
            return false;
        }
        if let Some(index) = self.ranges.iter().position(|r| r.is_single_column(col)) {
            self.remove_range(index);
            return true;
        }
        let range = SelectionRange::columns(col, col, self.row_count);
        self.push_or_replace(range, additive);
        true
    }

    /// Select the contiguous row span `anchor..=row`, replacing the selection.
    pub fn select_rows(&mut self, anchor: usize, row: usize) -> bool {
        if anchor.max(row) >= self.row_count || self.col_count == 0 {
            return false;
        }
        let range = SelectionRange::rows(anchor, row, self.col_count);
        self.ranges = vec![range];
        let focus = CellPosition::new(anchor, 0);
        self.primary = Some(focus);
        self.anchor = Some(focus);
        self.extent = Some(CellPosition::new(row, self.col_count - 1));
        true
    }

    /// Toggle a single row in the multi-selection (checkbox semantics).
    ///
    /// A row covered by a row range is carved out of it; otherwise the row is
    /// added as a new range.
    pub fn toggle_row(&mut self, row: usize) -> bool {
        if row >= self.row_count || self.col_count == 0 {
            return false;
        }
        let covering = self.ranges.iter().position(|r| {
            matches!(r.kind, RangeKind::Rows | RangeKind::All) && r.start_row <= row && row <= r.end_row
        });
        match covering {
            Some(index) => {
                let range = self.ranges.remove(index);
                let mut pieces = Vec::new();
                if range.start_row < row {
                    pieces.push(SelectionRange::rows(range.start_row, row - 1, self.col_count));
                }
                if row < range.end_row {
                    pieces.push(SelectionRange::rows(row + 1, range.end_row, self.col_count));
                }
                for (offset, piece) in pieces.into_iter().enumerate() {
                    self.ranges.insert(index + offset, piece);
                }
                self.repair_primary();
            }
            None => {
                self.ranges.push(SelectionRange::rows(row, row, self.col_count));
                let focus = CellPosition::new(row, 0);
                self.primary = Some(focus);
                self.anchor = Some(focus);
                self.extent = Some(focus);
            }
        }
        true
    }

    /// Select every cell.
    pub fn select_all(&mut self) -> bool {
        if self.row_count == 0 || self.col_count == 0 {
            return false;
        }
        self.ranges = vec![SelectionRange {
            start_row: 0,
            start_col: 0,
            end_row: self.row_count - 1,
            end_col: self.col_count - 1,
            kind: RangeKind::All,
        }];
        let focus = self.primary.unwrap_or_default();
        self.primary = Some(focus);
        self.anchor = Some(focus);
        self.extent = Some(focus);
        true
    }

    /// Remove every range.
    pub fn clear(&mut self) {
        self.ranges.clear();
        self.primary = None;
        self.anchor = None;
        self.extent = None;
    }

    /// Whether any range contains the cell.
    pub fn is_cell_selected(&self, row: usize, col: usize) -> bool {
        self.ranges.iter().any(|range| range.contains(row, col))
    }

    /// Whether the whole row is selected by a row or all range.
    pub fn is_row_selected(&self, row: usize) -> bool {
        self.ranges.iter().any(|range| {
            matches!(range.kind, RangeKind::Rows | RangeKind::All)
                && range.start_row <= row
                && row <= range.end_row
        })
    }

    /// Whether the whole column is selected by a column or all range.
    pub fn is_column_selected(&self, col: usize) -> bool {
        self.ranges.iter().any(|range| {
            matches!(range.kind, RangeKind::Columns | RangeKind::All)
                && range.start_col <= col
                && col <= range.end_col
        })
    }

    /// Componentwise min/max over all ranges.
    pub fn bounds(&self) -> Option<SelectionRange> {
        let first = self.ranges.first()?;
        let mut bounds = SelectionRange {
            kind: RangeKind::Cells,
            ..*first
        };
        for range in &self.ranges[1..] {
            bounds.start_row = bounds.start_row.min(range.start_row);
            bounds.start_col = bounds.start_col.min(range.start_col);
            bounds.end_row = bounds.end_row.max(range.end_row);
            bounds.end_col = bounds.end_col.max(range.end_col);
        }
        Some(bounds)
    }

    /// Move the primary cell by a delta, clamped to the grid. With `extend`
    /// the anchor stays and the moving corner follows instead.
    ///
    /// Returns the cell that should be scrolled into view.
    pub fn move_primary(&mut self, d_row: isize, d_col: isize, extend: bool) -> Option<CellPosition> {
        if self.row_count == 0 || self.col_count == 0 {
            return None;
        }
        let from = if extend {
            self.extent.or(self.primary)
        } else {
            self.primary
        }
        .unwrap_or_default();
        let target = CellPosition::new(
            from.row.saturating_add_signed(d_row).min(self.row_count - 1),
            from.col.saturating_add_signed(d_col).min(self.col_count - 1),
        );
        self.move_to(target, extend)
    }

    /// Move the primary cell (or, with `extend`, the moving corner) to `target`.
    pub fn move_to(&mut self, target: CellPosition, extend: bool) -> Option<CellPosition> {
        let target = CellPosition::new(
            target.row.min(self.row_count.checked_sub(1)?),
            target.col.min(self.col_count.checked_sub(1)?),
        );
        if extend && self.primary.is_some() {
            self.extend_to(target);
        } else {
            self.select_cell(target);
        }
        Some(target)
    }

    fn push_or_replace(&mut self, range: SelectionRange, additive: bool) {
        if additive {
            self.ranges.push(range);
        } else {
            self.ranges = vec![range];
        }
        let focus = range.start();
        self.primary = Some(focus);
        self.anchor = Some(focus);
        self.extent = Some(range.end());
    }

    fn remove_range(&mut self, index: usize) {
        self.ranges.remove(index);
        self.repair_primary();
    }

    /// Keep the primary cell inside some range.
    fn repair_primary(&mut self) {
        let Some(last) = self.ranges.last() else {
            self.clear();
            return;
        };
        let inside = self
            .primary
            .is_some_and(|pos| self.is_cell_selected(pos.row, pos.col));
        if !inside {
            let focus = last.start();
            self.primary = Some(focus);
            self.anchor = Some(focus);
            self.extent = Some(last.end());
        }
    }
}

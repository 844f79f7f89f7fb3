//! Fill handle range math.

use crate::model::CellValue;
use crate::selection::{CellPosition, SelectionRange};

/// Extend `source` toward `pointer` along the dominant axis.
///
/// The result always contains `source`. If the pointer is inside the source
/// the source itself is returned.
pub fn fill_target(source: SelectionRange, pointer: CellPosition) -> SelectionRange {
    let row_distance = if pointer.row > source.end_row {
        pointer.row - source.end_row
    } else {
        source.start_row.saturating_sub(pointer.row)
    };
    let col_distance = if pointer.col > source.end_col {
        pointer.col - source.end_col
    } else {
        source.start_col.saturating_sub(pointer.col)
    };

    let mut target = SelectionRange {
        kind: crate::selection::RangeKind::Cells,
        ..source
    };
    if row_distance == 0 && col_distance == 0 {
        return target;
    }
    if row_distance >= col_distance {
        target.start_row = source.start_row.min(pointer.row);
        target.end_row = source.end_row.max(pointer.row);
    } else {
        target.start_col = source.start_col.min(pointer.col);
        target.end_col = source.end_col.max(pointer.col);
    }
    target
}

/// Tile the source values over the target.
///
/// Each target cell outside the source takes the source cell at the same
/// offset modulo the source size, so the pattern repeats in either
/// direction. `value_at` reads a source cell; `None` skips it.
pub fn tile_fill(
    source: SelectionRange,
    target: SelectionRange,
    mut value_at: impl FnMut(CellPosition) -> Option<CellValue>,
) -> Vec<(CellPosition, CellValue)> {
    let height = source.row_count() as isize;
    let width = source.col_count() as isize;
    let mut writes = Vec::new();

    for row in target.start_row..=target.end_row {
        for col in target.start_col..=target.end_col {
            if source.contains(row, col) {
                continue;
            }
            let src_row = (row as isize - source.start_row as isize).rem_euclid(height);
            let src_col = (col as isize - source.start_col as isize).rem_euclid(width);
            let from = CellPosition::new(
                source.start_row + src_row as usize,
                source.start_col + src_col as usize,
            );
            if let Some(value) = value_at(from) {
                writes.push((CellPosition::new(row, col), value));
            }
        }
    }
    writes
}

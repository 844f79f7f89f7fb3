//! Row view layer: ordering, sorting and grouping of rows for display.

mod row_view;
mod sort;

pub use row_view::{EMPTY_GROUP_KEY, GROUP_ID_PREFIX, GroupHeader, RowView, ViewRow};
pub use sort::{SortDirection, SortSpec, compare_values, sort_rows};

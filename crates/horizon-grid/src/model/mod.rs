//! Data model: columns, keyed rows and sparse cells.
//!
//! The [`DataModel`] is the single source of truth for committed data. Only
//! the engine mutates it; views derive their ordering from it.

mod column;
mod data_model;
mod row;
mod value;

pub use column::{
    clamp_column_width, Column, ColumnId, ColumnUpdate, PinPosition, DEFAULT_COLUMN_WIDTH,
    MAX_COLUMN_WIDTH, MIN_COLUMN_WIDTH,
};
pub use data_model::DataModel;
pub use row::{Cell, NewRow, Row, RowId, TEMPORARY_ROW_PREFIX};
pub use value::CellValue;

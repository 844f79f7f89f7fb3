//! Error types for the grid engine.

use serde::{Deserialize, Serialize};

use crate::adapter::AdapterError;
use crate::config::ConfigError;
use crate::model::{ColumnId, RowId};

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// The mutating operations the orchestrator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Load,
    UpdateCell,
    UpdateCells,
    AddRow,
    UpdateRow,
    DeleteRow,
    MoveRow,
    AddColumn,
    UpdateColumn,
    DeleteColumn,
    ResizeColumn,
    ReorderColumn,
    PinColumn,
    Sort,
}

impl Operation {
    /// Stable name used in messages and error events.
    pub fn name(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::UpdateCell => "update_cell",
            Self::UpdateCells => "update_cells",
            Self::AddRow => "add_row",
            Self::UpdateRow => "update_row",
            Self::DeleteRow => "delete_row",
            Self::MoveRow => "move_row",
            Self::AddColumn => "add_column",
            Self::UpdateColumn => "update_column",
            Self::DeleteColumn => "delete_column",
            Self::ResizeColumn => "resize_column",
            Self::ReorderColumn => "reorder_column",
            Self::PinColumn => "pin_column",
            Self::Sort => "sort",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors returned by grid engine operations.
///
/// Validation failures are not represented here: they are recorded on the
/// cell and never abort a write.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// A before hook vetoed the operation.
    #[error("{operation} was cancelled by a before hook")]
    Cancelled { operation: Operation },

    /// The persistence adapter rejected the operation. Local state was rolled back.
    #[error("{operation} failed to persist: {source}")]
    Persistence {
        operation: Operation,
        #[source]
        source: AdapterError,
    },

    /// No persistence adapter is configured.
    #[error("no persistence adapter configured for {0}")]
    NoAdapter(Operation),

    /// Another operation of the same kind holds the lock.
    #[error("{0} is already in progress")]
    Busy(Operation),

    /// The row does not exist in the data model.
    #[error("row '{0}' not found")]
    RowNotFound(RowId),

    /// The column does not exist in the data model.
    #[error("column '{0}' not found")]
    ColumnNotFound(ColumnId),

    /// A column with this id already exists.
    #[error("column '{0}' already exists")]
    DuplicateColumn(ColumnId),

    /// A visual index was outside the current view.
    #[error("index {index} is out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Rows cannot be reordered while the view is grouped.
    #[error("row reordering is disabled while rows are grouped")]
    ReorderWhileGrouped,

    /// A command outlived the engine it was created for.
    #[error("the grid engine was dropped")]
    EngineDropped,

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GridError {
    /// Create a persistence error.
    pub fn persistence(operation: Operation, source: AdapterError) -> Self {
        Self::Persistence { operation, source }
    }

    /// Classify the error for the outward `error` event.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Cancelled { .. } => ErrorKind::Cancellation,
            Self::Persistence { .. } => ErrorKind::Persistence,
            Self::NoAdapter(_)
            | Self::Busy(_)
            | Self::RowNotFound(_)
            | Self::ColumnNotFound(_)
            | Self::DuplicateColumn(_)
            | Self::IndexOutOfBounds { .. }
            | Self::ReorderWhileGrouped
            | Self::EngineDropped
            | Self::Config(_) => ErrorKind::Precondition,
        }
    }

    /// Whether the error was caused by a before-hook veto.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Error classes surfaced through the `error` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Cancellation,
    Persistence,
    Precondition,
}

/// Payload of the `error` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Error class.
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    /// Operation that failed, if any.
    pub operation: Option<Operation>,
    /// Human-readable message.
    pub message: String,
}

impl ErrorEvent {
    /// Build the event payload for an error raised by `operation`.
    pub fn from_error(operation: Operation, error: &GridError) -> Self {
        Self {
            kind: error.kind(),
            operation: Some(operation),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_message_is_fixed() {
        let err = GridError::Cancelled {
            operation: Operation::AddRow,
        };
        assert_eq!(err.to_string(), "add_row was cancelled by a before hook");
        assert_eq!(err.kind(), ErrorKind::Cancellation);
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_persistence_error_event() {
        let err = GridError::persistence(Operation::UpdateCell, AdapterError::new("offline"));
        let event = ErrorEvent::from_error(Operation::UpdateCell, &err);
        assert_eq!(event.kind, ErrorKind::Persistence);
        assert_eq!(event.message, "update_cell failed to persist: offline");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "persistence");
        assert_eq!(json["operation"], "update_cell");
    }

    #[test]
    fn test_precondition_kinds() {
        assert_eq!(
            GridError::Busy(Operation::AddRow).kind(),
            ErrorKind::Precondition
        );
        assert_eq!(
            GridError::NoAdapter(Operation::Load).kind(),
            ErrorKind::Precondition
        );
    }
}

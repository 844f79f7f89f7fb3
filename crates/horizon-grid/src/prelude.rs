//! Commonly used types.
//!
//! ```
//! use horizon_grid::prelude::*;
//! ```

// ============================================================================
// Engine
// ============================================================================

pub use crate::{GridConfig, GridEngine, GridEngineBuilder, GridError, GridEvents, Result};
pub use crate::hooks::LifecycleHooks;

// ============================================================================
// Data
// ============================================================================

pub use crate::model::{CellValue, Column, ColumnId, ColumnUpdate, NewRow, PinPosition, Row, RowId};
pub use crate::view::{SortDirection, SortSpec, ViewRow};

// ============================================================================
// Persistence
// ============================================================================

pub use crate::adapter::{CellUpdate, MemoryAdapter, PersistenceAdapter};

// ============================================================================
// Input and Rendering
// ============================================================================

pub use crate::input::{Key, KeyEvent, KeyboardModifiers, MouseButton, PointerEvent, WheelEvent};
pub use crate::render::{Frame, RenderSurface};
pub use crate::selection::{CellPosition, SelectionRange};

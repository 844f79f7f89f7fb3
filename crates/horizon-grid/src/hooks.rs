//! Lifecycle hooks.
//!
//! Each class of mutation has a before/after pair. A before hook receives the
//! payload and returns it (possibly transformed) to proceed, or `None` to
//! veto the operation, which then fails with
//! [`GridError::Cancelled`](crate::GridError::Cancelled). After hooks run
//! only once persistence succeeded.
//!
//! ```
//! use horizon_grid::hooks::{CellWrite, HookPair, LifecycleHooks};
//!
//! let mut hooks = LifecycleHooks::default();
//! hooks.cell = HookPair::new().before(|mut write: CellWrite| {
//!     let trimmed = write.value.as_str().map(|text| text.trim().to_string());
//!     if let Some(text) = trimmed {
//!         write.value = text.into();
//!     }
//!     Some(write)
//! });
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{CellValue, Column, ColumnId, ColumnUpdate, NewRow, RowId};
use crate::view::SortSpec;

type BeforeHook<T> = Box<dyn Fn(T) -> Option<T> + Send + Sync>;
type AfterHook<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Before/after hooks for one operation class.
pub struct HookPair<T> {
    before: Option<BeforeHook<T>>,
    after: Option<AfterHook<T>>,
}

impl<T> Default for HookPair<T> {
    fn default() -> Self {
        Self {
            before: None,
            after: None,
        }
    }
}

impl<T> fmt::Debug for HookPair<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookPair")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

impl<T> HookPair<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the before hook.
    pub fn before(mut self, hook: impl Fn(T) -> Option<T> + Send + Sync + 'static) -> Self {
        self.before = Some(Box::new(hook));
        self
    }

    /// Set the after hook.
    pub fn after(mut self, hook: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.after = Some(Box::new(hook));
        self
    }

    /// Run the before hook. `None` means vetoed.
    pub fn run_before(&self, payload: T) -> Option<T> {
        match &self.before {
            Some(hook) => hook(payload),
            None => Some(payload),
        }
    }

    /// Run the after hook.
    pub fn run_after(&self, payload: &T) {
        if let Some(hook) = &self.after {
            hook(payload);
        }
    }
}

/// A single cell write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellWrite {
    pub row: RowId,
    pub column: ColumnId,
    pub value: CellValue,
}

/// A multi-cell update to one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowPatch {
    pub row: RowId,
    pub values: HashMap<ColumnId, CellValue>,
}

/// A column property update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPatch {
    pub column: ColumnId,
    pub update: ColumnUpdate,
}

/// A column width change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnResize {
    pub column: ColumnId,
    pub width: f32,
}

/// All lifecycle hooks of an engine.
#[derive(Debug, Default)]
pub struct LifecycleHooks {
    /// Single and bulk cell writes. A bulk write is vetoed as a whole if any
    /// of its cells is vetoed.
    pub cell: HookPair<CellWrite>,
    pub row_add: HookPair<NewRow>,
    pub row_update: HookPair<RowPatch>,
    pub row_delete: HookPair<RowId>,
    pub column_add: HookPair<Column>,
    pub column_update: HookPair<ColumnPatch>,
    pub column_delete: HookPair<ColumnId>,
    pub column_resize: HookPair<ColumnResize>,
    pub sort: HookPair<Option<SortSpec>>,
}

//! Context menu items.
//!
//! The grid does not draw menus. On a right-click (or a click in a column
//! header's menu zone) it asks every registered [`MenuItemProvider`] for
//! items and publishes the concatenated list through the
//! `context_menu_requested` event.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::model::{ColumnId, RowId};
use crate::selection::{CellPosition, SelectionRange};

/// What the menu was opened on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuTarget {
    /// A body cell.
    Cell(CellPosition),
    /// A column header.
    Column(ColumnId),
    /// A row header.
    RowHeader(usize),
}

/// Information handed to menu item providers.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenuContext {
    pub target: MenuTarget,
    /// Data row under the pointer, if any.
    pub row_id: Option<RowId>,
    /// Column under the pointer, if any.
    pub column_id: Option<ColumnId>,
    /// Bounds of the current selection.
    pub selection: Option<SelectionRange>,
}

/// A context menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuItem {
    Action {
        id: String,
        label: String,
        #[serde(default = "enabled_default")]
        enabled: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shortcut: Option<String>,
    },
    Separator,
}

fn enabled_default() -> bool {
    true
}

impl MenuItem {
    /// An enabled action without a shortcut.
    pub fn action(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Action {
            id: id.into(),
            label: label.into(),
            enabled: true,
            shortcut: None,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Self::Separator)
    }
}

/// Supplies context menu items.
pub trait MenuItemProvider: Send + Sync {
    fn items(&self, context: &ContextMenuContext) -> Vec<MenuItem>;
}

impl<F> MenuItemProvider for F
where
    F: Fn(&ContextMenuContext) -> Vec<MenuItem> + Send + Sync,
{
    fn items(&self, context: &ContextMenuContext) -> Vec<MenuItem> {
        self(context)
    }
}

/// Concatenate every provider's items, separating non-empty groups.
pub fn collect_menu_items(
    providers: &[Box<dyn MenuItemProvider>],
    context: &ContextMenuContext,
) -> Vec<MenuItem> {
    let mut items = Vec::new();
    for provider in providers {
        let group = provider.items(context);
        if group.is_empty() {
            continue;
        }
        if !items.is_empty() {
            items.push(MenuItem::Separator);
        }
        items.extend(group);
    }
    items
}

/// An open context menu.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuState {
    /// Screen position the menu was requested at.
    pub position: Point,
    pub context: ContextMenuContext,
    pub items: Vec<MenuItem>,
}

//! Visual row ordering.
//!
//! [`RowView`] derives the ordered list of [`ViewRow`]s the grid displays
//! from the [`DataModel`]: data order, optionally sorted, optionally grouped
//! by one column with collapsible group headers.

use std::collections::{BTreeMap, HashMap, HashSet};

use horizon_grid_core::PerfSpan;
use horizon_grid_core::logging::{span_names, targets};
use serde::{Deserialize, Serialize};

use super::sort::{SortSpec, compare_values};
use crate::model::{ColumnId, DataModel, RowId};

/// Group key used for absent, null and empty values.
pub const EMPTY_GROUP_KEY: &str = "(Empty)";

/// Prefix of group header identifiers.
pub const GROUP_ID_PREFIX: &str = "group:";

/// A synthetic header row introducing a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupHeader {
    /// Stable identifier, `group:<key>`.
    pub id: String,
    /// Stringified grouping value.
    pub key: String,
    /// Display title.
    pub title: String,
    /// Number of data rows in the group.
    pub child_count: usize,
    /// Whether the group's rows are hidden.
    pub collapsed: bool,
    /// Nesting depth.
    pub depth: usize,
}

/// A row as it appears in visual order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewRow {
    /// A data row.
    Data(RowId),
    /// A group header.
    GroupHeader(GroupHeader),
}

impl ViewRow {
    /// The data row id, if this is a data row.
    pub fn row_id(&self) -> Option<&RowId> {
        match self {
            Self::Data(id) => Some(id),
            Self::GroupHeader(_) => None,
        }
    }

    /// The group header, if this is one.
    pub fn group(&self) -> Option<&GroupHeader> {
        match self {
            Self::Data(_) => None,
            Self::GroupHeader(header) => Some(header),
        }
    }
}

/// The derived, ordered view of the data model's rows.
#[derive(Debug, Default, Clone)]
pub struct RowView {
    group_by: Option<ColumnId>,
    sort: Option<SortSpec>,
    /// Collapsed group keys for the current grouping column.
    collapsed: HashSet<String>,
    rows: Vec<ViewRow>,
    /// Visual index of each data row.
    index: HashMap<RowId, usize>,
}

impl RowView {
    /// Create an empty, ungrouped view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a view of `model` in data order.
    pub fn from_model(model: &DataModel) -> Self {
        let mut view = Self::new();
        view.rebuild(model);
        view
    }

    /// All view rows in visual order.
    pub fn rows(&self) -> &[ViewRow] {
        &self.rows
    }

    /// Number of view rows, including group headers.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the view has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The view row at `index`.
    pub fn get(&self, index: usize) -> Option<&ViewRow> {
        self.rows.get(index)
    }

    /// The data row id at `index`; `None` for headers and out-of-range indices.
    pub fn row_id_at(&self, index: usize) -> Option<&RowId> {
        self.rows.get(index)?.row_id()
    }

    /// Visual index of a data row; `None` if absent or inside a collapsed group.
    pub fn visual_index_of(&self, id: &RowId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Data row ids in visual order.
    pub fn data_row_ids(&self) -> impl Iterator<Item = &RowId> {
        self.rows.iter().filter_map(ViewRow::row_id)
    }

    /// The grouping column.
    pub fn grouping(&self) -> Option<&ColumnId> {
        self.group_by.as_ref()
    }

    /// Whether rows are grouped.
    pub fn is_grouped(&self) -> bool {
        self.group_by.is_some()
    }

    /// The local sort.
    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// Whether the view shows rows in plain data order.
    pub fn is_data_order(&self) -> bool {
        self.group_by.is_none() && self.sort.is_none()
    }

    /// Group rows by `column`, or ungroup with `None`.
    ///
    /// Collapsed state is kept when the grouping column is unchanged and
    /// reset otherwise.
    pub fn group_by(&mut self, column: Option<ColumnId>, model: &DataModel) {
        if self.group_by != column {
            self.collapsed.clear();
            self.group_by = column;
        }
        self.rebuild(model);
    }

    /// Set or clear the local sort.
    pub fn set_sort(&mut self, sort: Option<SortSpec>, model: &DataModel) {
        self.sort = sort;
        self.rebuild(model);
    }

    /// Toggle a group's collapsed flag. Returns the new flag, or `None` if no
    /// such group is shown.
    pub fn toggle_group(&mut self, key: &str, model: &DataModel) -> Option<bool> {
        let exists = self
            .rows
            .iter()
            .filter_map(ViewRow::group)
            .any(|header| header.key == key);
        if !exists {
            return None;
        }
        let collapsed = if self.collapsed.remove(key) {
            false
        } else {
            self.collapsed.insert(key.to_string());
            true
        };
        tracing::debug!(target: targets::VIEW, key, collapsed, "toggled group");
        self.rebuild(model);
        Some(collapsed)
    }

    /// Collapse every group.
    pub fn collapse_all(&mut self, model: &DataModel) {
        if self.group_by.is_none() {
            return;
        }
        let keys: Vec<String> = self
            .rows
            .iter()
            .filter_map(ViewRow::group)
            .map(|header| header.key.clone())
            .collect();
        self.collapsed.extend(keys);
        self.rebuild(model);
    }

    /// Expand every group.
    pub fn expand_all(&mut self, model: &DataModel) {
        self.collapsed.clear();
        self.rebuild(model);
    }

    /// A row was inserted into the model.
    ///
    /// In plain data order the row is spliced in place; otherwise the view
    /// is rebuilt.
    pub fn row_inserted(&mut self, model: &DataModel, id: &RowId) {
        match model.row_index(id) {
            Some(index) if self.is_data_order() && index <= self.rows.len() => {
                self.rows.insert(index, ViewRow::Data(id.clone()));
                self.reindex_from(index);
            }
            _ => self.rebuild(model),
        }
    }

    /// A row was removed from the model.
    pub fn row_removed(&mut self, model: &DataModel, id: &RowId) {
        match self.index.get(id).copied() {
            Some(index) if self.is_data_order() => {
                self.rows.remove(index);
                self.index.remove(id);
                self.reindex_from(index);
            }
            _ => self.rebuild(model),
        }
    }

    /// A row id was replaced (temporary id → permanent id).
    pub fn row_rekeyed(&mut self, old: &RowId, new: &RowId) {
        if let Some(index) = self.index.remove(old) {
            self.rows[index] = ViewRow::Data(new.clone());
            self.index.insert(new.clone(), index);
        }
    }

    fn reindex_from(&mut self, start: usize) {
        for (offset, row) in self.rows[start..].iter().enumerate() {
            if let ViewRow::Data(id) = row {
                self.index.insert(id.clone(), start + offset);
            }
        }
    }

    /// Recompute the whole view from `model`.
    pub fn rebuild(&mut self, model: &DataModel) {
        let _span = PerfSpan::new(span_names::VIEW_REBUILD);

        let mut ordered: Vec<&RowId> = model.row_ids().iter().collect();
        if let Some(sort) = &self.sort {
            ordered.sort_by(|a, b| {
                compare_values(
                    model.value(a, &sort.column),
                    model.value(b, &sort.column),
                    sort.direction,
                )
            });
        }

        self.rows.clear();
        match &self.group_by {
            None => {
                self.rows
                    .extend(ordered.into_iter().map(|id| ViewRow::Data(id.clone())));
            }
            Some(column) => {
                let mut groups: BTreeMap<String, Vec<&RowId>> = BTreeMap::new();
                for id in ordered {
                    let key = model
                        .value(id, column)
                        .map(|value| value.to_string())
                        .filter(|key| !key.trim().is_empty())
                        .unwrap_or_else(|| EMPTY_GROUP_KEY.to_string());
                    groups.entry(key).or_default().push(id);
                }
                for (key, members) in groups {
                    let collapsed = self.collapsed.contains(&key);
                    self.rows.push(ViewRow::GroupHeader(GroupHeader {
                        id: format!("{GROUP_ID_PREFIX}{key}"),
                        title: key.clone(),
                        key,
                        child_count: members.len(),
                        collapsed,
                        depth: 0,
                    }));
                    if !collapsed {
                        self.rows
                            .extend(members.into_iter().map(|id| ViewRow::Data(id.clone())));
                    }
                }
            }
        }

        self.index.clear();
        self.reindex_from(0);
        tracing::trace!(target: targets::VIEW, rows = self.rows.len(), "rebuilt row view");
    }
}

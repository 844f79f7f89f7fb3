//! Column definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Narrowest width a column may be resized to.
pub const MIN_COLUMN_WIDTH: f32 = 50.0;

/// Widest width a column may be resized to.
pub const MAX_COLUMN_WIDTH: f32 = 2000.0;

/// Default width of a newly created column.
pub const DEFAULT_COLUMN_WIDTH: f32 = 150.0;

/// Clamp a requested width to the allowed column width range.
pub fn clamp_column_width(width: f32) -> f32 {
    if width.is_nan() {
        return MIN_COLUMN_WIDTH;
    }
    width.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
}

/// Stable column identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(String);

impl ColumnId {
    /// Create an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ColumnId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Where a column is pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinPosition {
    /// Scrolls with the grid.
    #[default]
    None,
    /// Frozen at the left edge.
    Left,
}

/// A column of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Unique, stable identifier.
    pub id: ColumnId,
    /// Header label.
    pub title: String,
    /// Width in pixels, always within `[MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH]`.
    #[serde(default = "default_width")]
    pub width: f32,
    /// Semantic type tag resolved through the cell type registry.
    #[serde(default = "default_type", rename = "type")]
    pub column_type: String,
    /// Whether the column is shown.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Pin state.
    #[serde(default)]
    pub pin: PinPosition,
    /// Ordinal position among all columns.
    #[serde(default)]
    pub position: usize,
}

fn default_width() -> f32 {
    DEFAULT_COLUMN_WIDTH
}

fn default_type() -> String {
    "text".to_string()
}

fn default_visible() -> bool {
    true
}

impl Column {
    /// Create a visible, unpinned text column.
    pub fn new(id: impl Into<ColumnId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            width: DEFAULT_COLUMN_WIDTH,
            column_type: default_type(),
            visible: true,
            pin: PinPosition::None,
            position: 0,
        }
    }

    /// Set the width (clamped).
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = clamp_column_width(width);
        self
    }

    /// Set the semantic type tag.
    pub fn with_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = column_type.into();
        self
    }

    /// Pin the column to the left edge.
    pub fn pinned(mut self) -> Self {
        self.pin = PinPosition::Left;
        self
    }

    /// Hide the column.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Whether the column is pinned.
    pub fn is_pinned(&self) -> bool {
        self.pin == PinPosition::Left
    }
}

/// A partial update to a column's descriptive properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub column_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<PinPosition>,
}

impl ColumnUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.column_type.is_none()
            && self.visible.is_none()
            && self.pin.is_none()
    }

    /// Apply the update to `column`.
    pub fn apply_to(&self, column: &mut Column) {
        if let Some(title) = &self.title {
            column.title = title.clone();
        }
        if let Some(column_type) = &self.column_type {
            column.column_type = column_type.clone();
        }
        if let Some(visible) = self.visible {
            column.visible = visible;
        }
        if let Some(pin) = self.pin {
            column.pin = pin;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_clamp() {
        assert_eq!(clamp_column_width(10.0), 50.0);
        assert_eq!(clamp_column_width(5000.0), 2000.0);
        assert_eq!(clamp_column_width(120.0), 120.0);
        assert_eq!(clamp_column_width(f32::NAN), 50.0);
    }

    #[test]
    fn test_deserialize_defaults() {
        let column: Column = serde_json::from_str(r#"{"id":"amount","title":"Amount"}"#).unwrap();
        assert_eq!(column.width, DEFAULT_COLUMN_WIDTH);
        assert_eq!(column.column_type, "text");
        assert!(column.visible);
        assert!(!column.is_pinned());
    }

    #[test]
    fn test_update_apply() {
        let mut column = Column::new("amount", "Amount");
        let update = ColumnUpdate {
            title: Some("Total".into()),
            pin: Some(PinPosition::Left),
            ..Default::default()
        };
        update.apply_to(&mut column);
        assert_eq!(column.title, "Total");
        assert!(column.is_pinned());
        assert!(ColumnUpdate::default().is_empty());
    }
}

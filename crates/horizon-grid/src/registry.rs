//! Cell type registry.
//!
//! A column's semantic type tag selects a [`CellType`], which formats
//! values for display, validates writes, parses editor input and may claim
//! pointer clicks inside its cells (a checkbox, a link).

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::model::CellValue;

/// Side length of the boolean cell checkbox.
pub const CHECKBOX_SIZE: f32 = 16.0;

/// Everything a cell type needs to know about a cell under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRenderContext {
    /// Screen rectangle of the cell.
    pub rect: Rect,
    /// The cell's value.
    pub value: CellValue,
    /// Whether the cell is inside the selection.
    pub selected: bool,
    /// Whether the cell is the primary cell.
    pub focused: bool,
    /// Whether the pointer hovers the cell.
    pub hovered: bool,
}

/// An action claimed by a cell type's hit test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitAction {
    /// Action name, e.g. `"toggle"`.
    pub action: String,
    /// Value to write into the cell, if the action edits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
}

impl HitAction {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<CellValue>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Behaviour of one semantic cell type.
pub trait CellType: Send + Sync {
    /// Display text for a value.
    fn format(&self, value: &CellValue) -> String {
        value.to_string()
    }

    /// Validation message for a value, or `None` if it is acceptable.
    fn validate(&self, value: &CellValue) -> Option<String> {
        let _ = value;
        None
    }

    /// Convert editor text into a value.
    fn parse(&self, input: &str) -> CellValue {
        if input.is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(input.to_string())
        }
    }

    /// Claim a click at `point` (screen space) inside the cell.
    fn hit_test(&self, context: &CellRenderContext, point: Point) -> Option<HitAction> {
        let _ = (context, point);
        None
    }
}

/// Plain text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextCellType;

impl CellType for TextCellType {}

/// Numbers, with optional fixed decimals.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberCellType {
    /// Digits after the decimal point; `None` prints the shortest form.
    pub decimals: Option<usize>,
}

impl CellType for NumberCellType {
    fn format(&self, value: &CellValue) -> String {
        match (value, self.decimals) {
            (CellValue::Number(n), Some(decimals)) => format!("{n:.decimals$}"),
            _ => value.to_string(),
        }
    }

    fn validate(&self, value: &CellValue) -> Option<String> {
        match value {
            CellValue::Null | CellValue::Number(_) => None,
            CellValue::Text(text) if text.is_empty() => None,
            other if other.as_f64().is_some() => None,
            other => Some(format!("'{other}' is not a number")),
        }
    }

    fn parse(&self, input: &str) -> CellValue {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        trimmed
            .parse::<f64>()
            .map(CellValue::Number)
            .unwrap_or_else(|_| CellValue::Text(input.to_string()))
    }
}

/// Booleans rendered as a centered checkbox that toggles on click.
#[derive(Debug, Default, Clone, Copy)]
pub struct BooleanCellType;

impl BooleanCellType {
    /// Screen rectangle of the checkbox inside `cell`.
    pub fn checkbox_rect(cell: &Rect) -> Rect {
        let center = Point::new(
            cell.left() + cell.width() / 2.0,
            cell.top() + cell.height() / 2.0,
        );
        Rect::square_at(center, CHECKBOX_SIZE)
    }
}

impl CellType for BooleanCellType {
    fn validate(&self, value: &CellValue) -> Option<String> {
        match value {
            CellValue::Null | CellValue::Bool(_) => None,
            other => Some(format!("'{other}' is not true or false")),
        }
    }

    fn parse(&self, input: &str) -> CellValue {
        match input.trim().to_ascii_lowercase().as_str() {
            "" => CellValue::Null,
            "true" | "yes" | "1" | "x" => CellValue::Bool(true),
            "false" | "no" | "0" => CellValue::Bool(false),
            _ => CellValue::Text(input.to_string()),
        }
    }

    fn hit_test(&self, context: &CellRenderContext, point: Point) -> Option<HitAction> {
        if !Self::checkbox_rect(&context.rect).contains(point) {
            return None;
        }
        let checked = context.value.as_bool().unwrap_or(false);
        Some(HitAction::new("toggle").with_value(!checked))
    }
}

/// Maps semantic type tags to [`CellType`]s.
#[derive(Clone)]
pub struct CellTypeRegistry {
    types: HashMap<String, Arc<dyn CellType>>,
    fallback: Arc<dyn CellType>,
}

impl std::fmt::Debug for CellTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.types.keys().collect();
        names.sort();
        f.debug_struct("CellTypeRegistry").field("types", &names).finish()
    }
}

impl Default for CellTypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CellTypeRegistry {
    /// A registry with no types; everything formats as text.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
            fallback: Arc::new(TextCellType),
        }
    }

    /// A registry with the `text`, `number` and `boolean` types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("text", TextCellType);
        registry.register("number", NumberCellType::default());
        registry.register("boolean", BooleanCellType);
        registry
    }

    /// Register (or replace) a type.
    pub fn register(&mut self, name: impl Into<String>, cell_type: impl CellType + 'static) {
        self.types.insert(name.into(), Arc::new(cell_type));
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// The type registered as `name`, or the text fallback.
    pub fn get(&self, name: &str) -> Arc<dyn CellType> {
        self.types
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

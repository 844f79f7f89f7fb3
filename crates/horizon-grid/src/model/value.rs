//! Dynamically typed cell values.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The value stored in a cell.
///
/// Serialized untagged, so JSON `null`, `true`, `1.5` and `"text"` map
/// directly onto the variants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// No value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    Text(String),
}

impl CellValue {
    /// Whether the value is null or an empty string.
    ///
    /// Empty values group under the "(Empty)" sentinel and sort last.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the value, parsing text when possible.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean view of the value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text view of the value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Ordering used by local sorting.
    ///
    /// Numbers compare numerically and sort before booleans, booleans before
    /// text. Empty values are handled by the caller, which always places them
    /// last regardless of direction.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        fn rank(value: &CellValue) -> u8 {
            match value {
                CellValue::Number(_) => 0,
                CellValue::Bool(_) => 1,
                CellValue::Text(_) => 2,
                CellValue::Null => 3,
            }
        }

        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::from(100).to_string(), "100");
        assert_eq!(CellValue::from(2.5).to_string(), "2.5");
        assert_eq!(CellValue::from(true).to_string(), "true");
        assert_eq!(CellValue::from("north").to_string(), "north");
    }

    #[test]
    fn test_untagged_json() {
        let values: Vec<CellValue> = serde_json::from_str(r#"[null, true, 3, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                CellValue::Null,
                CellValue::Bool(true),
                CellValue::Number(3.0),
                CellValue::Text("x".into()),
            ]
        );
    }

    #[test]
    fn test_sort_cmp_mixed() {
        assert_eq!(
            CellValue::from(2).sort_cmp(&CellValue::from(10)),
            Ordering::Less
        );
        assert_eq!(
            CellValue::from("b").sort_cmp(&CellValue::from("a")),
            Ordering::Greater
        );
        assert_eq!(
            CellValue::from(99).sort_cmp(&CellValue::from("a")),
            Ordering::Less
        );
    }

    #[test]
    fn test_emptiness() {
        assert!(CellValue::Null.is_empty());
        assert!(CellValue::from("").is_empty());
        assert!(!CellValue::from(0).is_empty());
        assert_eq!(CellValue::from(" 42 ").as_f64(), Some(42.0));
    }
}

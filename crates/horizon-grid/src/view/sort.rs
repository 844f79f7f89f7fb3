//! Local sorting.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::{CellValue, ColumnId};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// A single-column sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: ColumnId,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    /// Ascending sort on `column`.
    pub fn ascending(column: impl Into<ColumnId>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort on `column`.
    pub fn descending(column: impl Into<ColumnId>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Compare two optional cell values for sorting.
///
/// Empty values (absent, null or empty text) sort last in both directions.
pub fn compare_values(
    a: Option<&CellValue>,
    b: Option<&CellValue>,
    direction: SortDirection,
) -> Ordering {
    let a = a.filter(|value| !value.is_empty());
    let b = b.filter(|value| !value.is_empty());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match direction {
            SortDirection::Ascending => a.sort_cmp(b),
            SortDirection::Descending => b.sort_cmp(a),
        },
    }
}

/// Stable sort of `items` by the value `key` extracts.
pub fn sort_rows<T>(
    mut items: Vec<T>,
    key: impl Fn(&T) -> Option<&CellValue>,
    direction: SortDirection,
) -> Vec<T> {
    items.sort_by(|a, b| compare_values(key(a), key(b), direction));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(values: Vec<CellValue>, direction: SortDirection) -> Vec<CellValue> {
        sort_rows(values, |v| Some(v), direction)
    }

    #[test]
    fn test_numbers_sort_numerically() {
        let values = vec![10.into(), 9.into(), 100.into()];
        assert_eq!(
            sorted(values, SortDirection::Ascending),
            vec![CellValue::from(9), 10.into(), 100.into()]
        );
    }

    #[test]
    fn test_empty_values_sort_last_both_ways() {
        let values = vec![CellValue::Null, "b".into(), "".into(), "a".into()];
        let asc = sorted(values.clone(), SortDirection::Ascending);
        assert_eq!(&asc[..2], &[CellValue::from("a"), "b".into()]);
        let desc = sorted(values, SortDirection::Descending);
        assert_eq!(&desc[..2], &[CellValue::from("b"), "a".into()]);
        assert!(desc[2..].iter().all(CellValue::is_empty));
    }

    #[test]
    fn test_sort_is_stable() {
        let rows = vec![("x", CellValue::from(1)), ("y", 1.into()), ("z", 0.into())];
        let out = sort_rows(rows, |(_, v)| Some(v), SortDirection::Ascending);
        let ids: Vec<_> = out.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, ["z", "x", "y"]);
    }
}

//! Single-column sorting with tri-state cycling.
//!
//! Cycle per column: no-sort -> ascending -> descending -> no-sort.
//! Toggling a different column abandons the old cycle and starts the
//! new one at ascending; only one column sorts at a time.
//!
//! Comparison is type-aware with a fixed type rank (numbers < text <
//! bools < null), so mixed-type columns order deterministically but
//! otherwise meaninglessly — a documented limitation, not a defect.
//! The sort is stable in both directions: ties keep their current
//! relative order.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::column::{Column, DataType};
use crate::row::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Active sort, if any. Absence is the third state of the cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortState {
    pub column: String,
    pub direction: SortDirection,
}

/// Typed sort key. Variant order is the type rank.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Number(OrderedFloat<f64>),
    Text(String),
    Bool(bool),
    Null,
}

impl SortKey {
    fn for_row(row: &Row, column: &Column) -> Self {
        match column.data_type {
            DataType::Number | DataType::NumberRange => row
                .number(&column.key)
                .map(|n| SortKey::Number(OrderedFloat(n)))
                .unwrap_or(SortKey::Null),
            DataType::Date | DataType::DateRange => row
                .date(&column.key)
                .map(|d| SortKey::Number(OrderedFloat(d.and_utc().timestamp() as f64)))
                .unwrap_or(SortKey::Null),
            _ => match row.text(&column.key) {
                Some(s) => SortKey::Text(s.to_lowercase()),
                None => SortKey::Null,
            },
        }
    }
}

/// Tri-state sort engine. Owns only the `SortState`; ordering is a pure
/// function over the rows it is handed.
#[derive(Debug, Clone, Default)]
pub struct SortEngine {
    state: Option<SortState>,
}

impl SortEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&SortState> {
        self.state.as_ref()
    }

    pub fn clear(&mut self) {
        self.state = None;
    }

    /// Advance the cycle for `column` and return the new state.
    pub fn toggle(&mut self, column: &str) -> Option<&SortState> {
        self.state = match self.state.take() {
            Some(state) if state.column == column => match state.direction {
                SortDirection::Asc => Some(SortState {
                    column: column.to_string(),
                    direction: SortDirection::Desc,
                }),
                SortDirection::Desc => None,
            },
            // Different (or no) column: restart at ascending
            _ => Some(SortState {
                column: column.to_string(),
                direction: SortDirection::Asc,
            }),
        };
        self.state.as_ref()
    }

    /// Stable-sort `indices` (into `rows`) by the active column.
    /// No-op when unsorted, when the column is unknown, or when it is
    /// declared non-sortable.
    pub fn apply(&self, rows: &[Row], columns: &[Column], indices: &mut [usize]) {
        let Some(state) = &self.state else {
            return;
        };
        let Some(column) = columns.iter().find(|c| c.key == state.column) else {
            return;
        };
        if !column.sortable {
            return;
        }

        let direction = state.direction;
        indices.sort_by(|&a, &b| {
            let ka = SortKey::for_row(&rows[a], column);
            let kb = SortKey::for_row(&rows[b], column);
            let ord = match direction {
                SortDirection::Asc => ka.cmp(&kb),
                SortDirection::Desc => kb.cmp(&ka),
            };
            // Tie-break on current position keeps the sort stable in
            // both directions
            ord.then_with(|| a.cmp(&b))
        });
    }
}

/// Compare two rows under a column, ascending. `SortEngine::apply` is
/// the usual entry point; this is the one-off comparison.
pub fn compare_rows(a: &Row, b: &Row, column: &Column) -> Ordering {
    SortKey::for_row(a, column).cmp(&SortKey::for_row(b, column))
}

//! Typed column filters, the global text filter, and the sub-row
//! filter namespace.
//!
//! Semantics:
//! - Column filters are ANDed together; the global filter is ANDed with
//!   them; sub-row filters (when the sub-row section is enabled) join
//!   the same conjunction.
//! - Predicate evaluation is type-dispatched off the filter's `kind`.
//! - Null/absent row values never match any filter (fail closed), and
//!   unparseable dates fail the predicate rather than erroring.
//! - A filter whose operand carries no usable value passes every row,
//!   so a half-typed filter input never blanks the grid.
//!
//! Sub-row filters target the same column keys as main filters but live
//! in a separate namespace. The public key carries `SUB_ROW_PREFIX`;
//! routing strips it, so a sub-row filter on `status` never collides
//! with a main filter on `status`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::column::Column;
use crate::row::{parse_date, stringify, Row};

/// Namespace prefix for sub-row filter keys.
pub const SUB_ROW_PREFIX: &str = "subRow:";

/// Comparison operator. Which operators are meaningful depends on the
/// filter kind; mismatches simply never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    Gt,
    Lt,
    Gte,
    Lte,
    Between,
}

/// Type dispatch tag for predicate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    Text,
    Number,
    Date,
    DateRange,
    Select,
}

/// The filter's value payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", untagged)]
pub enum FilterOperand {
    /// Open-ended range; either bound may be absent.
    Range {
        min: Option<Value>,
        max: Option<Value>,
    },
    /// Hybrid select/free-text control. Only one arm is authoritative
    /// at a time; the input's mutual-exclusivity logic clears the other
    /// before handing the value over.
    Hybrid {
        dropdown: Option<String>,
        text: Option<String>,
    },
    /// Plain scalar.
    Scalar(Value),
}

/// One column filter: operand + operator + kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterValue {
    pub operand: FilterOperand,
    pub operator: FilterOperator,
    pub kind: FilterKind,
}

impl FilterValue {
    pub fn text(operator: FilterOperator, needle: impl Into<String>) -> Self {
        Self {
            operand: FilterOperand::Scalar(Value::String(needle.into())),
            operator,
            kind: FilterKind::Text,
        }
    }

    pub fn number(operator: FilterOperator, value: f64) -> Self {
        Self {
            operand: FilterOperand::Scalar(Value::from(value)),
            operator,
            kind: FilterKind::Number,
        }
    }

    pub fn number_between(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            operand: FilterOperand::Range {
                min: min.map(Value::from),
                max: max.map(Value::from),
            },
            operator: FilterOperator::Between,
            kind: FilterKind::Number,
        }
    }

    pub fn date(operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            operand: FilterOperand::Scalar(Value::String(value.into())),
            operator,
            kind: FilterKind::Date,
        }
    }

    pub fn date_between(min: Option<&str>, max: Option<&str>) -> Self {
        Self {
            operand: FilterOperand::Range {
                min: min.map(|s| Value::String(s.to_string())),
                max: max.map(|s| Value::String(s.to_string())),
            },
            operator: FilterOperator::Between,
            kind: FilterKind::DateRange,
        }
    }

    pub fn select(option: impl Into<String>) -> Self {
        Self {
            operand: FilterOperand::Hybrid {
                dropdown: Some(option.into()),
                text: None,
            },
            operator: FilterOperator::Equals,
            kind: FilterKind::Select,
        }
    }

    pub fn select_text(needle: impl Into<String>) -> Self {
        Self {
            operand: FilterOperand::Hybrid {
                dropdown: None,
                text: Some(needle.into()),
            },
            operator: FilterOperator::Contains,
            kind: FilterKind::Select,
        }
    }

    /// Does `row`'s value under `key` pass this filter?
    pub fn matches(&self, row: &Row, key: &str) -> bool {
        match self.kind {
            FilterKind::Text => self.matches_text(row, key),
            FilterKind::Number => self.matches_number(row, key),
            FilterKind::Date | FilterKind::DateRange => self.matches_date(row, key),
            FilterKind::Select => self.matches_select(row, key),
        }
    }

    fn matches_text(&self, row: &Row, key: &str) -> bool {
        let Some(needle) = self.operand_text() else {
            return true;
        };
        let Some(value) = row.text(key) else {
            return false;
        };
        let haystack = value.to_lowercase();
        let needle = needle.to_lowercase();
        match self.operator {
            FilterOperator::Contains => haystack.contains(&needle),
            FilterOperator::Equals => haystack == needle,
            FilterOperator::StartsWith => haystack.starts_with(&needle),
            FilterOperator::EndsWith => haystack.ends_with(&needle),
            _ => false,
        }
    }

    fn matches_number(&self, row: &Row, key: &str) -> bool {
        let Some(value) = row.number(key) else {
            return false;
        };
        if self.operator == FilterOperator::Between {
            let (min, max) = self.operand_number_range();
            if min.is_none() && max.is_none() {
                return true;
            }
            return min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m);
        }
        let Some(bound) = self.operand_number() else {
            return true;
        };
        compare(self.operator, value.partial_cmp(&bound))
    }

    fn matches_date(&self, row: &Row, key: &str) -> bool {
        // Unparseable row dates exclude the row, never error
        let Some(value) = row.date(key) else {
            return false;
        };
        if self.operator == FilterOperator::Between {
            let (min, max) = self.operand_date_range();
            if min.is_none() && max.is_none() {
                return true;
            }
            return min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m);
        }
        let Some(bound) = self.operand_date() else {
            return true;
        };
        compare(self.operator, value.partial_cmp(&bound))
    }

    fn matches_select(&self, row: &Row, key: &str) -> bool {
        match &self.operand {
            FilterOperand::Hybrid { dropdown, text } => {
                // Exactly one arm is authoritative; prefer the dropdown
                // when both somehow arrive populated
                if let Some(option) = dropdown.as_deref().filter(|s| !s.is_empty()) {
                    return row.text(key).as_deref() == Some(option);
                }
                if let Some(needle) = text.as_deref().filter(|s| !s.is_empty()) {
                    return row
                        .text(key)
                        .map(|v| v.to_lowercase().contains(&needle.to_lowercase()))
                        .unwrap_or(false);
                }
                true
            }
            FilterOperand::Scalar(v) => match stringify(v) {
                Some(option) => row.text(key).as_deref() == Some(option.as_str()),
                None => true,
            },
            FilterOperand::Range { .. } => true,
        }
    }

    fn operand_text(&self) -> Option<String> {
        match &self.operand {
            FilterOperand::Scalar(v) => stringify(v).filter(|s| !s.is_empty()),
            FilterOperand::Hybrid { dropdown, text } => dropdown
                .clone()
                .filter(|s| !s.is_empty())
                .or_else(|| text.clone().filter(|s| !s.is_empty())),
            FilterOperand::Range { .. } => None,
        }
    }

    fn operand_number(&self) -> Option<f64> {
        match &self.operand {
            FilterOperand::Scalar(v) => value_number(v),
            _ => None,
        }
    }

    fn operand_number_range(&self) -> (Option<f64>, Option<f64>) {
        match &self.operand {
            FilterOperand::Range { min, max } => (
                min.as_ref().and_then(value_number),
                max.as_ref().and_then(value_number),
            ),
            FilterOperand::Scalar(v) => (value_number(v), None),
            _ => (None, None),
        }
    }

    fn operand_date(&self) -> Option<chrono::NaiveDateTime> {
        match &self.operand {
            FilterOperand::Scalar(v) => value_date(v),
            _ => None,
        }
    }

    fn operand_date_range(
        &self,
    ) -> (Option<chrono::NaiveDateTime>, Option<chrono::NaiveDateTime>) {
        match &self.operand {
            FilterOperand::Range { min, max } => (
                min.as_ref().and_then(value_date),
                max.as_ref().and_then(value_date),
            ),
            FilterOperand::Scalar(v) => (value_date(v), None),
            _ => (None, None),
        }
    }
}

fn value_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_date(v: &Value) -> Option<chrono::NaiveDateTime> {
    match v {
        Value::String(s) => parse_date(s),
        _ => None,
    }
}

fn compare(op: FilterOperator, ord: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering::*;
    let Some(ord) = ord else {
        return false;
    };
    match op {
        FilterOperator::Equals => ord == Equal,
        FilterOperator::Gt => ord == Greater,
        FilterOperator::Lt => ord == Less,
        FilterOperator::Gte => ord != Less,
        FilterOperator::Lte => ord != Greater,
        _ => false,
    }
}

/// All active filters for one grid: per-column map, sub-row map, and
/// the global needle.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    columns: HashMap<String, FilterValue>,
    sub_row: HashMap<String, FilterValue>,
    global: Option<String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear a filter. Keys starting with `SUB_ROW_PREFIX` route
    /// to the sub-row namespace with the prefix stripped.
    pub fn set_filter(&mut self, key: &str, value: Option<FilterValue>) {
        let (map, key) = match key.strip_prefix(SUB_ROW_PREFIX) {
            Some(stripped) => (&mut self.sub_row, stripped),
            None => (&mut self.columns, key),
        };
        match value {
            Some(value) => {
                map.insert(key.to_string(), value);
            }
            None => {
                map.remove(key);
            }
        }
    }

    pub fn clear_filter(&mut self, key: &str) {
        self.set_filter(key, None);
    }

    /// Set the global text filter. Blank input clears it.
    pub fn set_global(&mut self, needle: &str) {
        let trimmed = needle.trim();
        self.global = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    pub fn global(&self) -> Option<&str> {
        self.global.as_deref()
    }

    pub fn column_filter(&self, key: &str) -> Option<&FilterValue> {
        self.columns.get(key)
    }

    pub fn sub_row_filter(&self, key: &str) -> Option<&FilterValue> {
        self.sub_row.get(key)
    }

    pub fn clear_all(&mut self) {
        self.columns.clear();
        self.sub_row.clear();
        self.global = None;
    }

    pub fn is_active(&self) -> bool {
        !self.columns.is_empty() || !self.sub_row.is_empty() || self.global.is_some()
    }

    /// Indices of rows passing every active filter.
    ///
    /// `global_columns` is the visible, filterable column set the global
    /// needle searches; `sub_rows_enabled` gates the sub-row namespace.
    pub fn apply(
        &self,
        rows: &[Row],
        global_columns: &[&Column],
        sub_rows_enabled: bool,
    ) -> Vec<usize> {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| self.row_passes(row, global_columns, sub_rows_enabled))
            .map(|(i, _)| i)
            .collect()
    }

    fn row_passes(&self, row: &Row, global_columns: &[&Column], sub_rows_enabled: bool) -> bool {
        for (key, filter) in &self.columns {
            if !filter.matches(row, key) {
                return false;
            }
        }
        if sub_rows_enabled {
            for (key, filter) in &self.sub_row {
                if !filter.matches(row, key) {
                    return false;
                }
            }
        }
        if let Some(needle) = &self.global {
            let needle = needle.to_lowercase();
            let hit = global_columns.iter().filter(|c| c.filterable).any(|c| {
                row.text(&c.key)
                    .map(|v| v.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            });
            if !hit {
                return false;
            }
        }
        true
    }
}

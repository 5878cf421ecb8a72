//! Column descriptors and display-column derivation.
//!
//! A column's `key` is its stable identity; everything else (label,
//! width, pin, visibility, sub-row membership) can be overridden by
//! persisted preferences. The descriptor declares defaults and
//! capability flags; `display_columns` folds preferences over the
//! declared set to produce the render order.

use serde::{Deserialize, Serialize};
use tabula_config::{ColumnPreferences, PinSide, PreferenceDefaults};

/// Data type tag driving filter predicates, sort comparison, and the
/// editor widget the (out-of-scope) presentation layer picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    Text,
    Number,
    Date,
    DateRange,
    NumberRange,
    Select,
    DropdownText,
    Badge,
    Link,
}

impl DataType {
    /// Select-like types carry an option list.
    pub fn has_options(&self) -> bool {
        matches!(self, DataType::Select | DataType::DropdownText)
    }
}

/// Column descriptor. Declared once at grid construction; mutable
/// presentation state lives in `ColumnPreferences`, never here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub label: String,
    pub data_type: DataType,
    pub sortable: bool,
    pub filterable: bool,
    /// Mandatory columns cannot be hidden.
    pub mandatory: bool,
    pub editable: bool,
    /// Declared sub-row membership (preference overrides may add more).
    pub sub_row: bool,
    /// Declared width in pixels.
    pub width: u32,
    pub pin: Option<PinSide>,
    /// Resolved option list for select-like types. Asynchronous option
    /// fetching happens upstream; the engine only sees the result.
    pub options: Option<Vec<String>>,
}

impl Column {
    pub fn new(key: impl Into<String>, label: impl Into<String>, data_type: DataType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            data_type,
            sortable: true,
            filterable: true,
            mandatory: false,
            editable: false,
            sub_row: false,
            width: 150,
            pin: None,
            options: None,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn sub_row(mut self) -> Self {
        self.sub_row = true;
        self
    }

    pub fn not_sortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn not_filterable(mut self) -> Self {
        self.filterable = false;
        self
    }

    pub fn with_width(mut self, px: u32) -> Self {
        self.width = px;
        self
    }

    pub fn with_pin(mut self, side: PinSide) -> Self {
        self.pin = Some(side);
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }
}

/// Declared defaults handed to the preference manager for seeding.
pub fn preference_defaults(columns: &[Column]) -> PreferenceDefaults {
    PreferenceDefaults::new(
        columns.iter().map(|c| c.key.clone()).collect(),
        columns
            .iter()
            .filter(|c| c.mandatory)
            .map(|c| c.key.clone())
            .collect(),
    )
}

/// Visible main-grid columns in display order: preference order with
/// hidden and sub-row columns removed, then pinned-left first, pinned
/// right last. Relative order within each pin bucket is preserved.
pub fn display_columns<'a>(
    columns: &'a [Column],
    prefs: &ColumnPreferences,
) -> Vec<&'a Column> {
    let by_key = |key: &str| columns.iter().find(|c| c.key == key);

    let ordered: Vec<&Column> = if prefs.column_order.is_empty() {
        columns.iter().collect()
    } else {
        prefs
            .column_order
            .iter()
            .filter_map(|k| by_key(k))
            .collect()
    };

    let in_sub_row = |c: &Column| {
        prefs.enable_sub_row_config && (c.sub_row || prefs.is_sub_row(&c.key))
    };

    let visible: Vec<&Column> = ordered
        .into_iter()
        .filter(|c| (c.mandatory || !prefs.is_hidden(&c.key)) && !in_sub_row(c))
        .collect();

    let pin_of = |c: &Column| prefs.pin_for(&c.key).or(c.pin);

    let mut left: Vec<&Column> = Vec::new();
    let mut middle: Vec<&Column> = Vec::new();
    let mut right: Vec<&Column> = Vec::new();
    for col in visible {
        match pin_of(col) {
            Some(PinSide::Left) => left.push(col),
            Some(PinSide::Right) => right.push(col),
            None => middle.push(col),
        }
    }
    left.extend(middle);
    left.extend(right);
    left
}

/// Columns rendered inside a row's expandable sub-row section.
pub fn sub_row_columns<'a>(
    columns: &'a [Column],
    prefs: &ColumnPreferences,
) -> Vec<&'a Column> {
    if !prefs.enable_sub_row_config {
        return Vec::new();
    }
    columns
        .iter()
        .filter(|c| c.sub_row || prefs.is_sub_row(&c.key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", "ID", DataType::Number).mandatory(),
            Column::new("status", "Status", DataType::Select)
                .with_options(vec!["Released".to_string(), "Cancelled".to_string()]),
            Column::new("amount", "Amount", DataType::Number),
            Column::new("notes", "Notes", DataType::Text).sub_row(),
        ]
    }

    #[test]
    fn test_display_columns_declared_order() {
        let cols = columns();
        let prefs = ColumnPreferences::default();
        let keys: Vec<&str> = display_columns(&cols, &prefs)
            .iter()
            .map(|c| c.key.as_str())
            .collect();
        // Sub-row config disabled: declared sub-row column still shows
        assert_eq!(keys, vec!["id", "status", "amount", "notes"]);
    }

    #[test]
    fn test_display_columns_respects_preferences() {
        let cols = columns();
        let mut prefs = ColumnPreferences::default();
        prefs.column_order = vec![
            "amount".to_string(),
            "status".to_string(),
            "id".to_string(),
            "notes".to_string(),
        ];
        prefs.hidden_columns = vec!["status".to_string(), "id".to_string()];
        prefs.enable_sub_row_config = true;

        let keys: Vec<&str> = display_columns(&cols, &prefs)
            .iter()
            .map(|c| c.key.as_str())
            .collect();
        // "id" is mandatory so the hidden entry is ignored; "notes" moves
        // to the sub-row section once it is enabled
        assert_eq!(keys, vec!["amount", "id"]);

        let sub: Vec<&str> = sub_row_columns(&cols, &prefs)
            .iter()
            .map(|c| c.key.as_str())
            .collect();
        assert_eq!(sub, vec!["notes"]);
    }

    #[test]
    fn test_display_columns_pin_buckets() {
        let cols = columns();
        let mut prefs = ColumnPreferences::default();
        prefs
            .pinned_columns
            .insert("amount".to_string(), PinSide::Left);
        prefs.pinned_columns.insert("id".to_string(), PinSide::Right);

        let keys: Vec<&str> = display_columns(&cols, &prefs)
            .iter()
            .map(|c| c.key.as_str())
            .collect();
        assert_eq!(keys, vec!["amount", "status", "notes", "id"]);
    }

    #[test]
    fn test_preference_defaults_carries_mandatory() {
        let defaults = preference_defaults(&columns());
        assert_eq!(defaults.order.len(), 4);
        assert!(defaults.mandatory.contains("id"));
        assert!(!defaults.mandatory.contains("status"));
    }
}

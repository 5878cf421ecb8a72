//! Grouping: partition the processed row list into collapsible buckets.
//!
//! Groups are derived, never persisted — recomputed from the current
//! rows and grouping field on every change. The one sticky per-group
//! attribute is expansion, keyed by the derived string key. Because the
//! key is a string, semantically distinct values that stringify
//! identically land in the same group and share expansion state; that
//! is the documented contract, not a bug.
//!
//! Grouping and row-level nested-detail expansion are mutually
//! exclusive view modes; the orchestrator enforces that.

use serde_json::Value;
use std::collections::HashMap;

use crate::row::{stringify, Row};

/// Label for rows whose grouping field is null or absent.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// One derived bucket. `items` index into the processed row list the
/// bucket was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDescriptor {
    pub group_key: String,
    pub items: Vec<usize>,
    pub is_expanded: bool,
}

/// The flattened display stream: synthetic header markers interleaved
/// with data rows. Collapsed groups contribute only their header.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayRow {
    Header {
        group_key: String,
        count: usize,
        is_expanded: bool,
    },
    Data(usize),
}

/// Derive the string key a value groups under.
///
/// Objects prefer `.value`, then `.label`, then `.name`, then their
/// JSON text as a last resort. Null/absent values group under
/// [`UNCATEGORIZED`].
pub fn derive_group_key(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return UNCATEGORIZED.to_string();
    };
    match value {
        Value::Null => UNCATEGORIZED.to_string(),
        Value::Object(map) => ["value", "label", "name"]
            .iter()
            .find_map(|k| map.get(*k).and_then(stringify))
            .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
        other => stringify(other).unwrap_or_else(|| other.to_string()),
    }
}

/// Grouping state: the active field and the sticky expansion map.
#[derive(Debug, Clone, Default)]
pub struct GroupingEngine {
    field: Option<String>,
    /// Only collapsed groups are recorded; unknown keys are expanded.
    collapsed: HashMap<String, bool>,
}

impl GroupingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.field.is_some()
    }

    /// Change the grouping field. Any change resets every group to
    /// expanded.
    pub fn set_field(&mut self, field: Option<String>) {
        if self.field != field {
            self.collapsed.clear();
        }
        self.field = field;
    }

    pub fn is_expanded(&self, group_key: &str) -> bool {
        !self.collapsed.get(group_key).copied().unwrap_or(false)
    }

    /// Flip one group's expansion.
    pub fn toggle(&mut self, group_key: &str) {
        let collapsed = !self.collapsed.get(group_key).copied().unwrap_or(false);
        if collapsed {
            self.collapsed.insert(group_key.to_string(), true);
        } else {
            self.collapsed.remove(group_key);
        }
    }

    /// Partition `indices` (into `rows`) by the active field.
    ///
    /// Buckets keep their rows in input order, so a pre-sorted input
    /// yields sorted group members. Groups are ordered by key,
    /// case-insensitively. Inactive grouping returns no groups.
    pub fn group(&self, rows: &[Row], indices: &[usize]) -> Vec<GroupDescriptor> {
        let Some(field) = &self.field else {
            return Vec::new();
        };

        let mut buckets: Vec<(String, Vec<usize>)> = Vec::new();
        let mut by_key: HashMap<String, usize> = HashMap::new();

        for &idx in indices {
            let key = derive_group_key(rows[idx].get(field));
            match by_key.get(&key) {
                Some(&slot) => buckets[slot].1.push(idx),
                None => {
                    by_key.insert(key.clone(), buckets.len());
                    buckets.push((key, vec![idx]));
                }
            }
        }

        buckets.sort_by(|a, b| {
            a.0.to_lowercase()
                .cmp(&b.0.to_lowercase())
                .then_with(|| a.0.cmp(&b.0))
        });

        buckets
            .into_iter()
            .map(|(group_key, items)| {
                let is_expanded = self.is_expanded(&group_key);
                GroupDescriptor {
                    group_key,
                    items,
                    is_expanded,
                }
            })
            .collect()
    }

    /// Flatten groups into the display stream: one header per group,
    /// followed by its rows when expanded.
    pub fn flatten(&self, groups: &[GroupDescriptor]) -> Vec<DisplayRow> {
        let mut out = Vec::new();
        for group in groups {
            out.push(DisplayRow::Header {
                group_key: group.group_key.clone(),
                count: group.items.len(),
                is_expanded: group.is_expanded,
            });
            if group.is_expanded {
                out.extend(group.items.iter().map(|&i| DisplayRow::Data(i)));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{order_rows, row_json};
    use serde_json::json;

    fn all_indices(rows: &[Row]) -> Vec<usize> {
        (0..rows.len()).collect()
    }

    #[test]
    fn test_group_by_status_scenario() {
        // Released x2, Cancelled x1, all expanded initially
        let rows = order_rows();
        let mut engine = GroupingEngine::new();
        engine.set_field(Some("status".to_string()));

        let groups = engine.group(&rows, &all_indices(&rows));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_key, "Cancelled");
        assert_eq!(groups[0].items.len(), 1);
        assert_eq!(groups[1].group_key, "Released");
        assert_eq!(groups[1].items.len(), 2);
        assert!(groups.iter().all(|g| g.is_expanded));
    }

    #[test]
    fn test_group_count_invariant() {
        let rows = crate::harness::many_orders(50);
        let mut engine = GroupingEngine::new();
        engine.set_field(Some("status".to_string()));

        let groups = engine.group(&rows, &all_indices(&rows));
        let total: usize = groups.iter().map(|g| g.items.len()).sum();
        assert_eq!(total, rows.len());
    }

    #[test]
    fn test_derive_group_key_object_preference() {
        assert_eq!(derive_group_key(Some(&json!({"value": "A", "label": "B"}))), "A");
        assert_eq!(derive_group_key(Some(&json!({"label": "B", "name": "C"}))), "B");
        assert_eq!(derive_group_key(Some(&json!({"name": "C"}))), "C");
        // No preferred field: JSON text as last resort
        assert_eq!(derive_group_key(Some(&json!({"other": 1}))), r#"{"other":1}"#);
        assert_eq!(derive_group_key(Some(&json!(42))), "42");
        assert_eq!(derive_group_key(Some(&Value::Null)), UNCATEGORIZED);
        assert_eq!(derive_group_key(None), UNCATEGORIZED);
    }

    #[test]
    fn test_toggle_and_flatten() {
        let rows = order_rows();
        let mut engine = GroupingEngine::new();
        engine.set_field(Some("status".to_string()));
        engine.toggle("Released");

        let groups = engine.group(&rows, &all_indices(&rows));
        let flat = engine.flatten(&groups);

        // Cancelled header + its row, Released header only (collapsed)
        assert_eq!(flat.len(), 3);
        assert!(matches!(
            &flat[0],
            DisplayRow::Header { group_key, count: 1, is_expanded: true } if group_key == "Cancelled"
        ));
        assert!(matches!(&flat[1], DisplayRow::Data(1)));
        assert!(matches!(
            &flat[2],
            DisplayRow::Header { group_key, count: 2, is_expanded: false } if group_key == "Released"
        ));
    }

    #[test]
    fn test_changing_field_resets_expansion() {
        let rows = order_rows();
        let mut engine = GroupingEngine::new();
        engine.set_field(Some("status".to_string()));
        engine.toggle("Released");
        assert!(!engine.is_expanded("Released"));

        engine.set_field(Some("driver".to_string()));
        engine.set_field(Some("status".to_string()));
        assert!(engine.is_expanded("Released"), "field change resets to expanded");
    }

    #[test]
    fn test_stringify_collisions_share_a_group() {
        // 42 the number and "42" the string derive the same key
        let rows = vec![
            row_json(json!({"id": 1, "code": 42})),
            row_json(json!({"id": 2, "code": "42"})),
        ];
        let mut engine = GroupingEngine::new();
        engine.set_field(Some("code".to_string()));

        let groups = engine.group(&rows, &all_indices(&rows));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].items.len(), 2);
    }

    #[test]
    fn test_group_order_case_insensitive() {
        let rows = vec![
            row_json(json!({"id": 1, "tag": "beta"})),
            row_json(json!({"id": 2, "tag": "Alpha"})),
            row_json(json!({"id": 3, "tag": "alpha"})),
        ];
        let mut engine = GroupingEngine::new();
        engine.set_field(Some("tag".to_string()));

        let keys: Vec<String> = engine
            .group(&rows, &all_indices(&rows))
            .into_iter()
            .map(|g| g.group_key)
            .collect();
        assert_eq!(keys, vec!["Alpha", "alpha", "beta"]);
    }

    #[test]
    fn test_inactive_grouping_yields_nothing() {
        let rows = order_rows();
        let engine = GroupingEngine::new();
        assert!(engine.group(&rows, &all_indices(&rows)).is_empty());
    }
}

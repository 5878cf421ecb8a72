//! Persisted column preferences and their mutation intents.
//!
//! The preference payload is the only durable artifact the grid engine
//! defines. It must stay backward-readable: every field defaults
//! harmlessly when absent, and unknown fields are ignored on load.
//!
//! Lifecycle:
//! - Seeded from declared column defaults on first mount
//! - Loaded from an injected store keyed by (user_id, grid_id)
//! - Mutated through discrete intents (toggle, reorder, resize, rename,
//!   pin, sub-row assignment)
//! - Saved back best-effort on every mutation; a save failure never
//!   reverts in-memory state

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::store::PreferenceStore;

/// Which edge a column is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinSide {
    Left,
    Right,
}

/// The persisted preference shape. JSON field names are frozen; new
/// fields must carry `#[serde(default)]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnPreferences {
    /// Display order of column keys. Empty = declared order.
    pub column_order: Vec<String>,
    /// Keys the user has hidden. Mandatory columns never appear here.
    pub hidden_columns: Vec<String>,
    /// Width overrides in pixels.
    pub column_widths: HashMap<String, u32>,
    /// Header text overrides.
    pub column_headers: HashMap<String, String>,
    /// Pinned columns and their side.
    pub pinned_columns: HashMap<String, PinSide>,
    /// Columns assigned to the expandable sub-row section.
    pub sub_row_columns: Vec<String>,
    /// Whether the sub-row section is enabled at all.
    pub enable_sub_row_config: bool,
}

impl ColumnPreferences {
    /// Effective header for a column (override or fallback).
    pub fn header_for<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.column_headers
            .get(key)
            .map(|s| s.as_str())
            .unwrap_or(fallback)
    }

    /// Effective width for a column (override or declared).
    pub fn width_for(&self, key: &str, declared: u32) -> u32 {
        self.column_widths.get(key).copied().unwrap_or(declared)
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden_columns.iter().any(|k| k == key)
    }

    pub fn is_sub_row(&self, key: &str) -> bool {
        self.sub_row_columns.iter().any(|k| k == key)
    }

    pub fn pin_for(&self, key: &str) -> Option<PinSide> {
        self.pinned_columns.get(key).copied()
    }
}

/// Declared column facts the mutators need: which keys exist, in what
/// order, and which ones may never be hidden.
#[derive(Debug, Clone, Default)]
pub struct PreferenceDefaults {
    pub order: Vec<String>,
    pub mandatory: HashSet<String>,
}

impl PreferenceDefaults {
    pub fn new(order: Vec<String>, mandatory: HashSet<String>) -> Self {
        Self { order, mandatory }
    }

    fn knows(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}

/// Width clamp range applied to resize intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthClamp {
    pub min: u32,
    pub max: u32,
}

impl Default for WidthClamp {
    fn default() -> Self {
        Self { min: 100, max: 500 }
    }
}

impl WidthClamp {
    pub fn apply(&self, px: u32) -> u32 {
        px.clamp(self.min, self.max)
    }
}

/// Pure reorder intent: move `moved` so it lands at `target`'s position.
///
/// Decoupled from pointer handling on purpose; drag-and-drop reduces to
/// this plus `set_width`. Unknown keys leave the order untouched.
pub fn reorder(order: &[String], moved: &str, target: &str) -> Vec<String> {
    let mut out: Vec<String> = order.to_vec();
    let Some(from) = out.iter().position(|k| k == moved) else {
        return out;
    };
    let Some(to) = out.iter().position(|k| k == target) else {
        return out;
    };
    let key = out.remove(from);
    out.insert(to, key);
    out
}

/// In-memory preference state plus its persistence seam.
///
/// Every mutator updates memory synchronously, then persists through the
/// injected store. Persistence is best-effort: failures are logged at
/// warn and the in-memory state stands.
pub struct PreferencesManager {
    user_id: String,
    grid_id: String,
    prefs: ColumnPreferences,
    defaults: PreferenceDefaults,
    clamp: WidthClamp,
    store: Box<dyn PreferenceStore>,
}

impl PreferencesManager {
    pub fn new(
        user_id: impl Into<String>,
        grid_id: impl Into<String>,
        defaults: PreferenceDefaults,
        store: Box<dyn PreferenceStore>,
    ) -> Self {
        let prefs = ColumnPreferences {
            column_order: defaults.order.clone(),
            ..ColumnPreferences::default()
        };
        Self {
            user_id: user_id.into(),
            grid_id: grid_id.into(),
            prefs,
            defaults,
            clamp: WidthClamp::default(),
            store,
        }
    }

    pub fn with_clamp(mut self, clamp: WidthClamp) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn preferences(&self) -> &ColumnPreferences {
        &self.prefs
    }

    /// Load persisted preferences, replacing the seeded defaults.
    ///
    /// A missing entry keeps defaults. A failing store keeps defaults
    /// and logs; it never propagates to the caller.
    pub fn load(&mut self) {
        match self.store.load(&self.user_id, &self.grid_id) {
            Ok(Some(mut stored)) => {
                // Columns added since the payload was written get
                // appended in declared order; vanished keys are dropped.
                stored
                    .column_order
                    .retain(|k| self.defaults.knows(k));
                for key in &self.defaults.order {
                    if !stored.column_order.iter().any(|k| k == key) {
                        stored.column_order.push(key.clone());
                    }
                }
                stored
                    .hidden_columns
                    .retain(|k| !self.defaults.mandatory.contains(k));
                self.prefs = stored;
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!(
                    "preference load failed for ({}, {}): {e}; keeping defaults",
                    self.user_id,
                    self.grid_id
                );
            }
        }
    }

    /// Replace the column order wholesale (already-validated intent).
    pub fn set_order(&mut self, order: Vec<String>) {
        self.prefs.column_order = order;
        self.persist();
    }

    /// Move one column to another's position.
    pub fn reorder(&mut self, moved: &str, target: &str) {
        self.prefs.column_order = reorder(&self.prefs.column_order, moved, target);
        self.persist();
    }

    /// Toggle visibility. No-op for mandatory columns.
    pub fn toggle_visibility(&mut self, key: &str) {
        if self.defaults.mandatory.contains(key) {
            return;
        }
        if let Some(pos) = self.prefs.hidden_columns.iter().position(|k| k == key) {
            self.prefs.hidden_columns.remove(pos);
        } else {
            self.prefs.hidden_columns.push(key.to_string());
        }
        self.persist();
    }

    /// Set a width override, clamped to the configured range.
    pub fn set_width(&mut self, key: &str, px: u32) {
        self.prefs
            .column_widths
            .insert(key.to_string(), self.clamp.apply(px));
        self.persist();
    }

    /// Override a header label. Blank-after-trim input is ignored.
    pub fn set_header(&mut self, key: &str, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        self.prefs
            .column_headers
            .insert(key.to_string(), trimmed.to_string());
        self.persist();
    }

    /// Pin a column to a side, or unpin it with `None`.
    pub fn set_pin(&mut self, key: &str, side: Option<PinSide>) {
        match side {
            Some(side) => {
                self.prefs.pinned_columns.insert(key.to_string(), side);
            }
            None => {
                self.prefs.pinned_columns.remove(key);
            }
        }
        self.persist();
    }

    /// Toggle a column in or out of the sub-row section.
    pub fn toggle_sub_row(&mut self, key: &str) {
        if let Some(pos) = self.prefs.sub_row_columns.iter().position(|k| k == key) {
            self.prefs.sub_row_columns.remove(pos);
        } else {
            self.prefs.sub_row_columns.push(key.to_string());
        }
        self.persist();
    }

    pub fn set_sub_row_config_enabled(&mut self, enabled: bool) {
        self.prefs.enable_sub_row_config = enabled;
        self.persist();
    }

    /// Restore declared order and clear every override.
    pub fn reset_to_defaults(&mut self) {
        self.prefs = ColumnPreferences {
            column_order: self.defaults.order.clone(),
            ..ColumnPreferences::default()
        };
        self.persist();
    }

    /// Explicit save of the current state.
    pub fn save(&self) {
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.user_id, &self.grid_id, &self.prefs) {
            log::warn!(
                "preference save failed for ({}, {}): {e}; in-memory state kept",
                self.user_id,
                self.grid_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn defaults() -> PreferenceDefaults {
        let mandatory: HashSet<String> = ["id".to_string()].into_iter().collect();
        PreferenceDefaults::new(
            vec![
                "id".to_string(),
                "status".to_string(),
                "amount".to_string(),
            ],
            mandatory,
        )
    }

    fn manager() -> PreferencesManager {
        PreferencesManager::new("u1", "orders", defaults(), Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_seeded_from_declared_order() {
        let m = manager();
        assert_eq!(m.preferences().column_order, vec!["id", "status", "amount"]);
        assert!(m.preferences().hidden_columns.is_empty());
    }

    #[test]
    fn test_toggle_visibility_mandatory_is_noop() {
        let mut m = manager();
        m.toggle_visibility("id");
        assert!(!m.preferences().is_hidden("id"), "mandatory column must stay visible");

        m.toggle_visibility("status");
        assert!(m.preferences().is_hidden("status"));
        m.toggle_visibility("status");
        assert!(!m.preferences().is_hidden("status"));
    }

    #[test]
    fn test_set_width_clamps() {
        let mut m = manager();
        m.set_width("amount", 40);
        assert_eq!(m.preferences().width_for("amount", 150), 100);
        m.set_width("amount", 9000);
        assert_eq!(m.preferences().width_for("amount", 150), 500);
        m.set_width("amount", 240);
        assert_eq!(m.preferences().width_for("amount", 150), 240);
    }

    #[test]
    fn test_set_header_ignores_blank() {
        let mut m = manager();
        m.set_header("status", "   ");
        assert_eq!(m.preferences().header_for("status", "Status"), "Status");
        m.set_header("status", "  State  ");
        assert_eq!(m.preferences().header_for("status", "Status"), "State");
    }

    #[test]
    fn test_reorder_moves_to_target_position() {
        let order = vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "d".to_string(),
        ];
        assert_eq!(reorder(&order, "d", "b"), vec!["a", "d", "b", "c"]);
        assert_eq!(reorder(&order, "a", "c"), vec!["b", "c", "a", "d"]);
        // Unknown keys: untouched
        assert_eq!(reorder(&order, "x", "b"), order);
    }

    #[test]
    fn test_pin_and_unpin() {
        let mut m = manager();
        m.set_pin("id", Some(PinSide::Left));
        assert_eq!(m.preferences().pin_for("id"), Some(PinSide::Left));
        m.set_pin("id", None);
        assert_eq!(m.preferences().pin_for("id"), None);
    }

    #[test]
    fn test_reset_to_defaults() {
        let mut m = manager();
        m.toggle_visibility("status");
        m.set_width("amount", 300);
        m.set_header("amount", "Total");
        m.set_pin("id", Some(PinSide::Left));
        m.reset_to_defaults();

        let p = m.preferences();
        assert_eq!(p.column_order, vec!["id", "status", "amount"]);
        assert!(p.hidden_columns.is_empty());
        assert!(p.column_widths.is_empty());
        assert!(p.column_headers.is_empty());
        assert!(p.pinned_columns.is_empty());
    }

    #[test]
    fn test_load_reconciles_schema_drift() {
        let store = MemoryStore::new();
        let stale = ColumnPreferences {
            // "legacy" no longer exists; "amount" was added since
            column_order: vec!["status".to_string(), "legacy".to_string(), "id".to_string()],
            hidden_columns: vec!["id".to_string(), "status".to_string()],
            ..ColumnPreferences::default()
        };
        store.save("u1", "orders", &stale).unwrap();

        let mut m = PreferencesManager::new("u1", "orders", defaults(), Box::new(store));
        m.load();

        let p = m.preferences();
        assert_eq!(p.column_order, vec!["status", "id", "amount"]);
        // Mandatory "id" dropped from the stale hidden list
        assert_eq!(p.hidden_columns, vec!["status"]);
    }

    #[test]
    fn test_unknown_fields_ignored_on_load() {
        let json = r#"{
            "columnOrder": ["id"],
            "hiddenColumns": [],
            "futureField": {"anything": true}
        }"#;
        let parsed: ColumnPreferences = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.column_order, vec!["id"]);
        assert!(!parsed.enable_sub_row_config);
    }

    #[test]
    fn test_round_trip_json_shape() {
        let mut prefs = ColumnPreferences::default();
        prefs.column_order = vec!["id".to_string()];
        prefs.pinned_columns.insert("id".to_string(), PinSide::Right);

        let json = serde_json::to_value(&prefs).unwrap();
        assert!(json.get("columnOrder").is_some());
        assert!(json.get("pinnedColumns").is_some());
        assert_eq!(json["pinnedColumns"]["id"], "right");
    }
}

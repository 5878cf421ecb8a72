//! Inline editing with optimistic rollback.
//!
//! At most one edit session is open at a time. A session snapshots the
//! fields it may touch before anything changes; commit applies the
//! pending values to the live row first and only then hands them to the
//! external update callback. If the callback rejects, the snapshot is
//! restored verbatim, so the row ends up exactly as it was the moment
//! the session opened.
//!
//! Validation runs at commit and blocks it: the session stays open with
//! field-keyed messages until the values pass or the edit is cancelled.
//! Messages clear per field as new input arrives for that field.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::column::Column;
use crate::error::{GridError, ValidationErrors};
use crate::row::{stringify, Row, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// One cell at a time; only the session's column may change.
    Cell,
    /// The whole row is open; any editable field may change.
    Row,
}

impl Default for EditMode {
    fn default() -> Self {
        EditMode::Cell
    }
}

/// External acceptor for committed values. `Err(message)` triggers
/// rollback of the optimistic change.
pub type UpdateCallback = Box<dyn FnMut(&RowId, &Map<String, Value>) -> Result<(), String>>;

/// Domain-specific checks beyond the per-field rules. Runs on the
/// merged (snapshot + pending) view of the row; returned entries are
/// added to the field error map.
pub type RowValidator = Box<dyn Fn(&Map<String, Value>) -> ValidationErrors>;

/// Declarative per-field constraints, checked at commit.
#[derive(Debug, Clone, Default)]
pub struct FieldRule {
    required: bool,
    max_length: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
}

impl FieldRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// First failing check wins; `None` means the value passes.
    fn check(&self, value: Option<&Value>) -> Option<String> {
        let text = value.and_then(stringify);
        if self.required && text.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Some("required".to_string());
        }
        let Some(text) = text else {
            return None;
        };
        if let Some(max_length) = self.max_length {
            if text.chars().count() > max_length {
                return Some(format!("must be at most {max_length} characters"));
            }
        }
        if self.min.is_some() || self.max.is_some() {
            let Ok(n) = text.parse::<f64>() else {
                return Some("must be a number".to_string());
            };
            if let Some(min) = self.min {
                if n < min {
                    return Some(format!("must be at least {min}"));
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    return Some(format!("must be at most {max}"));
                }
            }
        }
        None
    }
}

/// One open edit. `previous` snapshots the affected fields as they were
/// when the session opened; `pending` accumulates the user's input.
#[derive(Debug, Clone)]
pub struct EditSession {
    pub row: RowId,
    /// `Some` in cell mode, `None` in row mode.
    pub column: Option<String>,
    previous: Map<String, Value>,
    pending: Map<String, Value>,
}

impl EditSession {
    pub fn pending(&self, key: &str) -> Option<&Value> {
        self.pending.get(key)
    }

    /// The field's value as the user currently sees it: pending input
    /// over the opening snapshot.
    pub fn merged(&self) -> Map<String, Value> {
        let mut merged = self.previous.clone();
        for (k, v) in &self.pending {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }
}

#[derive(Default)]
pub struct EditController {
    mode: EditMode,
    session: Option<EditSession>,
    rules: HashMap<String, FieldRule>,
    validator: Option<RowValidator>,
    on_update: Option<UpdateCallback>,
    errors: ValidationErrors,
}

impl EditController {
    pub fn new(mode: EditMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_rule(mut self, field: &str, rule: FieldRule) -> Self {
        self.rules.insert(field.to_string(), rule);
        self
    }

    pub fn set_validator(&mut self, validator: RowValidator) {
        self.validator = Some(validator);
    }

    pub fn set_update_callback(&mut self, callback: UpdateCallback) {
        self.on_update = Some(callback);
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    /// Identity of the row under edit, if any. Data refreshes consult
    /// this to leave the edited row alone.
    pub fn editing_row(&self) -> Option<&RowId> {
        self.session.as_ref().map(|s| &s.row)
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Open a session on `id`. No-op (returns false) when a session is
    /// already open, the row is missing, or (cell mode) the column is
    /// unknown or not editable.
    pub fn start_edit(
        &mut self,
        rows: &[Row],
        columns: &[Column],
        id: &RowId,
        column: Option<&str>,
    ) -> bool {
        if self.session.is_some() {
            return false;
        }
        let Some(row) = rows.iter().find(|r| &r.id == id) else {
            return false;
        };

        let (column, previous) = match self.mode {
            EditMode::Cell => {
                let Some(key) = column else {
                    return false;
                };
                let editable = columns.iter().any(|c| c.key == key && c.editable);
                if !editable {
                    return false;
                }
                let mut snapshot = Map::new();
                snapshot.insert(
                    key.to_string(),
                    row.get(key).cloned().unwrap_or(Value::Null),
                );
                (Some(key.to_string()), snapshot)
            }
            EditMode::Row => (None, row.data.clone()),
        };

        self.errors.clear();
        self.session = Some(EditSession {
            row: id.clone(),
            column,
            previous,
            pending: Map::new(),
        });
        true
    }

    /// Record user input for `key`. In cell mode, input for any other
    /// field than the session's column is ignored. Clears that field's
    /// validation message.
    pub fn set_pending(&mut self, key: &str, value: Value) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(column) = &session.column {
            if column != key {
                return;
            }
        }
        session.pending.insert(key.to_string(), value);
        self.errors.remove(key);
    }

    fn validate(&mut self) -> bool {
        let Some(session) = &self.session else {
            return true;
        };
        let merged = session.merged();
        let mut errors = ValidationErrors::new();

        for (field, rule) in &self.rules {
            // Cell mode only ever commits its own column
            if let Some(column) = &session.column {
                if column != field {
                    continue;
                }
            }
            if let Some(message) = rule.check(merged.get(field)) {
                errors.insert(field.clone(), message);
            }
        }
        if let Some(validator) = &self.validator {
            for (field, message) in validator(&merged) {
                errors.entry(field).or_insert(message);
            }
        }

        self.errors = errors;
        self.errors.is_empty()
    }

    /// Commit the open session.
    ///
    /// Order matters: validate (block, session stays open), apply
    /// pending values to the live row, close the session, then invoke
    /// the update callback. A callback rejection restores the opening
    /// snapshot and surfaces as `UpdateRejected`.
    pub fn commit(&mut self, rows: &mut [Row]) -> Result<(), GridError> {
        if self.session.is_none() {
            return Ok(());
        }
        if !self.validate() {
            return Err(GridError::Validation(self.errors.clone()));
        }

        let Some(session) = self.session.take() else {
            return Ok(());
        };
        self.errors.clear();

        let Some(row) = rows.iter_mut().find(|r| r.id == session.row) else {
            // Row left the dataset while the session was open; nothing
            // to apply and nothing to roll back.
            return Ok(());
        };

        for (key, value) in &session.pending {
            row.data.insert(key.clone(), value.clone());
        }

        if let Some(callback) = self.on_update.as_mut() {
            if let Err(message) = callback(&session.row, &session.pending) {
                for key in session.pending.keys() {
                    match session.previous.get(key) {
                        Some(value) => row.data.insert(key.clone(), value.clone()),
                        None => row.data.remove(key),
                    };
                }
                return Err(GridError::UpdateRejected {
                    row: session.row,
                    column: session.column,
                    message,
                });
            }
        }
        Ok(())
    }

    /// Discard the session and its pending input. The live row was
    /// never touched, so there is nothing to roll back.
    pub fn cancel(&mut self) {
        self.session = None;
        self.errors.clear();
    }
}

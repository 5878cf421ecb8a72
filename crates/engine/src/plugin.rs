//! Plugin host: extensions over a read-only grid snapshot.
//!
//! Capabilities are split into small traits (toolbar, row actions,
//! footer, lifecycle) instead of one interface with optional methods;
//! each host call site depends only on the capability it collects.
//!
//! Hooks never mutate engine state directly. They read the [`GridApi`]
//! snapshot and queue [`GridAction`]s, which the orchestrator drains
//! and applies after every hook has returned. That keeps the borrow
//! story simple: hooks hold shared references, mutation happens after.

use std::cell::RefCell;

use crate::column::Column;
use crate::row::{Row, RowId};
use tabula_config::ColumnPreferences;

/// A UI contribution from a plugin. Rendering is out of scope; these
/// are descriptions the presentation layer turns into widgets.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Button { id: String, label: String },
    Label(String),
    Link { label: String, href: String },
}

/// Deferred engine mutations requested by plugin hooks.
#[derive(Debug, Clone, PartialEq)]
pub enum GridAction {
    ExportData,
    ResetPreferences,
    ToggleRowSelection(RowId),
    SelectAllRows,
    ClearSelection,
}

/// Read-only snapshot handed to every hook, plus the action queue.
pub struct GridApi<'a> {
    /// The full in-memory dataset, in data order.
    pub data: &'a [Row],
    /// The filtered + sorted view (borrows into `data`).
    pub filtered_data: &'a [&'a Row],
    /// Currently selected rows, in data order.
    pub selected_rows: &'a [&'a Row],
    pub columns: &'a [Column],
    pub preferences: &'a ColumnPreferences,
    actions: &'a RefCell<Vec<GridAction>>,
}

impl<'a> GridApi<'a> {
    pub fn new(
        data: &'a [Row],
        filtered_data: &'a [&'a Row],
        selected_rows: &'a [&'a Row],
        columns: &'a [Column],
        preferences: &'a ColumnPreferences,
        actions: &'a RefCell<Vec<GridAction>>,
    ) -> Self {
        Self {
            data,
            filtered_data,
            selected_rows,
            columns,
            preferences,
            actions,
        }
    }

    pub fn export_data(&self) {
        self.queue(GridAction::ExportData);
    }

    pub fn reset_preferences(&self) {
        self.queue(GridAction::ResetPreferences);
    }

    pub fn toggle_row_selection(&self, id: RowId) {
        self.queue(GridAction::ToggleRowSelection(id));
    }

    pub fn select_all_rows(&self) {
        self.queue(GridAction::SelectAllRows);
    }

    pub fn clear_selection(&self) {
        self.queue(GridAction::ClearSelection);
    }

    fn queue(&self, action: GridAction) {
        self.actions.borrow_mut().push(action);
    }
}

// ===========================================================================
// Capabilities
// ===========================================================================

pub trait Lifecycle {
    /// Runs once when the plugin is registered.
    fn init(&mut self, _api: &GridApi<'_>) {}
    /// Runs on unregistration or host teardown.
    fn destroy(&mut self) {}
}

pub trait Toolbar {
    fn toolbar(&self, api: &GridApi<'_>) -> Vec<Fragment>;
}

pub trait RowActions {
    fn row_actions(&self, row: &Row, row_index: usize, api: &GridApi<'_>) -> Vec<Fragment>;
}

pub trait Footer {
    fn footer(&self, api: &GridApi<'_>) -> Vec<Fragment>;
}

/// A registered extension. Every capability accessor defaults to
/// "not provided"; a plugin overrides the ones it implements.
pub trait Plugin {
    /// Unique within a host; used as the unregistration handle.
    fn name(&self) -> &str;

    fn lifecycle(&mut self) -> Option<&mut dyn Lifecycle> {
        None
    }
    fn toolbar(&self) -> Option<&dyn Toolbar> {
        None
    }
    fn row_actions(&self) -> Option<&dyn RowActions> {
        None
    }
    fn footer(&self) -> Option<&dyn Footer> {
        None
    }
}

// ===========================================================================
// Host
// ===========================================================================

#[derive(Default)]
pub struct PluginHost {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Register `plugin` and run its `init` hook. A plugin with the
    /// same name as an existing one replaces it (the old one is
    /// destroyed first).
    pub fn register(&mut self, mut plugin: Box<dyn Plugin>, api: &GridApi<'_>) {
        self.unregister(plugin.name());
        if let Some(lifecycle) = plugin.lifecycle() {
            lifecycle.init(api);
        }
        self.plugins.push(plugin);
    }

    /// Remove the plugin named `name`, running its `destroy` hook.
    /// Unknown names are ignored.
    pub fn unregister(&mut self, name: &str) {
        if let Some(pos) = self.plugins.iter().position(|p| p.name() == name) {
            let mut plugin = self.plugins.remove(pos);
            if let Some(lifecycle) = plugin.lifecycle() {
                lifecycle.destroy();
            }
        }
    }

    /// Destroy every plugin, in registration order.
    pub fn teardown(&mut self) {
        for plugin in &mut self.plugins {
            if let Some(lifecycle) = plugin.lifecycle() {
                lifecycle.destroy();
            }
        }
        self.plugins.clear();
    }

    pub fn toolbar(&self, api: &GridApi<'_>) -> Vec<Fragment> {
        self.plugins
            .iter()
            .filter_map(|p| p.toolbar())
            .flat_map(|t| t.toolbar(api))
            .collect()
    }

    pub fn row_actions(&self, row: &Row, row_index: usize, api: &GridApi<'_>) -> Vec<Fragment> {
        self.plugins
            .iter()
            .filter_map(|p| p.row_actions())
            .flat_map(|r| r.row_actions(row, row_index, api))
            .collect()
    }

    pub fn footer(&self, api: &GridApi<'_>) -> Vec<Fragment> {
        self.plugins
            .iter()
            .filter_map(|p| p.footer())
            .flat_map(|f| f.footer(api))
            .collect()
    }
}

//! The grid orchestrator: one struct owning the dataset and every
//! sub-engine, exposing the operations a UI consumer drives.
//!
//! The display pipeline is a pure function of current state:
//! filter -> sort -> group -> paginate, recomputed on demand from the
//! raw rows. Selection and edit state are identity-keyed and never
//! touched by pipeline recomputation. Pipeline-shrinking changes
//! (filter, page size) re-clamp the current page; nothing re-clamps
//! the selection.
//!
//! Grouping and per-row nested-detail expansion are mutually exclusive
//! view modes; activating grouping collapses any open detail, and
//! detail expansion is refused while grouping is active.

use serde_json::Value;
use std::cell::RefCell;

use tabula_config::{ColumnPreferences, PreferenceStore, PreferencesManager};

use crate::column::{display_columns, preference_defaults, sub_row_columns, Column};
use crate::edit::{EditController, EditMode};
use crate::error::GridError;
use crate::filter::{FilterSet, FilterValue};
use crate::group::{DisplayRow, GroupingEngine};
use crate::page::{PageSize, Pagination};
use crate::plugin::{Fragment, GridAction, GridApi, Plugin, PluginHost};
use crate::row::{Row, RowId};
use crate::select::SelectionManager;
use crate::sort::{SortEngine, SortState};

/// The current page of the display stream plus paging facts.
#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
    /// Paged display rows; indices inside point into [`GridState::rows`].
    pub display: Vec<DisplayRow>,
    /// Rows passing the active filters (before grouping/paging).
    pub filtered_count: usize,
    pub page: usize,
    pub page_count: usize,
}

/// Flattened, stringified export of the visible view. Headers carry
/// preference-renamed labels; cells are display text ("" for
/// null/absent).
#[derive(Debug, Clone, PartialEq)]
pub struct ExportView {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

pub struct GridState {
    id_key: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
    preferences: PreferencesManager,
    filters: FilterSet,
    sort: SortEngine,
    grouping: GroupingEngine,
    pagination: Pagination,
    selection: SelectionManager,
    edit: EditController,
    plugins: PluginHost,
    loading: bool,
    error: Option<GridError>,
    expanded_detail: Option<RowId>,
    pending_export: Option<ExportView>,
}

impl GridState {
    /// Build a grid over `columns`, identified to the preference store
    /// as `(user_id, grid_id)`. Rows arrive later via the load cycle.
    pub fn new(
        columns: Vec<Column>,
        id_key: impl Into<String>,
        user_id: impl Into<String>,
        grid_id: impl Into<String>,
        store: Box<dyn PreferenceStore>,
    ) -> Self {
        let defaults = preference_defaults(&columns);
        let mut preferences = PreferencesManager::new(user_id, grid_id, defaults, store);
        preferences.load();

        Self {
            id_key: id_key.into(),
            columns,
            rows: Vec::new(),
            preferences,
            filters: FilterSet::new(),
            sort: SortEngine::new(),
            grouping: GroupingEngine::new(),
            pagination: Pagination::default(),
            selection: SelectionManager::new(),
            edit: EditController::new(EditMode::Cell),
            plugins: PluginHost::new(),
            loading: false,
            error: None,
            expanded_detail: None,
            pending_export: None,
        }
    }

    /// Edit mode is fixed per grid instance.
    pub fn with_edit_mode(mut self, mode: EditMode) -> Self {
        self.edit = EditController::new(mode);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.pagination = Pagination::new(page_size);
        self
    }

    pub fn with_edit_controller(mut self, edit: EditController) -> Self {
        self.edit = edit;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row(&self, id: &RowId) -> Option<&Row> {
        self.rows.iter().find(|r| &r.id == id)
    }

    pub fn prefs(&self) -> &ColumnPreferences {
        self.preferences.preferences()
    }

    pub fn preferences_mut(&mut self) -> &mut PreferencesManager {
        &mut self.preferences
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&GridError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Visible main-grid columns in display order.
    pub fn display_columns(&self) -> Vec<&Column> {
        display_columns(&self.columns, self.preferences.preferences())
    }

    /// Columns rendered in the expandable detail section.
    pub fn sub_row_columns(&self) -> Vec<&Column> {
        sub_row_columns(&self.columns, self.preferences.preferences())
    }

    // -----------------------------------------------------------------------
    // Load cycle
    // -----------------------------------------------------------------------

    /// Mark a fetch as in flight. UI consumers should disable mutating
    /// actions while this is set; the engine does not sequence requests.
    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    /// Complete a fetch. The loading flag clears on every path.
    ///
    /// On success, raw values become rows keyed by the configured
    /// identity field; values without a usable identity are dropped
    /// with a warning. A row under an open edit session keeps its
    /// current in-memory state until the session closes. On failure,
    /// the existing rows stand and a dismissible fetch error is set.
    pub fn finish_load(&mut self, result: Result<Vec<Value>, String>) {
        self.loading = false;
        match result {
            Ok(values) => {
                let mut incoming: Vec<Row> = Vec::with_capacity(values.len());
                for value in values {
                    match Row::from_object(&self.id_key, value) {
                        Some(row) => incoming.push(row),
                        None => {
                            log::warn!("dropping row without '{}' identity", self.id_key)
                        }
                    }
                }
                if let Some(editing) = self.edit.editing_row().cloned() {
                    if let Some(current) = self.row(&editing).cloned() {
                        if let Some(slot) =
                            incoming.iter_mut().find(|r| r.id == editing)
                        {
                            *slot = current;
                        }
                    }
                }
                self.rows = incoming;
                self.error = None;
                self.reclamp();
            }
            Err(message) => {
                self.error = Some(GridError::Fetch(message));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Display pipeline
    // -----------------------------------------------------------------------

    /// Filtered row indices in sorted order.
    fn processed_indices(&self) -> Vec<usize> {
        let prefs = self.preferences.preferences();
        let visible = display_columns(&self.columns, prefs);
        let mut indices =
            self.filters
                .apply(&self.rows, &visible, prefs.enable_sub_row_config);
        self.sort.apply(&self.rows, &self.columns, &mut indices);
        indices
    }

    fn display_stream(&self, indices: &[usize]) -> Vec<DisplayRow> {
        if self.grouping.is_active() {
            let groups = self.grouping.group(&self.rows, indices);
            self.grouping.flatten(&groups)
        } else {
            indices.iter().map(|&i| DisplayRow::Data(i)).collect()
        }
    }

    /// Compute the current page of the display stream.
    pub fn view(&self) -> GridView {
        let indices = self.processed_indices();
        let stream = self.display_stream(&indices);
        GridView {
            display: self.pagination.slice(&stream).to_vec(),
            filtered_count: indices.len(),
            page: self.pagination.current_page,
            page_count: self.pagination.page_count(stream.len()),
        }
    }

    /// Re-clamp the page after any change that can shrink the stream.
    /// Never touches the selection.
    fn reclamp(&mut self) {
        let total = self.display_stream(&self.processed_indices()).len();
        self.pagination.clamp(total);
    }

    // -----------------------------------------------------------------------
    // Filtering
    // -----------------------------------------------------------------------

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn set_filter(&mut self, key: &str, value: Option<FilterValue>) {
        self.filters.set_filter(key, value);
        self.reclamp();
    }

    pub fn set_global_filter(&mut self, needle: &str) {
        self.filters.set_global(needle);
        self.reclamp();
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear_all();
        self.reclamp();
    }

    // -----------------------------------------------------------------------
    // Sorting
    // -----------------------------------------------------------------------

    pub fn sort_state(&self) -> Option<&SortState> {
        self.sort.state()
    }

    /// Tri-state cycle on `column`: ascending, descending, none.
    pub fn toggle_sort(&mut self, column: &str) -> Option<SortState> {
        let state = self.sort.toggle(column).cloned();
        self.reclamp();
        state
    }

    // -----------------------------------------------------------------------
    // Grouping and detail expansion
    // -----------------------------------------------------------------------

    pub fn grouping_field(&self) -> Option<&str> {
        self.grouping.field()
    }

    /// Group by `field`, or clear grouping with `None`. Grouping and
    /// nested-detail expansion are mutually exclusive; any open detail
    /// closes.
    pub fn set_grouping(&mut self, field: Option<String>) {
        if field.is_some() {
            self.expanded_detail = None;
        }
        self.grouping.set_field(field);
        self.pagination.current_page = 1;
        self.reclamp();
    }

    pub fn toggle_group(&mut self, group_key: &str) {
        self.grouping.toggle(group_key);
        self.reclamp();
    }

    /// Expand/collapse one row's detail section. Refused while
    /// grouping is active.
    pub fn toggle_detail(&mut self, id: &RowId) {
        if self.grouping.is_active() {
            return;
        }
        self.expanded_detail = match self.expanded_detail.take() {
            Some(open) if &open == id => None,
            _ => Some(id.clone()),
        };
    }

    pub fn expanded_detail(&self) -> Option<&RowId> {
        self.expanded_detail.as_ref()
    }

    // -----------------------------------------------------------------------
    // Pagination
    // -----------------------------------------------------------------------

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn set_page(&mut self, page: usize) {
        let total = self.display_stream(&self.processed_indices()).len();
        self.pagination.set_page(page, total);
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.pagination.set_page_size(page_size);
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn toggle_selection(&mut self, id: &RowId) {
        self.selection.toggle(id);
    }

    /// Select every row passing the current filters, across all pages.
    pub fn select_all_visible(&mut self) {
        let ids: Vec<RowId> = self
            .processed_indices()
            .into_iter()
            .map(|i| self.rows[i].id.clone())
            .collect();
        self.selection.select_all(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selected_rows(&self) -> Vec<&Row> {
        self.selection.selected_rows(&self.rows)
    }

    // -----------------------------------------------------------------------
    // Inline editing
    // -----------------------------------------------------------------------

    pub fn edit(&self) -> &EditController {
        &self.edit
    }

    pub fn start_edit(&mut self, id: &RowId, column: Option<&str>) -> bool {
        self.edit.start_edit(&self.rows, &self.columns, id, column)
    }

    pub fn set_pending(&mut self, key: &str, value: Value) {
        self.edit.set_pending(key, value);
    }

    /// Commit the open edit. Rejections surface both as the returned
    /// error and as the grid's dismissible error state.
    pub fn commit_edit(&mut self) -> Result<(), GridError> {
        match self.edit.commit(&mut self.rows) {
            Ok(()) => Ok(()),
            Err(err) => {
                if err.is_notification() {
                    self.error = Some(err.clone());
                }
                Err(err)
            }
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit.cancel();
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Snapshot the visible view for export: filtered + sorted rows,
    /// visible columns in display order, preference-renamed headers.
    pub fn export_view(&self) -> ExportView {
        let prefs = self.preferences.preferences();
        let visible = display_columns(&self.columns, prefs);
        let headers = visible
            .iter()
            .map(|c| prefs.header_for(&c.key, &c.label).to_string())
            .collect();
        let records = self
            .processed_indices()
            .into_iter()
            .map(|i| {
                let row = &self.rows[i];
                visible
                    .iter()
                    .map(|c| row.text(&c.key).unwrap_or_default())
                    .collect()
            })
            .collect();
        ExportView { headers, records }
    }

    // -----------------------------------------------------------------------
    // Plugins
    // -----------------------------------------------------------------------

    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) {
        let actions = RefCell::new(Vec::new());
        {
            let filtered_indices = self.processed_indices();
            let filtered: Vec<&Row> =
                filtered_indices.iter().map(|&i| &self.rows[i]).collect();
            let selected = self.selection.selected_rows(&self.rows);
            let api = GridApi::new(
                &self.rows,
                &filtered,
                &selected,
                &self.columns,
                self.preferences.preferences(),
                &actions,
            );
            self.plugins.register(plugin, &api);
        }
        self.apply_actions(actions.into_inner());
    }

    pub fn unregister_plugin(&mut self, name: &str) {
        self.plugins.unregister(name);
    }

    pub fn teardown_plugins(&mut self) {
        self.plugins.teardown();
    }

    pub fn plugin_toolbar(&mut self) -> Vec<Fragment> {
        self.collect(|plugins, api| plugins.toolbar(api))
    }

    pub fn plugin_footer(&mut self) -> Vec<Fragment> {
        self.collect(|plugins, api| plugins.footer(api))
    }

    pub fn plugin_row_actions(&mut self, id: &RowId) -> Vec<Fragment> {
        self.collect(|plugins, api| {
            api.filtered_data
                .iter()
                .position(|r| &r.id == id)
                .map(|index| plugins.row_actions(api.filtered_data[index], index, api))
                .unwrap_or_default()
        })
    }

    /// An export requested by a plugin action, if one is pending.
    pub fn take_export(&mut self) -> Option<ExportView> {
        self.pending_export.take()
    }

    /// Run a hook collector over a fresh snapshot, then drain and apply
    /// the actions the hooks queued.
    fn collect<R>(&mut self, f: impl FnOnce(&PluginHost, &GridApi<'_>) -> R) -> R {
        let actions = RefCell::new(Vec::new());
        let result = {
            let filtered_indices = self.processed_indices();
            let filtered: Vec<&Row> =
                filtered_indices.iter().map(|&i| &self.rows[i]).collect();
            let selected = self.selection.selected_rows(&self.rows);
            let api = GridApi::new(
                &self.rows,
                &filtered,
                &selected,
                &self.columns,
                self.preferences.preferences(),
                &actions,
            );
            f(&self.plugins, &api)
        };
        self.apply_actions(actions.into_inner());
        result
    }

    fn apply_actions(&mut self, actions: Vec<GridAction>) {
        for action in actions {
            match action {
                GridAction::ExportData => {
                    self.pending_export = Some(self.export_view());
                }
                GridAction::ResetPreferences => {
                    self.preferences.reset_to_defaults();
                    self.reclamp();
                }
                GridAction::ToggleRowSelection(id) => self.selection.toggle(&id),
                GridAction::SelectAllRows => self.select_all_visible(),
                GridAction::ClearSelection => self.selection.clear(),
            }
        }
    }
}

pub mod column;
pub mod edit;
pub mod error;
pub mod filter;
pub mod grid;
pub mod group;
pub mod page;
pub mod plugin;
pub mod row;
pub mod select;
pub mod sort;

#[cfg(test)]
pub mod harness;

pub use column::{Column, DataType};
pub use edit::{EditController, EditMode, FieldRule};
pub use error::{GridError, ValidationErrors};
pub use filter::{FilterOperator, FilterSet, FilterValue, SUB_ROW_PREFIX};
pub use grid::{ExportView, GridState, GridView};
pub use group::{DisplayRow, GroupDescriptor, GroupingEngine};
pub use page::{PageSize, Pagination};
pub use plugin::{Fragment, GridAction, GridApi, Plugin, PluginHost};
pub use row::{Row, RowId};
pub use select::SelectionManager;
pub use sort::{SortDirection, SortEngine, SortState};

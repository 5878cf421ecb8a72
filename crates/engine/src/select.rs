//! Row selection keyed by identity.
//!
//! The selection set stores `RowId`s and nothing else. That is the
//! invariant that keeps a selection valid across every filter, sort,
//! group, and page transition: positions shift, identities do not.
//! Display-index mappings are views computed elsewhere, never state.

use rustc_hash::FxHashSet;

use crate::row::{Row, RowId};

#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    selected: FxHashSet<RowId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &RowId) {
        if !self.selected.remove(id) {
            self.selected.insert(id.clone());
        }
    }

    /// Add every given identity (select-all over the visible set).
    /// Existing selections outside the visible set are kept.
    pub fn select_all<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = RowId>,
    {
        self.selected.extend(ids);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected rows present in `rows`, in data order. Identities whose
    /// rows have left the dataset simply stop being reported; they are
    /// not pruned, so a row that comes back is selected again.
    pub fn selected_rows<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row> {
        rows.iter().filter(|r| self.selected.contains(&r.id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::order_rows;

    #[test]
    fn test_toggle() {
        let mut sel = SelectionManager::new();
        let id = RowId::from(1);
        sel.toggle(&id);
        assert!(sel.is_selected(&id));
        sel.toggle(&id);
        assert!(!sel.is_selected(&id));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_select_all_keeps_existing() {
        let mut sel = SelectionManager::new();
        sel.toggle(&RowId::from(99));
        sel.select_all([RowId::from(1), RowId::from(2)]);
        assert_eq!(sel.len(), 3);
        assert!(sel.is_selected(&RowId::from(99)));
    }

    #[test]
    fn test_selected_rows_in_data_order() {
        let rows = order_rows();
        let mut sel = SelectionManager::new();
        sel.toggle(&RowId::from(3));
        sel.toggle(&RowId::from(1));

        let ids: Vec<&str> = sel
            .selected_rows(&rows)
            .iter()
            .map(|r| r.id.0.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_absent_identities_not_reported_but_kept() {
        let rows = order_rows();
        let mut sel = SelectionManager::new();
        sel.toggle(&RowId::from(2));
        sel.toggle(&RowId::from(42)); // not in the dataset

        assert_eq!(sel.selected_rows(&rows).len(), 1);
        assert_eq!(sel.len(), 2, "unknown identity is kept, just not reported");
    }

    #[test]
    fn test_clear() {
        let mut sel = SelectionManager::new();
        sel.select_all([RowId::from(1), RowId::from(2)]);
        sel.clear();
        assert!(sel.is_empty());
    }
}

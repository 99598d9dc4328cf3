//! Row-selection state for the orders table.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The set of selected row ids, persisted in the session.
///
/// Selections survive re-renders by intersection: whenever the visible row
/// set changes, ids that are no longer present are dropped silently and
/// nothing else is touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    ids: BTreeSet<String>,
}

impl SelectionState {
    /// Whether a row is selected.
    #[must_use]
    pub fn contains(&self, row_id: &str) -> bool {
        self.ids.contains(row_id)
    }

    /// Number of selected rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Flip one row's selection.
    pub fn toggle(&mut self, row_id: &str) {
        if !self.ids.remove(row_id) {
            self.ids.insert(row_id.to_string());
        }
    }

    /// Drop selections for rows that are no longer visible.
    pub fn retain_visible(&mut self, visible: &[String]) {
        let visible: BTreeSet<&str> = visible.iter().map(String::as_str).collect();
        self.ids.retain(|id| visible.contains(id.as_str()));
    }

    /// Whether every currently-visible row is selected (false when none are
    /// visible).
    #[must_use]
    pub fn all_selected(&self, visible: &[String]) -> bool {
        !visible.is_empty() && visible.iter().all(|id| self.ids.contains(id))
    }

    /// Select all visible rows, or clear when they are all selected already.
    pub fn toggle_all(&mut self, visible: &[String]) {
        if self.all_selected(visible) {
            self.ids.clear();
        } else {
            self.ids = visible.iter().cloned().collect();
        }
    }
}

//! The orders query engine and its table-facing state.
//!
//! Two fetch strategies feed the orders table:
//! - **server pagination** when no search term is active: one backend page per
//!   render, cached per `{tenant, status, page, page_size}` with a short
//!   freshness window;
//! - **client-side search** when a term is active: an exhaustive, capped
//!   collection per `{tenant, status}` filtered and paginated locally.
//!
//! The two pagination models are independent; toggling search off restores
//! the server model untouched.

mod engine;
mod rows;
mod selection;

pub use engine::{EngineError, OrdersQueryEngine, PageMeta, SearchCollection, TableSnapshot};
pub use rows::{build_rows, matches_search, OrderRow};
pub use selection::SelectionState;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Page sizes offered by the table.
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 20, 50, 100];

/// Default page size for both pagination models.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Page size used while exhaustively collecting orders for search.
pub const SEARCH_PAGE_SIZE: u32 = 500;

/// Hard cap on records accumulated by one search collection.
pub const MAX_SEARCH_RECORDS: usize = 2000;

/// Hard cap on pages fetched by one search collection.
pub const MAX_SEARCH_PAGES: u32 = 10;

/// Freshness window for the server page cache.
pub const PAGE_CACHE_TTL: Duration = Duration::from_secs(30);

/// Freshness window for the per-order details cache (fresh-only).
pub const DETAILS_CACHE_TTL: Duration = Duration::from_secs(30);

/// One pagination model: a page index and a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageModel {
    pub page: u32,
    pub page_size: u32,
}

/// Session-held table state: the two pagination models plus the search term.
///
/// `server.page` is 1-based (the backend's convention); `client.page` is
/// 0-based (a local slice offset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableState {
    pub server: PageModel,
    pub client: PageModel,
    pub search: String,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            server: PageModel {
                page: 1,
                page_size: DEFAULT_PAGE_SIZE,
            },
            client: PageModel {
                page: 0,
                page_size: DEFAULT_PAGE_SIZE,
            },
            search: String::new(),
        }
    }
}

impl TableState {
    /// The trimmed, lowercased search term.
    #[must_use]
    pub fn normalized_search(&self) -> String {
        self.search.trim().to_lowercase()
    }

    /// Whether client-side search mode is active.
    #[must_use]
    pub fn is_searching(&self) -> bool {
        !self.normalized_search().is_empty()
    }

    /// Update the search term.
    ///
    /// Entering (or changing) a search resets the client model to its first
    /// page; leaving search realigns the client page size with the server
    /// model and leaves the server model untouched, so the pre-search page
    /// comes back exactly.
    pub fn set_search(&mut self, term: &str) {
        let was_searching = self.is_searching();
        let previous = self.normalized_search();
        self.search = term.to_string();

        if self.is_searching() {
            if !was_searching || self.normalized_search() != previous {
                self.client.page = 0;
            }
        } else {
            self.client.page_size = self.server.page_size;
        }
    }

    /// Move to a page in whichever model is active.
    ///
    /// `page` is 1-based as displayed; the client model stores it 0-based.
    pub fn set_page(&mut self, page: u32) {
        if self.is_searching() {
            self.client.page = page.saturating_sub(1);
        } else {
            self.server.page = page.max(1);
        }
    }

    /// Change the page size of whichever model is active.
    pub fn set_page_size(&mut self, page_size: u32) {
        if page_size == 0 {
            return;
        }
        if self.is_searching() {
            self.client.page_size = page_size;
            self.client.page = 0;
        } else {
            self.server.page_size = page_size;
            self.client.page_size = page_size;
        }
    }

    /// Reset the server model to the first page (tenant or state changed).
    pub fn reset_server_page(&mut self) {
        self.server.page = 1;
    }

    /// Clamp the server page to the backend-reported page count.
    pub fn clamp_server_page(&mut self, total_pages: u32) {
        if total_pages > 0 && self.server.page > total_pages {
            self.server.page = total_pages;
        }
    }

    /// Offered page sizes: the base set plus the current size when custom,
    /// kept sorted.
    #[must_use]
    pub fn page_size_options(&self) -> Vec<u32> {
        let current = self.server.page_size;
        let mut options = PAGE_SIZE_OPTIONS.to_vec();
        if !options.contains(&current) {
            options.push(current);
            options.sort_unstable();
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_toggle_restores_server_model() {
        let mut table = TableState::default();
        table.server = PageModel {
            page: 7,
            page_size: 50,
        };
        table.client.page_size = 50;

        table.set_search("factura");
        assert!(table.is_searching());
        assert_eq!(table.client.page, 0);

        table.set_page(4);
        assert_eq!(table.client.page, 3);
        // Server model untouched while searching.
        assert_eq!(table.server, PageModel { page: 7, page_size: 50 });

        table.set_search("");
        assert!(!table.is_searching());
        assert_eq!(table.server, PageModel { page: 7, page_size: 50 });
        assert_eq!(table.client.page_size, 50);
    }

    #[test]
    fn test_changing_term_resets_client_page() {
        let mut table = TableState::default();
        table.set_search("boleta");
        table.set_page(5);
        assert_eq!(table.client.page, 4);

        table.set_search("boleta electronica");
        assert_eq!(table.client.page, 0);

        // Re-setting the same (trimmed) term keeps the page.
        table.set_page(3);
        table.set_search("  boleta electronica ");
        assert_eq!(table.client.page, 2);
    }

    #[test]
    fn test_page_size_options_include_custom_size() {
        let mut table = TableState::default();
        assert_eq!(table.page_size_options(), vec![10, 20, 50, 100]);

        table.set_page_size(25);
        assert_eq!(table.page_size_options(), vec![10, 20, 25, 50, 100]);
    }

    #[test]
    fn test_server_page_clamp() {
        let mut table = TableState::default();
        table.server.page = 9;
        table.clamp_server_page(3);
        assert_eq!(table.server.page, 3);
        table.clamp_server_page(0);
        assert_eq!(table.server.page, 3);
    }

    #[test]
    fn test_whitespace_search_is_not_searching() {
        let mut table = TableState::default();
        table.set_search("   ");
        assert!(!table.is_searching());
    }
}

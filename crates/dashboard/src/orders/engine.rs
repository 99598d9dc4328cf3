//! Fetch/cache/search orchestration for the orders table.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use moka::future::Cache;
use thiserror::Error;
use tracing::instrument;

use middify_core::{BearerToken, OrderId, OrderState, TenantId};

use crate::middify::types::{OrderDetails, OrdersPage, RawOrder};
use crate::middify::{MiddifyClient, MiddifyError, OrdersByStateQuery};

use super::rows::{build_row, build_rows, matches_search, OrderRow};
use super::{
    TableState, DETAILS_CACHE_TTL, MAX_SEARCH_PAGES, MAX_SEARCH_RECORDS, PAGE_CACHE_TTL,
    SEARCH_PAGE_SIZE,
};

const PAGE_CACHE_CAPACITY: u64 = 256;
const COLLECTION_CACHE_CAPACITY: u64 = 32;
const DETAILS_CACHE_CAPACITY: u64 = 128;

/// Failures surfaced to the orders views.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A direct backend call failed.
    #[error(transparent)]
    Backend(#[from] MiddifyError),

    /// The exhaustive search collection failed; partial results were
    /// discarded and nothing was cached.
    #[error("search collection failed: {0}")]
    Search(Arc<MiddifyError>),

    /// The order-details fetch failed.
    #[error("order details fetch failed: {0}")]
    Details(Arc<MiddifyError>),
}

/// Pagination metadata reported by the backend, passed through as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub total: Option<u64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub total_pages: Option<u32>,
    pub ok: Option<bool>,
}

impl PageMeta {
    fn from_page(page: &OrdersPage) -> Self {
        Self {
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
            ok: page.ok,
        }
    }
}

/// The orders accumulated for one `{tenant, status}` search key.
#[derive(Debug)]
pub struct SearchCollection {
    pub orders: Vec<RawOrder>,
    /// False when a record or page cap cut the collection off.
    pub complete: bool,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct PageKey {
    tenant: Option<TenantId>,
    status: Option<OrderState>,
    page: u32,
    page_size: u32,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct FilterKey {
    tenant: Option<TenantId>,
    status: Option<OrderState>,
}

#[derive(Clone)]
struct PageEntry {
    orders: Arc<Vec<RawOrder>>,
    meta: PageMeta,
    fetched_at: Instant,
}

struct ServedPage {
    orders: Arc<Vec<RawOrder>>,
    meta: PageMeta,
    refreshing: bool,
    error: Option<EngineError>,
}

/// What one render of the orders table needs.
#[derive(Debug)]
pub struct TableSnapshot {
    /// Display rows for the current page.
    pub rows: Vec<OrderRow>,
    /// Total row count driving the pager.
    pub row_count: u64,
    /// Current page, 1-based, already clamped.
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    /// Whether the snapshot came from the client-side search path.
    pub searching: bool,
    /// A stale cache entry was served and a background refresh is running.
    pub refreshing: bool,
    /// The search collection was cut off by a cap.
    pub truncated: bool,
    /// Failure to surface inline; rows may still carry the previous data.
    pub error: Option<EngineError>,
}

impl TableSnapshot {
    fn empty(table: &TableState) -> Self {
        let searching = table.is_searching();
        Self {
            rows: Vec::new(),
            row_count: 0,
            page: 1,
            page_size: if searching {
                table.client.page_size
            } else {
                table.server.page_size
            },
            total_pages: 1,
            searching,
            refreshing: false,
            truncated: false,
            error: None,
        }
    }

    /// Ids of the rows visible in this snapshot, for selection reconciliation.
    #[must_use]
    pub fn visible_row_ids(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.row_id.clone()).collect()
    }
}

/// The orders query engine.
///
/// Holds the three caches (server pages, search collections, order details)
/// and switches between server pagination and exhaustive client-side search.
/// Cheaply cloneable; all mutation replaces whole cache entries atomically,
/// and the stale-refresh set guards the read-check-then-write sequence so one
/// key never runs two refreshes at once.
#[derive(Clone)]
pub struct OrdersQueryEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    client: MiddifyClient,
    page_ttl: Duration,
    page_cache: Cache<PageKey, PageEntry>,
    collection_cache: Cache<FilterKey, Arc<SearchCollection>>,
    details_cache: Cache<OrderId, Arc<Option<OrderDetails>>>,
    refreshing: Mutex<HashSet<PageKey>>,
}

impl OrdersQueryEngine {
    /// Create an engine with the standard freshness window.
    #[must_use]
    pub fn new(client: MiddifyClient) -> Self {
        Self::with_page_ttl(client, PAGE_CACHE_TTL)
    }

    /// Create an engine with a custom page freshness window (tests).
    #[must_use]
    pub fn with_page_ttl(client: MiddifyClient, page_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                client,
                page_ttl,
                page_cache: Cache::builder()
                    .max_capacity(PAGE_CACHE_CAPACITY)
                    .build(),
                // Search collections live for the whole session: no TTL.
                collection_cache: Cache::builder()
                    .max_capacity(COLLECTION_CACHE_CAPACITY)
                    .build(),
                // The details cache is fresh-only: expired entries refetch
                // before anything renders.
                details_cache: Cache::builder()
                    .max_capacity(DETAILS_CACHE_CAPACITY)
                    .time_to_live(DETAILS_CACHE_TTL)
                    .build(),
                refreshing: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Drop every cached page, collection, and details entry.
    pub fn invalidate_all(&self) {
        self.inner.page_cache.invalidate_all();
        self.inner.collection_cache.invalidate_all();
        self.inner.details_cache.invalidate_all();
    }

    /// Resolve one table render.
    ///
    /// Without a token this resolves immediately to an empty snapshot — no
    /// network call, no error. With a search term active, the exhaustive
    /// collection is consulted (building it on first use); otherwise the
    /// requested server page is served through the 30-second cache.
    #[instrument(skip_all, fields(searching = table.is_searching(), page = table.server.page))]
    pub async fn table(
        &self,
        token: Option<&BearerToken>,
        tenant: Option<&TenantId>,
        status: Option<OrderState>,
        table: &TableState,
    ) -> TableSnapshot {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return TableSnapshot::empty(table);
        };

        let served = self.server_page(token, tenant, status, table).await;

        if !table.is_searching() {
            return Self::server_snapshot(served, table, false);
        }

        match self.collection(token, tenant, status).await {
            Ok(collection) => Self::search_snapshot(&collection, table, served.error),
            Err(error) => {
                // The view falls back to whatever the server page shows.
                let mut snapshot = Self::server_snapshot(served, table, true);
                snapshot.error = Some(error);
                snapshot
            }
        }
    }

    /// Fetch (through the fresh-only cache) the detail panels for one order.
    ///
    /// # Errors
    ///
    /// `Backend(MissingCredential)` without a token; `Details` when the
    /// underlying fetch fails. Failures are never cached.
    pub async fn details(
        &self,
        token: Option<&BearerToken>,
        order_id: &OrderId,
    ) -> Result<Arc<Option<OrderDetails>>, EngineError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(MiddifyError::MissingCredential)?;

        let client = self.inner.client.clone();
        let token = token.clone();
        let id = order_id.clone();
        self.inner
            .details_cache
            .try_get_with(order_id.clone(), async move {
                client.order_details(Some(&token), &id).await.map(Arc::new)
            })
            .await
            .map_err(EngineError::Details)
    }

    /// Look up a raw order by internal id across the engine's caches.
    ///
    /// Feeds the details view's local fallback when the backend fetch fails.
    #[must_use]
    pub fn cached_order(&self, internal_id: &str) -> Option<RawOrder> {
        for (_, collection) in self.inner.collection_cache.iter() {
            if let Some(order) = collection
                .orders
                .iter()
                .find(|order| order.internal_id() == Some(internal_id))
            {
                return Some(order.clone());
            }
        }
        for (_, entry) in self.inner.page_cache.iter() {
            if let Some(order) = entry
                .orders
                .iter()
                .find(|order| order.internal_id() == Some(internal_id))
            {
                return Some(order.clone());
            }
        }
        None
    }

    // =========================================================================
    // Mode A — server pagination
    // =========================================================================

    async fn server_page(
        &self,
        token: &BearerToken,
        tenant: Option<&TenantId>,
        status: Option<OrderState>,
        table: &TableState,
    ) -> ServedPage {
        let key = PageKey {
            tenant: tenant.cloned(),
            status,
            page: table.server.page,
            page_size: table.server.page_size,
        };

        if let Some(entry) = self.inner.page_cache.get(&key).await {
            if entry.fetched_at.elapsed() < self.inner.page_ttl {
                return ServedPage {
                    orders: entry.orders,
                    meta: entry.meta,
                    refreshing: false,
                    error: None,
                };
            }
            // Stale: render what we have, replace it when the refresh lands.
            self.spawn_refresh(token.clone(), key);
            return ServedPage {
                orders: entry.orders,
                meta: entry.meta,
                refreshing: true,
                error: None,
            };
        }

        match self.fetch_page(token, &key).await {
            Ok(entry) => ServedPage {
                orders: entry.orders,
                meta: entry.meta,
                refreshing: false,
                error: None,
            },
            Err(error) => ServedPage {
                orders: Arc::new(Vec::new()),
                meta: PageMeta::default(),
                refreshing: false,
                error: Some(error.into()),
            },
        }
    }

    async fn fetch_page(
        &self,
        token: &BearerToken,
        key: &PageKey,
    ) -> Result<PageEntry, MiddifyError> {
        let query = OrdersByStateQuery {
            tenant_id: key.tenant.clone(),
            status: key.status,
            page: Some(key.page),
            page_size: Some(key.page_size),
        };
        let page = self.inner.client.orders_by_state(Some(token), &query).await?;

        let entry = PageEntry {
            meta: PageMeta::from_page(&page),
            orders: Arc::new(page.orders),
            fetched_at: Instant::now(),
        };
        self.inner.page_cache.insert(key.clone(), entry.clone()).await;
        Ok(entry)
    }

    /// Kick off a background refresh for a stale key, at most one per key.
    fn spawn_refresh(&self, token: BearerToken, key: PageKey) {
        {
            let mut refreshing = self
                .inner
                .refreshing
                .lock()
                .expect("refresh set lock poisoned");
            if !refreshing.insert(key.clone()) {
                return;
            }
        }

        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(error) = engine.fetch_page(&token, &key).await {
                // Keep the stale entry; the next render retries.
                tracing::warn!(%error, "background page refresh failed");
            }
            engine
                .inner
                .refreshing
                .lock()
                .expect("refresh set lock poisoned")
                .remove(&key);
        });
    }

    fn server_snapshot(served: ServedPage, table: &TableState, searching: bool) -> TableSnapshot {
        let rows = build_rows(&served.orders);
        let row_count = served.meta.total.unwrap_or(rows.len() as u64);
        let page_size = served
            .meta
            .page_size
            .unwrap_or(table.server.page_size)
            .max(1);
        let total_pages = served.meta.total_pages.unwrap_or_else(|| {
            u32::try_from(row_count.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
        });
        let total_pages = total_pages.max(1);
        let page = served
            .meta
            .page
            .unwrap_or(table.server.page)
            .clamp(1, total_pages);

        TableSnapshot {
            rows,
            row_count,
            page,
            page_size,
            total_pages,
            searching,
            refreshing: served.refreshing,
            truncated: false,
            error: served.error,
        }
    }

    // =========================================================================
    // Mode B — exhaustive collection + client-side search
    // =========================================================================

    async fn collection(
        &self,
        token: &BearerToken,
        tenant: Option<&TenantId>,
        status: Option<OrderState>,
    ) -> Result<Arc<SearchCollection>, EngineError> {
        let key = FilterKey {
            tenant: tenant.cloned(),
            status,
        };

        let engine = self.clone();
        let token = token.clone();
        let filter = key.clone();
        self.inner
            .collection_cache
            .try_get_with(key, async move {
                engine.collect_all(&token, &filter).await.map(Arc::new)
            })
            .await
            .map_err(EngineError::Search)
    }

    /// Accumulate every order matching a filter, page by page, until the
    /// backend runs out of pages or a cap is reached.
    ///
    /// Pages are requested strictly sequentially: never more than one
    /// outstanding request, so backend load stays bounded and accumulation
    /// order matches page order.
    async fn collect_all(
        &self,
        token: &BearerToken,
        key: &FilterKey,
    ) -> Result<SearchCollection, MiddifyError> {
        let mut collected: Vec<RawOrder> = Vec::new();
        let mut next_page: u32 = 1;
        let mut total_pages: u32 = 1;
        let mut pages_fetched: u32 = 0;
        let mut reached_limit = false;

        loop {
            let query = OrdersByStateQuery {
                tenant_id: key.tenant.clone(),
                status: key.status,
                page: Some(next_page),
                page_size: Some(SEARCH_PAGE_SIZE),
            };
            let page = self.inner.client.orders_by_state(Some(token), &query).await?;

            let fetched = page.orders.len();
            collected.extend(page.orders);
            total_pages = page.total_pages.unwrap_or(next_page);
            next_page += 1;
            pages_fetched += 1;

            if fetched == 0 {
                break;
            }
            if collected.len() >= MAX_SEARCH_RECORDS || pages_fetched >= MAX_SEARCH_PAGES {
                reached_limit = true;
                break;
            }
            if next_page > total_pages {
                break;
            }
        }

        tracing::debug!(
            records = collected.len(),
            pages = pages_fetched,
            reached_limit,
            "search collection finished"
        );

        Ok(SearchCollection {
            orders: collected,
            complete: !reached_limit && next_page > total_pages,
        })
    }

    fn search_snapshot(
        collection: &SearchCollection,
        table: &TableState,
        page_error: Option<EngineError>,
    ) -> TableSnapshot {
        let term = table.normalized_search();
        let rows_all: Vec<OrderRow> = collection
            .orders
            .iter()
            .filter(|order| matches_search(order, &term))
            .enumerate()
            .map(|(index, order)| build_row(order, index))
            .collect();

        let row_count = rows_all.len() as u64;
        let page_size = table.client.page_size.max(1);
        let total_pages = u32::try_from(row_count.div_ceil(u64::from(page_size)))
            .unwrap_or(u32::MAX)
            .max(1);
        let page = table.client.page.min(total_pages - 1);

        let start = (page as usize).saturating_mul(page_size as usize);
        let rows = rows_all
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        TableSnapshot {
            rows,
            row_count,
            page: page + 1,
            page_size,
            total_pages,
            searching: true,
            refreshing: false,
            truncated: !collection.complete,
            error: page_error,
        }
    }
}

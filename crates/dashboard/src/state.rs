//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::middify::MiddifyClient;
use crate::orders::OrdersQueryEngine;
use crate::resource::SharedResources;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The engine caches and resource cells live
/// here so they survive across requests; all of their internal mutation is
/// guarded, so handlers never need locks of their own.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DashboardConfig,
    api: MiddifyClient,
    orders: OrdersQueryEngine,
    resources: SharedResources,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: DashboardConfig) -> Self {
        let api = MiddifyClient::new(config.api.base_url.clone());
        let orders = OrdersQueryEngine::new(api.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                orders,
                resources: SharedResources::default(),
            }),
        }
    }

    /// Get a reference to the dashboard configuration.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    /// Get a reference to the Middify backend client.
    #[must_use]
    pub fn api(&self) -> &MiddifyClient {
        &self.inner.api
    }

    /// Get a reference to the orders query engine.
    #[must_use]
    pub fn orders(&self) -> &OrdersQueryEngine {
        &self.inner.orders
    }

    /// Get a reference to the shared resource cells.
    #[must_use]
    pub fn resources(&self) -> &SharedResources {
        &self.inner.resources
    }
}

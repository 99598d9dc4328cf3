//! Integration test harness: an in-process mock Middify backend.
//!
//! Spawns a real axum server on a random local port serving the five
//! backend endpoints with configurable fixtures, request counters, and
//! failure switches, so the dashboard's client and engine are exercised over
//! actual HTTP.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::future::IntoFuture;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};

use middify_core::BearerToken;

/// The bearer token the mock backend accepts.
pub const TEST_TOKEN: &str = "integration-test-token";

/// One recorded `getOrdersByState` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrdersParams {
    pub tenant_id: Option<String>,
    pub status: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

/// Shared mutable state of the mock backend.
pub struct MockState {
    /// Body served by `getProductStates`.
    pub product_states: Mutex<Value>,
    /// Body served by `getMarketplaceSummary`.
    pub marketplace_summary: Mutex<Value>,
    /// Body served by `getUsers`.
    pub users: Mutex<Value>,
    /// Envelope served by `getDetailsOrders`.
    pub details: Mutex<Value>,
    /// Status code for `getDetailsOrders`.
    pub details_status: AtomicU16,
    /// Dataset paginated by `getOrdersByState`.
    pub orders_dataset: Mutex<Vec<Value>>,
    /// When non-zero, serve endless full pages of this many records.
    pub endless_page_len: AtomicUsize,
    /// When set, `getOrdersByState` answers 500.
    pub orders_fail: AtomicBool,
    pub orders_hits: AtomicUsize,
    pub states_hits: AtomicUsize,
    pub marketplace_hits: AtomicUsize,
    pub users_hits: AtomicUsize,
    pub details_hits: AtomicUsize,
    /// Every `getOrdersByState` request, in arrival order.
    pub orders_requests: Mutex<Vec<OrdersParams>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            product_states: Mutex::new(json!({ "tenants": [] })),
            marketplace_summary: Mutex::new(json!({ "tenants": [] })),
            users: Mutex::new(json!({ "data": {
                "fullName": "Operadora QA",
                "email": "qa@middify.cl",
                "role": "admin",
            }})),
            details: Mutex::new(json!({ "success": true, "data": null })),
            details_status: AtomicU16::new(200),
            orders_dataset: Mutex::new(Vec::new()),
            endless_page_len: AtomicUsize::new(0),
            orders_fail: AtomicBool::new(false),
            orders_hits: AtomicUsize::new(0),
            states_hits: AtomicUsize::new(0),
            marketplace_hits: AtomicUsize::new(0),
            users_hits: AtomicUsize::new(0),
            details_hits: AtomicUsize::new(0),
            orders_requests: Mutex::new(Vec::new()),
        }
    }
}

/// A running mock backend.
pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    /// Spawn the backend on a random local port.
    ///
    /// # Panics
    ///
    /// Panics when the listener cannot bind (test environment failure).
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/getProductStates", get(product_states))
            .route("/getMarketplaceSummary", get(marketplace_summary))
            .route("/getUsers", get(users))
            .route("/getDetailsOrders", get(details))
            .route("/getOrdersByState", get(orders_by_state))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(axum::serve(listener, app).into_future());

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// The shared state for fixtures and assertions.
    #[must_use]
    pub fn state(&self) -> &MockState {
        &self.state
    }

    /// The token the backend accepts.
    #[must_use]
    pub fn token() -> BearerToken {
        BearerToken::new(TEST_TOKEN)
    }

    /// Replace the orders dataset.
    pub fn set_orders(&self, orders: Vec<Value>) {
        *self.state.orders_dataset.lock().unwrap() = orders;
    }

    /// Recorded orders requests with the search collection's page size.
    #[must_use]
    pub fn collection_requests(&self) -> Vec<OrdersParams> {
        self.state
            .orders_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|params| params.page_size == 500)
            .cloned()
            .collect()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {TEST_TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": "No autorizado" })),
    )
        .into_response()
}

async fn product_states(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.states_hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(state.product_states.lock().unwrap().clone()).into_response()
}

async fn marketplace_summary(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.marketplace_hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(state.marketplace_summary.lock().unwrap().clone()).into_response()
}

async fn users(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.users_hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(state.users.lock().unwrap().clone()).into_response()
}

async fn details(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.details_hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return unauthorized();
    }
    let status = StatusCode::from_u16(state.details_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::OK);
    (status, Json(state.details.lock().unwrap().clone())).into_response()
}

async fn orders_by_state(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.orders_hits.fetch_add(1, Ordering::SeqCst);

    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let page_size: u32 = params
        .get("pageSize")
        .and_then(|p| p.parse().ok())
        .unwrap_or(20);
    let request = OrdersParams {
        tenant_id: params.get("tenantId").cloned(),
        status: params.get("status").cloned(),
        page,
        page_size,
    };
    state.orders_requests.lock().unwrap().push(request.clone());

    if !authorized(&headers) {
        return unauthorized();
    }

    if state.orders_fail.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "fallo interno del backend" })),
        )
            .into_response();
    }

    let endless = state.endless_page_len.load(Ordering::SeqCst);
    if endless > 0 {
        let orders: Vec<Value> = (0..endless)
            .map(|index| {
                json!({
                    "_id": format!("endless-{page}-{index}"),
                    "tennantId": "endless",
                    "status": request.status.clone().unwrap_or_else(|| "pendiente".to_string()),
                    "message": "registro sintetico",
                })
            })
            .collect();
        return Json(json!({
            "orders": orders,
            "total": 1_000_000,
            "page": page,
            "pageSize": page_size,
            "totalPages": 10_000,
            "ok": true,
        }))
        .into_response();
    }

    let dataset = state.orders_dataset.lock().unwrap().clone();
    let filtered: Vec<Value> = dataset
        .into_iter()
        .filter(|order| {
            let status_ok = request.status.as_deref().is_none_or(|status| {
                order.get("status").and_then(Value::as_str) == Some(status)
            });
            let tenant_ok = request.tenant_id.as_deref().is_none_or(|tenant| {
                order.get("tennantId").and_then(Value::as_str) == Some(tenant)
            });
            status_ok && tenant_ok
        })
        .collect();

    let total = filtered.len();
    let total_pages = total.div_ceil(page_size as usize).max(1);
    let start = ((page as usize).saturating_sub(1)) * page_size as usize;
    let orders: Vec<Value> = filtered
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .collect();

    Json(json!({
        "orders": orders,
        "total": total,
        "page": page,
        "pageSize": page_size,
        "totalPages": total_pages,
        "ok": true,
    }))
    .into_response()
}

//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health              - Liveness check
//!
//! # Views
//! GET  /                    - Dashboard (state + marketplace cards)
//! GET  /stores              - Stores summary
//! GET  /orders              - Orders table (server or search pagination)
//! GET  /orders/{id}         - Order detail panels
//!
//! # Table actions
//! POST /orders/select       - Toggle one row selection
//! POST /orders/select-all   - Toggle all visible rows
//!
//! # Navigation state
//! POST /view                - Switch the active view (unknown names ignored)
//! POST /view/tenant         - Select the tenant filter
//! POST /view/state          - Select the order-state filter
//! POST /view/sidebar        - Sidebar collapse/open flags
//!
//! # Auth (opaque hosted identity provider)
//! GET  /auth/login          - Redirect to the provider sign-in
//! GET  /auth/callback       - Receive the id_token, store it in the session
//! POST /auth/logout         - Clear the session, redirect to provider logout
//! ```

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod stores;
pub mod view_actions;

use axum::{
    routing::{get, post},
    Router,
};
use tower_sessions::Session;

use middify_core::{BearerToken, OrderState};

use crate::error::AppError;
use crate::resource::ResourceState;
use crate::services::auth::session_keys;
use crate::state::AppState;
use crate::view::{ActiveView, ViewState};

/// Build the application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Views
        .route("/", get(dashboard::index))
        .route("/stores", get(stores::index))
        .route("/orders", get(orders::list::index))
        .route("/orders/{id}", get(orders::detail::show))
        // Table actions
        .route("/orders/select", post(orders::actions::toggle_row))
        .route("/orders/select-all", post(orders::actions::toggle_all))
        // Navigation state
        .route("/view", post(view_actions::change_view))
        .route("/view/tenant", post(view_actions::select_tenant))
        .route("/view/state", post(view_actions::select_state))
        .route("/view/sidebar", post(view_actions::sidebar))
        // Auth
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", post(auth::logout))
}

/// Load the operator's view state from the session (default when absent).
pub(crate) async fn load_view(session: &Session) -> ViewState {
    session
        .get::<ViewState>(session_keys::VIEW_STATE)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Persist the operator's view state into the session.
pub(crate) async fn save_view(session: &Session, view: &ViewState) -> Result<(), AppError> {
    session.insert(session_keys::VIEW_STATE, view).await?;
    Ok(())
}

/// The path serving a top-level view.
pub(crate) const fn view_path(view: ActiveView) -> &'static str {
    match view {
        ActiveView::Dashboard => "/",
        ActiveView::Stores => "/stores",
        ActiveView::Orders | ActiveView::OrderDetails => "/orders",
    }
}

/// A tenant entry for the sidebar filter.
#[derive(Debug, Clone)]
pub struct SidebarTenant {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// An order-state entry for the sidebar filter.
#[derive(Debug, Clone)]
pub struct SidebarState {
    pub slug: String,
    pub label: String,
    pub selected: bool,
}

/// Everything the navigation shell (navbar + sidebar) renders on every page.
#[derive(Debug, Clone)]
pub struct Shell {
    pub operator_name: String,
    pub operator_email: String,
    pub operator_role: String,
    pub tenants: Vec<SidebarTenant>,
    pub states: Vec<SidebarState>,
    pub any_state_selected: bool,
    pub sidebar_collapsed: bool,
}

/// Build the shell context from the shared resources.
///
/// Syncs the resource cells with the current token first, then waits for the
/// tenant list and profile to settle; a failed profile degrades to the
/// placeholder texts rather than blocking the page.
pub(crate) async fn build_shell(state: &AppState, token: &BearerToken, view: &ViewState) -> Shell {
    state.resources().sync(Some(token), state.api());

    let tenants_state = state.resources().tenant_states.wait_settled().await;
    let profile_state = state.resources().profile.wait_settled().await;

    let profile = match &profile_state {
        ResourceState::Ready(Some(profile)) => Some(profile.clone()),
        _ => None,
    };

    let tenants = match &tenants_state {
        ResourceState::Ready(tenants) => tenants
            .iter()
            .map(|tenant| SidebarTenant {
                id: tenant.tenant_id.as_str().to_string(),
                name: tenant.tenant_name.clone(),
                selected: Some(&tenant.tenant_id) == view.selected_tenant.as_ref(),
            })
            .collect(),
        _ => Vec::new(),
    };

    let states = OrderState::ALL
        .into_iter()
        .map(|order_state| SidebarState {
            slug: order_state.slug().to_string(),
            label: order_state.label().to_string(),
            selected: view.selected_state == Some(order_state),
        })
        .collect();

    Shell {
        operator_name: profile
            .as_ref()
            .and_then(|p| p.full_name.clone())
            .unwrap_or_else(|| "Usuario".to_string()),
        operator_email: profile
            .as_ref()
            .and_then(|p| p.email.clone())
            .unwrap_or_else(|| "Sin correo disponible".to_string()),
        operator_role: profile
            .as_ref()
            .and_then(|p| p.role.clone())
            .unwrap_or_else(|| "Rol no definido".to_string()),
        tenants,
        states,
        any_state_selected: view.selected_state.is_some(),
        sidebar_collapsed: view.sidebar_collapsed,
    }
}

/// The first failure among the shared resources, for the summary pages that
/// surface one combined error line.
pub(crate) async fn shared_data_error(state: &AppState) -> Option<String> {
    let (tenants, marketplaces, profile) = state.resources().settle().await;
    tenants
        .failure()
        .or_else(|| marketplaces.failure())
        .or_else(|| profile.failure())
        .map(str::to_string)
}

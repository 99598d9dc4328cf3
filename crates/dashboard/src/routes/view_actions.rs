//! Navigation-state actions: view switching, filters, sidebar flags.

use axum::{response::Redirect, Form};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use middify_core::{OrderState, TenantId};

use crate::error::AppError;
use crate::middleware::RequireAuth;

use super::{load_view, save_view, view_path};

/// Form body for switching the active view.
#[derive(Debug, Deserialize)]
pub struct ChangeViewForm {
    pub view: String,
}

/// Form body for the tenant filter (empty string clears it).
#[derive(Debug, Deserialize)]
pub struct TenantForm {
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Form body for the order-state filter.
#[derive(Debug, Deserialize)]
pub struct StateForm {
    /// State slug; empty or absent clears the filter.
    #[serde(default)]
    pub state: Option<String>,
    /// When set, jump to the orders view (dashboard chips do this).
    #[serde(default)]
    pub go: Option<String>,
}

/// Form body for the sidebar flags.
#[derive(Debug, Deserialize)]
pub struct SidebarForm {
    #[serde(default)]
    pub collapsed: Option<bool>,
    #[serde(default)]
    pub open: Option<bool>,
}

/// Switch the active view; unknown names leave it unchanged.
#[instrument(skip_all)]
pub async fn change_view(
    RequireAuth(_token): RequireAuth,
    session: Session,
    Form(form): Form<ChangeViewForm>,
) -> Result<Redirect, AppError> {
    let mut view = load_view(&session).await;
    view.change_view(&form.view);
    save_view(&session, &view).await?;
    Ok(Redirect::to(view_path(view.active_view)))
}

/// Select (or clear) the tenant filter.
#[instrument(skip_all)]
pub async fn select_tenant(
    RequireAuth(_token): RequireAuth,
    session: Session,
    Form(form): Form<TenantForm>,
) -> Result<Redirect, AppError> {
    let tenant = form
        .tenant_id
        .filter(|id| !id.is_empty())
        .map(TenantId::new);

    let mut view = load_view(&session).await;
    view.select_tenant(tenant);
    save_view(&session, &view).await?;
    Ok(Redirect::to(view_path(view.active_view)))
}

/// Select (or clear) the order-state filter.
///
/// Dashboard chips send `go`, which also jumps to the orders view; the
/// sidebar filter stays on the current view.
#[instrument(skip_all)]
pub async fn select_state(
    RequireAuth(_token): RequireAuth,
    session: Session,
    Form(form): Form<StateForm>,
) -> Result<Redirect, AppError> {
    let state = form
        .state
        .as_deref()
        .filter(|slug| !slug.is_empty())
        .and_then(OrderState::from_slug);

    let mut view = load_view(&session).await;
    if form.go.is_some() {
        view.select_order_state(state);
    } else {
        view.set_order_state(state);
    }
    save_view(&session, &view).await?;
    Ok(Redirect::to(view_path(view.active_view)))
}

/// Update the sidebar collapse/open flags.
#[instrument(skip_all)]
pub async fn sidebar(
    RequireAuth(_token): RequireAuth,
    session: Session,
    Form(form): Form<SidebarForm>,
) -> Result<Redirect, AppError> {
    let mut view = load_view(&session).await;
    if let Some(collapsed) = form.collapsed {
        view.sidebar_collapsed = collapsed;
    }
    if let Some(open) = form.open {
        view.sidebar_open = open;
    }
    save_view(&session, &view).await?;
    Ok(Redirect::to(view_path(view.active_view)))
}

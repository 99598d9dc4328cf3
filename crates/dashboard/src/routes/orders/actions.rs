//! Selection actions for the orders table.

use axum::{
    extract::State,
    response::Redirect,
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::state::AppState;

use super::super::{load_view, save_view};

/// Form body for toggling one row.
#[derive(Debug, Deserialize)]
pub struct ToggleRowForm {
    pub row_id: String,
}

/// Toggle one row's selection and return to the table.
#[instrument(skip_all)]
pub async fn toggle_row(
    RequireAuth(_token): RequireAuth,
    session: Session,
    Form(form): Form<ToggleRowForm>,
) -> Result<Redirect, AppError> {
    let mut view = load_view(&session).await;
    view.selection.toggle(&form.row_id);
    save_view(&session, &view).await?;
    Ok(Redirect::to("/orders"))
}

/// Select or clear every currently-visible row.
///
/// Recomputes the visible row set through the engine (cache-hit in the
/// common case) so "all" means exactly what is on screen.
#[instrument(skip_all)]
pub async fn toggle_all(
    RequireAuth(token): RequireAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, AppError> {
    let mut view = load_view(&session).await;

    let snapshot = state
        .orders()
        .table(
            Some(&token),
            view.selected_tenant.as_ref(),
            view.selected_state,
            &view.table,
        )
        .await;

    let visible = snapshot.visible_row_ids();
    view.selection.retain_visible(&visible);
    view.selection.toggle_all(&visible);

    save_view(&session, &view).await?;
    Ok(Redirect::to("/orders"))
}

//! Sign-in/sign-out flow against the hosted identity provider.

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use middify_core::BearerToken;

use crate::error::AppError;
use crate::middleware::auth::OptionalAuth;
use crate::services::auth;
use crate::state::AppState;

/// Query parameters the provider sends back to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Redirect the browser to the provider's sign-in page.
#[instrument(skip_all)]
pub async fn login(OptionalAuth(token): OptionalAuth, State(state): State<AppState>) -> Redirect {
    if token.is_some() {
        return Redirect::to("/");
    }
    let config = state.config();
    Redirect::to(&config.identity.login_url(&config.base_url))
}

/// Receive the provider's token and bind it to the session.
#[instrument(skip_all)]
pub async fn callback(
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError> {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        return Err(AppError::Unauthorized(format!(
            "identity provider error: {error} {description}"
        )));
    }

    let token = query
        .id_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::BadRequest("callback carried no id_token".to_string()))?;

    auth::sign_in(&session, BearerToken::new(token)).await?;
    tracing::info!("operator signed in");
    Ok(Redirect::to("/"))
}

/// Clear the session and send the browser to the provider logout.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, AppError> {
    let logout_url = auth::sign_out(&session, &state.config().identity).await?;

    // Cached backend data belongs to the signed-in operator's session.
    state.orders().invalidate_all();
    state.resources().sync(None, state.api());

    tracing::info!("operator signed out");
    Ok(Redirect::to(&logout_url))
}

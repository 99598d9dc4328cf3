//! Authentication extractors.
//!
//! The identity provider is opaque: a request is authenticated exactly when
//! its session carries a bearer token. The token is never validated locally.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use middify_core::BearerToken;

use crate::services::auth::session_keys;

/// Extractor that requires a signed-in session.
///
/// Without a token, HTML requests redirect to the sign-in flow and API
/// requests get 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(token): RequireAuth,
/// ) -> impl IntoResponse { /* ... */ }
/// ```
pub struct RequireAuth(pub BearerToken);

/// Rejection for unauthenticated requests.
pub enum AuthRejection {
    /// Redirect to the sign-in flow (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer.
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let token: BearerToken = session
            .get(session_keys::ID_TOKEN)
            .await
            .ok()
            .flatten()
            .filter(|token: &BearerToken| !token.is_empty())
            .ok_or_else(|| {
                if parts.uri.path().starts_with("/api/") {
                    AuthRejection::Unauthorized
                } else {
                    AuthRejection::RedirectToLogin
                }
            })?;

        Ok(Self(token))
    }
}

/// Extractor that optionally reads the session token.
///
/// Unlike [`RequireAuth`], this never rejects.
pub struct OptionalAuth(pub Option<BearerToken>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<BearerToken>(session_keys::ID_TOKEN)
                .await
                .ok()
                .flatten()
                .filter(|token| !token.is_empty()),
            None => None,
        };

        Ok(Self(token))
    }
}

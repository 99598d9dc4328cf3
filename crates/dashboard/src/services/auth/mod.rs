//! Sign-in/sign-out against the hosted identity provider.
//!
//! The provider is an opaque collaborator: it renders the actual login page,
//! redirects back to `/auth/callback` with an `id_token`, and owns the
//! federated logout endpoint. The dashboard only stores the token in the
//! session and clears every session artifact on the way out.

use tower_sessions::Session;

use middify_core::BearerToken;

use crate::config::IdentityConfig;
use crate::error::AppError;

/// Keys under which the session stores dashboard state.
pub mod session_keys {
    /// The identity provider's `id_token` for the signed-in operator.
    pub const ID_TOKEN: &str = "middify.id_token";
    /// The operator's navigation/view state.
    pub const VIEW_STATE: &str = "middify.view";
}

/// Read the current session token, treating empty strings as absent.
pub async fn current_token(session: &Session) -> Option<BearerToken> {
    session
        .get::<BearerToken>(session_keys::ID_TOKEN)
        .await
        .ok()
        .flatten()
        .filter(|token| !token.is_empty())
}

/// Store the token handed over by the provider callback.
///
/// The session id is cycled so a pre-login session cannot be fixated.
///
/// # Errors
///
/// Fails when the session store rejects the write.
pub async fn sign_in(session: &Session, token: BearerToken) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.insert(session_keys::ID_TOKEN, &token).await?;
    Ok(())
}

/// Clear the local session and build the provider logout URL.
///
/// Mirrors the browser client's sign-out: local artifacts go first, then the
/// browser is sent to the provider so the hosted session dies too. The old
/// token rides along as `id_token_hint` when we still have it.
///
/// # Errors
///
/// Fails when the session store rejects the removal.
pub async fn sign_out(session: &Session, identity: &IdentityConfig) -> Result<String, AppError> {
    let token = current_token(session).await;

    session
        .remove::<BearerToken>(session_keys::ID_TOKEN)
        .await?;
    session
        .remove::<serde_json::Value>(session_keys::VIEW_STATE)
        .await?;
    session.flush().await?;

    Ok(identity.logout_url(token.as_ref().map(BearerToken::as_str)))
}

//! Route gate and session extractors
//!
//! [`route_gate`] wraps the whole router. Paths outside the public set need a
//! session cookie that verifies; anything else is redirected to the login
//! entry point. The gate does not hand the identity to handlers: the
//! [`CurrentUser`] and [`AdminUser`] extractors re-verify the cookie when a
//! handler needs it.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};

use crate::{
    AppState, error::ApiError, models::UserIdentity, session::current_identity,
    settings::LOGIN_PATH,
};

/// Whether `path` bypasses the gate
///
/// The login entry point is always public. A prefix covers the path itself
/// and anything below it, so `/api` matches `/api/auth/me` but not `/apiary`.
pub fn is_public_path(path: &str, public_prefixes: &[String]) -> bool {
    if path == LOGIN_PATH {
        return true;
    }

    public_prefixes.iter().any(|prefix| {
        let prefix = prefix.trim_end_matches('/');
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    })
}

/// Redirect unauthenticated requests for protected paths to the login page
pub async fn route_gate(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    if is_public_path(req.uri().path(), &state.settings.public_prefixes) {
        return next.run(req).await;
    }

    if current_identity(&state, req.headers()).is_none() {
        debug!(path = %req.uri().path(), "Unauthenticated request, redirecting to login");
        return Redirect::temporary(LOGIN_PATH).into_response();
    }

    next.run(req).await
}

/// Identity of the caller, verified from the session cookie
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserIdentity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        current_identity(state, &parts.headers)
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Caller holding the ADMINISTRATOR role
#[derive(Debug, Clone)]
pub struct AdminUser(pub UserIdentity);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;

        if !identity.role.is_administrator() {
            warn!(user_id = identity.id, path = %parts.uri.path(), "Non-administrator denied");
            return Err(ApiError::Forbidden);
        }

        Ok(AdminUser(identity))
    }
}

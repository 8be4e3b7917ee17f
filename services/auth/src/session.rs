//! Session cookie handling

use axum::http::{HeaderMap, HeaderValue, header::InvalidHeaderValue};
use axum_extra::headers::{Cookie, HeaderMapExt};

use crate::{AppState, models::UserIdentity};

/// Read the session token from the request cookies
///
/// An empty cookie value counts as absent.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .typed_get::<Cookie>()?
        .get(cookie_name)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Verify the request's session cookie and return the identity it carries
pub fn current_identity(state: &AppState, headers: &HeaderMap) -> Option<UserIdentity> {
    let token = session_token(headers, &state.settings.cookie_name)?;
    state.jwt_service.verify(&token)
}

/// Build the `Set-Cookie` value that stores a freshly issued token
pub fn session_cookie(
    cookie_name: &str,
    token: &str,
    max_age_seconds: u64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{cookie_name}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the `Set-Cookie` value that deletes the session cookie
pub fn clear_session_cookie(
    cookie_name: &str,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    session_cookie(cookie_name, "", 0, secure)
}

//! HTTP routes
//!
//! Everything under `/api` is public as far as the route gate is concerned;
//! handlers that need the caller re-verify the session cookie through the
//! [`CurrentUser`](crate::middleware::CurrentUser) and [`AdminUser`] extractors.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    AppState,
    credentials::CredentialError,
    error::{ApiError, ApiResult},
    middleware::{AdminUser, route_gate},
    models::{LoginCredentials, NewUser, Role, UpdateUser, UserResponse},
    password::hash_password,
    session::{clear_session_cookie, current_identity, session_cookie},
    validation::{validate_email, validate_name, validate_password, validate_username},
};

/// Request for creating a user account
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// Create the router for the service
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/users", post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/:id/unlock", post(unlock_user))
        .fallback(not_found);

    let router = Router::new().nest("/api", api);

    let router = match &state.settings.frontend_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).not_found_service(ServeFile::new(format!("{dir}/index.html"))),
        ),
        None => router.fallback(not_found),
    };

    router
        .layer(middleware::from_fn_with_state(state.clone(), route_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = state.user_store.health_check().await.unwrap_or_else(|e| {
        warn!("User store health check failed: {}", e);
        false
    });

    let (status, label) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "helpdesk-auth"
        })),
    )
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginCredentials>, JsonRejection>,
) -> ApiResult<Response> {
    // An unreadable body carries no usable credentials.
    let Json(credentials) = payload.map_err(|_| CredentialError::IncompleteCredentials)?;

    let identity = state
        .validator
        .validate(&credentials.username, &credentials.password)
        .await?;

    let token = state.jwt_service.issue(&identity)?;
    let cookie = session_cookie(
        &state.settings.cookie_name,
        &token,
        state.jwt_service.token_expiry(),
        state.settings.secure_cookies,
    )
    .map_err(|e| anyhow::anyhow!("Failed to build session cookie: {}", e))?;

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(json!({"message": "Inicio de sesión exitoso"})),
    )
        .into_response())
}

/// Logout endpoint
pub async fn logout(State(state): State<AppState>) -> ApiResult<Response> {
    let cookie = clear_session_cookie(&state.settings.cookie_name, state.settings.secure_cookies)
        .map_err(|e| anyhow::anyhow!("Failed to build session cookie: {}", e))?;

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(json!({"message": "Sesión cerrada"})),
    )
        .into_response())
}

/// Current user: the decoded identity, or 401 with a `null` body
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match current_identity(&state, &headers) {
        Some(identity) => Json(identity).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(serde_json::Value::Null)).into_response(),
    }
}

/// Create a user account
pub async fn create_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_username(&payload.username).map_err(ApiError::BadRequest)?;
    validate_password(&payload.password).map_err(ApiError::BadRequest)?;
    validate_name(&payload.name).map_err(ApiError::BadRequest)?;
    validate_email(&payload.email).map_err(ApiError::BadRequest)?;

    let new_user = NewUser {
        username: payload.username,
        password_hash: hash_password(&payload.password)?,
        name: payload.name.trim().to_string(),
        email: payload.email,
        phone: payload.phone.filter(|phone| !phone.trim().is_empty()),
        role: payload.role,
    };

    let user = state.user_store.create(&new_user).await?;
    info!(admin_id = admin.id, user_id = user.id, username = %user.username, "User created");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Get a user account
pub async fn get_user(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .user_store
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(user.into()))
}

/// Update profile, role or disabled flag
pub async fn update_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(mut changes): Json<UpdateUser>,
) -> ApiResult<Json<UserResponse>> {
    if changes.is_empty() {
        return Err(ApiError::BadRequest("No hay cambios que aplicar".to_string()));
    }
    if let Some(name) = changes.name.take() {
        validate_name(&name).map_err(ApiError::BadRequest)?;
        changes.name = Some(name.trim().to_string());
    }
    if let Some(email) = &changes.email {
        validate_email(email).map_err(ApiError::BadRequest)?;
    }
    // An empty phone clears the stored number.
    if let Some(phone) = changes.phone.take() {
        changes.phone = Some(phone.trim().to_string());
    }

    let user = state
        .user_store
        .update(id, &changes)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(admin_id = admin.id, user_id = id, "User updated");

    Ok(Json(user.into()))
}

/// Soft delete: accounts are disabled, never removed
pub async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<UserResponse>> {
    let changes = UpdateUser {
        disabled: Some(true),
        ..Default::default()
    };

    let user = state
        .user_store
        .update(id, &changes)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(admin_id = admin.id, user_id = id, "User disabled");

    Ok(Json(user.into()))
}

/// Clear a lockout
pub async fn unlock_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .user_store
        .unlock(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(admin_id = admin.id, user_id = id, "User unlocked");

    Ok(Json(user.into()))
}

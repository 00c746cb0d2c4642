//! Authentication API endpoints
//!
//! - POST /api/v1/auth/register - Create an account (first account is admin)
//! - POST /api/v1/auth/login - Log in by email, sets the session cookie
//! - POST /api/v1/auth/logout - End the current session
//! - GET /api/v1/auth/me - Current user

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::common::MessageResponse;
use crate::api::middleware::{
    extract_session_token, ApiError, AppState, AuthenticatedUser, ClientMeta,
};
use crate::models::User;
use crate::services::user::{LOGGED_OUT_MESSAGE, REGISTERED_MESSAGE};
use crate::services::{LoginInput, RegisterInput};

const CLEAR_SESSION_COOKIE: &str = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: User,
    pub message: &'static str,
}

/// Response for successful login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

/// Routes that don't need a session
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Routes that need a session
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.register(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            message: REGISTERED_MESSAGE,
        }),
    ))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(body): Json<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.user_service.login(body, client.ip).await?;
    let message = outcome.welcome_message();

    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        outcome.session.id,
        outcome.session.max_age_seconds()
    );
    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::internal_error(format!("Invalid session cookie: {}", e)))?,
    );

    Ok((
        response_headers,
        Json(AuthResponse {
            user: outcome.user,
            token: outcome.session.id,
            expires_at: outcome.session.expires_at,
            message,
        }),
    ))
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_session_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;
    state.user_service.logout(&token).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static(CLEAR_SESSION_COOKIE),
    );

    Ok((
        response_headers,
        Json(MessageResponse::new(LOGGED_OUT_MESSAGE)),
    ))
}

/// GET /api/v1/auth/me
async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

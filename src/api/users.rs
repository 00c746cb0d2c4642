//! Member API endpoints
//!
//! Public member directory and profiles, the signed-in member's own
//! profile and dashboard, and admin account management.

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{SearchPageQuery, WithMessage};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::models::{PagedResult, User, UserRole, UserStatus};
use crate::services::user::{Dashboard, ProfileUpdate, ProfileView, PROFILE_UPDATED_MESSAGE};

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: UserStatus,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: UserRole,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{username}", get(get_profile))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(own_profile).put(update_profile))
        .route("/dashboard", get(dashboard))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin/users/{id}/status", put(set_status))
        .route("/admin/users/{id}/role", put(set_role))
}

/// GET /api/v1/users?q=&page=
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<SearchPageQuery>,
) -> Result<Json<PagedResult<User>>, ApiError> {
    let users = state
        .user_service
        .list_users(query.q.as_deref(), query.page)
        .await?;
    Ok(Json(users))
}

/// GET /api/v1/users/{username}
async fn get_profile(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
) -> Result<Json<ProfileView>, ApiError> {
    let profile = state
        .user_service
        .get_profile(Some(&username), viewer.user())
        .await?;
    Ok(Json(profile))
}

/// GET /api/v1/profile
async fn own_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<ProfileView>, ApiError> {
    Ok(Json(state.user_service.get_profile(None, Some(&user)).await?))
}

/// PUT /api/v1/profile
async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<WithMessage<ProfileView>>, ApiError> {
    let profile = state.user_service.update_profile(user.id, &body).await?;
    Ok(Json(WithMessage::new(profile, PROFILE_UPDATED_MESSAGE)))
}

/// GET /api/v1/dashboard
async fn dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Dashboard>, ApiError> {
    Ok(Json(state.user_service.dashboard(&user).await?))
}

/// PUT /api/v1/admin/users/{id}/status
async fn set_status(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .user_service
        .set_user_status(&admin, id, body.status)
        .await?;
    Ok(Json(user))
}

/// PUT /api/v1/admin/users/{id}/role
async fn set_role(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<RoleRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state.user_service.set_user_role(&admin, id, body.role).await?;
    Ok(Json(user))
}

//! Portfolio API endpoints
//!
//! Public pages:
//! - GET /portfolio, /portfolio/about, /portfolio/stats
//! - GET /portfolio/projects, /portfolio/project/{slug}, /portfolio/search
//! - GET /portfolio/categories, /portfolio/categories/{slug}
//! - GET /portfolio/users/{username}
//!
//! Project management (owner or admin) lives under /portfolio/projects/{id},
//! category management under the admin router.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use crate::api::common::PageQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::models::{
    CreateProjectInput, LikeStatus, PortfolioCategory, PortfolioCategoryInput, Project,
    ProjectImageInput, UpdateProjectInput,
};
use crate::services::portfolio::{
    AboutPage, CategoryDetail, HomePage, PortfolioStats, ProjectDetail, ProjectListPage,
    ProjectListQuery, ProjectSearchQuery, ProjectSearchResults, UserPortfolio,
};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/portfolio", get(home))
        .route("/portfolio/about", get(about))
        .route("/portfolio/stats", get(stats))
        .route("/portfolio/projects", get(list_projects))
        .route("/portfolio/project/{slug}", get(project_detail))
        .route("/portfolio/search", get(search))
        .route("/portfolio/categories", get(list_categories))
        .route("/portfolio/categories/{slug}", get(category_detail))
        .route("/portfolio/users/{username}", get(user_portfolio))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/portfolio/projects", post(create_project))
        .route(
            "/portfolio/projects/{id}",
            get(get_project_for_edit).put(update_project).delete(delete_project),
        )
        .route("/portfolio/projects/{id}/images", post(add_image))
        .route("/portfolio/projects/{id}/like", post(toggle_like))
        .route("/portfolio/images/{id}", delete(remove_image))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/portfolio/categories", post(create_category))
        .route(
            "/portfolio/categories/{slug}",
            axum::routing::put(update_category).delete(delete_category),
        )
}

// ============================================================================
// Public pages
// ============================================================================

/// GET /api/v1/portfolio
async fn home(State(state): State<AppState>) -> Result<Json<HomePage>, ApiError> {
    Ok(Json(state.portfolio_service.home().await?))
}

/// GET /api/v1/portfolio/about
async fn about(State(state): State<AppState>) -> Result<Json<AboutPage>, ApiError> {
    Ok(Json(state.portfolio_service.about().await?))
}

/// GET /api/v1/portfolio/stats
async fn stats(State(state): State<AppState>) -> Result<Json<PortfolioStats>, ApiError> {
    Ok(Json(state.portfolio_service.stats().await?))
}

/// GET /api/v1/portfolio/projects?q=&category=&user=&status=&sort=&page=
async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> Result<Json<ProjectListPage>, ApiError> {
    Ok(Json(state.portfolio_service.list_projects(&query).await?))
}

/// GET /api/v1/portfolio/project/{slug}
///
/// Counts a view. Unpublished projects are only shown to their owner
/// and to admins.
async fn project_detail(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(slug): Path<String>,
) -> Result<Json<ProjectDetail>, ApiError> {
    let detail = state
        .portfolio_service
        .project_detail(&slug, viewer.user())
        .await?;
    Ok(Json(detail))
}

/// GET /api/v1/portfolio/search?q=&category=&user=&page=
async fn search(
    State(state): State<AppState>,
    Query(query): Query<ProjectSearchQuery>,
) -> Result<Json<ProjectSearchResults>, ApiError> {
    Ok(Json(state.portfolio_service.search(&query).await?))
}

/// GET /api/v1/portfolio/categories
async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<PortfolioCategory>>, ApiError> {
    Ok(Json(state.portfolio_service.list_categories().await?))
}

/// GET /api/v1/portfolio/categories/{slug}?page=
async fn category_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CategoryDetail>, ApiError> {
    let detail = state
        .portfolio_service
        .category_detail(&slug, query.page)
        .await?;
    Ok(Json(detail))
}

/// GET /api/v1/portfolio/users/{username}?page=
async fn user_portfolio(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserPortfolio>, ApiError> {
    let portfolio = state
        .portfolio_service
        .user_portfolio(&username, query.page)
        .await?;
    Ok(Json(portfolio))
}

// ============================================================================
// Project management
// ============================================================================

/// POST /api/v1/portfolio/projects
async fn create_project(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<CreateProjectInput>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state.portfolio_service.create_project(&user, body).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/v1/portfolio/projects/{id}
async fn get_project_for_edit(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Project>, ApiError> {
    let project = state.portfolio_service.get_project(id).await?;
    if !user.can_edit(project.user_id) {
        return Err(ApiError::forbidden("You can only edit your own projects"));
    }
    Ok(Json(project))
}

/// PUT /api/v1/portfolio/projects/{id}
async fn update_project(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProjectInput>,
) -> Result<Json<Project>, ApiError> {
    let project = state.portfolio_service.update_project(&user, id, body).await?;
    Ok(Json(project))
}

/// DELETE /api/v1/portfolio/projects/{id}
async fn delete_project(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.portfolio_service.delete_project(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/portfolio/projects/{id}/images
async fn add_image(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<ProjectImageInput>,
) -> Result<impl IntoResponse, ApiError> {
    let image = state
        .portfolio_service
        .add_project_image(&user, id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(image)))
}

/// DELETE /api/v1/portfolio/images/{id}
async fn remove_image(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.portfolio_service.remove_project_image(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/portfolio/projects/{id}/like
async fn toggle_like(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<LikeStatus>, ApiError> {
    Ok(Json(state.portfolio_service.toggle_project_like(id, &user).await?))
}

// ============================================================================
// Category management (admin)
// ============================================================================

async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<PortfolioCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.portfolio_service.create_category(body).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<PortfolioCategoryInput>,
) -> Result<Json<PortfolioCategory>, ApiError> {
    Ok(Json(state.portfolio_service.update_category(&slug, body).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.portfolio_service.delete_category(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

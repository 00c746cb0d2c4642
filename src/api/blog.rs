//! Blog API endpoints
//!
//! Public pages:
//! - GET /blog, /blog/posts, /blog/post/{slug}, /blog/search, /blog/archive
//! - GET /blog/categories, /blog/categories/{slug}
//! - GET /blog/series, /blog/series/{slug}, /blog/tags
//! - POST /blog/newsletter
//!
//! Members write posts, series and comments; admins manage categories,
//! tags, comment moderation and the subscriber list.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{default_page, PageQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::models::{
    deserialize_page_or_first, BlogCategory, BlogCategoryInput, BlogSeries, Comment, CreateCommentInput, CreatePostInput,
    LikeStatus, Newsletter, Post, SeriesInput, TagWithCount, UpdatePostInput,
};
use crate::services::blog::{
    ArchivePage, BlogCategoryDetail, BlogHome, PostDetail, PostListPage, PostListQuery,
    PostSearchQuery, PostSearchResults, SeriesDetail,
};
use crate::services::comment::CommentCreated;
use crate::services::newsletter::{SubscribeInput, SubscribeOutcome};

#[derive(Debug, Deserialize)]
pub struct ArchiveQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    #[serde(default = "default_page", deserialize_with = "deserialize_page_or_first")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub email: String,
    pub is_active: bool,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/blog", get(blog_home))
        .route("/blog/posts", get(list_posts))
        .route("/blog/post/{slug}", get(post_detail))
        .route("/blog/search", get(search))
        .route("/blog/archive", get(archive))
        .route("/blog/archive/{year}", get(archive_year))
        .route("/blog/archive/{year}/{month}", get(archive_month))
        .route("/blog/categories", get(list_categories))
        .route("/blog/categories/{slug}", get(category_detail))
        .route("/blog/series", get(list_series))
        .route("/blog/series/{slug}", get(series_detail))
        .route("/blog/tags", get(list_tags))
        .route("/blog/newsletter", post(subscribe))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/blog/posts", post(create_post))
        .route(
            "/blog/posts/{id}",
            get(get_post_for_edit).put(update_post).delete(delete_post),
        )
        .route("/blog/posts/{id}/like", post(toggle_like))
        .route("/blog/post/{slug}/comments", post(add_comment))
        .route("/blog/comments/{id}", delete(delete_comment))
        .route("/blog/series", post(create_series))
        .route("/blog/series/{slug}", put(update_series).delete(delete_series))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/blog/categories", post(create_category))
        .route(
            "/blog/categories/{slug}",
            put(update_category).delete(delete_category),
        )
        .route("/admin/tags/{slug}", delete(delete_tag))
        .route("/admin/comments/pending", get(pending_comments))
        .route("/admin/comments/{id}/approval", put(set_comment_approval))
        .route("/admin/newsletter", get(list_subscribers).put(set_subscription))
}

// ============================================================================
// Public pages
// ============================================================================

/// GET /api/v1/blog
async fn blog_home(State(state): State<AppState>) -> Result<Json<BlogHome>, ApiError> {
    Ok(Json(state.blog_service.blog_home().await?))
}

/// GET /api/v1/blog/posts?q=&category=&author=&tag=&sort=&page=
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<PostListPage>, ApiError> {
    Ok(Json(state.blog_service.list_posts(&query).await?))
}

/// GET /api/v1/blog/post/{slug}
///
/// Published posts only; counts a view.
async fn post_detail(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(slug): Path<String>,
) -> Result<Json<PostDetail>, ApiError> {
    Ok(Json(state.blog_service.post_detail(&slug, viewer.user()).await?))
}

/// GET /api/v1/blog/search?q=&category=&page=
async fn search(
    State(state): State<AppState>,
    Query(query): Query<PostSearchQuery>,
) -> Result<Json<PostSearchResults>, ApiError> {
    Ok(Json(state.blog_service.search(&query).await?))
}

/// GET /api/v1/blog/archive?year=&month=&page=
async fn archive(
    State(state): State<AppState>,
    Query(query): Query<ArchiveQuery>,
) -> Result<Json<ArchivePage>, ApiError> {
    let page = state
        .blog_service
        .archive(query.year, query.month, query.page)
        .await?;
    Ok(Json(page))
}

/// GET /api/v1/blog/archive/{year}
async fn archive_year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ArchivePage>, ApiError> {
    Ok(Json(state.blog_service.archive(Some(year), None, query.page).await?))
}

/// GET /api/v1/blog/archive/{year}/{month}
async fn archive_month(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ArchivePage>, ApiError> {
    let page = state
        .blog_service
        .archive(Some(year), Some(month), query.page)
        .await?;
    Ok(Json(page))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<BlogCategory>>, ApiError> {
    Ok(Json(state.blog_service.list_categories().await?))
}

/// GET /api/v1/blog/categories/{slug}?page=
async fn category_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<BlogCategoryDetail>, ApiError> {
    Ok(Json(state.blog_service.category_detail(&slug, query.page).await?))
}

async fn list_series(State(state): State<AppState>) -> Result<Json<Vec<BlogSeries>>, ApiError> {
    Ok(Json(state.blog_service.list_series().await?))
}

async fn series_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SeriesDetail>, ApiError> {
    Ok(Json(state.blog_service.series_detail(&slug).await?))
}

/// GET /api/v1/blog/tags - tags with usage counts
async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagWithCount>>, ApiError> {
    Ok(Json(state.tag_service.list_tags().await?))
}

/// POST /api/v1/blog/newsletter
///
/// 201 for a new subscriber, 200 when the address was already listed.
async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<SubscribeInput>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome: SubscribeOutcome = state.newsletter_service.subscribe(&body).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

// ============================================================================
// Member writes
// ============================================================================

/// POST /api/v1/blog/posts
async fn create_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<CreatePostInput>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.blog_service.create_post(&user, body).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/v1/blog/posts/{id} - any status, author or admin
async fn get_post_for_edit(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.blog_service.get_post_for_edit(&user, id).await?))
}

async fn update_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePostInput>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.blog_service.update_post(&user, id, body).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.blog_service.delete_post(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/blog/posts/{id}/like
async fn toggle_like(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<LikeStatus>, ApiError> {
    Ok(Json(state.blog_service.toggle_post_like(id, &user).await?))
}

/// POST /api/v1/blog/post/{slug}/comments
async fn add_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(slug): Path<String>,
    Json(body): Json<CreateCommentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created: CommentCreated = state.comment_service.add_comment(&slug, &user, body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.comment_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_series(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<SeriesInput>,
) -> Result<impl IntoResponse, ApiError> {
    let series = state.blog_service.create_series(&user, body).await?;
    Ok((StatusCode::CREATED, Json(series)))
}

async fn update_series(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(slug): Path<String>,
    Json(body): Json<SeriesInput>,
) -> Result<Json<BlogSeries>, ApiError> {
    Ok(Json(state.blog_service.update_series(&user, &slug, body).await?))
}

async fn delete_series(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.blog_service.delete_series(&user, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Admin
// ============================================================================

async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<BlogCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.blog_service.create_category(body).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<BlogCategoryInput>,
) -> Result<Json<BlogCategory>, ApiError> {
    Ok(Json(state.blog_service.update_category(&slug, body).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.blog_service.delete_category(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_tag(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.tag_service.delete(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn pending_comments(State(state): State<AppState>) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(state.comment_service.list_pending().await?))
}

/// PUT /api/v1/admin/comments/{id}/approval
async fn set_comment_approval(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ApprovalRequest>,
) -> Result<Json<Comment>, ApiError> {
    Ok(Json(state.comment_service.set_approved(id, body.approved).await?))
}

/// GET /api/v1/admin/newsletter - active subscribers
async fn list_subscribers(
    State(state): State<AppState>,
) -> Result<Json<Vec<Newsletter>>, ApiError> {
    Ok(Json(state.newsletter_service.list_subscribers().await?))
}

/// PUT /api/v1/admin/newsletter
async fn set_subscription(
    State(state): State<AppState>,
    Json(body): Json<SubscriptionRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .newsletter_service
        .set_active(&body.email, body.is_active)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

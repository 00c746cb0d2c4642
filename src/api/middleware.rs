//! API middleware
//!
//! Contains middleware and extractors for:
//! - Authentication (session token validation)
//! - Authorization (admin checks)
//! - Request statistics
//! - Mapping service errors onto JSON error responses

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::create_cache;
use crate::config::{Config, UploadConfig};
use crate::db::repositories::{
    SqlxBlogCategoryRepository, SqlxCommentRepository, SqlxContactInfoRepository,
    SqlxContactRepository, SqlxFaqRepository, SqlxNewsletterRepository,
    SqlxPortfolioCategoryRepository, SqlxPostRepository, SqlxProjectRepository,
    SqlxResumeRepository, SqlxSeriesRepository, SqlxSessionRepository, SqlxTagRepository,
    SqlxTestimonialRepository, SqlxUserRepository,
};
use crate::models::User;
use crate::services::validation::NON_FIELD_ERRORS;
use crate::services::{
    BlogService, BlogServiceError, CommentService, CommentServiceError, ContactService,
    ContactServiceError, EmailService, EmailTransport, FieldErrors, NewsletterService,
    NewsletterServiceError, PortfolioService, PortfolioServiceError, RateLimiter, ResumeService,
    TagService, TagServiceError, UserService, UserServiceError,
};

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    total_requests: AtomicU64,
    /// Responses with a 4xx or 5xx status
    error_requests: AtomicU64,
    /// Total response time in microseconds (for calculating average)
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            error_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a request with its status and response time
    pub fn record(&self, status: StatusCode, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if status.is_client_error() || status.is_server_error() {
            self.error_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.total_response_time_us.fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn error_requests(&self) -> u64 {
        self.error_requests.load(Ordering::Relaxed)
    }

    /// Average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Application state
// ============================================================================

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub user_service: Arc<UserService>,
    pub portfolio_service: Arc<PortfolioService>,
    pub resume_service: Arc<ResumeService>,
    pub blog_service: Arc<BlogService>,
    pub comment_service: Arc<CommentService>,
    pub newsletter_service: Arc<NewsletterService>,
    pub tag_service: Arc<TagService>,
    pub contact_service: Arc<ContactService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub upload_config: Arc<UploadConfig>,
    pub request_stats: Arc<RequestStats>,
}

impl AppState {
    /// Wire repositories and services over a migrated pool
    pub fn new(pool: SqlitePool, config: &Config, transport: Arc<dyn EmailTransport>) -> Self {
        let cache = create_cache(&config.cache);
        let rate_limiter = Arc::new(RateLimiter::new(&config.security));

        let users = SqlxUserRepository::boxed(pool.clone());
        let projects = SqlxProjectRepository::boxed(pool.clone());
        let posts = SqlxPostRepository::boxed(pool.clone());
        let comments = SqlxCommentRepository::boxed(pool.clone());
        let resume = SqlxResumeRepository::boxed(pool.clone());
        let testimonials = SqlxTestimonialRepository::boxed(pool.clone());

        let tag_service = Arc::new(TagService::new(SqlxTagRepository::boxed(pool.clone())));
        let user_service = Arc::new(
            UserService::new(
                users.clone(),
                SqlxSessionRepository::boxed(pool.clone()),
                projects.clone(),
                posts.clone(),
                rate_limiter.clone(),
                cache.clone(),
            )
            .with_session_days(config.security.session_days),
        );
        let portfolio_service = Arc::new(PortfolioService::new(
            projects.clone(),
            SqlxPortfolioCategoryRepository::boxed(pool.clone()),
            users,
            resume.clone(),
            testimonials.clone(),
            tag_service.clone(),
            cache.clone(),
        ));
        let resume_service = Arc::new(ResumeService::new(resume, testimonials, projects));
        let blog_service = Arc::new(BlogService::new(
            posts.clone(),
            SqlxBlogCategoryRepository::boxed(pool.clone()),
            SqlxSeriesRepository::boxed(pool.clone()),
            comments.clone(),
            tag_service.clone(),
            cache.clone(),
        ));
        let comment_service = Arc::new(CommentService::new(comments, posts));
        let newsletter_service = Arc::new(NewsletterService::new(
            SqlxNewsletterRepository::boxed(pool.clone()),
        ));

        let email = Arc::new(EmailService::new(
            transport,
            config.email.clone(),
            config.site.clone(),
        ));
        let contact_service = Arc::new(ContactService::new(
            SqlxContactRepository::boxed(pool.clone()),
            SqlxFaqRepository::boxed(pool.clone()),
            SqlxContactInfoRepository::boxed(pool.clone()),
            email,
            rate_limiter.clone(),
            cache,
        ));

        Self {
            pool,
            user_service,
            portfolio_service,
            resume_service,
            blog_service,
            comment_service,
            newsletter_service,
            tag_service,
            contact_service,
            rate_limiter,
            upload_config: Arc::new(config.upload.clone()),
            request_stats: Arc::new(RequestStats::new()),
        }
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// The viewer on public routes, when a valid session came with the request
#[derive(Debug, Clone, Default)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts.extensions.get::<AuthenticatedUser>().map(|u| u.0.clone()),
        ))
    }
}

/// Client address and user agent of the request.
///
/// `X-Forwarded-For` (first hop) and `X-Real-IP` win over the socket
/// address so the server works behind a reverse proxy.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip: Option<IpAddr>,
    pub user_agent: String,
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let socket_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientMeta {
            ip: forwarded_ip(&parts.headers).or(socket_ip),
            user_agent: parts
                .headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string(),
        })
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = forwarded.split(',').next().and_then(|s| s.trim().parse().ok()) {
            return Some(ip);
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Form errors as `{ field: [messages] }` details. The first non-field
    /// error becomes the message when there is one.
    pub fn from_field_errors(code: &str, errors: FieldErrors) -> Self {
        let message = errors
            .get(NON_FIELD_ERRORS)
            .and_then(|messages| messages.first())
            .cloned()
            .unwrap_or_else(|| "Please correct the errors below.".to_string());
        let details = serde_json::to_value(&errors).unwrap_or_default();
        Self::with_details(code, message, details)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new("RATE_LIMITED", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Log the cause and hide it from the client
    fn internal(err: anyhow::Error) -> Self {
        tracing::error!("Request failed: {:#}", err);
        Self::internal_error("Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::AuthenticationError(msg) => Self::unauthorized(msg),
            UserServiceError::ValidationError(errors) => {
                Self::from_field_errors("VALIDATION_ERROR", errors)
            }
            UserServiceError::UserExists(errors) => Self::from_field_errors("CONFLICT", errors),
            UserServiceError::RateLimited(msg) => Self::rate_limited(msg),
            UserServiceError::NotFound(msg) => Self::not_found(format!("User not found: {}", msg)),
            UserServiceError::PermissionDenied(msg) => Self::forbidden(msg),
            UserServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<PortfolioServiceError> for ApiError {
    fn from(err: PortfolioServiceError) -> Self {
        match err {
            PortfolioServiceError::NotFound(msg) => Self::not_found(format!("{} not found", msg)),
            PortfolioServiceError::ValidationError(errors) => {
                Self::from_field_errors("VALIDATION_ERROR", errors)
            }
            PortfolioServiceError::DuplicateSlug(slug) => {
                Self::conflict(format!("Slug '{}' is already in use", slug))
            }
            PortfolioServiceError::PermissionDenied(msg) => Self::forbidden(msg),
            PortfolioServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<BlogServiceError> for ApiError {
    fn from(err: BlogServiceError) -> Self {
        match err {
            BlogServiceError::NotFound(msg) => Self::not_found(format!("{} not found", msg)),
            BlogServiceError::ValidationError(errors) => {
                Self::from_field_errors("VALIDATION_ERROR", errors)
            }
            BlogServiceError::DuplicateSlug(slug) => {
                Self::conflict(format!("Slug '{}' is already in use", slug))
            }
            BlogServiceError::PermissionDenied(msg) => Self::forbidden(msg),
            BlogServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<CommentServiceError> for ApiError {
    fn from(err: CommentServiceError) -> Self {
        match err {
            CommentServiceError::NotFound(msg) => Self::not_found(format!("{} not found", msg)),
            CommentServiceError::ValidationError(errors) => {
                Self::from_field_errors("VALIDATION_ERROR", errors)
            }
            CommentServiceError::PermissionDenied(msg) => Self::forbidden(msg),
            CommentServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<NewsletterServiceError> for ApiError {
    fn from(err: NewsletterServiceError) -> Self {
        match err {
            NewsletterServiceError::ValidationError(errors) => {
                Self::from_field_errors("VALIDATION_ERROR", errors)
            }
            NewsletterServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<TagServiceError> for ApiError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::NotFound(msg) => Self::not_found(format!("{} not found", msg)),
            TagServiceError::ValidationError(msg) => Self::validation_error(msg),
            TagServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<ContactServiceError> for ApiError {
    fn from(err: ContactServiceError) -> Self {
        match err {
            ContactServiceError::NotFound(msg) => Self::not_found(format!("{} not found", msg)),
            ContactServiceError::ValidationError(errors) => {
                Self::from_field_errors("VALIDATION_ERROR", errors)
            }
            ContactServiceError::RateLimited(msg) => Self::rate_limited(msg),
            ContactServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Session token from `Authorization: Bearer` or the `session` cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Optional authentication middleware
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(request.headers()) {
        if let Ok(Some(user)) = state.user_service.validate_session(&token).await {
            request.extensions_mut().insert(AuthenticatedUser(user));
        }
    }
    next.run(request).await
}

/// Admin authorization middleware
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Request statistics middleware
///
/// Records request count, error count and response time.
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;

    let duration_us = start.elapsed().as_micros() as u64;
    state.request_stats.record(response.status(), duration_us);

    response
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer test-token-123")]);
        assert_eq!(extract_session_token(&map), Some("test-token-123".to_string()));
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark; session=test-token-456")]);
        assert_eq!(extract_session_token(&map), Some("test-token-456".to_string()));
    }

    #[test]
    fn test_extract_session_token_bearer_priority() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer bearer-token"),
            (header::COOKIE, "session=cookie-token"),
        ]);
        assert_eq!(extract_session_token(&map), Some("bearer-token".to_string()));
    }

    #[test]
    fn test_extract_session_token_none() {
        assert!(extract_session_token(&HeaderMap::new()).is_none());
        assert!(extract_session_token(&headers(&[(header::AUTHORIZATION, "Basic invalid")])).is_none());
        // a cleared cookie is not a token
        assert!(extract_session_token(&headers(&[(header::COOKIE, "session=")])).is_none());
    }

    #[test]
    fn test_forwarded_ip() {
        let map = headers(&[(
            header::HeaderName::from_static("x-forwarded-for"),
            "203.0.113.7, 10.0.0.1",
        )]);
        assert_eq!(forwarded_ip(&map), Some("203.0.113.7".parse().unwrap()));

        let map = headers(&[(header::HeaderName::from_static("x-real-ip"), "198.51.100.2")]);
        assert_eq!(forwarded_ip(&map), Some("198.51.100.2".parse().unwrap()));

        assert_eq!(forwarded_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::validation_error("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::rate_limited("x").status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ApiError::internal_error("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_field_errors_become_details() {
        let mut errors = FieldErrors::single("content", "This field is required.");
        errors.add(NON_FIELD_ERRORS, "Please correct the errors in your comment.");

        let error: ApiError = CommentServiceError::ValidationError(errors).into();
        assert_eq!(error.error.code, "VALIDATION_ERROR");
        assert_eq!(error.error.message, "Please correct the errors in your comment.");
        let details = error.error.details.unwrap();
        assert_eq!(details["content"][0], "This field is required.");
    }

    #[test]
    fn test_service_error_mapping() {
        let error: ApiError = BlogServiceError::DuplicateSlug("hello".to_string()).into();
        assert_eq!(error.status(), StatusCode::CONFLICT);

        let error: ApiError = ContactServiceError::RateLimited("slow down".to_string()).into();
        assert_eq!(error.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(error.error.message, "slow down");

        let error: ApiError =
            PortfolioServiceError::InternalError(anyhow::anyhow!("disk on fire")).into();
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!error.error.message.contains("disk"));
    }

    #[test]
    fn test_request_stats() {
        let stats = RequestStats::new();
        stats.record(StatusCode::OK, 100);
        stats.record(StatusCode::NOT_FOUND, 300);
        stats.record(StatusCode::INTERNAL_SERVER_ERROR, 200);

        assert_eq!(stats.total_requests(), 3);
        assert_eq!(stats.error_requests(), 2);
        assert!((stats.avg_response_time_us() - 200.0).abs() < f64::EPSILON);
    }
}

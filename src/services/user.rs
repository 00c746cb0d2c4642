//! User service
//!
//! Accounts, sessions and member profiles:
//! - Registration (first user becomes admin)
//! - Login by email, rate limited per email and per IP
//! - Session validation and logout
//! - Public profiles, the member directory and the personal dashboard

use crate::cache::{keys, Cache, CacheLayer};
use crate::db::repositories::{PostRepository, ProjectRepository, SessionRepository, UserRepository};
use crate::models::{
    ListParams, PagedResult, Post, Profile, Project, Session, UpdateProfileInput, UpdateUserInput,
    User, UserRole, UserStatus,
};
use crate::services::password::{hash_password, password_problems, verify_password};
use crate::services::rate_limiter::RateLimiter;
use crate::services::validation::{FieldErrors, NON_FIELD_ERRORS};
use anyhow::Context;
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use uuid::Uuid;

/// Default session lifetime in days
const DEFAULT_SESSION_DAYS: i64 = 7;

/// Members per page in the directory
pub const USERS_PER_PAGE: u32 = 12;

/// Recent items shown on the dashboard
const DASHBOARD_ITEMS: i64 = 5;

pub const REGISTERED_MESSAGE: &str = "Registration successful! You can now log in.";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";
pub const LOGGED_OUT_MESSAGE: &str = "You have been logged out successfully.";
pub const PROFILE_UPDATED_MESSAGE: &str = "Your profile has been updated successfully!";
const TOO_MANY_ATTEMPTS: &str = "Too many login attempts. Please try again later.";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials or inactive account)
    #[error("{0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// Username or email already taken
    #[error("{0}")]
    UserExists(FieldErrors),

    #[error("{0}")]
    RateLimited(String),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Registration form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password1: String,
    pub password2: String,
}

impl RegisterInput {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            username: username.into(),
            email: email.into(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password1: password.clone(),
            password2: password,
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }
}

/// Login form
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub session: Session,
}

impl LoginOutcome {
    pub fn welcome_message(&self) -> String {
        format!("Welcome back, {}!", self.user.first_name)
    }
}

/// Combined account and profile update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    #[serde(flatten)]
    pub user: UpdateUserInput,
    pub profile: UpdateProfileInput,
}

/// A member's public profile
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub user: User,
    pub profile: Profile,
    pub full_name: String,
    pub skill_list: Vec<String>,
    pub is_own_profile: bool,
}

/// Personal dashboard
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub user: User,
    pub profile: Profile,
    pub recent_projects: Vec<Project>,
    pub recent_posts: Vec<Post>,
}

/// User service for accounts, sessions and profiles
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    project_repo: Arc<dyn ProjectRepository>,
    post_repo: Arc<dyn PostRepository>,
    rate_limiter: Arc<RateLimiter>,
    cache: Arc<Cache>,
    session_days: i64,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        project_repo: Arc<dyn ProjectRepository>,
        post_repo: Arc<dyn PostRepository>,
        rate_limiter: Arc<RateLimiter>,
        cache: Arc<Cache>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            project_repo,
            post_repo,
            rate_limiter,
            cache,
            session_days: DEFAULT_SESSION_DAYS,
        }
    }

    /// Override the session lifetime
    pub fn with_session_days(mut self, days: i64) -> Self {
        self.session_days = days.max(1);
        self
    }

    /// Register a new user.
    ///
    /// Every field problem is reported at once. The first account in the
    /// system becomes the site administrator; the profile row is created
    /// together with the user.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();
        let first_name = input.first_name.trim().to_string();
        let last_name = input.last_name.trim().to_string();

        let mut errors = FieldErrors::new();
        if errors.require("username", &username) {
            errors.max_len("username", &username, 150);
            if !USERNAME_RE.is_match(&username) {
                errors.add(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            }
        }
        errors.email("email", &email);
        if errors.require("first_name", &first_name) {
            errors.max_len("first_name", &first_name, 50);
        }
        if errors.require("last_name", &last_name) {
            errors.max_len("last_name", &last_name, 50);
        }
        let has_password1 = errors.require("password1", &input.password1);
        let has_password2 = errors.require("password2", &input.password2);
        if has_password1 && has_password2 {
            if input.password1 != input.password2 {
                errors.add("password2", "The two password fields didn't match.");
            } else {
                for problem in password_problems(&input.password2) {
                    errors.add("password2", problem);
                }
            }
        }
        errors.into_result().map_err(UserServiceError::ValidationError)?;

        let mut taken = FieldErrors::new();
        if self
            .user_repo
            .exists_by_username(&username)
            .await
            .context("Failed to check username")?
        {
            taken.add("username", "A user with that username already exists.");
        }
        if self
            .user_repo
            .exists_by_email(&email)
            .await
            .context("Failed to check email")?
        {
            taken.add("email", "A user with that email already exists.");
        }
        taken.into_result().map_err(UserServiceError::UserExists)?;

        let role = if self.is_first_user().await? {
            UserRole::Admin
        } else {
            UserRole::Member
        };

        let password_hash = hash_password(&input.password1).context("Failed to hash password")?;
        let user = User::new(username, email, password_hash, first_name, last_name, role);

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;
        self.invalidate_member_stats().await;

        tracing::info!(user_id = created.id, username = %created.username, "User registered");
        Ok(created)
    }

    /// Log in by email and password, creating a session
    pub async fn login(
        &self,
        input: LoginInput,
        ip: Option<IpAddr>,
    ) -> Result<LoginOutcome, UserServiceError> {
        let email = input.email.trim();

        if let Some(ip) = ip {
            if self.rate_limiter.is_login_ip_limited(ip).await {
                tracing::warn!(%ip, "Login rate limit reached for IP");
                return Err(UserServiceError::RateLimited(TOO_MANY_ATTEMPTS.to_string()));
            }
            self.rate_limiter.record_login_ip(ip).await;
        }

        if self.rate_limiter.is_email_limited(email).await {
            tracing::warn!(email, "Login rate limit reached for email");
            return Err(UserServiceError::RateLimited(TOO_MANY_ATTEMPTS.to_string()));
        }

        let user = match self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to get user by email")?
        {
            Some(user) => user,
            None => {
                self.rate_limiter.record_failed_login(email).await;
                return Err(UserServiceError::AuthenticationError(
                    INVALID_CREDENTIALS.to_string(),
                ));
            }
        };

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !password_valid {
            self.rate_limiter.record_failed_login(email).await;
            return Err(UserServiceError::AuthenticationError(
                INVALID_CREDENTIALS.to_string(),
            ));
        }

        if !user.is_active() {
            return Err(UserServiceError::AuthenticationError(
                "This account is inactive.".to_string(),
            ));
        }

        self.rate_limiter.clear_failed_logins(email).await;
        let session = self.create_session(user.id).await?;

        Ok(LoginOutcome { user, session })
    }

    /// Logout (invalidate session)
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Expired sessions are deleted; sessions of inactive users are
    /// rejected.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user.filter(User::is_active))
    }

    pub async fn is_first_user(&self) -> Result<bool, UserServiceError> {
        let count = self
            .user_repo
            .count()
            .await
            .context("Failed to count users")?;
        Ok(count == 0)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?)
    }

    /// Look up an active member by username
    pub async fn get_active_by_username(&self, username: &str) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?
            .filter(User::is_active)
            .ok_or_else(|| UserServiceError::NotFound(username.to_string()))
    }

    /// Public profile of `username`, or of the viewer when no username is given
    pub async fn get_profile(
        &self,
        username: Option<&str>,
        viewer: Option<&User>,
    ) -> Result<ProfileView, UserServiceError> {
        let user = match (username, viewer) {
            (Some(username), _) => self.get_active_by_username(username).await?,
            (None, Some(viewer)) => viewer.clone(),
            (None, None) => {
                return Err(UserServiceError::AuthenticationError(
                    "Authentication required".to_string(),
                ))
            }
        };

        let profile = self
            .user_repo
            .get_or_create_profile(user.id)
            .await
            .context("Failed to load profile")?;

        Ok(ProfileView {
            full_name: user.full_name(),
            skill_list: profile.skill_list(),
            is_own_profile: viewer.map(|v| v.id == user.id).unwrap_or(false),
            user,
            profile,
        })
    }

    /// Update the account fields and the profile of a user
    pub async fn update_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
    ) -> Result<ProfileView, UserServiceError> {
        let mut user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| UserServiceError::NotFound(user_id.to_string()))?;
        let mut profile = self
            .user_repo
            .get_or_create_profile(user_id)
            .await
            .context("Failed to load profile")?;

        user.apply(&update.user);
        profile.apply(&update.profile);
        validate_profile(&user, &profile).map_err(UserServiceError::ValidationError)?;

        let user = self
            .user_repo
            .update(&user)
            .await
            .context("Failed to update user")?;
        let profile = self
            .user_repo
            .update_profile(&profile)
            .await
            .context("Failed to update profile")?;

        Ok(ProfileView {
            full_name: user.full_name(),
            skill_list: profile.skill_list(),
            is_own_profile: true,
            user,
            profile,
        })
    }

    /// Active members, newest first, optionally filtered by `q`
    pub async fn list_users(
        &self,
        query: Option<&str>,
        page: u32,
    ) -> Result<PagedResult<User>, UserServiceError> {
        let total = self
            .user_repo
            .count_list_active(query)
            .await
            .context("Failed to count users")?;
        let params = ListParams::new(page, USERS_PER_PAGE).clamp_to(total);
        let users = self
            .user_repo
            .list_active(query, params)
            .await
            .context("Failed to list users")?;

        Ok(PagedResult::new(users, total, &params))
    }

    /// Profile with the member's most recent projects and posts
    pub async fn dashboard(&self, user: &User) -> Result<Dashboard, UserServiceError> {
        let profile = self
            .user_repo
            .get_or_create_profile(user.id)
            .await
            .context("Failed to load profile")?;
        let recent_projects = self
            .project_repo
            .list_by_user(user.id, DASHBOARD_ITEMS)
            .await
            .context("Failed to load recent projects")?;
        let recent_posts = self
            .post_repo
            .list_by_author(user.id, DASHBOARD_ITEMS)
            .await
            .context("Failed to load recent posts")?;

        Ok(Dashboard {
            user: user.clone(),
            profile,
            recent_projects,
            recent_posts,
        })
    }

    /// Activate or deactivate an account. Deactivation ends its sessions.
    pub async fn set_user_status(
        &self,
        admin: &User,
        user_id: i64,
        status: UserStatus,
    ) -> Result<User, UserServiceError> {
        if !admin.is_admin() {
            return Err(UserServiceError::PermissionDenied(
                "Admin privileges required".to_string(),
            ));
        }
        if admin.id == user_id && status == UserStatus::Inactive {
            return Err(UserServiceError::ValidationError(FieldErrors::single(
                NON_FIELD_ERRORS,
                "You cannot deactivate your own account.",
            )));
        }

        self.require_user(user_id).await?;
        self.user_repo
            .set_status(user_id, status)
            .await
            .context("Failed to update user status")?;
        self.invalidate_member_stats().await;
        if status == UserStatus::Inactive {
            self.session_repo
                .delete_by_user(user_id)
                .await
                .context("Failed to end user sessions")?;
        }

        self.require_user(user_id).await
    }

    /// Grant or revoke administrator rights
    pub async fn set_user_role(
        &self,
        admin: &User,
        user_id: i64,
        role: UserRole,
    ) -> Result<User, UserServiceError> {
        if !admin.is_admin() {
            return Err(UserServiceError::PermissionDenied(
                "Admin privileges required".to_string(),
            ));
        }
        if admin.id == user_id && role != UserRole::Admin {
            return Err(UserServiceError::ValidationError(FieldErrors::single(
                NON_FIELD_ERRORS,
                "You cannot remove your own administrator role.",
            )));
        }

        self.require_user(user_id).await?;
        self.user_repo
            .set_role(user_id, role)
            .await
            .context("Failed to update user role")?;

        self.require_user(user_id).await
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    async fn require_user(&self, user_id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| UserServiceError::NotFound(user_id.to_string()))
    }

    /// The about page counts active members
    async fn invalidate_member_stats(&self) {
        let _ = self.cache.delete(keys::PORTFOLIO_STATS).await;
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }
}

fn validate_profile(user: &User, profile: &Profile) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    errors.max_len("first_name", &user.first_name, 50);
    errors.max_len("last_name", &user.last_name, 50);
    errors.max_len("bio", &user.bio, 500);
    errors.max_len("location", &user.location, 100);
    errors.url("website", &user.website);
    errors.url("github", &user.github);
    errors.url("linkedin", &user.linkedin);
    errors.url("twitter", &user.twitter);

    errors.max_len("phone", &profile.phone, 20);
    errors.max_len("company", &profile.company, 100);
    errors.max_len("position", &profile.position, 100);
    if profile.hourly_rate.map(|rate| rate < 0.0).unwrap_or(false) {
        errors.add("hourly_rate", "Ensure this value is greater than or equal to 0.");
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxPostRepository, SqlxProjectRepository, SqlxSessionRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use sqlx::SqlitePool;

    async fn setup_test_service() -> (SqlitePool, UserService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            SqlxProjectRepository::boxed(pool.clone()),
            SqlxPostRepository::boxed(pool.clone()),
            Arc::new(RateLimiter::default()),
            Arc::new(Cache::new()),
        );

        (pool, service)
    }

    async fn register(service: &UserService, username: &str) -> User {
        service
            .register(RegisterInput::new(
                username,
                format!("{}@example.com", username),
                "s3cure-passw0rd",
            ))
            .await
            .expect("Failed to register")
    }

    // ========================================================================
    // Registration tests
    // ========================================================================

    #[tokio::test]
    async fn test_register_first_user_becomes_admin() {
        let (_pool, service) = setup_test_service().await;

        let admin = register(&service, "admin").await;
        let member = register(&service, "member").await;

        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(member.role, UserRole::Member);
    }

    #[tokio::test]
    async fn test_register_creates_profile() {
        let (_pool, service) = setup_test_service().await;
        let user = register(&service, "ada").await;

        let view = service.get_profile(Some("ada"), Some(&user)).await.unwrap();
        assert!(view.is_own_profile);
        assert!(view.profile.is_available_for_hire);
        assert_eq!(view.full_name, "Test User");
    }

    #[tokio::test]
    async fn test_register_reports_every_field() {
        let (_pool, service) = setup_test_service().await;

        let input = RegisterInput {
            username: "bad name!".to_string(),
            email: "nope".to_string(),
            first_name: String::new(),
            last_name: "x".repeat(51),
            password1: "12345678".to_string(),
            password2: "12345678".to_string(),
        };

        match service.register(input).await {
            Err(UserServiceError::ValidationError(errors)) => {
                assert!(errors.contains("username"));
                assert!(errors.contains("email"));
                assert!(errors.contains("first_name"));
                assert!(errors.contains("last_name"));
                assert_eq!(
                    errors.get("password2").unwrap(),
                    ["This password is entirely numeric."]
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let (_pool, service) = setup_test_service().await;

        let mut input = RegisterInput::new("ada", "ada@example.com", "s3cure-passw0rd");
        input.password2 = "different-passw0rd".to_string();

        match service.register(input).await {
            Err(UserServiceError::ValidationError(errors)) => {
                assert_eq!(
                    errors.get("password2").unwrap(),
                    ["The two password fields didn't match."]
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_email_case_insensitive() {
        let (_pool, service) = setup_test_service().await;
        register(&service, "ada").await;

        let result = service
            .register(RegisterInput::new("ada2", "ADA@example.com", "s3cure-passw0rd"))
            .await;

        match result {
            Err(UserServiceError::UserExists(errors)) => {
                assert!(errors.contains("email"));
                assert!(!errors.contains("username"));
            }
            other => panic!("expected UserExists, got {:?}", other),
        }
    }

    // ========================================================================
    // Login tests
    // ========================================================================

    #[tokio::test]
    async fn test_login_and_validate_session() {
        let (_pool, service) = setup_test_service().await;
        let user = register(&service, "ada").await;

        let outcome = service
            .login(LoginInput::new("ada@example.com", "s3cure-passw0rd"), None)
            .await
            .unwrap();
        assert_eq!(outcome.user.id, user.id);
        assert_eq!(outcome.welcome_message(), "Welcome back, Test!");

        let validated = service
            .validate_session(&outcome.session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(validated.id, user.id);

        service.logout(&outcome.session.id).await.unwrap();
        assert!(service
            .validate_session(&outcome.session.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_login_wrong_password_same_message() {
        let (_pool, service) = setup_test_service().await;
        register(&service, "ada").await;

        let wrong_password = service
            .login(LoginInput::new("ada@example.com", "wrong"), None)
            .await
            .unwrap_err();
        let unknown_email = service
            .login(LoginInput::new("nobody@example.com", "wrong"), None)
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), INVALID_CREDENTIALS);
        assert_eq!(unknown_email.to_string(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_login_rate_limited_after_failures() {
        let (_pool, service) = setup_test_service().await;
        register(&service, "ada").await;

        for _ in 0..5 {
            let _ = service
                .login(LoginInput::new("ada@example.com", "wrong"), None)
                .await;
        }

        let result = service
            .login(LoginInput::new("ada@example.com", "s3cure-passw0rd"), None)
            .await;
        assert!(matches!(result, Err(UserServiceError::RateLimited(_))));
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_login() {
        let (_pool, service) = setup_test_service().await;
        let admin = register(&service, "admin").await;
        let member = register(&service, "member").await;

        let outcome = service
            .login(LoginInput::new("member@example.com", "s3cure-passw0rd"), None)
            .await
            .unwrap();

        service
            .set_user_status(&admin, member.id, UserStatus::Inactive)
            .await
            .unwrap();

        assert!(service
            .validate_session(&outcome.session.id)
            .await
            .unwrap()
            .is_none());
        let result = service
            .login(LoginInput::new("member@example.com", "s3cure-passw0rd"), None)
            .await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let (pool, service) = setup_test_service().await;
        let user = register(&service, "ada").await;

        let now = Utc::now();
        SqlxSessionRepository::new(pool.clone())
            .create(&Session {
                id: "stale".to_string(),
                user_id: user.id,
                expires_at: now - Duration::hours(1),
                created_at: now - Duration::days(8),
            })
            .await
            .unwrap();

        assert!(service.validate_session("stale").await.unwrap().is_none());
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    // ========================================================================
    // Profile and directory tests
    // ========================================================================

    #[tokio::test]
    async fn test_update_profile_validates_urls() {
        let (_pool, service) = setup_test_service().await;
        let user = register(&service, "ada").await;

        let update = ProfileUpdate {
            user: UpdateUserInput::new().with_website("not a url"),
            profile: UpdateProfileInput::default(),
        };
        let result = service.update_profile(user.id, &update).await;
        assert!(matches!(result, Err(UserServiceError::ValidationError(ref e)) if e.contains("website")));

        let update = ProfileUpdate {
            user: UpdateUserInput::new()
                .with_website("https://ada.dev")
                .with_bio("Analytical engines"),
            profile: UpdateProfileInput {
                company: Some("Engines Ltd".to_string()),
                hourly_rate: Some(Some(120.0)),
                ..UpdateProfileInput::default()
            },
        };
        let view = service.update_profile(user.id, &update).await.unwrap();
        assert_eq!(view.user.website, "https://ada.dev");
        assert_eq!(view.profile.company, "Engines Ltd");
        assert_eq!(view.profile.hourly_rate, Some(120.0));
    }

    #[tokio::test]
    async fn test_list_users_hides_inactive() {
        let (_pool, service) = setup_test_service().await;
        let admin = register(&service, "admin").await;
        register(&service, "grace").await;
        let hidden = register(&service, "hidden").await;
        service
            .set_user_status(&admin, hidden.id, UserStatus::Inactive)
            .await
            .unwrap();

        let page = service.list_users(None, 1).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.per_page, USERS_PER_PAGE);

        let found = service.list_users(Some("gra"), 1).await.unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].username, "grace");

        assert!(matches!(
            service.get_profile(Some("hidden"), None).await,
            Err(UserServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_guards() {
        let (_pool, service) = setup_test_service().await;
        let admin = register(&service, "admin").await;
        let member = register(&service, "member").await;

        assert!(matches!(
            service.set_user_role(&member, admin.id, UserRole::Member).await,
            Err(UserServiceError::PermissionDenied(_))
        ));
        assert!(matches!(
            service.set_user_role(&admin, admin.id, UserRole::Member).await,
            Err(UserServiceError::ValidationError(_))
        ));

        let promoted = service
            .set_user_role(&admin, member.id, UserRole::Admin)
            .await
            .unwrap();
        assert!(promoted.is_admin());
    }

    #[tokio::test]
    async fn test_dashboard_empty_for_new_member() {
        let (_pool, service) = setup_test_service().await;
        let user = register(&service, "ada").await;

        let dashboard = service.dashboard(&user).await.unwrap();
        assert_eq!(dashboard.profile.user_id, user.id);
        assert!(dashboard.recent_projects.is_empty());
        assert!(dashboard.recent_posts.is_empty());
    }

    #[tokio::test]
    async fn test_member_changes_refresh_about_stats() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let cache = Arc::new(Cache::new());
        let service = UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            SqlxProjectRepository::boxed(pool.clone()),
            SqlxPostRepository::boxed(pool.clone()),
            Arc::new(RateLimiter::default()),
            cache.clone(),
        );

        cache
            .set(keys::PORTFOLIO_STATS, &1i64, cache.default_ttl())
            .await
            .unwrap();
        let admin = register(&service, "admin").await;
        assert!(cache.get::<i64>(keys::PORTFOLIO_STATS).await.unwrap().is_none());

        let member = register(&service, "member").await;
        cache
            .set(keys::PORTFOLIO_STATS, &2i64, cache.default_ttl())
            .await
            .unwrap();
        service
            .set_user_status(&admin, member.id, UserStatus::Inactive)
            .await
            .unwrap();
        assert!(cache.get::<i64>(keys::PORTFOLIO_STATS).await.unwrap().is_none());
    }
}

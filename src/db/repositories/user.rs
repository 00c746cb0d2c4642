//! User repository
//!
//! Database operations for user accounts and their 1:1 profiles.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite

use super::contains_pattern;
use crate::models::{DeveloperSummary, ListParams, Profile, User, UserRole, UserStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user; the profile row is created alongside
    async fn create(&self, user: &User) -> Result<User>;

    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Case-insensitive lookup
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn exists_by_username(&self, username: &str) -> Result<bool>;

    async fn exists_by_email(&self, email: &str) -> Result<bool>;

    /// Update the account fields (not the password, role or status)
    async fn update(&self, user: &User) -> Result<User>;

    async fn set_role(&self, id: i64, role: UserRole) -> Result<()>;

    async fn set_status(&self, id: i64, status: UserStatus) -> Result<()>;

    /// Delete an account; profile, sessions, projects, posts and comments
    /// go with it
    async fn delete(&self, id: i64) -> Result<()>;

    /// Total number of accounts
    async fn count(&self) -> Result<i64>;

    async fn count_active(&self) -> Result<i64>;

    /// Active users newest first, optionally filtered by a substring of
    /// first name, last name, username or bio
    async fn list_active(&self, query: Option<&str>, params: ListParams) -> Result<Vec<User>>;

    async fn count_list_active(&self, query: Option<&str>) -> Result<i64>;

    /// Active users owning at least one project, newest accounts first
    async fn list_with_projects(&self, limit: i64) -> Result<Vec<DeveloperSummary>>;

    /// Active users owning at least one project, by project count
    async fn list_top_developers(&self, limit: i64) -> Result<Vec<DeveloperSummary>>;

    /// Get the profile, creating an empty one when missing
    async fn get_or_create_profile(&self, user_id: i64) -> Result<Profile>;

    async fn update_profile(&self, profile: &Profile) -> Result<Profile>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        create_user(&self.pool, user).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        get_user_where(&self.pool, "id = ?", UserKey::Id(id)).await
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        get_user_where(&self.pool, "username = ?", UserKey::Text(username)).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        get_user_where(&self.pool, "email = ? COLLATE NOCASE", UserKey::Text(email)).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check username existence")?;
        Ok(count > 0)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ? COLLATE NOCASE")
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .context("Failed to check email existence")?;
        Ok(count > 0)
    }

    async fn update(&self, user: &User) -> Result<User> {
        update_user(&self.pool, user).await
    }

    async fn set_role(&self, id: i64, role: UserRole) -> Result<()> {
        sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update user role")?;
        Ok(())
    }

    async fn set_status(&self, id: i64, status: UserStatus) -> Result<()> {
        sqlx::query("UPDATE users SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update user status")?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")
    }

    async fn count_active(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE status = 'active'")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count active users")
    }

    async fn list_active(&self, query: Option<&str>, params: ListParams) -> Result<Vec<User>> {
        list_active_users(&self.pool, query, params).await
    }

    async fn count_list_active(&self, query: Option<&str>) -> Result<i64> {
        count_active_users(&self.pool, query).await
    }

    async fn list_with_projects(&self, limit: i64) -> Result<Vec<DeveloperSummary>> {
        list_developers(&self.pool, "u.created_at DESC, u.id DESC", limit).await
    }

    async fn list_top_developers(&self, limit: i64) -> Result<Vec<DeveloperSummary>> {
        list_developers(&self.pool, "project_count DESC, u.id ASC", limit).await
    }

    async fn get_or_create_profile(&self, user_id: i64) -> Result<Profile> {
        get_or_create_profile(&self.pool, user_id).await
    }

    async fn update_profile(&self, profile: &Profile) -> Result<Profile> {
        update_profile(&self.pool, profile).await
    }
}

// ============================================================================
// Users
// ============================================================================

const USER_COLUMNS: &str = r#"
    u.id, u.username, u.email, u.password_hash, u.first_name, u.last_name, u.bio,
    u.location, u.website, u.github, u.linkedin, u.twitter, u.profile_picture,
    u.is_verified, u.role, u.status, u.created_at, u.updated_at
"#;

enum UserKey<'a> {
    Id(i64),
    Text(&'a str),
}

async fn create_user(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, first_name, last_name, bio,
            location, website, github, linkedin, twitter, profile_picture, is_verified,
            role, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.bio)
    .bind(&user.location)
    .bind(&user.website)
    .bind(&user.github)
    .bind(&user.linkedin)
    .bind(&user.twitter)
    .bind(&user.profile_picture)
    .bind(user.is_verified)
    .bind(user.role.as_str())
    .bind(user.status.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_rowid();

    sqlx::query("INSERT INTO profiles (user_id) VALUES (?)")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to create profile")?;

    tx.commit().await.context("Failed to commit user creation")?;

    Ok(User {
        id,
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

async fn get_user_where(pool: &SqlitePool, condition: &str, key: UserKey<'_>) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users u WHERE u.{}", USER_COLUMNS, condition);
    let query = sqlx::query(&sql);
    let query = match key {
        UserKey::Id(id) => query.bind(id),
        UserKey::Text(value) => query.bind(value),
    };

    let row = query
        .fetch_optional(pool)
        .await
        .context("Failed to get user")?;

    row.as_ref().map(row_to_user).transpose()
}

async fn update_user(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET first_name = ?, last_name = ?, bio = ?, location = ?, website = ?, github = ?,
            linkedin = ?, twitter = ?, profile_picture = ?, is_verified = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.bio)
    .bind(&user.location)
    .bind(&user.website)
    .bind(&user.github)
    .bind(&user.linkedin)
    .bind(&user.twitter)
    .bind(&user.profile_picture)
    .bind(user.is_verified)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    get_user_where(pool, "id = ?", UserKey::Id(user.id))
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

fn active_search_pattern(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(contains_pattern)
}

async fn list_active_users(
    pool: &SqlitePool,
    query: Option<&str>,
    params: ListParams,
) -> Result<Vec<User>> {
    let pattern = active_search_pattern(query);
    let sql = format!(
        r#"
        SELECT {}
        FROM users u
        WHERE u.status = 'active'
          AND (?1 IS NULL OR u.first_name LIKE ?1 ESCAPE '\' OR u.last_name LIKE ?1 ESCAPE '\'
               OR u.username LIKE ?1 ESCAPE '\' OR u.bio LIKE ?1 ESCAPE '\')
        ORDER BY u.created_at DESC, u.id DESC
        LIMIT ?2 OFFSET ?3
        "#,
        USER_COLUMNS
    );

    let rows = sqlx::query(&sql)
        .bind(pattern)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    rows.iter().map(row_to_user).collect()
}

async fn count_active_users(pool: &SqlitePool, query: Option<&str>) -> Result<i64> {
    let pattern = active_search_pattern(query);
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM users u
        WHERE u.status = 'active'
          AND (?1 IS NULL OR u.first_name LIKE ?1 ESCAPE '\' OR u.last_name LIKE ?1 ESCAPE '\'
               OR u.username LIKE ?1 ESCAPE '\' OR u.bio LIKE ?1 ESCAPE '\')
        "#,
    )
    .bind(pattern)
    .fetch_one(pool)
    .await
    .context("Failed to count users")
}

async fn list_developers(pool: &SqlitePool, order: &str, limit: i64) -> Result<Vec<DeveloperSummary>> {
    let sql = format!(
        r#"
        SELECT {}, COUNT(p.id) AS project_count
        FROM users u
        JOIN projects p ON p.user_id = u.id
        WHERE u.status = 'active'
        GROUP BY u.id
        ORDER BY {}
        LIMIT ?
        "#,
        USER_COLUMNS, order
    );

    let rows = sqlx::query(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list developers")?;

    rows.iter()
        .map(|row| {
            Ok(DeveloperSummary {
                user: row_to_user(row)?,
                project_count: row.get("project_count"),
            })
        })
        .collect()
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role: String = row.get("role");
    let status: String = row.get("status");

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        bio: row.get("bio"),
        location: row.get("location"),
        website: row.get("website"),
        github: row.get("github"),
        linkedin: row.get("linkedin"),
        twitter: row.get("twitter"),
        profile_picture: row.get("profile_picture"),
        is_verified: row.get("is_verified"),
        role: UserRole::from_db(&role),
        status: UserStatus::from_db(&status),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// Profiles
// ============================================================================

async fn get_or_create_profile(pool: &SqlitePool, user_id: i64) -> Result<Profile> {
    sqlx::query("INSERT OR IGNORE INTO profiles (user_id) VALUES (?)")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to create profile")?;

    let row = sqlx::query(
        r#"
        SELECT id, user_id, phone, date_of_birth, company, position, skills, resume,
               is_available_for_hire, hourly_rate
        FROM profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("Failed to get profile")?;

    Ok(Profile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        phone: row.get("phone"),
        date_of_birth: row.get("date_of_birth"),
        company: row.get("company"),
        position: row.get("position"),
        skills: row.get("skills"),
        resume: row.get("resume"),
        is_available_for_hire: row.get("is_available_for_hire"),
        hourly_rate: row.get("hourly_rate"),
    })
}

async fn update_profile(pool: &SqlitePool, profile: &Profile) -> Result<Profile> {
    sqlx::query(
        r#"
        UPDATE profiles
        SET phone = ?, date_of_birth = ?, company = ?, position = ?, skills = ?, resume = ?,
            is_available_for_hire = ?, hourly_rate = ?
        WHERE user_id = ?
        "#,
    )
    .bind(&profile.phone)
    .bind(profile.date_of_birth)
    .bind(&profile.company)
    .bind(&profile.position)
    .bind(&profile.skills)
    .bind(&profile.resume)
    .bind(profile.is_available_for_hire)
    .bind(profile.hourly_rate)
    .bind(profile.user_id)
    .execute(pool)
    .await
    .context("Failed to update profile")?;

    get_or_create_profile(pool, profile.user_id).await
}

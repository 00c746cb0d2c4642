//! Database migrations module
//!
//! All migrations are embedded directly in Rust code as SQL strings so the
//! server ships as a single binary.
//!
//! # Usage
//!
//! ```ignore
//! use portfolio_platform::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```
//!
//! Each migration is a `Migration` with a unique `version`, a readable
//! `name` and the SQL to apply. Applied versions are recorded in the
//! `_migrations` table, so running twice is a no-op.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements to apply
    pub up: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users_and_profiles",
        up: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE COLLATE NOCASE,
                password_hash VARCHAR(255) NOT NULL,
                first_name VARCHAR(50) NOT NULL DEFAULT '',
                last_name VARCHAR(50) NOT NULL DEFAULT '',
                bio TEXT NOT NULL DEFAULT '',
                location VARCHAR(100) NOT NULL DEFAULT '',
                website VARCHAR(200) NOT NULL DEFAULT '',
                github VARCHAR(200) NOT NULL DEFAULT '',
                linkedin VARCHAR(200) NOT NULL DEFAULT '',
                twitter VARCHAR(200) NOT NULL DEFAULT '',
                profile_picture VARCHAR(255) NOT NULL DEFAULT 'default_profile.jpg',
                is_verified BOOLEAN NOT NULL DEFAULT 0,
                role VARCHAR(20) NOT NULL DEFAULT 'member',
                status VARCHAR(20) NOT NULL DEFAULT 'active',
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at);
            CREATE TABLE IF NOT EXISTS profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE,
                phone VARCHAR(20) NOT NULL DEFAULT '',
                date_of_birth DATE,
                company VARCHAR(100) NOT NULL DEFAULT '',
                position VARCHAR(100) NOT NULL DEFAULT '',
                skills TEXT NOT NULL DEFAULT '',
                resume VARCHAR(255) NOT NULL DEFAULT '',
                is_available_for_hire BOOLEAN NOT NULL DEFAULT 1,
                hourly_rate REAL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_tags",
        up: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL UNIQUE,
                slug VARCHAR(100) NOT NULL UNIQUE,
                created_at TIMESTAMP NOT NULL
            );
        "#,
    },
    Migration {
        version: 4,
        name: "create_portfolio",
        up: r#"
            CREATE TABLE IF NOT EXISTS portfolio_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL UNIQUE,
                slug VARCHAR(100) NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                icon VARCHAR(50) NOT NULL DEFAULT '',
                color VARCHAR(7) NOT NULL DEFAULT '#007bff',
                created_at TIMESTAMP NOT NULL
            );
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                slug VARCHAR(200) NOT NULL UNIQUE,
                description TEXT NOT NULL,
                short_description VARCHAR(300) NOT NULL,
                category_id INTEGER,
                user_id INTEGER NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'completed',
                start_date DATE,
                end_date DATE,
                client VARCHAR(200) NOT NULL DEFAULT '',
                budget REAL,
                featured_image VARCHAR(255) NOT NULL DEFAULT '',
                demo_url VARCHAR(200) NOT NULL DEFAULT '',
                source_url VARCHAR(200) NOT NULL DEFAULT '',
                technologies TEXT NOT NULL DEFAULT '',
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                is_published BOOLEAN NOT NULL DEFAULT 1,
                views INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                FOREIGN KEY (category_id) REFERENCES portfolio_categories(id) ON DELETE SET NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_projects_created_at ON projects(created_at);
            CREATE INDEX IF NOT EXISTS idx_projects_featured ON projects(is_featured, created_at);
            CREATE INDEX IF NOT EXISTS idx_projects_published ON projects(is_published, created_at);
            CREATE TABLE IF NOT EXISTS project_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL,
                image VARCHAR(255) NOT NULL,
                caption VARCHAR(200) NOT NULL DEFAULT '',
                sort_order INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS project_tags (
                project_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (project_id, tag_id),
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS project_likes (
                project_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL,
                PRIMARY KEY (project_id, user_id),
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 5,
        name: "create_resume",
        up: r#"
            CREATE TABLE IF NOT EXISTS skills (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                proficiency VARCHAR(20) NOT NULL,
                percentage INTEGER NOT NULL DEFAULT 0,
                icon VARCHAR(50) NOT NULL DEFAULT '',
                category VARCHAR(100) NOT NULL DEFAULT '',
                user_id INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL,
                UNIQUE (name, user_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS experiences (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                company VARCHAR(200) NOT NULL,
                position VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                location VARCHAR(200) NOT NULL DEFAULT '',
                start_date DATE NOT NULL,
                end_date DATE,
                is_current BOOLEAN NOT NULL DEFAULT 0,
                company_url VARCHAR(200) NOT NULL DEFAULT '',
                skills_used TEXT NOT NULL DEFAULT '',
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS education (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                institution VARCHAR(200) NOT NULL,
                degree VARCHAR(20) NOT NULL,
                field_of_study VARCHAR(200) NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                start_date DATE NOT NULL,
                end_date DATE,
                is_current BOOLEAN NOT NULL DEFAULT 0,
                grade VARCHAR(50) NOT NULL DEFAULT '',
                institution_url VARCHAR(200) NOT NULL DEFAULT '',
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS achievements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                issuer VARCHAR(200) NOT NULL,
                date_received DATE NOT NULL,
                credential_id VARCHAR(100) NOT NULL DEFAULT '',
                credential_url VARCHAR(200) NOT NULL DEFAULT '',
                image VARCHAR(255) NOT NULL DEFAULT '',
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS testimonials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                client_name VARCHAR(200) NOT NULL,
                client_position VARCHAR(200) NOT NULL DEFAULT '',
                client_company VARCHAR(200) NOT NULL DEFAULT '',
                client_image VARCHAR(255) NOT NULL DEFAULT '',
                testimonial TEXT NOT NULL,
                rating INTEGER NOT NULL DEFAULT 5 CHECK (rating BETWEEN 1 AND 5),
                project_id INTEGER,
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE SET NULL
            );
        "#,
    },
    Migration {
        version: 6,
        name: "create_blog",
        up: r#"
            CREATE TABLE IF NOT EXISTS blog_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL UNIQUE,
                slug VARCHAR(100) NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                color VARCHAR(7) NOT NULL DEFAULT '#007bff',
                created_at TIMESTAMP NOT NULL
            );
            CREATE TABLE IF NOT EXISTS blog_series (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                slug VARCHAR(200) NOT NULL UNIQUE,
                description TEXT NOT NULL,
                image VARCHAR(255) NOT NULL DEFAULT '',
                author_id INTEGER NOT NULL,
                is_completed BOOLEAN NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                slug VARCHAR(200) NOT NULL UNIQUE,
                author_id INTEGER NOT NULL,
                category_id INTEGER,
                excerpt VARCHAR(300) NOT NULL,
                content TEXT NOT NULL,
                featured_image VARCHAR(255) NOT NULL DEFAULT '',
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                reading_time INTEGER NOT NULL DEFAULT 0,
                meta_title VARCHAR(60) NOT NULL DEFAULT '',
                meta_description VARCHAR(160) NOT NULL DEFAULT '',
                views INTEGER NOT NULL DEFAULT 0,
                series_id INTEGER,
                series_order INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                published_at TIMESTAMP,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (category_id) REFERENCES blog_categories(id) ON DELETE SET NULL,
                FOREIGN KEY (series_id) REFERENCES blog_series(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at);
            CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status, created_at);
            CREATE INDEX IF NOT EXISTS idx_posts_featured ON posts(is_featured, created_at);
            CREATE TABLE IF NOT EXISTS post_tags (
                post_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (post_id, tag_id),
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS post_likes (
                post_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL,
                PRIMARY KEY (post_id, user_id),
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                parent_id INTEGER,
                content TEXT NOT NULL,
                is_approved BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (parent_id) REFERENCES comments(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments(post_id);
            CREATE TABLE IF NOT EXISTS newsletters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE COLLATE NOCASE,
                name VARCHAR(100) NOT NULL DEFAULT '',
                is_active BOOLEAN NOT NULL DEFAULT 1,
                subscribed_at TIMESTAMP NOT NULL
            );
        "#,
    },
    Migration {
        version: 7,
        name: "create_contact",
        up: r#"
            CREATE TABLE IF NOT EXISTS contact_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL,
                phone VARCHAR(20) NOT NULL DEFAULT '',
                company VARCHAR(100) NOT NULL DEFAULT '',
                website VARCHAR(200) NOT NULL DEFAULT '',
                subject VARCHAR(20) NOT NULL DEFAULT 'general',
                subject_custom VARCHAR(200) NOT NULL DEFAULT '',
                message TEXT NOT NULL,
                project_budget VARCHAR(50) NOT NULL DEFAULT '',
                project_timeline VARCHAR(100) NOT NULL DEFAULT '',
                status VARCHAR(20) NOT NULL DEFAULT 'new',
                priority VARCHAR(10) NOT NULL DEFAULT 'medium',
                ip_address VARCHAR(45),
                user_agent TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                read_at TIMESTAMP,
                replied_at TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_contact_messages_created_at ON contact_messages(created_at);
            CREATE INDEX IF NOT EXISTS idx_contact_messages_status ON contact_messages(status, created_at);
            CREATE INDEX IF NOT EXISTS idx_contact_messages_email ON contact_messages(email);
            CREATE TABLE IF NOT EXISTS contact_replies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id INTEGER NOT NULL,
                admin_user_id INTEGER NOT NULL,
                subject VARCHAR(200) NOT NULL,
                message TEXT NOT NULL,
                is_sent BOOLEAN NOT NULL DEFAULT 0,
                sent_at TIMESTAMP,
                created_at TIMESTAMP NOT NULL,
                FOREIGN KEY (message_id) REFERENCES contact_messages(id) ON DELETE CASCADE,
                FOREIGN KEY (admin_user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS faqs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question VARCHAR(300) NOT NULL,
                answer TEXT NOT NULL,
                category VARCHAR(20) NOT NULL DEFAULT 'general',
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
            CREATE TABLE IF NOT EXISTS contact_info (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                business_name VARCHAR(100) NOT NULL DEFAULT 'Portfolio Platform',
                tagline VARCHAR(200) NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                email VARCHAR(255) NOT NULL,
                phone VARCHAR(20) NOT NULL DEFAULT '',
                address TEXT NOT NULL DEFAULT '',
                website VARCHAR(200) NOT NULL DEFAULT '',
                linkedin VARCHAR(200) NOT NULL DEFAULT '',
                twitter VARCHAR(200) NOT NULL DEFAULT '',
                facebook VARCHAR(200) NOT NULL DEFAULT '',
                instagram VARCHAR(200) NOT NULL DEFAULT '',
                github VARCHAR(200) NOT NULL DEFAULT '',
                business_hours TEXT NOT NULL DEFAULT '',
                latitude REAL,
                longitude REAL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
        "#,
    },
];

/// Run all pending migrations
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create migrations table")?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    let records = rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect();

    Ok(records)
}

/// Apply a single migration inside a transaction
async fn apply_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    for statement in split_sql_statements(migration.up) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name, applied_at) VALUES (?, ?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    tx.commit().await.context("Failed to commit migration")?;
    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        let cut = (0..=100).rev().find(|i| sql.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &sql[..cut])
    } else {
        sql.to_string()
    }
}

/// Split SQL into individual statements, dropping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &SqlitePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Get pending migrations count
pub async fn pending_count(pool: &SqlitePool) -> Result<usize> {
    create_migrations_table(pool).await?;
    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

/// Get the total number of migrations defined
pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}

/// Get migration by version
pub fn get_migration(version: i32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn migrated_pool() -> SqlitePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    async fn table_exists(pool: &SqlitePool, name: &str) -> bool {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(name)
                .fetch_optional(pool)
                .await
                .expect("Failed to query sqlite_master");
        row.is_some()
    }

    async fn insert_user(pool: &SqlitePool, username: &str, email: &str) -> i64 {
        sqlx::query(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at) VALUES (?, ?, 'hash', ?, ?)",
        )
        .bind(username)
        .bind(email)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("Failed to insert user")
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let applied = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(applied, MIGRATIONS.len());

        let applied = run_migrations(&pool).await.expect("Failed to rerun migrations");
        assert_eq!(applied, 0);
        assert!(is_up_to_date(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_pending_count() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        assert_eq!(pending_count(&pool).await.unwrap(), total_migrations());

        run_migrations(&pool).await.unwrap();
        assert_eq!(pending_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_all_tables_created() {
        let pool = migrated_pool().await;

        for table in [
            "users",
            "profiles",
            "sessions",
            "tags",
            "portfolio_categories",
            "projects",
            "project_images",
            "project_tags",
            "project_likes",
            "skills",
            "experiences",
            "education",
            "achievements",
            "testimonials",
            "blog_categories",
            "blog_series",
            "posts",
            "post_tags",
            "post_likes",
            "comments",
            "newsletters",
            "contact_messages",
            "contact_replies",
            "faqs",
            "contact_info",
        ] {
            assert!(table_exists(&pool, table).await, "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_foreign_key_constraints() {
        let pool = migrated_pool().await;

        let result = sqlx::query(
            "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES ('s1', 999, ?, ?)",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unique_email_is_case_insensitive() {
        let pool = migrated_pool().await;
        insert_user(&pool, "first", "Same@Example.com").await;

        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at) VALUES ('second', 'same@example.com', 'h', ?, ?)",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_skill_unique_per_user() {
        let pool = migrated_pool().await;
        let alice = insert_user(&pool, "alice", "alice@example.com").await;
        let bob = insert_user(&pool, "bob", "bob@example.com").await;

        let insert = |user_id: i64| {
            sqlx::query(
                "INSERT INTO skills (name, proficiency, user_id, created_at) VALUES ('Rust', 'expert', ?, ?)",
            )
            .bind(user_id)
            .bind(Utc::now())
            .execute(&pool)
        };

        insert(alice).await.expect("first skill");
        insert(bob).await.expect("same name for another user");
        assert!(insert(alice).await.is_err());
    }

    #[tokio::test]
    async fn test_deleting_category_nulls_project_reference() {
        let pool = migrated_pool().await;
        let user_id = insert_user(&pool, "owner", "owner@example.com").await;
        let now = Utc::now();

        let category_id = sqlx::query(
            "INSERT INTO portfolio_categories (name, slug, created_at) VALUES ('Web', 'web', ?)",
        )
        .bind(now)
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

        sqlx::query(
            "INSERT INTO projects (title, slug, description, short_description, category_id, user_id, created_at, updated_at) VALUES ('P', 'p', 'd', 's', ?, ?, ?, ?)",
        )
        .bind(category_id)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query("DELETE FROM portfolio_categories WHERE id = ?")
            .bind(category_id)
            .execute(&pool)
            .await
            .unwrap();

        let category: Option<i64> = sqlx::query_scalar("SELECT category_id FROM projects WHERE slug = 'p'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(category.is_none());

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&pool)
            .await
            .unwrap();
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_get_migration() {
        let migration = get_migration(1).expect("Migration 1 should exist");
        assert_eq!(migration.name, "create_users_and_profiles");
        assert!(get_migration(999).is_none());
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INTEGER);\n-- just a note\n;\nCREATE INDEX i ON a(id);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE"));
        assert!(statements[1].starts_with("CREATE INDEX"));
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- comment\n   -- another"));
        assert!(!is_comment_only("-- comment\nSELECT 1"));
    }

    #[test]
    fn test_versions_are_sequential() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, i + 1);
        }
    }
}

//! SQLite connection pool
//!
//! Builds the pool from `DatabaseConfig`. File-backed databases get their
//! parent directory created on demand; `:memory:` yields a private in-memory
//! database used by the test suites.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::DatabaseConfig;

/// Create a SQLite connection pool from configuration.
///
/// Foreign keys are enabled on every pooled connection so that cascade and
/// set-null rules declared in the schema are enforced.
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let path = config.path.as_str();

    if !is_memory(path) {
        let file_path = path.trim_start_matches("sqlite:");
        if let Some(parent) = std::path::Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
            }
        }
    }

    let options = SqliteConnectOptions::from_str(&connection_url(path))
        .with_context(|| format!("Invalid SQLite database path: {}", path))?
        .foreign_keys(true);

    // An in-memory database lives as long as its single connection.
    let max_connections = if is_memory(path) {
        1
    } else {
        config.max_connections.max(1)
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .min_connections(if is_memory(path) { 1 } else { 0 })
        .idle_timeout(None)
        .max_lifetime(if is_memory(path) { None } else { Some(std::time::Duration::from_secs(1800)) })
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", path))?;

    Ok(pool)
}

/// Create a SQLite in-memory database pool for testing
pub async fn create_test_pool() -> Result<SqlitePool> {
    let config = DatabaseConfig {
        path: ":memory:".to_string(),
        ..DatabaseConfig::default()
    };
    create_pool(&config).await
}

/// Check that the database answers queries
pub async fn ping(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Database ping failed")?;
    Ok(())
}

fn is_memory(path: &str) -> bool {
    path == ":memory:" || path.starts_with("sqlite::memory:")
}

/// Build the connection URL with create mode for file-based databases
fn connection_url(path: &str) -> String {
    if path == ":memory:" {
        "sqlite::memory:".to_string()
    } else if path.starts_with("sqlite:") {
        if path.contains('?') {
            path.to_string()
        } else {
            format!("{}?mode=rwc", path)
        }
    } else {
        format!("sqlite:{}?mode=rwc", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_url() {
        assert_eq!(connection_url(":memory:"), "sqlite::memory:");
        assert_eq!(connection_url("data/site.db"), "sqlite:data/site.db?mode=rwc");
        assert_eq!(connection_url("sqlite:site.db"), "sqlite:site.db?mode=rwc");
        assert_eq!(connection_url("sqlite:site.db?mode=ro"), "sqlite:site.db?mode=ro");
    }

    #[tokio::test]
    async fn test_create_test_pool() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        ping(&pool).await.expect("Ping should succeed");
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .expect("Failed to read pragma");
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_sqlite_nested_directory_creation() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("dir").join("test.db");

        let config = DatabaseConfig {
            path: db_path.to_string_lossy().to_string(),
            ..DatabaseConfig::default()
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        ping(&pool).await.expect("Ping should succeed");

        assert!(db_path.exists());
    }
}

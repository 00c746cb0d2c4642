//! Newsletter subscription repository

use crate::models::Newsletter;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait NewsletterRepository: Send + Sync {
    /// Return the subscription for an email, creating it when missing.
    ///
    /// The flag is `true` when a new row was inserted.
    async fn get_or_create(&self, email: &str, name: &str) -> Result<(Newsletter, bool)>;

    async fn get_by_email(&self, email: &str) -> Result<Option<Newsletter>>;

    /// Active subscriptions, newest first
    async fn list_active(&self) -> Result<Vec<Newsletter>>;

    async fn set_active(&self, email: &str, active: bool) -> Result<()>;
}

pub struct SqlxNewsletterRepository {
    pool: SqlitePool,
}

impl SqlxNewsletterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn NewsletterRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsletterRepository for SqlxNewsletterRepository {
    async fn get_or_create(&self, email: &str, name: &str) -> Result<(Newsletter, bool)> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO newsletters (email, name, is_active, subscribed_at) VALUES (?, ?, 1, ?)",
        )
        .bind(email)
        .bind(name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to create newsletter subscription")?;

        let subscription = self
            .get_by_email(email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Subscription not found after insert"))?;

        Ok((subscription, result.rows_affected() > 0))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Newsletter>> {
        let row = sqlx::query(
            "SELECT id, email, name, is_active, subscribed_at FROM newsletters WHERE email = ? COLLATE NOCASE",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get subscription by email")?;
        Ok(row.as_ref().map(row_to_newsletter))
    }

    async fn list_active(&self) -> Result<Vec<Newsletter>> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, name, is_active, subscribed_at
            FROM newsletters
            WHERE is_active = 1
            ORDER BY subscribed_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list subscriptions")?;
        Ok(rows.iter().map(row_to_newsletter).collect())
    }

    async fn set_active(&self, email: &str, active: bool) -> Result<()> {
        sqlx::query("UPDATE newsletters SET is_active = ? WHERE email = ? COLLATE NOCASE")
            .bind(active)
            .bind(email)
            .execute(&self.pool)
            .await
            .context("Failed to update subscription")?;
        Ok(())
    }
}

fn row_to_newsletter(row: &sqlx::sqlite::SqliteRow) -> Newsletter {
    Newsletter {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        is_active: row.get("is_active"),
        subscribed_at: row.get("subscribed_at"),
    }
}

//! Portfolio category repository

use crate::models::{CategoryWithCount, PortfolioCategory};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait PortfolioCategoryRepository: Send + Sync {
    async fn create(&self, category: &PortfolioCategory) -> Result<PortfolioCategory>;

    async fn get_by_id(&self, id: i64) -> Result<Option<PortfolioCategory>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<PortfolioCategory>>;

    /// All categories ordered by name
    async fn list(&self) -> Result<Vec<PortfolioCategory>>;

    /// Categories having at least one published project, with the count
    async fn list_with_counts(&self, limit: i64) -> Result<Vec<CategoryWithCount<PortfolioCategory>>>;

    async fn update(&self, category: &PortfolioCategory) -> Result<PortfolioCategory>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn exists_by_name(&self, name: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

pub struct SqlxPortfolioCategoryRepository {
    pool: SqlitePool,
}

impl SqlxPortfolioCategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn PortfolioCategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

const COLUMNS: &str = "c.id, c.name, c.slug, c.description, c.icon, c.color, c.created_at";

#[async_trait]
impl PortfolioCategoryRepository for SqlxPortfolioCategoryRepository {
    async fn create(&self, category: &PortfolioCategory) -> Result<PortfolioCategory> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO portfolio_categories (name, slug, description, icon, color, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.icon)
        .bind(&category.color)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create portfolio category")?;

        Ok(PortfolioCategory {
            id: result.last_insert_rowid(),
            created_at: now,
            ..category.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<PortfolioCategory>> {
        let row = sqlx::query(&format!("SELECT {} FROM portfolio_categories c WHERE c.id = ?", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get portfolio category by ID")?;
        Ok(row.as_ref().map(row_to_category))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<PortfolioCategory>> {
        let row = sqlx::query(&format!("SELECT {} FROM portfolio_categories c WHERE c.slug = ?", COLUMNS))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get portfolio category by slug")?;
        Ok(row.as_ref().map(row_to_category))
    }

    async fn list(&self) -> Result<Vec<PortfolioCategory>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM portfolio_categories c ORDER BY c.name ASC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list portfolio categories")?;
        Ok(rows.iter().map(row_to_category).collect())
    }

    async fn list_with_counts(&self, limit: i64) -> Result<Vec<CategoryWithCount<PortfolioCategory>>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}, COUNT(p.id) AS item_count
            FROM portfolio_categories c
            JOIN projects p ON p.category_id = c.id AND p.is_published = 1
            GROUP BY c.id
            ORDER BY c.name ASC
            LIMIT ?
            "#,
            COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list portfolio categories with counts")?;

        Ok(rows
            .iter()
            .map(|row| CategoryWithCount {
                category: row_to_category(row),
                count: row.get("item_count"),
            })
            .collect())
    }

    async fn update(&self, category: &PortfolioCategory) -> Result<PortfolioCategory> {
        sqlx::query(
            r#"
            UPDATE portfolio_categories
            SET name = ?, slug = ?, description = ?, icon = ?, color = ?
            WHERE id = ?
            "#,
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.icon)
        .bind(&category.color)
        .bind(category.id)
        .execute(&self.pool)
        .await
        .context("Failed to update portfolio category")?;

        self.get_by_id(category.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Portfolio category not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM portfolio_categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete portfolio category")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM portfolio_categories WHERE slug = ? AND id != COALESCE(?, 0)",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check portfolio category slug")?;
        Ok(count > 0)
    }

    async fn exists_by_name(&self, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM portfolio_categories WHERE name = ? AND id != COALESCE(?, 0)",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check portfolio category name")?;
        Ok(count > 0)
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM portfolio_categories")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count portfolio categories")
    }
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> PortfolioCategory {
    PortfolioCategory {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        icon: row.get("icon"),
        color: row.get("color"),
        created_at: row.get("created_at"),
    }
}

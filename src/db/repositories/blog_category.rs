//! Blog category repository

use crate::models::{BlogCategory, CategoryWithCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait BlogCategoryRepository: Send + Sync {
    async fn create(&self, category: &BlogCategory) -> Result<BlogCategory>;

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogCategory>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogCategory>>;

    /// All categories ordered by name
    async fn list(&self) -> Result<Vec<BlogCategory>>;

    /// Categories with at least one published post
    async fn list_with_counts(&self, limit: i64) -> Result<Vec<CategoryWithCount<BlogCategory>>>;

    async fn update(&self, category: &BlogCategory) -> Result<BlogCategory>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn exists_by_name(&self, name: &str, exclude_id: Option<i64>) -> Result<bool>;
}

pub struct SqlxBlogCategoryRepository {
    pool: SqlitePool,
}

impl SqlxBlogCategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn BlogCategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

const COLUMNS: &str = "c.id, c.name, c.slug, c.description, c.color, c.created_at";

#[async_trait]
impl BlogCategoryRepository for SqlxBlogCategoryRepository {
    async fn create(&self, category: &BlogCategory) -> Result<BlogCategory> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO blog_categories (name, slug, description, color, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.color)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create blog category")?;

        Ok(BlogCategory {
            id: result.last_insert_rowid(),
            created_at: now,
            ..category.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogCategory>> {
        let row = sqlx::query(&format!("SELECT {} FROM blog_categories c WHERE c.id = ?", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get blog category by ID")?;
        Ok(row.as_ref().map(row_to_category))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogCategory>> {
        let row = sqlx::query(&format!("SELECT {} FROM blog_categories c WHERE c.slug = ?", COLUMNS))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get blog category by slug")?;
        Ok(row.as_ref().map(row_to_category))
    }

    async fn list(&self) -> Result<Vec<BlogCategory>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM blog_categories c ORDER BY c.name ASC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list blog categories")?;
        Ok(rows.iter().map(row_to_category).collect())
    }

    async fn list_with_counts(&self, limit: i64) -> Result<Vec<CategoryWithCount<BlogCategory>>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}, COUNT(p.id) AS item_count
            FROM blog_categories c
            JOIN posts p ON p.category_id = c.id AND p.status = 'published'
            GROUP BY c.id
            ORDER BY c.name ASC
            LIMIT ?
            "#,
            COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list blog categories with counts")?;

        Ok(rows
            .iter()
            .map(|row| CategoryWithCount {
                category: row_to_category(row),
                count: row.get("item_count"),
            })
            .collect())
    }

    async fn update(&self, category: &BlogCategory) -> Result<BlogCategory> {
        sqlx::query("UPDATE blog_categories SET name = ?, slug = ?, description = ?, color = ? WHERE id = ?")
            .bind(&category.name)
            .bind(&category.slug)
            .bind(&category.description)
            .bind(&category.color)
            .bind(category.id)
            .execute(&self.pool)
            .await
            .context("Failed to update blog category")?;

        self.get_by_id(category.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Blog category not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM blog_categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete blog category")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM blog_categories WHERE slug = ? AND id != COALESCE(?, 0)",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check blog category slug")?;
        Ok(count > 0)
    }

    async fn exists_by_name(&self, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM blog_categories WHERE name = ? AND id != COALESCE(?, 0)",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check blog category name")?;
        Ok(count > 0)
    }
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> BlogCategory {
    BlogCategory {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        color: row.get("color"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_post, insert_user, setup_pool};

    fn category(name: &str, slug: &str) -> BlogCategory {
        BlogCategory {
            id: 0,
            name: name.to_string(),
            slug: slug.to_string(),
            description: String::new(),
            color: "#007bff".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_category_with_published_posts_only() {
        let pool = setup_pool().await;
        let user_id = insert_user(&pool, "alice").await;
        let repo = SqlxBlogCategoryRepository::new(pool.clone());

        let rust = repo.create(&category("Rust", "rust")).await.unwrap();
        let drafts = repo.create(&category("Drafts", "drafts")).await.unwrap();

        let live = insert_post(&pool, user_id, "live", "published").await;
        let draft = insert_post(&pool, user_id, "draft", "draft").await;
        for (post, cat) in [(live, rust.id), (draft, drafts.id)] {
            sqlx::query("UPDATE posts SET category_id = ? WHERE id = ?")
                .bind(cat)
                .bind(post)
                .execute(&pool)
                .await
                .unwrap();
        }

        let counts = repo.list_with_counts(8).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].category, rust);
        assert_eq!(counts[0].count, 1);
    }

    #[tokio::test]
    async fn test_delete_category_keeps_posts() {
        let pool = setup_pool().await;
        let user_id = insert_user(&pool, "bob").await;
        let repo = SqlxBlogCategoryRepository::new(pool.clone());

        let cat = repo.create(&category("News", "news")).await.unwrap();
        let post = insert_post(&pool, user_id, "p", "published").await;
        sqlx::query("UPDATE posts SET category_id = ? WHERE id = ?")
            .bind(cat.id)
            .bind(post)
            .execute(&pool)
            .await
            .unwrap();

        repo.delete(cat.id).await.unwrap();

        let category_id: Option<i64> = sqlx::query_scalar("SELECT category_id FROM posts WHERE id = ?")
            .bind(post)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(category_id, None);
        assert!(repo.get_by_slug("news").await.unwrap().is_none());
    }
}

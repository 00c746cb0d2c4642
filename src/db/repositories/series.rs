//! Blog series repository

use crate::models::BlogSeries;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait SeriesRepository: Send + Sync {
    async fn create(&self, series: &BlogSeries) -> Result<BlogSeries>;

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogSeries>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogSeries>>;

    async fn update(&self, series: &BlogSeries) -> Result<BlogSeries>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// All series, newest first
    async fn list(&self) -> Result<Vec<BlogSeries>>;

    /// Series with at least one published post, newest first
    async fn list_with_published_posts(&self, limit: i64) -> Result<Vec<BlogSeries>>;
}

pub struct SqlxSeriesRepository {
    pool: SqlitePool,
}

impl SqlxSeriesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn SeriesRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_SERIES: &str = r#"
    SELECT s.id, s.title, s.slug, s.description, s.image, s.author_id, s.is_completed,
           s.created_at,
           (SELECT COUNT(*) FROM posts p
             WHERE p.series_id = s.id AND p.status = 'published') AS post_count
    FROM blog_series s
"#;

#[async_trait]
impl SeriesRepository for SqlxSeriesRepository {
    async fn create(&self, series: &BlogSeries) -> Result<BlogSeries> {
        let result = sqlx::query(
            r#"
            INSERT INTO blog_series (title, slug, description, image, author_id, is_completed, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&series.title)
        .bind(&series.slug)
        .bind(&series.description)
        .bind(&series.image)
        .bind(series.author_id)
        .bind(series.is_completed)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to create series")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("Series not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogSeries>> {
        let row = sqlx::query(&format!("{} WHERE s.id = ?", SELECT_SERIES))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get series by ID")?;
        Ok(row.as_ref().map(row_to_series))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogSeries>> {
        let row = sqlx::query(&format!("{} WHERE s.slug = ?", SELECT_SERIES))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get series by slug")?;
        Ok(row.as_ref().map(row_to_series))
    }

    async fn update(&self, series: &BlogSeries) -> Result<BlogSeries> {
        sqlx::query(
            r#"
            UPDATE blog_series
            SET title = ?, slug = ?, description = ?, image = ?, is_completed = ?
            WHERE id = ?
            "#,
        )
        .bind(&series.title)
        .bind(&series.slug)
        .bind(&series.description)
        .bind(&series.image)
        .bind(series.is_completed)
        .bind(series.id)
        .execute(&self.pool)
        .await
        .context("Failed to update series")?;

        self.get_by_id(series.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Series not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM blog_series WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete series")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM blog_series WHERE slug = ? AND id != COALESCE(?, 0)",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check series slug existence")?;
        Ok(count > 0)
    }

    async fn list(&self) -> Result<Vec<BlogSeries>> {
        let rows = sqlx::query(&format!("{} ORDER BY s.created_at DESC, s.id DESC", SELECT_SERIES))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list series")?;
        Ok(rows.iter().map(row_to_series).collect())
    }

    async fn list_with_published_posts(&self, limit: i64) -> Result<Vec<BlogSeries>> {
        let rows = sqlx::query(&format!(
            r#"{}
            WHERE EXISTS (SELECT 1 FROM posts p WHERE p.series_id = s.id AND p.status = 'published')
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT ?"#,
            SELECT_SERIES
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list active series")?;
        Ok(rows.iter().map(row_to_series).collect())
    }
}

fn row_to_series(row: &sqlx::sqlite::SqliteRow) -> BlogSeries {
    BlogSeries {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        image: row.get("image"),
        author_id: row.get("author_id"),
        is_completed: row.get("is_completed"),
        created_at: row.get("created_at"),
        post_count: row.get("post_count"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_post, insert_user, setup_pool};

    fn series(author_id: i64, slug: &str) -> BlogSeries {
        BlogSeries {
            id: 0,
            title: format!("Series {}", slug),
            slug: slug.to_string(),
            description: "A run of posts".to_string(),
            image: String::new(),
            author_id,
            is_completed: false,
            created_at: Utc::now(),
            post_count: 0,
        }
    }

    async fn attach(pool: &SqlitePool, post_id: i64, series_id: i64) {
        sqlx::query("UPDATE posts SET series_id = ? WHERE id = ?")
            .bind(series_id)
            .bind(post_id)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_post_count_only_published() {
        let pool = setup_pool().await;
        let author = insert_user(&pool, "alice").await;
        let repo = SqlxSeriesRepository::new(pool.clone());

        let created = repo.create(&series(author, "rust-101")).await.unwrap();
        let live = insert_post(&pool, author, "live", "published").await;
        let draft = insert_post(&pool, author, "draft", "draft").await;
        attach(&pool, live, created.id).await;
        attach(&pool, draft, created.id).await;

        let found = repo.get_by_slug("rust-101").await.unwrap().unwrap();
        assert_eq!(found.post_count, 1);
    }

    #[tokio::test]
    async fn test_list_with_published_posts() {
        let pool = setup_pool().await;
        let author = insert_user(&pool, "alice").await;
        let repo = SqlxSeriesRepository::new(pool.clone());

        let active = repo.create(&series(author, "active")).await.unwrap();
        let empty = repo.create(&series(author, "empty")).await.unwrap();
        let draft = insert_post(&pool, author, "draft", "draft").await;
        let live = insert_post(&pool, author, "live", "published").await;
        attach(&pool, live, active.id).await;
        attach(&pool, draft, empty.id).await;

        let list = repo.list_with_published_posts(4).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].slug, "active");
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_slug_exists_and_delete_detaches_posts() {
        let pool = setup_pool().await;
        let author = insert_user(&pool, "alice").await;
        let repo = SqlxSeriesRepository::new(pool.clone());

        let created = repo.create(&series(author, "taken")).await.unwrap();
        assert!(repo.exists_by_slug("taken", None).await.unwrap());
        assert!(!repo.exists_by_slug("taken", Some(created.id)).await.unwrap());

        let post_id = insert_post(&pool, author, "member", "published").await;
        attach(&pool, post_id, created.id).await;
        repo.delete(created.id).await.unwrap();

        let series_id: Option<i64> = sqlx::query_scalar("SELECT series_id FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(series_id.is_none());
    }
}

//! Testimonial repository

use crate::models::Testimonial;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait TestimonialRepository: Send + Sync {
    async fn create(&self, testimonial: &Testimonial) -> Result<Testimonial>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Testimonial>>;

    async fn update(&self, testimonial: &Testimonial) -> Result<Testimonial>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Featured testimonials, newest first
    async fn list_featured(&self, limit: i64) -> Result<Vec<Testimonial>>;

    /// Testimonials of one member, newest first
    async fn list_by_user(&self, user_id: i64, limit: Option<i64>) -> Result<Vec<Testimonial>>;

    /// Testimonials attached to a project, newest first
    async fn list_by_project(&self, project_id: i64) -> Result<Vec<Testimonial>>;
}

pub struct SqlxTestimonialRepository {
    pool: SqlitePool,
}

impl SqlxTestimonialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn TestimonialRepository> {
        Arc::new(Self::new(pool))
    }

    async fn list_where(&self, condition: &str, key: i64, limit: i64) -> Result<Vec<Testimonial>> {
        let sql = format!(
            "SELECT {} FROM testimonials WHERE {} ORDER BY created_at DESC, id DESC LIMIT ?",
            COLUMNS, condition
        );
        let rows = sqlx::query(&sql)
            .bind(key)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list testimonials")?;
        Ok(rows.iter().map(row_to_testimonial).collect())
    }
}

const COLUMNS: &str = "id, user_id, client_name, client_position, client_company, client_image, \
    testimonial, rating, project_id, is_featured, created_at";

#[async_trait]
impl TestimonialRepository for SqlxTestimonialRepository {
    async fn create(&self, testimonial: &Testimonial) -> Result<Testimonial> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO testimonials (user_id, client_name, client_position, client_company,
                client_image, testimonial, rating, project_id, is_featured, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(testimonial.user_id)
        .bind(&testimonial.client_name)
        .bind(&testimonial.client_position)
        .bind(&testimonial.client_company)
        .bind(&testimonial.client_image)
        .bind(&testimonial.testimonial)
        .bind(testimonial.rating)
        .bind(testimonial.project_id)
        .bind(testimonial.is_featured)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create testimonial")?;

        Ok(Testimonial {
            id: result.last_insert_rowid(),
            created_at: now,
            ..testimonial.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Testimonial>> {
        let row = sqlx::query(&format!("SELECT {} FROM testimonials WHERE id = ?", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get testimonial")?;
        Ok(row.as_ref().map(row_to_testimonial))
    }

    async fn update(&self, testimonial: &Testimonial) -> Result<Testimonial> {
        sqlx::query(
            r#"
            UPDATE testimonials
            SET client_name = ?, client_position = ?, client_company = ?, client_image = ?,
                testimonial = ?, rating = ?, project_id = ?, is_featured = ?
            WHERE id = ?
            "#,
        )
        .bind(&testimonial.client_name)
        .bind(&testimonial.client_position)
        .bind(&testimonial.client_company)
        .bind(&testimonial.client_image)
        .bind(&testimonial.testimonial)
        .bind(testimonial.rating)
        .bind(testimonial.project_id)
        .bind(testimonial.is_featured)
        .bind(testimonial.id)
        .execute(&self.pool)
        .await
        .context("Failed to update testimonial")?;

        self.get_by_id(testimonial.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Testimonial not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM testimonials WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete testimonial")?;
        Ok(())
    }

    async fn list_featured(&self, limit: i64) -> Result<Vec<Testimonial>> {
        self.list_where("is_featured = ?", 1, limit).await
    }

    async fn list_by_user(&self, user_id: i64, limit: Option<i64>) -> Result<Vec<Testimonial>> {
        self.list_where("user_id = ?", user_id, limit.unwrap_or(-1)).await
    }

    async fn list_by_project(&self, project_id: i64) -> Result<Vec<Testimonial>> {
        self.list_where("project_id = ?", project_id, -1).await
    }
}

fn row_to_testimonial(row: &sqlx::sqlite::SqliteRow) -> Testimonial {
    Testimonial {
        id: row.get("id"),
        user_id: row.get("user_id"),
        client_name: row.get("client_name"),
        client_position: row.get("client_position"),
        client_company: row.get("client_company"),
        client_image: row.get("client_image"),
        testimonial: row.get("testimonial"),
        rating: row.get("rating"),
        project_id: row.get("project_id"),
        is_featured: row.get("is_featured"),
        created_at: row.get("created_at"),
    }
}

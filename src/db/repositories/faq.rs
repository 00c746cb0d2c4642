//! FAQ repository

use crate::models::{Faq, FaqCategory};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait FaqRepository: Send + Sync {
    async fn create(&self, faq: &Faq) -> Result<Faq>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Faq>>;

    async fn update(&self, faq: &Faq) -> Result<Faq>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Entries by display order, optionally narrowed to one category
    async fn list(&self, category: Option<FaqCategory>) -> Result<Vec<Faq>>;

    /// Featured entries by display order
    async fn list_featured(&self, limit: i64) -> Result<Vec<Faq>>;
}

pub struct SqlxFaqRepository {
    pool: SqlitePool,
}

impl SqlxFaqRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn FaqRepository> {
        Arc::new(Self::new(pool))
    }
}

const COLUMNS: &str =
    "id, question, answer, category, is_featured, sort_order, created_at, updated_at";

const ORDER: &str = "ORDER BY sort_order ASC, created_at DESC, id DESC";

#[async_trait]
impl FaqRepository for SqlxFaqRepository {
    async fn create(&self, faq: &Faq) -> Result<Faq> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO faqs (question, answer, category, is_featured, sort_order, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&faq.question)
        .bind(&faq.answer)
        .bind(faq.category.as_str())
        .bind(faq.is_featured)
        .bind(faq.order)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create FAQ")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("FAQ not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Faq>> {
        let row = sqlx::query(&format!("SELECT {} FROM faqs WHERE id = ?", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get FAQ by ID")?;
        Ok(row.as_ref().map(row_to_faq))
    }

    async fn update(&self, faq: &Faq) -> Result<Faq> {
        sqlx::query(
            r#"
            UPDATE faqs
            SET question = ?, answer = ?, category = ?, is_featured = ?, sort_order = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&faq.question)
        .bind(&faq.answer)
        .bind(faq.category.as_str())
        .bind(faq.is_featured)
        .bind(faq.order)
        .bind(Utc::now())
        .bind(faq.id)
        .execute(&self.pool)
        .await
        .context("Failed to update FAQ")?;

        self.get_by_id(faq.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("FAQ not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM faqs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete FAQ")?;
        Ok(())
    }

    async fn list(&self, category: Option<FaqCategory>) -> Result<Vec<Faq>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM faqs WHERE (?1 IS NULL OR category = ?1) {}",
            COLUMNS, ORDER
        ))
        .bind(category.map(|c| c.as_str()))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list FAQs")?;
        Ok(rows.iter().map(row_to_faq).collect())
    }

    async fn list_featured(&self, limit: i64) -> Result<Vec<Faq>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM faqs WHERE is_featured = 1 {} LIMIT ?",
            COLUMNS, ORDER
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list featured FAQs")?;
        Ok(rows.iter().map(row_to_faq).collect())
    }
}

fn row_to_faq(row: &sqlx::sqlite::SqliteRow) -> Faq {
    let category: String = row.get("category");
    Faq {
        id: row.get("id"),
        question: row.get("question"),
        answer: row.get("answer"),
        category: FaqCategory::from_db(&category),
        is_featured: row.get("is_featured"),
        order: row.get("sort_order"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

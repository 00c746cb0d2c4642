//! Tag repository
//!
//! Tags are shared between blog posts (`post_tags`) and projects
//! (`project_tags`).

use crate::models::{Tag, TagWithCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// Case-insensitive lookup by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// All tags with published post and project counts, most used first
    async fn list_with_counts(&self) -> Result<Vec<TagWithCount>>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Replace the tags of a post
    async fn set_post_tags(&self, post_id: i64, tag_ids: &[i64]) -> Result<()>;

    /// Replace the tags of a project
    async fn set_project_tags(&self, project_id: i64, tag_ids: &[i64]) -> Result<()>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: SqlitePool,
}

impl SqlxTagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &Tag) -> Result<Tag> {
        let now = Utc::now();

        let result = sqlx::query("INSERT INTO tags (name, slug, created_at) VALUES (?, ?, ?)")
            .bind(&tag.name)
            .bind(&tag.slug)
            .bind(now)
            .execute(&self.pool)
            .await
            .context("Failed to create tag")?;

        Ok(Tag {
            id: result.last_insert_rowid(),
            name: tag.name.clone(),
            slug: tag.slug.clone(),
            created_at: now,
        })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name, slug, created_at FROM tags WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get tag by slug")?;

        Ok(row.as_ref().map(row_to_tag))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let row = sqlx::query(
            "SELECT id, name, slug, created_at FROM tags WHERE name = ? COLLATE NOCASE",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get tag by name")?;

        Ok(row.as_ref().map(row_to_tag))
    }

    async fn list_with_counts(&self) -> Result<Vec<TagWithCount>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.slug, t.created_at,
                (SELECT COUNT(*) FROM post_tags pt JOIN posts p ON p.id = pt.post_id
                 WHERE pt.tag_id = t.id AND p.status = 'published') AS post_count,
                (SELECT COUNT(*) FROM project_tags jt JOIN projects j ON j.id = jt.project_id
                 WHERE jt.tag_id = t.id AND j.is_published = 1) AS project_count
            FROM tags t
            ORDER BY post_count + project_count DESC, t.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tags with counts")?;

        Ok(rows
            .iter()
            .map(|row| TagWithCount {
                tag: row_to_tag(row),
                post_count: row.get("post_count"),
                project_count: row.get("project_count"),
            })
            .collect())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete tag")?;
        Ok(())
    }

    async fn set_post_tags(&self, post_id: i64, tag_ids: &[i64]) -> Result<()> {
        replace_links(&self.pool, "post_tags", "post_id", post_id, tag_ids).await
    }

    async fn set_project_tags(&self, project_id: i64, tag_ids: &[i64]) -> Result<()> {
        replace_links(&self.pool, "project_tags", "project_id", project_id, tag_ids).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Swap the tag links of one owner inside a transaction.
/// `table` and `owner_column` are compile-time constants, never user input.
async fn replace_links(
    pool: &SqlitePool,
    table: &str,
    owner_column: &str,
    owner_id: i64,
    tag_ids: &[i64],
) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(&format!("DELETE FROM {} WHERE {} = ?", table, owner_column))
        .bind(owner_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear tag links")?;

    let insert = format!(
        "INSERT OR IGNORE INTO {} ({}, tag_id) VALUES (?, ?)",
        table, owner_column
    );
    for tag_id in tag_ids {
        sqlx::query(&insert)
            .bind(owner_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to link tag")?;
    }

    tx.commit().await.context("Failed to commit tag links")?;
    Ok(())
}

fn row_to_tag(row: &sqlx::sqlite::SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_post, insert_project, insert_user, setup_pool};

    #[tokio::test]
    async fn test_create_and_lookup() {
        let pool = setup_pool().await;
        let repo = SqlxTagRepository::new(pool);

        let tag = repo
            .create(&Tag::new("Rust".to_string(), "rust".to_string()))
            .await
            .unwrap();
        assert!(tag.id > 0);

        assert_eq!(repo.get_by_name("rust").await.unwrap(), Some(tag.clone()));
        assert_eq!(repo.get_by_slug("rust").await.unwrap(), Some(tag));
        assert!(repo.get_by_slug("go").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_counts_only_published_content() {
        let pool = setup_pool().await;
        let user_id = insert_user(&pool, "alice").await;
        let published = insert_post(&pool, user_id, "live", "published").await;
        let draft = insert_post(&pool, user_id, "draft", "draft").await;
        let project = insert_project(&pool, user_id, "site", true).await;
        let repo = SqlxTagRepository::new(pool);

        let rust = repo.create(&Tag::new("Rust".into(), "rust".into())).await.unwrap();
        let sql = repo.create(&Tag::new("SQL".into(), "sql".into())).await.unwrap();

        repo.set_post_tags(published, &[rust.id]).await.unwrap();
        repo.set_post_tags(draft, &[rust.id, sql.id]).await.unwrap();
        repo.set_project_tags(project, &[rust.id]).await.unwrap();

        let counts = repo.list_with_counts().await.unwrap();
        assert_eq!(counts[0].tag.slug, "rust");
        assert_eq!(counts[0].post_count, 1);
        assert_eq!(counts[0].project_count, 1);
        assert_eq!(counts[1].total(), 0);
    }

    #[tokio::test]
    async fn test_set_tags_replaces_links() {
        let pool = setup_pool().await;
        let user_id = insert_user(&pool, "bob").await;
        let post = insert_post(&pool, user_id, "p", "published").await;
        let repo = SqlxTagRepository::new(pool.clone());

        let a = repo.create(&Tag::new("A".into(), "a".into())).await.unwrap();
        let b = repo.create(&Tag::new("B".into(), "b".into())).await.unwrap();

        let linked = |pool: SqlitePool| async move {
            sqlx::query_scalar::<_, i64>("SELECT tag_id FROM post_tags WHERE post_id = ? ORDER BY tag_id")
                .bind(post)
                .fetch_all(&pool)
                .await
                .unwrap()
        };

        repo.set_post_tags(post, &[a.id, b.id, a.id]).await.unwrap();
        assert_eq!(linked(pool.clone()).await, vec![a.id, b.id]);

        repo.set_post_tags(post, &[b.id]).await.unwrap();
        assert_eq!(linked(pool.clone()).await, vec![b.id]);
    }
}

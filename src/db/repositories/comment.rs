//! Comment repository
//!
//! Comments are listed oldest first with the author's username and full
//! name joined in; replies reference a parent comment on the same post.

use crate::models::Comment;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Approved comments of a post, oldest first
    async fn list_approved(&self, post_id: i64) -> Result<Vec<Comment>>;

    /// Comments awaiting moderation across all posts, oldest first
    async fn list_pending(&self) -> Result<Vec<Comment>>;

    async fn set_approved(&self, id: i64, approved: bool) -> Result<()>;

    /// Delete a comment together with its replies
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: SqlitePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_COMMENT: &str = r#"
    SELECT c.id, c.post_id, c.author_id, c.parent_id, c.content, c.is_approved,
           c.created_at, c.updated_at,
           u.username AS author_username,
           TRIM(u.first_name || ' ' || u.last_name) AS author_name
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO comments (post_id, author_id, parent_id, content, is_approved, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(comment.parent_id)
        .bind(&comment.content)
        .bind(comment.is_approved)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create comment")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("Comment not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!("{} WHERE c.id = ?", SELECT_COMMENT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get comment by ID")?;
        Ok(row.as_ref().map(row_to_comment))
    }

    async fn list_approved(&self, post_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "{} WHERE c.post_id = ? AND c.is_approved = 1 ORDER BY c.created_at ASC, c.id ASC",
            SELECT_COMMENT
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list comments")?;
        Ok(rows.iter().map(row_to_comment).collect())
    }

    async fn list_pending(&self) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "{} WHERE c.is_approved = 0 ORDER BY c.created_at ASC, c.id ASC",
            SELECT_COMMENT
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list pending comments")?;
        Ok(rows.iter().map(row_to_comment).collect())
    }

    async fn set_approved(&self, id: i64, approved: bool) -> Result<()> {
        sqlx::query("UPDATE comments SET is_approved = ?, updated_at = ? WHERE id = ?")
            .bind(approved)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update comment approval")?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete comment")?;
        Ok(())
    }
}

fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        parent_id: row.get("parent_id"),
        content: row.get("content"),
        is_approved: row.get("is_approved"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        author_username: row.get("author_username"),
        author_name: row.get("author_name"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_post, insert_user, setup_pool};

    fn comment(post_id: i64, author_id: i64, parent_id: Option<i64>, content: &str) -> Comment {
        let now = Utc::now();
        Comment {
            id: 0,
            post_id,
            author_id,
            parent_id,
            content: content.to_string(),
            is_approved: true,
            created_at: now,
            updated_at: now,
            author_username: String::new(),
            author_name: String::new(),
        }
    }

    async fn setup() -> (SqlxCommentRepository, i64, i64) {
        let pool = setup_pool().await;
        let user_id = insert_user(&pool, "alice").await;
        let post_id = insert_post(&pool, user_id, "hello", "published").await;
        (SqlxCommentRepository::new(pool), user_id, post_id)
    }

    #[tokio::test]
    async fn test_create_joins_author() {
        let (repo, user_id, post_id) = setup().await;

        let created = repo.create(&comment(post_id, user_id, None, "First!")).await.unwrap();
        assert_eq!(created.author_username, "alice");
        assert!(!created.is_reply());
    }

    #[tokio::test]
    async fn test_list_approved_oldest_first() {
        let (repo, user_id, post_id) = setup().await;

        let first = repo.create(&comment(post_id, user_id, None, "one")).await.unwrap();
        repo.create(&comment(post_id, user_id, Some(first.id), "two")).await.unwrap();
        let hidden = repo.create(&comment(post_id, user_id, None, "three")).await.unwrap();
        repo.set_approved(hidden.id, false).await.unwrap();

        let list = repo.list_approved(post_id).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].content, "one");
        assert_eq!(list[1].parent_id, Some(first.id));
        assert_eq!(repo.list_pending().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_replies() {
        let (repo, user_id, post_id) = setup().await;

        let parent = repo.create(&comment(post_id, user_id, None, "parent")).await.unwrap();
        repo.create(&comment(post_id, user_id, Some(parent.id), "reply")).await.unwrap();

        repo.delete(parent.id).await.unwrap();
        assert!(repo.list_approved(post_id).await.unwrap().is_empty());
    }
}

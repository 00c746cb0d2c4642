//! Comment service
//!
//! Members comment on published posts. A reply to a reply is attached to
//! the top-level comment, so threads stay one level deep. Authors and
//! admins may delete; admins moderate.

use crate::db::repositories::{CommentRepository, PostRepository};
use crate::models::{Comment, CreateCommentInput, User};
use crate::services::validation::{FieldErrors, NON_FIELD_ERRORS};
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

pub const COMMENT_ADDED_MESSAGE: &str = "Your comment has been added successfully!";
pub const COMMENT_INVALID_MESSAGE: &str = "Please correct the errors in your comment.";

/// Error types for comment operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A created comment with the flash message shown to its author
#[derive(Debug, Clone, Serialize)]
pub struct CommentCreated {
    pub comment: Comment,
    pub message: &'static str,
}

/// Comment service
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    /// Comment on the published post with `slug`, optionally replying to
    /// another comment on the same post.
    pub async fn add_comment(
        &self,
        slug: &str,
        author: &User,
        input: CreateCommentInput,
    ) -> Result<CommentCreated, CommentServiceError> {
        let post = self
            .posts
            .get_by_slug(slug)
            .await
            .context("Failed to get post")?
            .filter(|p| p.is_published())
            .ok_or_else(|| CommentServiceError::NotFound(format!("Post '{}'", slug)))?;

        let content = input.content.trim().to_string();
        let mut errors = FieldErrors::new();
        if !errors.require("content", &content) {
            errors.add(NON_FIELD_ERRORS, COMMENT_INVALID_MESSAGE);
        }
        errors.into_result().map_err(CommentServiceError::ValidationError)?;

        let parent_id = match input.parent_id {
            Some(parent_id) => {
                let parent = self
                    .comments
                    .get_by_id(parent_id)
                    .await
                    .context("Failed to get parent comment")?
                    .filter(|c| c.post_id == post.id)
                    .ok_or_else(|| CommentServiceError::NotFound(format!("Comment {}", parent_id)))?;
                Some(parent.parent_id.unwrap_or(parent.id))
            }
            None => None,
        };

        let now = Utc::now();
        let comment = self
            .comments
            .create(&Comment {
                id: 0,
                post_id: post.id,
                author_id: author.id,
                parent_id,
                content,
                is_approved: true,
                created_at: now,
                updated_at: now,
                author_username: author.username.clone(),
                author_name: author.full_name(),
            })
            .await
            .context("Failed to create comment")?;

        tracing::info!(comment_id = comment.id, post_id = post.id, "Comment added");
        Ok(CommentCreated {
            comment,
            message: COMMENT_ADDED_MESSAGE,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Comment, CommentServiceError> {
        self.comments
            .get_by_id(id)
            .await
            .context("Failed to get comment")?
            .ok_or_else(|| CommentServiceError::NotFound(format!("Comment {}", id)))
    }

    /// Delete a comment and its replies. Author or admin only.
    pub async fn delete(&self, user: &User, id: i64) -> Result<(), CommentServiceError> {
        let comment = self.get(id).await?;
        if !user.can_edit(comment.author_id) {
            return Err(CommentServiceError::PermissionDenied(
                "You can only delete your own comments".to_string(),
            ));
        }

        self.comments
            .delete(id)
            .await
            .context("Failed to delete comment")?;
        Ok(())
    }

    /// Set the approval flag (admin moderation)
    pub async fn set_approved(&self, id: i64, approved: bool) -> Result<Comment, CommentServiceError> {
        self.get(id).await?;
        self.comments
            .set_approved(id, approved)
            .await
            .context("Failed to update comment")?;
        self.get(id).await
    }

    /// Comments awaiting moderation, oldest first
    pub async fn list_pending(&self) -> Result<Vec<Comment>, CommentServiceError> {
        Ok(self
            .comments
            .list_pending()
            .await
            .context("Failed to list pending comments")?)
    }
}

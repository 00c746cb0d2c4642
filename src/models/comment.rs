//! Comment model
//!
//! Comments nest one level deep: a top-level comment may carry replies,
//! replies never carry their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Author username, joined from `users`
    #[serde(default)]
    pub author_username: String,
    /// Author full name, joined from `users`
    #[serde(default)]
    pub author_name: String,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Top-level comment with its approved replies, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

impl CommentThread {
    /// Group a flat, oldest-first list into threads.
    ///
    /// Replies whose parent is not in the list are dropped.
    pub fn build(comments: Vec<Comment>) -> Vec<CommentThread> {
        let (top, replies): (Vec<_>, Vec<_>) = comments.into_iter().partition(|c| !c.is_reply());

        let mut threads: Vec<CommentThread> = top
            .into_iter()
            .map(|comment| CommentThread {
                comment,
                replies: Vec::new(),
            })
            .collect();

        for reply in replies {
            if let Some(thread) = threads
                .iter_mut()
                .find(|t| Some(t.comment.id) == reply.parent_id)
            {
                thread.replies.push(reply);
            }
        }

        threads
    }

    /// Comments in the thread including the parent
    pub fn comment_count(&self) -> usize {
        1 + self.replies.len()
    }
}

/// Input for creating a comment
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateCommentInput {
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl CreateCommentInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            parent_id: None,
        }
    }

    pub fn reply_to(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64, parent_id: Option<i64>) -> Comment {
        let now = Utc::now();
        Comment {
            id,
            post_id: 1,
            author_id: 1,
            parent_id,
            content: format!("comment {}", id),
            is_approved: true,
            created_at: now,
            updated_at: now,
            author_username: "ann".to_string(),
            author_name: "Ann".to_string(),
        }
    }

    #[test]
    fn test_build_threads() {
        let threads = CommentThread::build(vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, None),
            comment(4, Some(1)),
            comment(5, Some(99)),
        ]);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, 1);
        assert_eq!(
            threads[0].replies.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![2, 4]
        );
        assert!(threads[1].replies.is_empty());
        assert_eq!(threads[0].comment_count(), 3);
    }

    #[test]
    fn test_thread_serializes_flat() {
        let thread = CommentThread {
            comment: comment(1, None),
            replies: vec![comment(2, Some(1))],
        };
        let json = serde_json::to_value(&thread).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["replies"][0]["parent_id"], 1);
    }
}

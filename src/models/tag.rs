//! Tag model
//!
//! Free-form labels shared by blog posts and portfolio projects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// The ID will be set to 0 and should be assigned by the database.
    pub fn new(name: String, slug: String) -> Self {
        Self {
            id: 0,
            name,
            slug,
            created_at: Utc::now(),
        }
    }
}

/// Tag with usage counts for tag clouds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithCount {
    #[serde(flatten)]
    pub tag: Tag,
    /// Published posts carrying the tag
    pub post_count: i64,
    /// Published projects carrying the tag
    pub project_count: i64,
}

impl TagWithCount {
    pub fn total(&self) -> i64 {
        self.post_count + self.project_count
    }
}

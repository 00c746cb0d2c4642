//! Blog series model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered collection of posts by one author
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogSeries {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub image: String,
    pub author_id: i64,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    /// Published posts in the series
    #[serde(default)]
    pub post_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesInput {
    pub title: String,
    /// Derived from the title when empty
    pub slug: Option<String>,
    pub description: String,
    pub image: String,
    pub is_completed: bool,
}

impl SeriesInput {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }
}

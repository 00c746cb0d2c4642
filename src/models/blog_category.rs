//! Blog category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Grouping for blog posts, ordered by name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogCategoryInput {
    pub name: String,
    /// Derived from the name on create when empty; kept on update
    pub slug: Option<String>,
    pub description: String,
    pub color: Option<String>,
}

impl BlogCategoryInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }
}

/// Category with the number of published posts (blog) or projects (portfolio)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWithCount<C> {
    #[serde(flatten)]
    pub category: C,
    pub count: i64,
}

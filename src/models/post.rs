//! Post model
//!
//! This module provides:
//! - `Post` entity representing a blog post
//! - `PostStatus` enum for publication states
//! - Input types for creating and updating posts
//! - `PostFilter` / `PostSort` for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{double_option, BlogCategory, Tag};

string_enum! {
    /// Publication state of a post
    pub enum PostStatus {
        Draft => ("draft", "Draft"),
        Published => ("published", "Published"),
        Archived => ("archived", "Archived"),
    }
    default = Draft;
}

/// Blog post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    /// URL-friendly slug
    pub slug: String,
    pub author_id: i64,
    pub category_id: Option<i64>,
    /// Short summary
    pub excerpt: String,
    pub content: String,
    pub featured_image: String,
    pub status: PostStatus,
    pub is_featured: bool,
    /// Estimated minutes to read
    pub reading_time: i64,
    pub meta_title: String,
    pub meta_description: String,
    pub views: i64,
    pub series_id: Option<i64>,
    pub series_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<BlogCategory>,
    /// Author username, joined from `users`
    #[serde(default)]
    pub author_username: String,
    #[serde(default)]
    pub like_count: i64,
    /// Approved comments
    #[serde(default)]
    pub comment_count: i64,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

/// Input for creating a post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatePostInput {
    pub title: String,
    pub slug: Option<String>,
    pub category_id: Option<i64>,
    pub excerpt: String,
    pub content: String,
    pub featured_image: String,
    pub status: PostStatus,
    pub is_featured: bool,
    pub meta_title: String,
    pub meta_description: String,
    pub series_id: Option<i64>,
    pub series_order: i64,
    /// Tag names; missing tags are created
    pub tags: Vec<String>,
}

impl CreatePostInput {
    pub fn new(
        title: impl Into<String>,
        excerpt: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            excerpt: excerpt.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn published(mut self) -> Self {
        self.status = PostStatus::Published;
        self
    }

    pub fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_series(mut self, series_id: i64, order: i64) -> Self {
        self.series_id = Some(series_id);
        self.series_order = order;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Partial update of a post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub featured_image: Option<String>,
    pub status: Option<PostStatus>,
    pub is_featured: Option<bool>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub series_id: Option<Option<i64>>,
    pub series_order: Option<i64>,
    pub tags: Option<Vec<String>>,
}

impl UpdatePostInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn apply(&self, post: &mut Post) {
        if let Some(ref v) = self.title {
            post.title = v.trim().to_string();
        }
        if let Some(v) = self.category_id {
            post.category_id = v;
        }
        if let Some(ref v) = self.excerpt {
            post.excerpt = v.clone();
        }
        if let Some(ref v) = self.content {
            post.content = v.clone();
        }
        if let Some(ref v) = self.featured_image {
            post.featured_image = v.clone();
        }
        if let Some(v) = self.status {
            post.status = v;
        }
        if let Some(v) = self.is_featured {
            post.is_featured = v;
        }
        if let Some(ref v) = self.meta_title {
            post.meta_title = v.clone();
        }
        if let Some(ref v) = self.meta_description {
            post.meta_description = v.clone();
        }
        if let Some(v) = self.series_id {
            post.series_id = v;
        }
        if let Some(v) = self.series_order {
            post.series_order = v;
        }
    }
}

/// Accepted `sort` values for post listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSort {
    #[default]
    PublishedDesc,
    PublishedAsc,
    ViewsDesc,
    ViewsAsc,
    TitleAsc,
    TitleDesc,
}

impl PostSort {
    /// Parse a Django-style ordering key; unknown keys use the default
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("-published_at") => Self::PublishedDesc,
            Some("published_at") => Self::PublishedAsc,
            Some("-views") => Self::ViewsDesc,
            Some("views") => Self::ViewsAsc,
            Some("title") => Self::TitleAsc,
            Some("-title") => Self::TitleDesc,
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublishedDesc => "-published_at",
            Self::PublishedAsc => "published_at",
            Self::ViewsDesc => "-views",
            Self::ViewsAsc => "views",
            Self::TitleAsc => "title",
            Self::TitleDesc => "-title",
        }
    }

    /// SQL ORDER BY clause over the `p` alias
    pub fn order_clause(&self) -> &'static str {
        match self {
            Self::PublishedDesc => "p.published_at DESC, p.id DESC",
            Self::PublishedAsc => "p.published_at ASC, p.id ASC",
            Self::ViewsDesc => "p.views DESC, p.id DESC",
            Self::ViewsAsc => "p.views ASC, p.id ASC",
            Self::TitleAsc => "p.title ASC, p.id ASC",
            Self::TitleDesc => "p.title DESC, p.id DESC",
        }
    }
}

/// Filters for post listings. Only published posts are ever listed.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Substring matched against title, excerpt and content
    pub query: Option<String>,
    /// Also match tag names
    pub search_tags: bool,
    /// Category slug
    pub category: Option<String>,
    /// Author username
    pub author: Option<String>,
    /// Exact tag name or slug
    pub tag: Option<String>,
    pub featured_only: bool,
    /// Half-open `published_at` window
    pub published_from: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
    pub sort: PostSort,
}

impl PostFilter {
    pub fn published() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let q = query.into();
        self.query = if q.trim().is_empty() { None } else { Some(q.trim().to_string()) };
        self
    }

    pub fn with_category(mut self, slug: impl Into<String>) -> Self {
        self.category = Some(slug.into());
        self
    }

    pub fn with_sort(mut self, sort: PostSort) -> Self {
        self.sort = sort;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_sort_allowlist() {
        assert_eq!(PostSort::parse(Some("-views")), PostSort::ViewsDesc);
        assert_eq!(PostSort::parse(Some("published_at")), PostSort::PublishedAsc);
        assert_eq!(PostSort::parse(Some("created_at")), PostSort::PublishedDesc);
        assert_eq!(PostSort::parse(None).as_str(), "-published_at");
    }

    #[test]
    fn test_create_input_defaults_to_draft() {
        let input: CreatePostInput =
            serde_json::from_str(r#"{"title": "Hello", "content": "World"}"#).unwrap();
        assert_eq!(input.status, PostStatus::Draft);
        assert!(input.slug.is_none());
    }

    #[test]
    fn test_update_input_clears_category() {
        let input: UpdatePostInput = serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(input.category_id, Some(None));
    }
}

//! Project model
//!
//! Portfolio entries owned by a member, with an image gallery, shared tags
//! and likes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{double_option, split_csv, PortfolioCategory, Tag};

string_enum! {
    /// Lifecycle of a portfolio project
    pub enum ProjectStatus {
        Planning => ("planning", "Planning"),
        InProgress => ("in_progress", "In Progress"),
        Completed => ("completed", "Completed"),
        OnHold => ("on_hold", "On Hold"),
    }
    default = Completed;
}

/// A portfolio project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub short_description: String,
    pub category_id: Option<i64>,
    /// Owner
    pub user_id: i64,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub client: String,
    pub budget: Option<f64>,
    pub featured_image: String,
    pub demo_url: String,
    pub source_url: String,
    /// Comma-separated list of technologies
    pub technologies: String,
    pub is_featured: bool,
    pub is_published: bool,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Loaded separately from `project_tags`
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Loaded separately from `portfolio_categories`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<PortfolioCategory>,
    /// Number of likes, filled in by the repository
    #[serde(default)]
    pub like_count: i64,
}

impl Project {
    /// Technologies as a trimmed list
    pub fn technology_list(&self) -> Vec<String> {
        split_csv(&self.technologies)
    }

    /// Published projects are public; others only for owner and admins
    pub fn is_visible_to(&self, viewer: Option<&super::User>) -> bool {
        self.is_published || viewer.map(|u| u.can_edit(self.user_id)).unwrap_or(false)
    }
}

/// Gallery image attached to a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectImage {
    pub id: i64,
    pub project_id: i64,
    pub image: String,
    pub caption: String,
    pub order: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectImageInput {
    pub image: String,
    pub caption: String,
    pub order: i64,
}

/// Input for creating a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateProjectInput {
    pub title: String,
    /// Derived from the title when empty
    pub slug: Option<String>,
    pub description: String,
    pub short_description: String,
    pub category_id: Option<i64>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub client: String,
    pub budget: Option<f64>,
    pub featured_image: String,
    pub demo_url: String,
    pub source_url: String,
    pub technologies: String,
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_published: bool,
    /// Tag names; missing tags are created
    pub tags: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl CreateProjectInput {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        short_description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            short_description: short_description.into(),
            is_published: true,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_technologies(mut self, technologies: impl Into<String>) -> Self {
        self.technologies = technologies.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.is_published = false;
        self
    }
}

/// Partial update of a project; `null` clears nullable fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateProjectInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    pub status: Option<ProjectStatus>,
    #[serde(deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    pub client: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub budget: Option<Option<f64>>,
    pub featured_image: Option<String>,
    pub demo_url: Option<String>,
    pub source_url: Option<String>,
    pub technologies: Option<String>,
    pub is_featured: Option<bool>,
    pub is_published: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl UpdateProjectInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_published(mut self, published: bool) -> Self {
        self.is_published = Some(published);
        self
    }

    pub fn apply(&self, project: &mut Project) {
        if let Some(ref v) = self.title {
            project.title = v.trim().to_string();
        }
        if let Some(ref v) = self.description {
            project.description = v.clone();
        }
        if let Some(ref v) = self.short_description {
            project.short_description = v.clone();
        }
        if let Some(v) = self.category_id {
            project.category_id = v;
        }
        if let Some(v) = self.status {
            project.status = v;
        }
        if let Some(v) = self.start_date {
            project.start_date = v;
        }
        if let Some(v) = self.end_date {
            project.end_date = v;
        }
        if let Some(ref v) = self.client {
            project.client = v.clone();
        }
        if let Some(v) = self.budget {
            project.budget = v;
        }
        if let Some(ref v) = self.featured_image {
            project.featured_image = v.clone();
        }
        if let Some(ref v) = self.demo_url {
            project.demo_url = v.trim().to_string();
        }
        if let Some(ref v) = self.source_url {
            project.source_url = v.trim().to_string();
        }
        if let Some(ref v) = self.technologies {
            project.technologies = v.clone();
        }
        if let Some(v) = self.is_featured {
            project.is_featured = v;
        }
        if let Some(v) = self.is_published {
            project.is_published = v;
        }
    }
}

/// Accepted `sort` values for project listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectSort {
    CreatedAsc,
    #[default]
    CreatedDesc,
    TitleAsc,
    TitleDesc,
    ViewsAsc,
    ViewsDesc,
}

impl ProjectSort {
    /// Parse a Django-style ordering key; unknown keys use the default
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("created_at") => Self::CreatedAsc,
            Some("-created_at") => Self::CreatedDesc,
            Some("title") => Self::TitleAsc,
            Some("-title") => Self::TitleDesc,
            Some("views") => Self::ViewsAsc,
            Some("-views") => Self::ViewsDesc,
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAsc => "created_at",
            Self::CreatedDesc => "-created_at",
            Self::TitleAsc => "title",
            Self::TitleDesc => "-title",
            Self::ViewsAsc => "views",
            Self::ViewsDesc => "-views",
        }
    }

    /// SQL ORDER BY clause over the `p` alias
    pub fn order_clause(&self) -> &'static str {
        match self {
            Self::CreatedAsc => "p.created_at ASC, p.id ASC",
            Self::CreatedDesc => "p.created_at DESC, p.id DESC",
            Self::TitleAsc => "p.title ASC, p.id ASC",
            Self::TitleDesc => "p.title DESC, p.id DESC",
            Self::ViewsAsc => "p.views ASC, p.id ASC",
            Self::ViewsDesc => "p.views DESC, p.id DESC",
        }
    }
}

/// Filters for project listings
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Substring matched against title, description, technologies and tag names
    pub query: Option<String>,
    /// Also match `short_description` (search page)
    pub search_short_description: bool,
    /// Match tag names
    pub search_tags: bool,
    /// Category slug
    pub category: Option<String>,
    /// Owner username
    pub username: Option<String>,
    pub status: Option<ProjectStatus>,
    pub featured_only: bool,
    /// Include unpublished projects
    pub include_unpublished: bool,
    pub sort: ProjectSort,
}

impl ProjectFilter {
    /// Published projects, newest first
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

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_sort_allowlist() {
        assert_eq!(ProjectSort::parse(Some("-views")), ProjectSort::ViewsDesc);
        assert_eq!(ProjectSort::parse(Some("title")), ProjectSort::TitleAsc);
        assert_eq!(ProjectSort::parse(Some("id; DROP TABLE projects")), ProjectSort::CreatedDesc);
        assert_eq!(ProjectSort::parse(None), ProjectSort::CreatedDesc);
        assert_eq!(ProjectSort::ViewsDesc.as_str(), "-views");
    }

    #[test]
    fn test_project_status_values() {
        assert_eq!(ProjectStatus::default(), ProjectStatus::Completed);
        assert_eq!("in_progress".parse::<ProjectStatus>().unwrap(), ProjectStatus::InProgress);
        assert_eq!(ProjectStatus::OnHold.label(), "On Hold");
    }

    #[test]
    fn test_create_input_defaults_to_published() {
        let input: CreateProjectInput =
            serde_json::from_str(r#"{"title": "Site", "description": "d", "short_description": "s"}"#)
                .unwrap();
        assert!(input.is_published);
        assert_eq!(input.status, ProjectStatus::Completed);
        assert!(CreateProjectInput::new("a", "b", "c").is_published);
    }

    #[test]
    fn test_filter_blank_query_is_none() {
        assert!(ProjectFilter::published().with_query("  ").query.is_none());
        assert_eq!(
            ProjectFilter::published().with_query(" rust ").query.as_deref(),
            Some("rust")
        );
    }
}

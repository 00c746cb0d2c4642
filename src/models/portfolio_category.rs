//! Portfolio category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default badge color for new categories
pub const DEFAULT_CATEGORY_COLOR: &str = "#007bff";

/// Grouping for projects, ordered by name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Icon class name (e.g. "fas fa-code")
    pub icon: String,
    /// Hex color code
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// Create or update a portfolio category; an empty slug is derived from the
/// name on create and left unchanged on update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioCategoryInput {
    pub name: String,
    pub slug: Option<String>,
    pub description: String,
    pub icon: String,
    pub color: Option<String>,
}

impl PortfolioCategoryInput {
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

    /// Color to store, falling back to the default badge color
    pub fn color_or_default(&self) -> String {
        match self.color.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => DEFAULT_CATEGORY_COLOR.to_string(),
        }
    }
}

//! Tag service
//!
//! Tags are free-form labels shared by posts and projects. Assigning tag
//! names reuses existing tags (case-insensitive) and creates the rest.

use crate::db::repositories::TagRepository;
use crate::models::{Tag, TagWithCount};
use crate::services::text::generate_slug;
use anyhow::Context;
use std::sync::Arc;

/// Longest accepted tag name
const MAX_TAG_NAME: usize = 50;

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    #[error("Tag not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Tag service shared by the blog and portfolio services
pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    /// Create a new tag or get the existing one by name
    pub async fn create_or_get(&self, name: &str) -> Result<Tag, TagServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Tag name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_TAG_NAME {
            return Err(TagServiceError::ValidationError(format!(
                "Tag name must be at most {} characters",
                MAX_TAG_NAME
            )));
        }

        if let Some(existing) = self
            .repo
            .get_by_name(name)
            .await
            .context("Failed to check existing tag")?
        {
            return Ok(existing);
        }

        let slug = self.unique_slug(name).await?;
        let created = self
            .repo
            .create(&Tag::new(name.to_string(), slug))
            .await
            .context("Failed to create tag")?;

        Ok(created)
    }

    /// Resolve a list of names to tags, skipping blanks and duplicates
    pub async fn resolve(&self, names: &[String]) -> Result<Vec<Tag>, TagServiceError> {
        let mut tags: Vec<Tag> = Vec::new();
        for name in names.iter().filter(|n| !n.trim().is_empty()) {
            let tag = self.create_or_get(name).await?;
            if !tags.iter().any(|t| t.id == tag.id) {
                tags.push(tag);
            }
        }
        Ok(tags)
    }

    /// Replace the tags of a post by name
    pub async fn set_post_tags(&self, post_id: i64, names: &[String]) -> Result<Vec<Tag>, TagServiceError> {
        let tags = self.resolve(names).await?;
        let ids: Vec<i64> = tags.iter().map(|t| t.id).collect();
        self.repo
            .set_post_tags(post_id, &ids)
            .await
            .context("Failed to set post tags")?;
        Ok(tags)
    }

    /// Replace the tags of a project by name
    pub async fn set_project_tags(
        &self,
        project_id: i64,
        names: &[String],
    ) -> Result<Vec<Tag>, TagServiceError> {
        let tags = self.resolve(names).await?;
        let ids: Vec<i64> = tags.iter().map(|t| t.id).collect();
        self.repo
            .set_project_tags(project_id, &ids)
            .await
            .context("Failed to set project tags")?;
        Ok(tags)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Tag, TagServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get tag by slug")?
            .ok_or_else(|| TagServiceError::NotFound(slug.to_string()))
    }

    /// Tags with usage counts, most used first
    pub async fn list_tags(&self) -> Result<Vec<TagWithCount>, TagServiceError> {
        Ok(self
            .repo
            .list_with_counts()
            .await
            .context("Failed to list tags")?)
    }

    pub async fn delete(&self, slug: &str) -> Result<(), TagServiceError> {
        let tag = self.get_by_slug(slug).await?;
        self.repo
            .delete(tag.id)
            .await
            .context("Failed to delete tag")?;
        Ok(())
    }

    /// Slug for a new tag, suffixed with a counter when taken
    async fn unique_slug(&self, name: &str) -> Result<String, TagServiceError> {
        let base = match generate_slug(name) {
            s if s.is_empty() => "tag".to_string(),
            s => s,
        };

        let mut candidate = base.clone();
        let mut counter = 2;
        while self
            .repo
            .get_by_slug(&candidate)
            .await
            .context("Failed to check tag slug")?
            .is_some()
        {
            candidate = format!("{}-{}", base, counter);
            counter += 1;
        }
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxTagRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> TagService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        TagService::new(SqlxTagRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_create_or_get_reuses_case_insensitive() {
        let service = setup_test_service().await;

        let first = service.create_or_get("Rust").await.unwrap();
        let again = service.create_or_get("  rust ").await.unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(first.slug, "rust");
    }

    #[tokio::test]
    async fn test_colliding_slugs_get_suffix() {
        let service = setup_test_service().await;

        let c = service.create_or_get("C").await.unwrap();
        let cpp = service.create_or_get("C++").await.unwrap();
        let symbols = service.create_or_get("++").await.unwrap();

        assert_eq!(c.slug, "c");
        assert_eq!(cpp.slug, "c-2");
        assert_eq!(symbols.slug, "tag");
    }

    #[tokio::test]
    async fn test_resolve_skips_blank_and_duplicates() {
        let service = setup_test_service().await;

        let names = vec![
            "Django".to_string(),
            " ".to_string(),
            "django".to_string(),
            "Python".to_string(),
        ];
        let tags = service.resolve(&names).await.unwrap();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "Django");
        assert_eq!(tags[1].name, "Python");
    }

    #[tokio::test]
    async fn test_validation() {
        let service = setup_test_service().await;

        assert!(matches!(
            service.create_or_get("").await,
            Err(TagServiceError::ValidationError(_))
        ));
        assert!(matches!(
            service.create_or_get(&"x".repeat(51)).await,
            Err(TagServiceError::ValidationError(_))
        ));
        assert!(matches!(
            service.get_by_slug("missing").await,
            Err(TagServiceError::NotFound(_))
        ));
    }
}

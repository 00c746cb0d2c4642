//! Portfolio service
//!
//! Public showcase pages and project management:
//! - Home and about pages (about statistics are cached)
//! - Project listing, search, detail (with view counting) and likes
//! - Project CRUD with gallery images, restricted to owner or admin
//! - Portfolio categories with a cached list
//! - A member's portfolio page with their resume entries

use crate::cache::{keys, Cache, CacheLayer};
use crate::db::repositories::{
    PortfolioCategoryRepository, ProjectRepository, ResumeRepository, TestimonialRepository,
    UserRepository,
};
use crate::models::{
    deserialize_page, Achievement, CategoryWithCount, CreateProjectInput, DeveloperSummary, Education, Experience,
    LikeStatus, ListParams, PagedResult, PortfolioCategory, PortfolioCategoryInput, Profile,
    Project, ProjectFilter, ProjectImage, ProjectImageInput, ProjectSort, ProjectStatus, Skill,
    Testimonial, UpdateProjectInput, User,
};
use crate::services::tag::{TagService, TagServiceError};
use crate::services::text::{generate_slug, slug_or_existing};
use crate::services::validation::FieldErrors;
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Projects per page on listings, search and category pages
pub const PROJECTS_PER_PAGE: u32 = 12;

/// Projects per page on a member's portfolio
pub const USER_PROJECTS_PER_PAGE: u32 = 9;

const RELATED_PROJECTS: i64 = 4;

/// Error types for portfolio operations
#[derive(Debug, thiserror::Error)]
pub enum PortfolioServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<TagServiceError> for PortfolioServiceError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::NotFound(msg) => Self::NotFound(msg),
            TagServiceError::ValidationError(msg) => {
                Self::ValidationError(FieldErrors::single("tags", msg))
            }
            TagServiceError::InternalError(e) => Self::InternalError(e),
        }
    }
}

// ============================================================================
// Page types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    pub featured_projects: Vec<Project>,
    pub recent_projects: Vec<Project>,
    pub categories: Vec<CategoryWithCount<PortfolioCategory>>,
    pub featured_users: Vec<DeveloperSummary>,
    pub testimonials: Vec<Testimonial>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub total_projects: i64,
    pub total_users: i64,
    pub total_categories: i64,
    pub completed_projects: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AboutPage {
    pub stats: PortfolioStats,
    pub featured_developers: Vec<DeveloperSummary>,
}

/// Query string of the project listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub user: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    #[serde(deserialize_with = "deserialize_page")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectListPage {
    pub projects: PagedResult<Project>,
    pub categories: Vec<PortfolioCategory>,
    pub sort: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub images: Vec<ProjectImage>,
    pub related_projects: Vec<Project>,
    pub testimonials: Vec<Testimonial>,
    pub user_has_liked: bool,
    pub can_edit: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    pub category: PortfolioCategory,
    pub projects: PagedResult<Project>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPortfolio {
    pub portfolio_user: User,
    pub profile: Profile,
    pub projects: PagedResult<Project>,
    pub skills: Vec<Skill>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub achievements: Vec<Achievement>,
    pub testimonials: Vec<Testimonial>,
}

/// Query string of the search page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectSearchQuery {
    pub q: String,
    pub category: Option<String>,
    pub user: Option<String>,
    #[serde(deserialize_with = "deserialize_page")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSearchResults {
    pub query: String,
    pub projects: PagedResult<Project>,
    pub categories: Vec<PortfolioCategory>,
    pub total_results: i64,
}

/// Portfolio service
pub struct PortfolioService {
    projects: Arc<dyn ProjectRepository>,
    categories: Arc<dyn PortfolioCategoryRepository>,
    users: Arc<dyn UserRepository>,
    resume: Arc<dyn ResumeRepository>,
    testimonials: Arc<dyn TestimonialRepository>,
    tags: Arc<TagService>,
    cache: Arc<Cache>,
}

impl PortfolioService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        categories: Arc<dyn PortfolioCategoryRepository>,
        users: Arc<dyn UserRepository>,
        resume: Arc<dyn ResumeRepository>,
        testimonials: Arc<dyn TestimonialRepository>,
        tags: Arc<TagService>,
        cache: Arc<Cache>,
    ) -> Self {
        Self {
            projects,
            categories,
            users,
            resume,
            testimonials,
            tags,
            cache,
        }
    }

    // ========================================================================
    // Public pages
    // ========================================================================

    pub async fn home(&self) -> Result<HomePage, PortfolioServiceError> {
        let featured = ProjectFilter {
            featured_only: true,
            ..ProjectFilter::published()
        };
        let featured_projects = self
            .projects
            .list(&featured, ListParams::new(1, 6))
            .await
            .context("Failed to load featured projects")?;
        let recent_projects = self
            .projects
            .list(&ProjectFilter::published(), ListParams::new(1, 8))
            .await
            .context("Failed to load recent projects")?;
        let categories = self
            .categories
            .list_with_counts(6)
            .await
            .context("Failed to load categories")?;
        let featured_users = self
            .users
            .list_with_projects(6)
            .await
            .context("Failed to load developers")?;
        let testimonials = self
            .testimonials
            .list_featured(5)
            .await
            .context("Failed to load testimonials")?;

        Ok(HomePage {
            featured_projects,
            recent_projects,
            categories,
            featured_users,
            testimonials,
        })
    }

    pub async fn about(&self) -> Result<AboutPage, PortfolioServiceError> {
        let stats = self.stats().await?;
        let featured_developers = self
            .users
            .list_top_developers(8)
            .await
            .context("Failed to load developers")?;

        Ok(AboutPage {
            stats,
            featured_developers,
        })
    }

    /// Site-wide counters, cached
    pub async fn stats(&self) -> Result<PortfolioStats, PortfolioServiceError> {
        if let Some(stats) = self
            .cache
            .get::<PortfolioStats>(keys::PORTFOLIO_STATS)
            .await
            .ok()
            .flatten()
        {
            return Ok(stats);
        }

        let stats = PortfolioStats {
            total_projects: self
                .projects
                .count(&ProjectFilter::published())
                .await
                .context("Failed to count projects")?,
            total_users: self
                .users
                .count_active()
                .await
                .context("Failed to count users")?,
            total_categories: self
                .categories
                .count()
                .await
                .context("Failed to count categories")?,
            completed_projects: self
                .projects
                .count_published_with_status(ProjectStatus::Completed)
                .await
                .context("Failed to count completed projects")?,
        };

        let _ = self
            .cache
            .set(keys::PORTFOLIO_STATS, &stats, self.cache.default_ttl())
            .await;
        Ok(stats)
    }

    /// Published projects with filters, search and sorting
    pub async fn list_projects(
        &self,
        query: &ProjectListQuery,
    ) -> Result<ProjectListPage, PortfolioServiceError> {
        let sort = ProjectSort::parse(query.sort.as_deref());
        let mut filter = ProjectFilter {
            search_tags: true,
            sort,
            status: query.status.as_deref().and_then(|s| s.parse().ok()),
            ..ProjectFilter::published()
        }
        .with_query(query.q.clone().unwrap_or_default());
        filter.category = non_empty(query.category.as_deref());
        filter.username = non_empty(query.user.as_deref());

        let projects = self
            .paginate(&filter, query.page.unwrap_or(1), PROJECTS_PER_PAGE)
            .await?;

        Ok(ProjectListPage {
            projects,
            categories: self.list_categories().await?,
            sort: sort.as_str(),
        })
    }

    /// Search over title, descriptions and technologies
    pub async fn search(
        &self,
        query: &ProjectSearchQuery,
    ) -> Result<ProjectSearchResults, PortfolioServiceError> {
        let mut filter = ProjectFilter {
            search_short_description: true,
            ..ProjectFilter::published()
        }
        .with_query(query.q.clone());
        filter.category = non_empty(query.category.as_deref());
        filter.username = non_empty(query.user.as_deref());

        let projects = self
            .paginate(&filter, query.page.unwrap_or(1), PROJECTS_PER_PAGE)
            .await?;

        Ok(ProjectSearchResults {
            query: query.q.trim().to_string(),
            total_results: projects.total,
            projects,
            categories: self.list_categories().await?,
        })
    }

    /// Project page. Counts a view; unpublished projects are only shown to
    /// their owner and admins.
    pub async fn project_detail(
        &self,
        slug: &str,
        viewer: Option<&User>,
    ) -> Result<ProjectDetail, PortfolioServiceError> {
        let mut project = self
            .projects
            .get_by_slug(slug)
            .await
            .context("Failed to get project")?
            .filter(|p| p.is_visible_to(viewer))
            .ok_or_else(|| PortfolioServiceError::NotFound(format!("Project '{}'", slug)))?;

        self.projects
            .increment_views(project.id)
            .await
            .context("Failed to count project view")?;
        project.views += 1;

        let images = self
            .projects
            .list_images(project.id)
            .await
            .context("Failed to load project images")?;
        let related_projects = self
            .projects
            .list_related(&project, RELATED_PROJECTS)
            .await
            .context("Failed to load related projects")?;
        let testimonials = self
            .testimonials
            .list_by_project(project.id)
            .await
            .context("Failed to load testimonials")?;
        let user_has_liked = match viewer {
            Some(user) => self
                .projects
                .has_liked(project.id, user.id)
                .await
                .context("Failed to check like")?,
            None => false,
        };

        Ok(ProjectDetail {
            can_edit: viewer.map(|u| u.can_edit(project.user_id)).unwrap_or(false),
            project,
            images,
            related_projects,
            testimonials,
            user_has_liked,
        })
    }

    pub async fn user_portfolio(
        &self,
        username: &str,
        page: u32,
    ) -> Result<UserPortfolio, PortfolioServiceError> {
        let user = self
            .users
            .get_by_username(username)
            .await
            .context("Failed to get user")?
            .filter(User::is_active)
            .ok_or_else(|| PortfolioServiceError::NotFound(format!("User '{}'", username)))?;

        let profile = self
            .users
            .get_or_create_profile(user.id)
            .await
            .context("Failed to load profile")?;
        let projects = self
            .paginate(
                &ProjectFilter::published().with_username(user.username.clone()),
                page,
                USER_PROJECTS_PER_PAGE,
            )
            .await?;
        let skills = self
            .resume
            .list_skills(user.id)
            .await
            .context("Failed to load skills")?;
        let experience = self
            .resume
            .list_experience(user.id)
            .await
            .context("Failed to load experience")?;
        let education = self
            .resume
            .list_education(user.id)
            .await
            .context("Failed to load education")?;
        let achievements = self
            .resume
            .list_achievements(user.id, Some(5))
            .await
            .context("Failed to load achievements")?;
        let testimonials = self
            .testimonials
            .list_by_user(user.id, Some(5))
            .await
            .context("Failed to load testimonials")?;

        Ok(UserPortfolio {
            portfolio_user: user,
            profile,
            projects,
            skills,
            experience,
            education,
            achievements,
            testimonials,
        })
    }

    // ========================================================================
    // Project management
    // ========================================================================

    pub async fn get_project(&self, id: i64) -> Result<Project, PortfolioServiceError> {
        self.projects
            .get_by_id(id)
            .await
            .context("Failed to get project")?
            .ok_or_else(|| PortfolioServiceError::NotFound(format!("Project {}", id)))
    }

    pub async fn create_project(
        &self,
        owner: &User,
        input: CreateProjectInput,
    ) -> Result<Project, PortfolioServiceError> {
        let slug = match input.slug.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => generate_slug(s),
            _ => generate_slug(&input.title),
        };

        let now = Utc::now();
        let project = Project {
            id: 0,
            title: input.title.trim().to_string(),
            slug,
            description: input.description,
            short_description: input.short_description.trim().to_string(),
            category_id: input.category_id,
            user_id: owner.id,
            status: input.status,
            start_date: input.start_date,
            end_date: input.end_date,
            client: input.client.trim().to_string(),
            budget: input.budget,
            featured_image: input.featured_image,
            demo_url: input.demo_url.trim().to_string(),
            source_url: input.source_url.trim().to_string(),
            technologies: input.technologies,
            is_featured: input.is_featured,
            is_published: input.is_published,
            views: 0,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
            category: None,
            like_count: 0,
        };

        self.validate_project(&project).await?;
        self.ensure_slug_free(&project.slug, None).await?;

        let created = self
            .projects
            .create(&project)
            .await
            .context("Failed to create project")?;
        self.tags.set_project_tags(created.id, &input.tags).await?;
        self.invalidate().await;

        tracing::info!(project_id = created.id, slug = %created.slug, "Project created");
        self.get_project(created.id).await
    }

    pub async fn update_project(
        &self,
        user: &User,
        id: i64,
        input: UpdateProjectInput,
    ) -> Result<Project, PortfolioServiceError> {
        let mut project = self.get_project(id).await?;
        ensure_can_edit(user, project.user_id)?;

        input.apply(&mut project);
        if let Some(ref slug) = input.slug {
            project.slug = match slug.trim() {
                "" => generate_slug(&project.title),
                s => generate_slug(s),
            };
        }

        self.validate_project(&project).await?;
        self.ensure_slug_free(&project.slug, Some(project.id)).await?;

        self.projects
            .update(&project)
            .await
            .context("Failed to update project")?;
        if let Some(ref tags) = input.tags {
            self.tags.set_project_tags(project.id, tags).await?;
        }
        self.invalidate().await;

        self.get_project(id).await
    }

    pub async fn delete_project(&self, user: &User, id: i64) -> Result<(), PortfolioServiceError> {
        let project = self.get_project(id).await?;
        ensure_can_edit(user, project.user_id)?;

        self.projects
            .delete(id)
            .await
            .context("Failed to delete project")?;
        self.invalidate().await;

        tracing::info!(project_id = id, "Project deleted");
        Ok(())
    }

    pub async fn add_project_image(
        &self,
        user: &User,
        project_id: i64,
        input: ProjectImageInput,
    ) -> Result<ProjectImage, PortfolioServiceError> {
        let project = self.get_project(project_id).await?;
        ensure_can_edit(user, project.user_id)?;

        let mut errors = FieldErrors::new();
        errors.require("image", &input.image);
        errors.max_len("caption", &input.caption, 200);
        errors.into_result().map_err(PortfolioServiceError::ValidationError)?;

        let image = ProjectImage {
            id: 0,
            project_id,
            image: input.image.trim().to_string(),
            caption: input.caption.trim().to_string(),
            order: input.order,
        };
        Ok(self
            .projects
            .add_image(&image)
            .await
            .context("Failed to add project image")?)
    }

    pub async fn remove_project_image(
        &self,
        user: &User,
        image_id: i64,
    ) -> Result<(), PortfolioServiceError> {
        let image = self
            .projects
            .get_image(image_id)
            .await
            .context("Failed to get project image")?
            .ok_or_else(|| PortfolioServiceError::NotFound(format!("Image {}", image_id)))?;
        let project = self.get_project(image.project_id).await?;
        ensure_can_edit(user, project.user_id)?;

        self.projects
            .delete_image(image_id)
            .await
            .context("Failed to delete project image")?;
        Ok(())
    }

    /// Like or unlike a published project
    pub async fn toggle_project_like(
        &self,
        project_id: i64,
        user: &User,
    ) -> Result<LikeStatus, PortfolioServiceError> {
        let project = self.get_project(project_id).await?;
        if !project.is_visible_to(Some(user)) {
            return Err(PortfolioServiceError::NotFound(format!("Project {}", project_id)));
        }

        let liked = self
            .projects
            .toggle_like(project_id, user.id)
            .await
            .context("Failed to toggle like")?;
        let like_count = self
            .projects
            .like_count(project_id)
            .await
            .context("Failed to count likes")?;

        Ok(LikeStatus { liked, like_count })
    }

    // ========================================================================
    // Categories
    // ========================================================================

    /// All categories ordered by name, cached
    pub async fn list_categories(&self) -> Result<Vec<PortfolioCategory>, PortfolioServiceError> {
        if let Some(categories) = self
            .cache
            .get::<Vec<PortfolioCategory>>(keys::PORTFOLIO_CATEGORIES)
            .await
            .ok()
            .flatten()
        {
            return Ok(categories);
        }

        let categories = self
            .categories
            .list()
            .await
            .context("Failed to list categories")?;
        let _ = self
            .cache
            .set(keys::PORTFOLIO_CATEGORIES, &categories, self.cache.default_ttl())
            .await;
        Ok(categories)
    }

    pub async fn category_detail(
        &self,
        slug: &str,
        page: u32,
    ) -> Result<CategoryDetail, PortfolioServiceError> {
        let category = self.get_category(slug).await?;
        let projects = self
            .paginate(
                &ProjectFilter::published().with_category(category.slug.clone()),
                page,
                PROJECTS_PER_PAGE,
            )
            .await?;

        Ok(CategoryDetail { category, projects })
    }

    pub async fn get_category(&self, slug: &str) -> Result<PortfolioCategory, PortfolioServiceError> {
        self.categories
            .get_by_slug(slug)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| PortfolioServiceError::NotFound(format!("Category '{}'", slug)))
    }

    pub async fn create_category(
        &self,
        input: PortfolioCategoryInput,
    ) -> Result<PortfolioCategory, PortfolioServiceError> {
        let category = PortfolioCategory {
            id: 0,
            name: input.name.trim().to_string(),
            slug: category_slug(&input),
            description: input.description.clone(),
            icon: input.icon.trim().to_string(),
            color: input.color_or_default(),
            created_at: Utc::now(),
        };
        self.validate_category(&category, None).await?;

        let created = self
            .categories
            .create(&category)
            .await
            .context("Failed to create category")?;
        self.invalidate().await;
        Ok(created)
    }

    pub async fn update_category(
        &self,
        slug: &str,
        input: PortfolioCategoryInput,
    ) -> Result<PortfolioCategory, PortfolioServiceError> {
        let existing = self.get_category(slug).await?;
        let category = PortfolioCategory {
            name: input.name.trim().to_string(),
            slug: slug_or_existing(input.slug.as_deref(), &existing.slug),
            description: input.description.clone(),
            icon: input.icon.trim().to_string(),
            color: input.color_or_default(),
            ..existing
        };
        self.validate_category(&category, Some(category.id)).await?;

        let updated = self
            .categories
            .update(&category)
            .await
            .context("Failed to update category")?;
        self.invalidate().await;
        Ok(updated)
    }

    /// Delete a category; its projects become uncategorized
    pub async fn delete_category(&self, slug: &str) -> Result<(), PortfolioServiceError> {
        let category = self.get_category(slug).await?;
        self.categories
            .delete(category.id)
            .await
            .context("Failed to delete category")?;
        self.invalidate().await;
        Ok(())
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    async fn paginate(
        &self,
        filter: &ProjectFilter,
        page: u32,
        per_page: u32,
    ) -> Result<PagedResult<Project>, PortfolioServiceError> {
        let total = self
            .projects
            .count(filter)
            .await
            .context("Failed to count projects")?;
        let params = ListParams::new(page, per_page).clamp_to(total);
        let items = self
            .projects
            .list(filter, params)
            .await
            .context("Failed to list projects")?;
        Ok(PagedResult::new(items, total, &params))
    }

    async fn validate_project(&self, project: &Project) -> Result<(), PortfolioServiceError> {
        let mut errors = FieldErrors::new();

        if errors.require("title", &project.title) {
            errors.max_len("title", &project.title, 200);
            if project.slug.is_empty() {
                errors.add("slug", "Enter a valid slug.");
            }
        }
        errors.require("description", &project.description);
        if errors.require("short_description", &project.short_description) {
            errors.max_len("short_description", &project.short_description, 300);
        }
        errors.max_len("client", &project.client, 100);
        errors.url("demo_url", &project.demo_url);
        errors.url("source_url", &project.source_url);
        if project.budget.map(|b| b < 0.0).unwrap_or(false) {
            errors.add("budget", "Ensure this value is greater than or equal to 0.");
        }
        if let (Some(start), Some(end)) = (project.start_date, project.end_date) {
            if end < start {
                errors.add("end_date", "End date cannot be before the start date.");
            }
        }
        if let Some(category_id) = project.category_id {
            if self
                .categories
                .get_by_id(category_id)
                .await
                .context("Failed to check category")?
                .is_none()
            {
                errors.add(
                    "category_id",
                    "Select a valid choice. That choice is not one of the available choices.",
                );
            }
        }

        errors.into_result().map_err(PortfolioServiceError::ValidationError)
    }

    async fn ensure_slug_free(
        &self,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> Result<(), PortfolioServiceError> {
        if self
            .projects
            .exists_by_slug(slug, exclude_id)
            .await
            .context("Failed to check project slug")?
        {
            return Err(PortfolioServiceError::DuplicateSlug(slug.to_string()));
        }
        Ok(())
    }

    async fn validate_category(
        &self,
        category: &PortfolioCategory,
        exclude_id: Option<i64>,
    ) -> Result<(), PortfolioServiceError> {
        let mut errors = FieldErrors::new();
        if errors.require("name", &category.name) {
            errors.max_len("name", &category.name, 100);
            if category.slug.is_empty() {
                errors.add("slug", "Enter a valid slug.");
            }
            if self
                .categories
                .exists_by_name(&category.name, exclude_id)
                .await
                .context("Failed to check category name")?
            {
                errors.add("name", "Category with this Name already exists.");
            }
        }
        errors.max_len("icon", &category.icon, 50);
        errors.into_result().map_err(PortfolioServiceError::ValidationError)?;

        if self
            .categories
            .exists_by_slug(&category.slug, exclude_id)
            .await
            .context("Failed to check category slug")?
        {
            return Err(PortfolioServiceError::DuplicateSlug(category.slug.clone()));
        }
        Ok(())
    }

    async fn invalidate(&self) {
        let _ = self.cache.delete_pattern(keys::PORTFOLIO_PREFIX).await;
    }
}

/// Administrators may edit anything; members only what they own
pub(crate) fn ensure_can_edit(user: &User, owner_id: i64) -> Result<(), PortfolioServiceError> {
    if user.can_edit(owner_id) {
        Ok(())
    } else {
        Err(PortfolioServiceError::PermissionDenied(
            "You can only modify your own content".to_string(),
        ))
    }
}

fn category_slug(input: &PortfolioCategoryInput) -> String {
    match input.slug.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => generate_slug(s),
        _ => generate_slug(&input.name),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

//! Blog service
//!
//! Reading side: home page, listings with search and sorting, post detail
//! with comment threads, category and series pages, search and the date
//! archive. Writing side: post CRUD (author or admin), blog categories
//! (admin) and series (author or admin). The category list is cached.

use crate::cache::{keys, Cache, CacheLayer};
use crate::db::repositories::{BlogCategoryRepository, CommentRepository, PostRepository, SeriesRepository};
use crate::models::{
    deserialize_page, BlogCategory, BlogCategoryInput, BlogSeries, CategoryWithCount, CommentThread,
    CreatePostInput, LikeStatus, ListParams, PagedResult, Post, PostFilter, PostSort, PostStatus,
    SeriesInput, UpdatePostInput, User,
};
use crate::services::tag::{TagService, TagServiceError};
use crate::services::text::{generate_slug, reading_time, slug_or_existing};
use crate::services::validation::FieldErrors;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Posts per page on every paginated blog listing
pub const POSTS_PER_PAGE: u32 = 10;

const RELATED_POSTS: i64 = 4;
const DEFAULT_CATEGORY_COLOR: &str = "#007bff";

/// Error types for blog operations
#[derive(Debug, thiserror::Error)]
pub enum BlogServiceError {
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

impl From<TagServiceError> for BlogServiceError {
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
pub struct BlogHome {
    pub featured_posts: Vec<Post>,
    pub recent_posts: Vec<Post>,
    pub popular_posts: Vec<Post>,
    pub categories: Vec<CategoryWithCount<BlogCategory>>,
    pub series: Vec<BlogSeries>,
}

/// Query string of the post listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub tag: Option<String>,
    pub sort: Option<String>,
    #[serde(deserialize_with = "deserialize_page")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostListPage {
    pub posts: PagedResult<Post>,
    pub categories: Vec<BlogCategory>,
    pub featured_posts: Vec<Post>,
    pub sort: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<CommentThread>,
    pub comment_count: i64,
    pub related_posts: Vec<Post>,
    pub user_has_liked: bool,
    pub series: Option<BlogSeries>,
    pub series_posts: Vec<Post>,
    pub can_edit: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogCategoryDetail {
    pub category: BlogCategory,
    pub posts: PagedResult<Post>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesDetail {
    pub series: BlogSeries,
    pub posts: Vec<Post>,
}

/// Query string of the search page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostSearchQuery {
    pub q: String,
    pub category: Option<String>,
    #[serde(deserialize_with = "deserialize_page")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostSearchResults {
    pub query: String,
    pub current_category: Option<String>,
    pub posts: PagedResult<Post>,
    pub categories: Vec<BlogCategory>,
    pub total_results: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchivePage {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub posts: PagedResult<Post>,
}

/// Blog service
pub struct BlogService {
    posts: Arc<dyn PostRepository>,
    categories: Arc<dyn BlogCategoryRepository>,
    series: Arc<dyn SeriesRepository>,
    comments: Arc<dyn CommentRepository>,
    tags: Arc<TagService>,
    cache: Arc<Cache>,
}

impl BlogService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        categories: Arc<dyn BlogCategoryRepository>,
        series: Arc<dyn SeriesRepository>,
        comments: Arc<dyn CommentRepository>,
        tags: Arc<TagService>,
        cache: Arc<Cache>,
    ) -> Self {
        Self {
            posts,
            categories,
            series,
            comments,
            tags,
            cache,
        }
    }

    // ========================================================================
    // Public pages
    // ========================================================================

    pub async fn blog_home(&self) -> Result<BlogHome, BlogServiceError> {
        let featured_posts = self.featured(3).await?;
        let recent_posts = self
            .posts
            .list(&PostFilter::published(), ListParams::new(1, 6))
            .await
            .context("Failed to load recent posts")?;
        let popular_posts = self
            .posts
            .list(
                &PostFilter::published().with_sort(PostSort::ViewsDesc),
                ListParams::new(1, 5),
            )
            .await
            .context("Failed to load popular posts")?;
        let categories = self
            .categories
            .list_with_counts(8)
            .await
            .context("Failed to load categories")?;
        let series = self
            .series
            .list_with_published_posts(4)
            .await
            .context("Failed to load series")?;

        Ok(BlogHome {
            featured_posts,
            recent_posts,
            popular_posts,
            categories,
            series,
        })
    }

    /// Published posts with filters, search over tags and sorting
    pub async fn list_posts(&self, query: &PostListQuery) -> Result<PostListPage, BlogServiceError> {
        let sort = PostSort::parse(query.sort.as_deref());
        let mut filter = PostFilter {
            search_tags: true,
            sort,
            ..PostFilter::published()
        }
        .with_query(query.q.clone().unwrap_or_default());
        filter.category = non_empty(query.category.as_deref());
        filter.author = non_empty(query.author.as_deref());
        filter.tag = non_empty(query.tag.as_deref());

        let posts = self.paginate(&filter, query.page.unwrap_or(1)).await?;

        Ok(PostListPage {
            posts,
            categories: self.list_categories().await?,
            featured_posts: self.featured(3).await?,
            sort: sort.as_str(),
        })
    }

    /// Published post page. Counts a view.
    pub async fn post_detail(
        &self,
        slug: &str,
        viewer: Option<&User>,
    ) -> Result<PostDetail, BlogServiceError> {
        let mut post = self
            .posts
            .get_by_slug(slug)
            .await
            .context("Failed to get post")?
            .filter(Post::is_published)
            .ok_or_else(|| BlogServiceError::NotFound(format!("Post '{}'", slug)))?;

        self.posts
            .increment_views(post.id)
            .await
            .context("Failed to count post view")?;
        post.views += 1;

        let approved = self
            .comments
            .list_approved(post.id)
            .await
            .context("Failed to load comments")?;
        let comment_count = approved.len() as i64;
        let comments = CommentThread::build(approved);

        let related_posts = self
            .posts
            .list_related(&post, RELATED_POSTS)
            .await
            .context("Failed to load related posts")?;
        let user_has_liked = match viewer {
            Some(user) => self
                .posts
                .has_liked(post.id, user.id)
                .await
                .context("Failed to check like")?,
            None => false,
        };

        let (series, series_posts) = match post.series_id {
            Some(series_id) => {
                let series = self
                    .series
                    .get_by_id(series_id)
                    .await
                    .context("Failed to get series")?;
                let posts = self
                    .posts
                    .list_by_series(series_id)
                    .await
                    .context("Failed to load series posts")?;
                (series, posts)
            }
            None => (None, Vec::new()),
        };

        Ok(PostDetail {
            can_edit: viewer.map(|u| u.can_edit(post.author_id)).unwrap_or(false),
            post,
            comments,
            comment_count,
            related_posts,
            user_has_liked,
            series,
            series_posts,
        })
    }

    /// Title, excerpt and content search
    pub async fn search(&self, query: &PostSearchQuery) -> Result<PostSearchResults, BlogServiceError> {
        let mut filter = PostFilter::published().with_query(query.q.clone());
        filter.category = non_empty(query.category.as_deref());

        let posts = self.paginate(&filter, query.page.unwrap_or(1)).await?;

        Ok(PostSearchResults {
            query: query.q.trim().to_string(),
            current_category: filter.category,
            total_results: posts.total,
            posts,
            categories: self.list_categories().await?,
        })
    }

    /// Published posts by year, or by year and month. A month without a
    /// year is ignored.
    pub async fn archive(
        &self,
        year: Option<i32>,
        month: Option<u32>,
        page: u32,
    ) -> Result<ArchivePage, BlogServiceError> {
        let month = year.and(month);
        let mut filter = PostFilter::published();
        if let Some(year) = year {
            let (from, before) = archive_window(year, month).ok_or_else(|| {
                BlogServiceError::NotFound(format!(
                    "Archive {}/{}",
                    year,
                    month.map(|m| m.to_string()).unwrap_or_default()
                ))
            })?;
            filter.published_from = Some(from);
            filter.published_before = Some(before);
        }

        Ok(ArchivePage {
            year,
            month,
            posts: self.paginate(&filter, page).await?,
        })
    }

    // ========================================================================
    // Posts
    // ========================================================================

    pub async fn get_post(&self, id: i64) -> Result<Post, BlogServiceError> {
        self.posts
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| BlogServiceError::NotFound(format!("Post {}", id)))
    }

    /// Post for editing, any status. Author or admin only.
    pub async fn get_post_for_edit(&self, user: &User, id: i64) -> Result<Post, BlogServiceError> {
        let post = self.get_post(id).await?;
        ensure_can_edit(user, post.author_id)?;
        Ok(post)
    }

    pub async fn create_post(
        &self,
        author: &User,
        input: CreatePostInput,
    ) -> Result<Post, BlogServiceError> {
        let now = Utc::now();
        let mut post = Post {
            id: 0,
            title: input.title.trim().to_string(),
            slug: slug_or_title(input.slug.as_deref(), &input.title),
            author_id: author.id,
            category_id: input.category_id,
            excerpt: input.excerpt.trim().to_string(),
            content: input.content,
            featured_image: input.featured_image,
            status: input.status,
            is_featured: input.is_featured,
            reading_time: 1,
            meta_title: input.meta_title.trim().to_string(),
            meta_description: input.meta_description.trim().to_string(),
            views: 0,
            series_id: input.series_id,
            series_order: input.series_order,
            created_at: now,
            updated_at: now,
            published_at: None,
            tags: Vec::new(),
            category: None,
            author_username: author.username.clone(),
            like_count: 0,
            comment_count: 0,
        };
        prepare_for_save(&mut post);

        self.validate_post(&post).await?;
        self.ensure_slug_free(&post.slug, None).await?;

        let created = self
            .posts
            .create(&post)
            .await
            .context("Failed to create post")?;
        self.tags.set_post_tags(created.id, &input.tags).await?;
        self.invalidate().await;

        tracing::info!(post_id = created.id, slug = %created.slug, status = %created.status, "Post created");
        self.get_post(created.id).await
    }

    pub async fn update_post(
        &self,
        user: &User,
        id: i64,
        input: UpdatePostInput,
    ) -> Result<Post, BlogServiceError> {
        let mut post = self.get_post(id).await?;
        ensure_can_edit(user, post.author_id)?;

        input.apply(&mut post);
        if let Some(ref slug) = input.slug {
            post.slug = slug_or_title(Some(slug), &post.title);
        }
        prepare_for_save(&mut post);

        self.validate_post(&post).await?;
        self.ensure_slug_free(&post.slug, Some(post.id)).await?;

        self.posts
            .update(&post)
            .await
            .context("Failed to update post")?;
        if let Some(ref tags) = input.tags {
            self.tags.set_post_tags(post.id, tags).await?;
        }
        self.invalidate().await;

        self.get_post(id).await
    }

    pub async fn delete_post(&self, user: &User, id: i64) -> Result<(), BlogServiceError> {
        let post = self.get_post(id).await?;
        ensure_can_edit(user, post.author_id)?;

        self.posts
            .delete(id)
            .await
            .context("Failed to delete post")?;
        self.invalidate().await;

        tracing::info!(post_id = id, "Post deleted");
        Ok(())
    }

    /// Like or unlike a published post
    pub async fn toggle_post_like(
        &self,
        post_id: i64,
        user: &User,
    ) -> Result<LikeStatus, BlogServiceError> {
        let post = self.get_post(post_id).await?;
        if !post.is_published() {
            return Err(BlogServiceError::NotFound(format!("Post {}", post_id)));
        }

        let liked = self
            .posts
            .toggle_like(post_id, user.id)
            .await
            .context("Failed to toggle like")?;
        let like_count = self
            .posts
            .like_count(post_id)
            .await
            .context("Failed to count likes")?;

        Ok(LikeStatus { liked, like_count })
    }

    // ========================================================================
    // Categories
    // ========================================================================

    /// All categories ordered by name, cached
    pub async fn list_categories(&self) -> Result<Vec<BlogCategory>, BlogServiceError> {
        if let Some(categories) = self
            .cache
            .get::<Vec<BlogCategory>>(keys::BLOG_CATEGORIES)
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
            .set(keys::BLOG_CATEGORIES, &categories, self.cache.default_ttl())
            .await;
        Ok(categories)
    }

    pub async fn category_detail(
        &self,
        slug: &str,
        page: u32,
    ) -> Result<BlogCategoryDetail, BlogServiceError> {
        let category = self.get_category(slug).await?;
        let posts = self
            .paginate(&PostFilter::published().with_category(category.slug.clone()), page)
            .await?;

        Ok(BlogCategoryDetail { category, posts })
    }

    pub async fn get_category(&self, slug: &str) -> Result<BlogCategory, BlogServiceError> {
        self.categories
            .get_by_slug(slug)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| BlogServiceError::NotFound(format!("Category '{}'", slug)))
    }

    pub async fn create_category(
        &self,
        input: BlogCategoryInput,
    ) -> Result<BlogCategory, BlogServiceError> {
        let category = BlogCategory {
            id: 0,
            name: input.name.trim().to_string(),
            slug: slug_or_title(input.slug.as_deref(), &input.name),
            description: input.description.clone(),
            color: category_color(&input),
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
        input: BlogCategoryInput,
    ) -> Result<BlogCategory, BlogServiceError> {
        let existing = self.get_category(slug).await?;
        let category = BlogCategory {
            name: input.name.trim().to_string(),
            slug: slug_or_existing(input.slug.as_deref(), &existing.slug),
            description: input.description.clone(),
            color: category_color(&input),
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

    /// Delete a category; its posts become uncategorized
    pub async fn delete_category(&self, slug: &str) -> Result<(), BlogServiceError> {
        let category = self.get_category(slug).await?;
        self.categories
            .delete(category.id)
            .await
            .context("Failed to delete category")?;
        self.invalidate().await;
        Ok(())
    }

    // ========================================================================
    // Series
    // ========================================================================

    pub async fn list_series(&self) -> Result<Vec<BlogSeries>, BlogServiceError> {
        Ok(self.series.list().await.context("Failed to list series")?)
    }

    /// Series with its published posts in series order
    pub async fn series_detail(&self, slug: &str) -> Result<SeriesDetail, BlogServiceError> {
        let series = self.get_series(slug).await?;
        let posts = self
            .posts
            .list_by_series(series.id)
            .await
            .context("Failed to load series posts")?;
        Ok(SeriesDetail { series, posts })
    }

    pub async fn get_series(&self, slug: &str) -> Result<BlogSeries, BlogServiceError> {
        self.series
            .get_by_slug(slug)
            .await
            .context("Failed to get series")?
            .ok_or_else(|| BlogServiceError::NotFound(format!("Series '{}'", slug)))
    }

    pub async fn create_series(
        &self,
        author: &User,
        input: SeriesInput,
    ) -> Result<BlogSeries, BlogServiceError> {
        let series = BlogSeries {
            id: 0,
            title: input.title.trim().to_string(),
            slug: slug_or_title(input.slug.as_deref(), &input.title),
            description: input.description,
            image: input.image,
            author_id: author.id,
            is_completed: input.is_completed,
            created_at: Utc::now(),
            post_count: 0,
        };
        self.validate_series(&series, None).await?;

        let created = self
            .series
            .create(&series)
            .await
            .context("Failed to create series")?;
        self.invalidate().await;
        Ok(created)
    }

    pub async fn update_series(
        &self,
        user: &User,
        slug: &str,
        input: SeriesInput,
    ) -> Result<BlogSeries, BlogServiceError> {
        let existing = self.get_series(slug).await?;
        ensure_can_edit(user, existing.author_id)?;

        let series = BlogSeries {
            title: input.title.trim().to_string(),
            slug: slug_or_existing(input.slug.as_deref(), &existing.slug),
            description: input.description,
            image: input.image,
            is_completed: input.is_completed,
            ..existing
        };
        self.validate_series(&series, Some(series.id)).await?;

        let updated = self
            .series
            .update(&series)
            .await
            .context("Failed to update series")?;
        self.invalidate().await;
        Ok(updated)
    }

    /// Delete a series; its posts leave the series
    pub async fn delete_series(&self, user: &User, slug: &str) -> Result<(), BlogServiceError> {
        let series = self.get_series(slug).await?;
        ensure_can_edit(user, series.author_id)?;

        self.series
            .delete(series.id)
            .await
            .context("Failed to delete series")?;
        self.invalidate().await;
        Ok(())
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    async fn featured(&self, limit: u32) -> Result<Vec<Post>, BlogServiceError> {
        let filter = PostFilter {
            featured_only: true,
            ..PostFilter::published()
        };
        Ok(self
            .posts
            .list(&filter, ListParams::new(1, limit))
            .await
            .context("Failed to load featured posts")?)
    }

    async fn paginate(
        &self,
        filter: &PostFilter,
        page: u32,
    ) -> Result<PagedResult<Post>, BlogServiceError> {
        let total = self
            .posts
            .count(filter)
            .await
            .context("Failed to count posts")?;
        let params = ListParams::new(page, POSTS_PER_PAGE).clamp_to(total);
        let items = self
            .posts
            .list(filter, params)
            .await
            .context("Failed to list posts")?;
        Ok(PagedResult::new(items, total, &params))
    }

    async fn validate_post(&self, post: &Post) -> Result<(), BlogServiceError> {
        let mut errors = FieldErrors::new();

        if errors.require("title", &post.title) {
            errors.max_len("title", &post.title, 200);
            if post.slug.is_empty() {
                errors.add("slug", "Enter a valid slug.");
            }
        }
        if errors.require("excerpt", &post.excerpt) {
            errors.max_len("excerpt", &post.excerpt, 300);
        }
        errors.require("content", &post.content);
        errors.max_len("meta_title", &post.meta_title, 60);
        errors.max_len("meta_description", &post.meta_description, 160);
        if post.series_order < 0 {
            errors.add("series_order", "Ensure this value is greater than or equal to 0.");
        }

        if let Some(category_id) = post.category_id {
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
        if let Some(series_id) = post.series_id {
            if self
                .series
                .get_by_id(series_id)
                .await
                .context("Failed to check series")?
                .is_none()
            {
                errors.add(
                    "series_id",
                    "Select a valid choice. That choice is not one of the available choices.",
                );
            }
        }

        errors.into_result().map_err(BlogServiceError::ValidationError)
    }

    async fn ensure_slug_free(
        &self,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> Result<(), BlogServiceError> {
        if self
            .posts
            .exists_by_slug(slug, exclude_id)
            .await
            .context("Failed to check post slug")?
        {
            return Err(BlogServiceError::DuplicateSlug(slug.to_string()));
        }
        Ok(())
    }

    async fn validate_category(
        &self,
        category: &BlogCategory,
        exclude_id: Option<i64>,
    ) -> Result<(), BlogServiceError> {
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
                errors.add("name", "Blog category with this Name already exists.");
            }
        }
        errors.max_len("color", &category.color, 7);
        errors.into_result().map_err(BlogServiceError::ValidationError)?;

        if self
            .categories
            .exists_by_slug(&category.slug, exclude_id)
            .await
            .context("Failed to check category slug")?
        {
            return Err(BlogServiceError::DuplicateSlug(category.slug.clone()));
        }
        Ok(())
    }

    async fn validate_series(
        &self,
        series: &BlogSeries,
        exclude_id: Option<i64>,
    ) -> Result<(), BlogServiceError> {
        let mut errors = FieldErrors::new();
        if errors.require("title", &series.title) {
            errors.max_len("title", &series.title, 200);
            if series.slug.is_empty() {
                errors.add("slug", "Enter a valid slug.");
            }
        }
        errors.require("description", &series.description);
        errors.into_result().map_err(BlogServiceError::ValidationError)?;

        if self
            .series
            .exists_by_slug(&series.slug, exclude_id)
            .await
            .context("Failed to check series slug")?
        {
            return Err(BlogServiceError::DuplicateSlug(series.slug.clone()));
        }
        Ok(())
    }

    async fn invalidate(&self) {
        let _ = self.cache.delete_pattern(keys::BLOG_PREFIX).await;
    }
}

/// Apply the save rules: reading time from content, publication stamp
fn prepare_for_save(post: &mut Post) {
    if !post.content.trim().is_empty() {
        post.reading_time = reading_time(&post.content);
    }
    if post.status == PostStatus::Published && post.published_at.is_none() {
        post.published_at = Some(Utc::now());
    }
}

fn ensure_can_edit(user: &User, owner_id: i64) -> Result<(), BlogServiceError> {
    if user.can_edit(owner_id) {
        Ok(())
    } else {
        Err(BlogServiceError::PermissionDenied(
            "You can only modify your own content".to_string(),
        ))
    }
}

fn slug_or_title(slug: Option<&str>, title: &str) -> String {
    match slug.map(str::trim) {
        Some(s) if !s.is_empty() => generate_slug(s),
        _ => generate_slug(title),
    }
}

fn category_color(input: &BlogCategoryInput) -> String {
    match input.color.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => DEFAULT_CATEGORY_COLOR.to_string(),
    }
}

/// Half-open `published_at` window for a year or a single month
fn archive_window(year: i32, month: Option<u32>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (start, end) = match month {
        Some(month) => {
            let start = NaiveDate::from_ymd_opt(year, month, 1)?;
            let end = if month == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)?
            } else {
                NaiveDate::from_ymd_opt(year, month + 1, 1)?
            };
            (start, end)
        }
        None => (
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
        ),
    };
    Some((
        start.and_hms_opt(0, 0, 0)?.and_utc(),
        end.and_hms_opt(0, 0, 0)?.and_utc(),
    ))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, setup_pool};
    use crate::db::repositories::{
        SqlxBlogCategoryRepository, SqlxCommentRepository, SqlxPostRepository,
        SqlxSeriesRepository, SqlxTagRepository, SqlxUserRepository,
    };
    use crate::models::{Comment, UserRole};
    use chrono::{Datelike, TimeZone};
    use sqlx::SqlitePool;

    struct Fixture {
        pool: SqlitePool,
        service: BlogService,
        comments: Arc<dyn CommentRepository>,
        author: User,
        other: User,
        admin: User,
    }

    async fn setup() -> Fixture {
        let pool = setup_pool().await;
        let users = SqlxUserRepository::boxed(pool.clone());
        let comments = SqlxCommentRepository::boxed(pool.clone());
        let service = BlogService::new(
            SqlxPostRepository::boxed(pool.clone()),
            SqlxBlogCategoryRepository::boxed(pool.clone()),
            SqlxSeriesRepository::boxed(pool.clone()),
            comments.clone(),
            Arc::new(TagService::new(SqlxTagRepository::boxed(pool.clone()))),
            Arc::new(Cache::new()),
        );

        let author_id = insert_user(&pool, "author").await;
        let other_id = insert_user(&pool, "other").await;
        let admin_id = insert_user(&pool, "admin").await;
        users.set_role(admin_id, UserRole::Admin).await.unwrap();

        Fixture {
            author: users.get_by_id(author_id).await.unwrap().unwrap(),
            other: users.get_by_id(other_id).await.unwrap().unwrap(),
            admin: users.get_by_id(admin_id).await.unwrap().unwrap(),
            comments,
            pool,
            service,
        }
    }

    fn post_input(title: &str) -> CreatePostInput {
        CreatePostInput::new(title, "Short excerpt", "Some body text").published()
    }

    async fn add_comment(f: &Fixture, post_id: i64, parent_id: Option<i64>, approved: bool) -> i64 {
        let now = Utc::now();
        f.comments
            .create(&Comment {
                id: 0,
                post_id,
                author_id: f.other.id,
                parent_id,
                content: "Nice post".to_string(),
                is_approved: approved,
                created_at: now,
                updated_at: now,
                author_username: String::new(),
                author_name: String::new(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_post_applies_save_rules() {
        let f = setup().await;
        let body = "word ".repeat(500);

        let post = f
            .service
            .create_post(
                &f.author,
                CreatePostInput::new("Hello, Rust!", "Intro", body)
                    .published()
                    .with_tags(vec!["rust".to_string(), "web".to_string()]),
            )
            .await
            .unwrap();

        assert_eq!(post.slug, "hello-rust");
        assert_eq!(post.reading_time, 2);
        assert!(post.published_at.is_some());
        assert_eq!(post.tags.len(), 2);

        let draft = f
            .service
            .create_post(&f.author, CreatePostInput::new("Draft", "Intro", "Body"))
            .await
            .unwrap();
        assert_eq!(draft.status, PostStatus::Draft);
        assert!(draft.published_at.is_none());
        assert_eq!(draft.reading_time, 1);
    }

    #[tokio::test]
    async fn test_publishing_keeps_first_timestamp() {
        let f = setup().await;
        let draft = f
            .service
            .create_post(&f.author, CreatePostInput::new("Later", "Intro", "Body"))
            .await
            .unwrap();

        let published = f
            .service
            .update_post(
                &f.author,
                draft.id,
                UpdatePostInput::new().with_status(PostStatus::Published),
            )
            .await
            .unwrap();
        let stamp = published.published_at.unwrap();

        let edited = f
            .service
            .update_post(&f.author, draft.id, UpdatePostInput::new().with_content("Edited"))
            .await
            .unwrap();
        assert_eq!(edited.published_at, Some(stamp));
    }

    #[tokio::test]
    async fn test_post_validation_and_conflicts() {
        let f = setup().await;

        let mut input = CreatePostInput::new("", "", "");
        input.meta_title = "m".repeat(61);
        input.category_id = Some(42);
        match f.service.create_post(&f.author, input).await {
            Err(BlogServiceError::ValidationError(errors)) => {
                assert!(errors.contains("title"));
                assert!(errors.contains("excerpt"));
                assert!(errors.contains("content"));
                assert!(errors.contains("meta_title"));
                assert!(errors.contains("category_id"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        f.service.create_post(&f.author, post_input("Twice")).await.unwrap();
        assert!(matches!(
            f.service.create_post(&f.other, post_input("Twice")).await,
            Err(BlogServiceError::DuplicateSlug(_))
        ));
    }

    #[tokio::test]
    async fn test_only_author_or_admin_can_edit() {
        let f = setup().await;
        let post = f.service.create_post(&f.author, post_input("Mine")).await.unwrap();

        assert!(matches!(
            f.service.delete_post(&f.other, post.id).await,
            Err(BlogServiceError::PermissionDenied(_))
        ));
        assert!(matches!(
            f.service.get_post_for_edit(&f.other, post.id).await,
            Err(BlogServiceError::PermissionDenied(_))
        ));
        f.service.delete_post(&f.admin, post.id).await.unwrap();
        assert!(matches!(
            f.service.get_post(post.id).await,
            Err(BlogServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_post_detail() {
        let f = setup().await;
        let post = f.service.create_post(&f.author, post_input("Threads")).await.unwrap();
        f.service
            .create_post(&f.author, CreatePostInput::new("Hidden", "Intro", "Body"))
            .await
            .unwrap();

        let top = add_comment(&f, post.id, None, true).await;
        add_comment(&f, post.id, Some(top), true).await;
        add_comment(&f, post.id, Some(top), false).await;
        add_comment(&f, post.id, None, false).await;

        let detail = f.service.post_detail("threads", Some(&f.author)).await.unwrap();
        assert_eq!(detail.post.views, 1);
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].replies.len(), 1);
        assert_eq!(detail.comment_count, 2);
        assert!(detail.can_edit);
        assert!(detail.series.is_none());

        assert!(matches!(
            f.service.post_detail("hidden", Some(&f.author)).await,
            Err(BlogServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_series_posts_in_order() {
        let f = setup().await;
        let series = f
            .service
            .create_series(&f.author, SeriesInput::new("Learning Rust", "A tour"))
            .await
            .unwrap();
        assert_eq!(series.slug, "learning-rust");

        f.service
            .create_post(&f.author, post_input("Part Two").with_series(series.id, 2))
            .await
            .unwrap();
        f.service
            .create_post(&f.author, post_input("Part One").with_series(series.id, 1))
            .await
            .unwrap();
        f.service
            .create_post(
                &f.author,
                CreatePostInput::new("Part Three", "Intro", "Body").with_series(series.id, 3),
            )
            .await
            .unwrap();

        let detail = f.service.series_detail("learning-rust").await.unwrap();
        let titles: Vec<_> = detail.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Part One", "Part Two"]);

        let post = f.service.post_detail("part-two", None).await.unwrap();
        assert_eq!(post.series.map(|s| s.id), Some(series.id));
        assert_eq!(post.series_posts.len(), 2);

        let renamed = f
            .service
            .update_series(&f.author, "learning-rust", SeriesInput::new("Learning Rust, Again", "A tour"))
            .await
            .unwrap();
        assert_eq!(renamed.title, "Learning Rust, Again");
        assert_eq!(renamed.slug, "learning-rust");

        assert!(matches!(
            f.service
                .update_series(&f.other, "learning-rust", SeriesInput::new("Stolen", "x"))
                .await,
            Err(BlogServiceError::PermissionDenied(_))
        ));
        f.service.delete_series(&f.author, "learning-rust").await.unwrap();
        let orphan = f.service.post_detail("part-one", None).await.unwrap();
        assert!(orphan.post.series_id.is_none());
    }

    #[tokio::test]
    async fn test_list_posts_filters_and_sort() {
        let f = setup().await;
        let tech = f
            .service
            .create_category(BlogCategoryInput::new("Tech"))
            .await
            .unwrap();
        f.service
            .create_post(
                &f.author,
                post_input("Async Rust")
                    .with_category(tech.id)
                    .with_tags(vec!["Tokio".to_string()])
                    .featured(),
            )
            .await
            .unwrap();
        f.service.create_post(&f.other, post_input("Gardening")).await.unwrap();

        let by_tag_text = f
            .service
            .list_posts(&PostListQuery {
                q: Some("tokio".to_string()),
                ..PostListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(by_tag_text.posts.total, 1);
        assert_eq!(by_tag_text.featured_posts.len(), 1);

        let by_author = f
            .service
            .list_posts(&PostListQuery {
                author: Some("other".to_string()),
                ..PostListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(by_author.posts.items[0].title, "Gardening");

        let by_tag = f
            .service
            .list_posts(&PostListQuery {
                tag: Some("tokio".to_string()),
                ..PostListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(by_tag.posts.total, 1);

        let sorted = f
            .service
            .list_posts(&PostListQuery {
                sort: Some("title".to_string()),
                ..PostListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(sorted.sort, "title");
        assert_eq!(sorted.posts.items[0].title, "Async Rust");

        let fallback = f
            .service
            .list_posts(&PostListQuery {
                sort: Some("id; DROP TABLE posts".to_string()),
                ..PostListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(fallback.sort, "-published_at");
        assert_eq!(fallback.categories.len(), 1);

        let results = f
            .service
            .search(&PostSearchQuery {
                q: "tokio".to_string(),
                ..PostSearchQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(results.total_results, 0);

        let results = f
            .service
            .search(&PostSearchQuery {
                q: "body".to_string(),
                category: Some("tech".to_string()),
                page: None,
            })
            .await
            .unwrap();
        assert_eq!(results.total_results, 1);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let f = setup().await;
        f.service
            .create_post(&f.author, post_input("Plain title"))
            .await
            .unwrap();

        let search = |q: &str| PostSearchQuery {
            q: q.to_string(),
            ..PostSearchQuery::default()
        };
        for q in ["%", "_", "\\"] {
            let results = f.service.search(&search(q)).await.unwrap();
            assert_eq!(results.total_results, 0, "query {:?}", q);
        }

        f.service
            .create_post(&f.author, post_input("100% snake_case"))
            .await
            .unwrap();
        assert_eq!(f.service.search(&search("0% s")).await.unwrap().total_results, 1);
        assert_eq!(f.service.search(&search("e_c")).await.unwrap().total_results, 1);
    }

    #[tokio::test]
    async fn test_home_page() {
        let f = setup().await;
        let tech = f
            .service
            .create_category(BlogCategoryInput::new("Tech"))
            .await
            .unwrap();
        f.service
            .create_category(BlogCategoryInput::new("Empty"))
            .await
            .unwrap();
        f.service
            .create_post(&f.author, post_input("Featured").featured().with_category(tech.id))
            .await
            .unwrap();
        f.service.create_post(&f.author, post_input("Plain")).await.unwrap();
        f.service.post_detail("plain", None).await.unwrap();

        let home = f.service.blog_home().await.unwrap();
        assert_eq!(home.featured_posts.len(), 1);
        assert_eq!(home.recent_posts.len(), 2);
        assert_eq!(home.popular_posts[0].title, "Plain");
        assert_eq!(home.categories.len(), 1);
        assert_eq!(home.categories[0].count, 1);
        assert!(home.series.is_empty());
    }

    #[tokio::test]
    async fn test_archive() {
        let f = setup().await;
        let post = f.service.create_post(&f.author, post_input("Old News")).await.unwrap();
        let published = Utc.with_ymd_and_hms(2023, 12, 31, 23, 30, 0).unwrap();
        sqlx::query("UPDATE posts SET published_at = ? WHERE id = ?")
            .bind(published)
            .bind(post.id)
            .execute(&f.pool)
            .await
            .unwrap();
        f.service.create_post(&f.author, post_input("Fresh")).await.unwrap();

        let year = f.service.archive(Some(2023), None, 1).await.unwrap();
        assert_eq!(year.posts.total, 1);

        let december = f.service.archive(Some(2023), Some(12), 1).await.unwrap();
        assert_eq!(december.posts.items[0].title, "Old News");

        let november = f.service.archive(Some(2023), Some(11), 1).await.unwrap();
        assert_eq!(november.posts.total, 0);

        let everything = f.service.archive(None, Some(5), 1).await.unwrap();
        assert_eq!(everything.posts.total, 2);
        assert_eq!(everything.month, None);

        assert!(matches!(
            f.service.archive(Some(2023), Some(13), 1).await,
            Err(BlogServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_post_like() {
        let f = setup().await;
        let post = f.service.create_post(&f.author, post_input("Liked")).await.unwrap();
        let draft = f
            .service
            .create_post(&f.author, CreatePostInput::new("Unliked", "Intro", "Body"))
            .await
            .unwrap();

        let status = f.service.toggle_post_like(post.id, &f.other).await.unwrap();
        assert_eq!(status, LikeStatus { liked: true, like_count: 1 });
        assert!(f.service.post_detail("liked", Some(&f.other)).await.unwrap().user_has_liked);

        let status = f.service.toggle_post_like(post.id, &f.other).await.unwrap();
        assert_eq!(status, LikeStatus { liked: false, like_count: 0 });

        assert!(matches!(
            f.service.toggle_post_like(draft.id, &f.other).await,
            Err(BlogServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_category_crud_and_cache() {
        let f = setup().await;
        let category = f
            .service
            .create_category(BlogCategoryInput::new("Tutorials"))
            .await
            .unwrap();
        assert_eq!(category.color, DEFAULT_CATEGORY_COLOR);
        assert_eq!(f.service.list_categories().await.unwrap().len(), 1);

        match f.service.create_category(BlogCategoryInput::new("Tutorials")).await {
            Err(BlogServiceError::ValidationError(errors)) => assert!(errors.contains("name")),
            other => panic!("expected validation error, got {:?}", other),
        }

        let mut input = BlogCategoryInput::new("Guides");
        input.color = Some("#ff0000".to_string());
        let updated = f.service.update_category("tutorials", input).await.unwrap();
        // renaming keeps the old URL working
        assert_eq!(updated.slug, "tutorials");
        assert_eq!(updated.color, "#ff0000");
        assert_eq!(f.service.get_category("tutorials").await.unwrap().name, "Guides");
        assert_eq!(f.service.list_categories().await.unwrap()[0].name, "Guides");

        let updated = f
            .service
            .update_category("tutorials", BlogCategoryInput::new("Guides").with_slug("guides"))
            .await
            .unwrap();
        assert_eq!(updated.slug, "guides");
        assert!(matches!(
            f.service.get_category("tutorials").await,
            Err(BlogServiceError::NotFound(_))
        ));

        f.service.create_post(&f.author, post_input("Guide").with_category(updated.id)).await.unwrap();
        let detail = f.service.category_detail("guides", 1).await.unwrap();
        assert_eq!(detail.posts.total, 1);
        assert_eq!(detail.posts.per_page, POSTS_PER_PAGE);

        f.service.delete_category("guides").await.unwrap();
        assert!(f.service.list_categories().await.unwrap().is_empty());
        let post = f.service.post_detail("guide", None).await.unwrap();
        assert!(post.post.category_id.is_none());
    }

    #[test]
    fn test_archive_window() {
        let (from, before) = archive_window(2024, Some(12)).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(before, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());

        let (from, before) = archive_window(2024, None).unwrap();
        assert_eq!(from.month(), 1);
        assert_eq!(before.year(), 2025);

        assert!(archive_window(2024, Some(0)).is_none());
    }
}

//! Post repository
//!
//! Database operations for blog posts and their likes.
//!
//! Listings only ever return published posts; drafts and archived posts are
//! reachable through `get_by_*` and `list_by_author`.

use super::{contains_pattern, LIKE_ESCAPE};
use crate::models::{BlogCategory, ListParams, Post, PostFilter, PostStatus, Tag};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: &Post) -> Result<Post>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    async fn update(&self, post: &Post) -> Result<Post>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Published posts matching a filter
    async fn list(&self, filter: &PostFilter, params: ListParams) -> Result<Vec<Post>>;

    async fn count(&self, filter: &PostFilter) -> Result<i64>;

    /// Most recent posts of one author in any status
    async fn list_by_author(&self, author_id: i64, limit: i64) -> Result<Vec<Post>>;

    /// Published posts sharing the category (any published post when the
    /// post has none), excluding the post itself
    async fn list_related(&self, post: &Post, limit: i64) -> Result<Vec<Post>>;

    /// Published posts of a series by `series_order`
    async fn list_by_series(&self, series_id: i64) -> Result<Vec<Post>>;

    async fn increment_views(&self, id: i64) -> Result<()>;

    /// Flip the like of a user, returning the new state
    async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<bool>;

    async fn has_liked(&self, post_id: i64, user_id: i64) -> Result<bool>;

    async fn like_count(&self, post_id: i64) -> Result<i64>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: SqlitePool,
}

impl SqlxPostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_POST: &str = r#"
    SELECT p.id, p.title, p.slug, p.author_id, p.category_id, p.excerpt, p.content,
           p.featured_image, p.status, p.is_featured, p.reading_time, p.meta_title,
           p.meta_description, p.views, p.series_id, p.series_order, p.created_at,
           p.updated_at, p.published_at,
           u.username AS author_username,
           c.name AS category_name, c.slug AS category_slug,
           c.description AS category_description, c.color AS category_color,
           c.created_at AS category_created_at,
           (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS like_count,
           (SELECT COUNT(*) FROM comments m WHERE m.post_id = p.id AND m.is_approved = 1) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN blog_categories c ON c.id = p.category_id
"#;

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, slug, author_id, category_id, excerpt, content,
                featured_image, status, is_featured, reading_time, meta_title, meta_description,
                views, series_id, series_order, created_at, updated_at, published_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(post.author_id)
        .bind(post.category_id)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.featured_image)
        .bind(post.status.as_str())
        .bind(post.is_featured)
        .bind(post.reading_time)
        .bind(&post.meta_title)
        .bind(&post.meta_description)
        .bind(post.series_id)
        .bind(post.series_order)
        .bind(now)
        .bind(now)
        .bind(post.published_at)
        .execute(&self.pool)
        .await
        .context("Failed to create post")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("{} WHERE p.id = ?", SELECT_POST))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post by ID")?;
        self.hydrate_one(row).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("{} WHERE p.slug = ?", SELECT_POST))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post by slug")?;
        self.hydrate_one(row).await
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        sqlx::query(
            r#"
            UPDATE posts
            SET title = ?, slug = ?, category_id = ?, excerpt = ?, content = ?,
                featured_image = ?, status = ?, is_featured = ?, reading_time = ?,
                meta_title = ?, meta_description = ?, series_id = ?, series_order = ?,
                updated_at = ?, published_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(post.category_id)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.featured_image)
        .bind(post.status.as_str())
        .bind(post.is_featured)
        .bind(post.reading_time)
        .bind(&post.meta_title)
        .bind(&post.meta_description)
        .bind(post.series_id)
        .bind(post.series_order)
        .bind(Utc::now())
        .bind(post.published_at)
        .bind(post.id)
        .execute(&self.pool)
        .await
        .context("Failed to update post")?;

        self.get_by_id(post.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE slug = ? AND id != COALESCE(?, 0)")
                .bind(slug)
                .bind(exclude_id)
                .fetch_one(&self.pool)
                .await
                .context("Failed to check post slug existence")?;
        Ok(count > 0)
    }

    async fn list(&self, filter: &PostFilter, params: ListParams) -> Result<Vec<Post>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_POST);
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY ")
            .push(filter.sort.order_clause())
            .push(" LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list posts")?;

        self.hydrate(rows.iter().map(row_to_post).collect()).await
    }

    async fn count(&self, filter: &PostFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT COUNT(*)
            FROM posts p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN blog_categories c ON c.id = p.category_id
            "#,
        );
        push_filters(&mut qb, filter);

        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts")?;
        Ok(row.get(0))
    }

    async fn list_by_author(&self, author_id: i64, limit: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "{} WHERE p.author_id = ? ORDER BY p.created_at DESC, p.id DESC LIMIT ?",
            SELECT_POST
        ))
        .bind(author_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list posts by author")?;

        self.hydrate(rows.iter().map(row_to_post).collect()).await
    }

    async fn list_related(&self, post: &Post, limit: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            r#"{}
            WHERE p.status = 'published' AND p.id != ?
              AND (? IS NULL OR p.category_id = ?)
            ORDER BY p.published_at DESC, p.id DESC
            LIMIT ?"#,
            SELECT_POST
        ))
        .bind(post.id)
        .bind(post.category_id)
        .bind(post.category_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list related posts")?;

        self.hydrate(rows.iter().map(row_to_post).collect()).await
    }

    async fn list_by_series(&self, series_id: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            r#"{}
            WHERE p.series_id = ? AND p.status = 'published'
            ORDER BY p.series_order ASC, p.id ASC"#,
            SELECT_POST
        ))
        .bind(series_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list series posts")?;

        self.hydrate(rows.iter().map(row_to_post).collect()).await
    }

    async fn increment_views(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE posts SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to increment post views")?;
        Ok(())
    }

    async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to remove post like")?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO post_likes (post_id, user_id, created_at) VALUES (?, ?, ?)")
            .bind(post_id)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to add post like")?;
        Ok(true)
    }

    async fn has_liked(&self, post_id: i64, user_id: i64) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = ? AND user_id = ?")
                .bind(post_id)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .context("Failed to check post like")?;
        Ok(count > 0)
    }

    async fn like_count(&self, post_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count post likes")
    }
}

impl SqlxPostRepository {
    async fn hydrate_one(&self, row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<Post>> {
        match row {
            Some(row) => Ok(self.hydrate(vec![row_to_post(&row)]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Attach tags to a batch of posts with a single query
    async fn hydrate(&self, mut posts: Vec<Post>) -> Result<Vec<Post>> {
        if posts.is_empty() {
            return Ok(posts);
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT pt.post_id, t.id, t.name, t.slug, t.created_at
            FROM post_tags pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id IN (
            "#,
        );
        let mut ids = qb.separated(", ");
        for post in &posts {
            ids.push_bind(post.id);
        }
        qb.push(") ORDER BY t.name ASC");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to load post tags")?;

        let mut by_post: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in &rows {
            by_post.entry(row.get("post_id")).or_default().push(Tag {
                id: row.get("id"),
                name: row.get("name"),
                slug: row.get("slug"),
                created_at: row.get("created_at"),
            });
        }

        for post in &mut posts {
            post.tags = by_post.remove(&post.id).unwrap_or_default();
        }
        Ok(posts)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &PostFilter) {
    qb.push(" WHERE p.status = 'published'");

    if let Some(ref query) = filter.query {
        let pattern = contains_pattern(query);
        qb.push(" AND (p.title LIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE)
            .push(" OR p.excerpt LIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE)
            .push(" OR p.content LIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE);
        if filter.search_tags {
            qb.push(
                " OR EXISTS (SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
                 WHERE pt.post_id = p.id AND t.name LIKE ",
            )
            .push_bind(pattern)
            .push(LIKE_ESCAPE)
            .push(")");
        }
        qb.push(")");
    }

    if let Some(ref slug) = filter.category {
        qb.push(" AND c.slug = ").push_bind(slug.clone());
    }
    if let Some(ref author) = filter.author {
        qb.push(" AND u.username = ").push_bind(author.clone());
    }
    if let Some(ref tag) = filter.tag {
        qb.push(
            " AND EXISTS (SELECT 1 FROM post_tags ft JOIN tags t2 ON t2.id = ft.tag_id \
             WHERE ft.post_id = p.id AND (t2.name = ",
        )
        .push_bind(tag.clone())
        .push(" OR t2.slug = ")
        .push_bind(tag.clone())
        .push("))");
    }
    if filter.featured_only {
        qb.push(" AND p.is_featured = 1");
    }
    if let Some(from) = filter.published_from {
        qb.push(" AND p.published_at >= ").push_bind(from);
    }
    if let Some(before) = filter.published_before {
        qb.push(" AND p.published_at < ").push_bind(before);
    }
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Post {
    let status: String = row.get("status");
    let category_id: Option<i64> = row.get("category_id");

    let category = category_id.map(|id| BlogCategory {
        id,
        name: row.get("category_name"),
        slug: row.get("category_slug"),
        description: row.get("category_description"),
        color: row.get("category_color"),
        created_at: row.get("category_created_at"),
    });

    Post {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        author_id: row.get("author_id"),
        category_id,
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        featured_image: row.get("featured_image"),
        status: PostStatus::from_db(&status),
        is_featured: row.get("is_featured"),
        reading_time: row.get("reading_time"),
        meta_title: row.get("meta_title"),
        meta_description: row.get("meta_description"),
        views: row.get("views"),
        series_id: row.get("series_id"),
        series_order: row.get("series_order"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        published_at: row.get("published_at"),
        tags: Vec::new(),
        category,
        author_username: row.get("author_username"),
        like_count: row.get("like_count"),
        comment_count: row.get("comment_count"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, setup_pool};
    use crate::models::PostSort;
    use chrono::{Duration, TimeZone};

    fn post(author_id: i64, slug: &str, status: PostStatus) -> Post {
        let now = Utc::now();
        Post {
            id: 0,
            title: format!("Title {}", slug),
            slug: slug.to_string(),
            author_id,
            category_id: None,
            excerpt: "Excerpt".to_string(),
            content: "Some content".to_string(),
            featured_image: String::new(),
            status,
            is_featured: false,
            reading_time: 1,
            meta_title: String::new(),
            meta_description: String::new(),
            views: 0,
            series_id: None,
            series_order: 0,
            created_at: now,
            updated_at: now,
            published_at: (status == PostStatus::Published).then_some(now),
            tags: Vec::new(),
            category: None,
            author_username: String::new(),
            like_count: 0,
            comment_count: 0,
        }
    }

    async fn setup() -> (SqlitePool, SqlxPostRepository, i64) {
        let pool = setup_pool().await;
        let user_id = insert_user(&pool, "alice").await;
        (pool.clone(), SqlxPostRepository::new(pool), user_id)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_pool, repo, user_id) = setup().await;

        let created = repo.create(&post(user_id, "hello", PostStatus::Published)).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.author_username, "alice");
        assert!(created.published_at.is_some());

        let found = repo.get_by_slug("hello").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_list_only_published() {
        let (_pool, repo, user_id) = setup().await;
        repo.create(&post(user_id, "live", PostStatus::Published)).await.unwrap();
        repo.create(&post(user_id, "draft", PostStatus::Draft)).await.unwrap();
        repo.create(&post(user_id, "old", PostStatus::Archived)).await.unwrap();

        let filter = PostFilter::published();
        let list = repo.list(&filter, ListParams::new(1, 10)).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
        assert_eq!(repo.list_by_author(user_id, 5).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_tag_filter_and_search() {
        let (pool, repo, user_id) = setup().await;
        let tagged = repo.create(&post(user_id, "tagged", PostStatus::Published)).await.unwrap();
        repo.create(&post(user_id, "plain", PostStatus::Published)).await.unwrap();

        let tag_id = sqlx::query("INSERT INTO tags (name, slug, created_at) VALUES ('Async Rust', 'async-rust', ?)")
            .bind(Utc::now())
            .execute(&pool)
            .await
            .unwrap()
            .last_insert_rowid();
        sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(tagged.id)
            .bind(tag_id)
            .execute(&pool)
            .await
            .unwrap();

        let mut by_tag = PostFilter::published();
        by_tag.tag = Some("Async Rust".to_string());
        let list = repo.list(&by_tag, ListParams::new(1, 10)).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].tags[0].slug, "async-rust");

        let mut search = PostFilter::published().with_query("async");
        search.search_tags = true;
        assert_eq!(repo.count(&search).await.unwrap(), 1);
        assert_eq!(repo.count(&PostFilter::published().with_query("async")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_popular_sort_and_views() {
        let (_pool, repo, user_id) = setup().await;
        let a = repo.create(&post(user_id, "a", PostStatus::Published)).await.unwrap();
        repo.create(&post(user_id, "b", PostStatus::Published)).await.unwrap();

        repo.increment_views(a.id).await.unwrap();
        repo.increment_views(a.id).await.unwrap();

        let filter = PostFilter::published().with_sort(PostSort::ViewsDesc);
        let list = repo.list(&filter, ListParams::new(1, 5)).await.unwrap();
        assert_eq!(list[0].slug, "a");
        assert_eq!(list[0].views, 2);
    }

    #[tokio::test]
    async fn test_archive_window() {
        let (_pool, repo, user_id) = setup().await;

        let mut march = post(user_id, "march", PostStatus::Published);
        march.published_at = Some(Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap());
        repo.create(&march).await.unwrap();

        let mut april = post(user_id, "april", PostStatus::Published);
        april.published_at = Some(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
        repo.create(&april).await.unwrap();

        let mut filter = PostFilter::published();
        filter.published_from = Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        filter.published_before = Some(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());

        let list = repo.list(&filter, ListParams::new(1, 10)).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].slug, "march");
    }

    #[tokio::test]
    async fn test_related_and_likes() {
        let (pool, repo, user_id) = setup().await;
        let other = insert_user(&pool, "bob").await;

        let a = repo.create(&post(user_id, "a", PostStatus::Published)).await.unwrap();
        let mut b = post(user_id, "b", PostStatus::Published);
        b.published_at = Some(Utc::now() - Duration::days(1));
        repo.create(&b).await.unwrap();

        let related = repo.list_related(&a, 4).await.unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].slug, "b");

        assert!(repo.toggle_like(a.id, other).await.unwrap());
        assert!(repo.toggle_like(a.id, user_id).await.unwrap());
        assert_eq!(repo.like_count(a.id).await.unwrap(), 2);
        assert!(!repo.toggle_like(a.id, other).await.unwrap());
        assert!(!repo.has_liked(a.id, other).await.unwrap());
        assert_eq!(repo.get_by_id(a.id).await.unwrap().unwrap().like_count, 1);
    }
}

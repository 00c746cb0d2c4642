//! Project repository
//!
//! Database operations for portfolio projects, their gallery images and
//! likes. Listings attach the category, tags and like count so a returned
//! `Project` is ready to serialize.

use super::{contains_pattern, LIKE_ESCAPE};
use crate::models::{
    ListParams, PortfolioCategory, Project, ProjectFilter, ProjectImage, ProjectStatus, Tag,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

/// Project repository trait
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, project: &Project) -> Result<Project>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Project>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Project>>;

    async fn update(&self, project: &Project) -> Result<Project>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// List projects matching a filter with pagination
    async fn list(&self, filter: &ProjectFilter, params: ListParams) -> Result<Vec<Project>>;

    /// Count projects matching a filter
    async fn count(&self, filter: &ProjectFilter) -> Result<i64>;

    /// Most recent projects of one owner, published or not
    async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Project>>;

    /// Published projects in the same category, excluding the project itself
    async fn list_related(&self, project: &Project, limit: i64) -> Result<Vec<Project>>;

    async fn increment_views(&self, id: i64) -> Result<()>;

    /// Published projects with the given status
    async fn count_published_with_status(&self, status: ProjectStatus) -> Result<i64>;

    // Gallery

    async fn add_image(&self, image: &ProjectImage) -> Result<ProjectImage>;

    async fn get_image(&self, id: i64) -> Result<Option<ProjectImage>>;

    async fn delete_image(&self, id: i64) -> Result<()>;

    /// Gallery images ordered by `order`
    async fn list_images(&self, project_id: i64) -> Result<Vec<ProjectImage>>;

    // Likes

    /// Flip the like of a user, returning the new state
    async fn toggle_like(&self, project_id: i64, user_id: i64) -> Result<bool>;

    async fn has_liked(&self, project_id: i64, user_id: i64) -> Result<bool>;

    async fn like_count(&self, project_id: i64) -> Result<i64>;
}

/// SQLx-based project repository implementation
pub struct SqlxProjectRepository {
    pool: SqlitePool,
}

impl SqlxProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn ProjectRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_PROJECT: &str = r#"
    SELECT p.id, p.title, p.slug, p.description, p.short_description, p.category_id,
           p.user_id, p.status, p.start_date, p.end_date, p.client, p.budget,
           p.featured_image, p.demo_url, p.source_url, p.technologies, p.is_featured,
           p.is_published, p.views, p.created_at, p.updated_at,
           c.name AS category_name, c.slug AS category_slug,
           c.description AS category_description, c.icon AS category_icon,
           c.color AS category_color, c.created_at AS category_created_at,
           (SELECT COUNT(*) FROM project_likes l WHERE l.project_id = p.id) AS like_count
    FROM projects p
    LEFT JOIN portfolio_categories c ON c.id = p.category_id
    JOIN users u ON u.id = p.user_id
"#;

#[async_trait]
impl ProjectRepository for SqlxProjectRepository {
    async fn create(&self, project: &Project) -> Result<Project> {
        create_project(&self.pool, project).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Project>> {
        get_project_where(&self.pool, "p.id = ?", ProjectKey::Id(id)).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        get_project_where(&self.pool, "p.slug = ?", ProjectKey::Slug(slug)).await
    }

    async fn update(&self, project: &Project) -> Result<Project> {
        update_project(&self.pool, project).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete project")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM projects WHERE slug = ? AND id != COALESCE(?, 0)",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check project slug existence")?;
        Ok(count > 0)
    }

    async fn list(&self, filter: &ProjectFilter, params: ListParams) -> Result<Vec<Project>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_PROJECT);
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
            .context("Failed to list projects")?;

        self.hydrate(rows.iter().map(row_to_project).collect()).await
    }

    async fn count(&self, filter: &ProjectFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT COUNT(*)
            FROM projects p
            LEFT JOIN portfolio_categories c ON c.id = p.category_id
            JOIN users u ON u.id = p.user_id
            "#,
        );
        push_filters(&mut qb, filter);

        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count projects")?;
        Ok(row.get(0))
    }

    async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Project>> {
        let rows = sqlx::query(&format!(
            "{} WHERE p.user_id = ? ORDER BY p.created_at DESC, p.id DESC LIMIT ?",
            SELECT_PROJECT
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list projects by user")?;

        self.hydrate(rows.iter().map(row_to_project).collect()).await
    }

    async fn list_related(&self, project: &Project, limit: i64) -> Result<Vec<Project>> {
        let rows = sqlx::query(&format!(
            r#"{}
            WHERE p.category_id IS ? AND p.is_published = 1 AND p.id != ?
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ?"#,
            SELECT_PROJECT
        ))
        .bind(project.category_id)
        .bind(project.id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list related projects")?;

        self.hydrate(rows.iter().map(row_to_project).collect()).await
    }

    async fn increment_views(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE projects SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to increment project views")?;
        Ok(())
    }

    async fn count_published_with_status(&self, status: ProjectStatus) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE is_published = 1 AND status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count projects by status")
    }

    async fn add_image(&self, image: &ProjectImage) -> Result<ProjectImage> {
        let result = sqlx::query(
            "INSERT INTO project_images (project_id, image, caption, sort_order) VALUES (?, ?, ?, ?)",
        )
        .bind(image.project_id)
        .bind(&image.image)
        .bind(&image.caption)
        .bind(image.order)
        .execute(&self.pool)
        .await
        .context("Failed to add project image")?;

        Ok(ProjectImage {
            id: result.last_insert_rowid(),
            ..image.clone()
        })
    }

    async fn get_image(&self, id: i64) -> Result<Option<ProjectImage>> {
        let row = sqlx::query(
            "SELECT id, project_id, image, caption, sort_order FROM project_images WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get project image")?;
        Ok(row.as_ref().map(row_to_image))
    }

    async fn delete_image(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM project_images WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete project image")?;
        Ok(())
    }

    async fn list_images(&self, project_id: i64) -> Result<Vec<ProjectImage>> {
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, image, caption, sort_order
            FROM project_images
            WHERE project_id = ?
            ORDER BY sort_order ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list project images")?;
        Ok(rows.iter().map(row_to_image).collect())
    }

    async fn toggle_like(&self, project_id: i64, user_id: i64) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM project_likes WHERE project_id = ? AND user_id = ?")
            .bind(project_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to remove project like")?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO project_likes (project_id, user_id, created_at) VALUES (?, ?, ?)")
            .bind(project_id)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to add project like")?;
        Ok(true)
    }

    async fn has_liked(&self, project_id: i64, user_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM project_likes WHERE project_id = ? AND user_id = ?",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check project like")?;
        Ok(count > 0)
    }

    async fn like_count(&self, project_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM project_likes WHERE project_id = ?")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count project likes")
    }
}

impl SqlxProjectRepository {
    /// Attach tags to a batch of projects with a single query
    async fn hydrate(&self, mut projects: Vec<Project>) -> Result<Vec<Project>> {
        if projects.is_empty() {
            return Ok(projects);
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT pt.project_id, t.id, t.name, t.slug, t.created_at
            FROM project_tags pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.project_id IN (
            "#,
        );
        let mut ids = qb.separated(", ");
        for project in &projects {
            ids.push_bind(project.id);
        }
        qb.push(") ORDER BY t.name ASC");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to load project tags")?;

        let mut by_project: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in &rows {
            by_project.entry(row.get("project_id")).or_default().push(Tag {
                id: row.get("id"),
                name: row.get("name"),
                slug: row.get("slug"),
                created_at: row.get("created_at"),
            });
        }

        for project in &mut projects {
            project.tags = by_project.remove(&project.id).unwrap_or_default();
        }
        Ok(projects)
    }
}

// ============================================================================
// Helpers
// ============================================================================

enum ProjectKey<'a> {
    Id(i64),
    Slug(&'a str),
}

async fn get_project_where(
    pool: &SqlitePool,
    condition: &str,
    key: ProjectKey<'_>,
) -> Result<Option<Project>> {
    let sql = format!("{} WHERE {}", SELECT_PROJECT, condition);
    let query = sqlx::query(&sql);
    let query = match key {
        ProjectKey::Id(id) => query.bind(id),
        ProjectKey::Slug(slug) => query.bind(slug),
    };

    let row = query
        .fetch_optional(pool)
        .await
        .context("Failed to get project")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut project = row_to_project(&row);
    project.tags = load_tags(pool, project.id).await?;
    Ok(Some(project))
}

async fn load_tags(pool: &SqlitePool, project_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name, t.slug, t.created_at
        FROM tags t
        JOIN project_tags pt ON pt.tag_id = t.id
        WHERE pt.project_id = ?
        ORDER BY t.name ASC
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
    .context("Failed to load project tags")?;

    Ok(rows
        .iter()
        .map(|row| Tag {
            id: row.get("id"),
            name: row.get("name"),
            slug: row.get("slug"),
            created_at: row.get("created_at"),
        })
        .collect())
}

async fn create_project(pool: &SqlitePool, project: &Project) -> Result<Project> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO projects (title, slug, description, short_description, category_id, user_id,
            status, start_date, end_date, client, budget, featured_image, demo_url, source_url,
            technologies, is_featured, is_published, views, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&project.title)
    .bind(&project.slug)
    .bind(&project.description)
    .bind(&project.short_description)
    .bind(project.category_id)
    .bind(project.user_id)
    .bind(project.status.as_str())
    .bind(project.start_date)
    .bind(project.end_date)
    .bind(&project.client)
    .bind(project.budget)
    .bind(&project.featured_image)
    .bind(&project.demo_url)
    .bind(&project.source_url)
    .bind(&project.technologies)
    .bind(project.is_featured)
    .bind(project.is_published)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create project")?;

    let id = result.last_insert_rowid();
    get_project_where(pool, "p.id = ?", ProjectKey::Id(id))
        .await?
        .ok_or_else(|| anyhow::anyhow!("Project not found after insert"))
}

async fn update_project(pool: &SqlitePool, project: &Project) -> Result<Project> {
    sqlx::query(
        r#"
        UPDATE projects
        SET title = ?, slug = ?, description = ?, short_description = ?, category_id = ?,
            status = ?, start_date = ?, end_date = ?, client = ?, budget = ?,
            featured_image = ?, demo_url = ?, source_url = ?, technologies = ?,
            is_featured = ?, is_published = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&project.title)
    .bind(&project.slug)
    .bind(&project.description)
    .bind(&project.short_description)
    .bind(project.category_id)
    .bind(project.status.as_str())
    .bind(project.start_date)
    .bind(project.end_date)
    .bind(&project.client)
    .bind(project.budget)
    .bind(&project.featured_image)
    .bind(&project.demo_url)
    .bind(&project.source_url)
    .bind(&project.technologies)
    .bind(project.is_featured)
    .bind(project.is_published)
    .bind(Utc::now())
    .bind(project.id)
    .execute(pool)
    .await
    .context("Failed to update project")?;

    get_project_where(pool, "p.id = ?", ProjectKey::Id(project.id))
        .await?
        .ok_or_else(|| anyhow::anyhow!("Project not found after update"))
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ProjectFilter) {
    qb.push(" WHERE 1 = 1");

    if !filter.include_unpublished {
        qb.push(" AND p.is_published = 1");
    }

    if let Some(ref query) = filter.query {
        let pattern = contains_pattern(query);
        qb.push(" AND (p.title LIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE)
            .push(" OR p.description LIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE)
            .push(" OR p.technologies LIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE);
        if filter.search_short_description {
            qb.push(" OR p.short_description LIKE ")
                .push_bind(pattern.clone())
                .push(LIKE_ESCAPE);
        }
        if filter.search_tags {
            qb.push(
                " OR EXISTS (SELECT 1 FROM project_tags pt JOIN tags t ON t.id = pt.tag_id \
                 WHERE pt.project_id = p.id AND t.name LIKE ",
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
    if let Some(ref username) = filter.username {
        qb.push(" AND u.username = ").push_bind(username.clone());
    }
    if let Some(status) = filter.status {
        qb.push(" AND p.status = ").push_bind(status.as_str());
    }
    if filter.featured_only {
        qb.push(" AND p.is_featured = 1");
    }
}

fn row_to_project(row: &sqlx::sqlite::SqliteRow) -> Project {
    let status: String = row.get("status");
    let category_id: Option<i64> = row.get("category_id");

    let category = category_id.map(|id| PortfolioCategory {
        id,
        name: row.get("category_name"),
        slug: row.get("category_slug"),
        description: row.get("category_description"),
        icon: row.get("category_icon"),
        color: row.get("category_color"),
        created_at: row.get("category_created_at"),
    });

    Project {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        short_description: row.get("short_description"),
        category_id,
        user_id: row.get("user_id"),
        status: ProjectStatus::from_db(&status),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        client: row.get("client"),
        budget: row.get("budget"),
        featured_image: row.get("featured_image"),
        demo_url: row.get("demo_url"),
        source_url: row.get("source_url"),
        technologies: row.get("technologies"),
        is_featured: row.get("is_featured"),
        is_published: row.get("is_published"),
        views: row.get("views"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        tags: Vec::new(),
        category,
        like_count: row.get("like_count"),
    }
}

fn row_to_image(row: &sqlx::sqlite::SqliteRow) -> ProjectImage {
    ProjectImage {
        id: row.get("id"),
        project_id: row.get("project_id"),
        image: row.get("image"),
        caption: row.get("caption"),
        order: row.get("sort_order"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, setup_pool};
    use crate::models::ProjectSort;

    fn project(user_id: i64, slug: &str, title: &str) -> Project {
        let now = Utc::now();
        Project {
            id: 0,
            title: title.to_string(),
            slug: slug.to_string(),
            description: format!("Description of {}", title),
            short_description: "Short".to_string(),
            category_id: None,
            user_id,
            status: ProjectStatus::Completed,
            start_date: None,
            end_date: None,
            client: String::new(),
            budget: Some(1500.0),
            featured_image: String::new(),
            demo_url: String::new(),
            source_url: String::new(),
            technologies: "Rust, Axum".to_string(),
            is_featured: false,
            is_published: true,
            views: 0,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
            category: None,
            like_count: 0,
        }
    }

    async fn setup() -> (SqlitePool, SqlxProjectRepository, i64) {
        let pool = setup_pool().await;
        let user_id = insert_user(&pool, "alice").await;
        (pool.clone(), SqlxProjectRepository::new(pool), user_id)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_pool, repo, user_id) = setup().await;

        let created = repo.create(&project(user_id, "site", "Site")).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.budget, Some(1500.0));

        let found = repo.get_by_slug("site").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.technology_list(), vec!["Rust", "Axum"]);
        assert!(repo.exists_by_slug("site", None).await.unwrap());
        assert!(!repo.exists_by_slug("site", Some(created.id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_hides_unpublished_and_searches_tags() {
        let (pool, repo, user_id) = setup().await;

        let visible = repo.create(&project(user_id, "visible", "Visible")).await.unwrap();
        let mut hidden = project(user_id, "hidden", "Hidden");
        hidden.is_published = false;
        repo.create(&hidden).await.unwrap();

        let tag_id = sqlx::query("INSERT INTO tags (name, slug, created_at) VALUES ('WebAssembly', 'webassembly', ?)")
            .bind(Utc::now())
            .execute(&pool)
            .await
            .unwrap()
            .last_insert_rowid();
        sqlx::query("INSERT INTO project_tags (project_id, tag_id) VALUES (?, ?)")
            .bind(visible.id)
            .bind(tag_id)
            .execute(&pool)
            .await
            .unwrap();

        let params = ListParams::new(1, 12);
        let all = repo.list(&ProjectFilter::published(), params).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].tags.len(), 1);

        let mut by_tag = ProjectFilter::published().with_query("assembly");
        by_tag.search_tags = true;
        assert_eq!(repo.count(&by_tag).await.unwrap(), 1);

        let without_tags = ProjectFilter::published().with_query("assembly");
        assert_eq!(repo.count(&without_tags).await.unwrap(), 0);

        let mut everything = ProjectFilter::published();
        everything.include_unpublished = true;
        assert_eq!(repo.count(&everything).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_sort_and_user_filter() {
        let (pool, repo, user_id) = setup().await;
        let other = insert_user(&pool, "bob").await;

        repo.create(&project(user_id, "b", "Beta")).await.unwrap();
        repo.create(&project(user_id, "a", "Alpha")).await.unwrap();
        repo.create(&project(other, "c", "Gamma")).await.unwrap();

        let mut filter = ProjectFilter::published().with_username("alice");
        filter.sort = ProjectSort::TitleAsc;
        let titles: Vec<_> = repo
            .list(&filter, ListParams::new(1, 12))
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);
    }

    #[tokio::test]
    async fn test_toggle_like() {
        let (_pool, repo, user_id) = setup().await;
        let created = repo.create(&project(user_id, "site", "Site")).await.unwrap();

        assert!(repo.toggle_like(created.id, user_id).await.unwrap());
        assert!(repo.has_liked(created.id, user_id).await.unwrap());
        assert_eq!(repo.like_count(created.id).await.unwrap(), 1);

        assert!(!repo.toggle_like(created.id, user_id).await.unwrap());
        assert_eq!(repo.like_count(created.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_images_ordered() {
        let (_pool, repo, user_id) = setup().await;
        let created = repo.create(&project(user_id, "site", "Site")).await.unwrap();

        for (name, order) in [("b.png", 2), ("a.png", 1)] {
            repo.add_image(&ProjectImage {
                id: 0,
                project_id: created.id,
                image: name.to_string(),
                caption: String::new(),
                order,
            })
            .await
            .unwrap();
        }

        let images = repo.list_images(created.id).await.unwrap();
        assert_eq!(images[0].image, "a.png");

        repo.delete(created.id).await.unwrap();
        assert!(repo.list_images(created.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_related_excludes_self() {
        let (_pool, repo, user_id) = setup().await;
        let one = repo.create(&project(user_id, "one", "One")).await.unwrap();
        repo.create(&project(user_id, "two", "Two")).await.unwrap();

        let related = repo.list_related(&one, 4).await.unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].slug, "two");

        repo.increment_views(one.id).await.unwrap();
        assert_eq!(repo.get_by_id(one.id).await.unwrap().unwrap().views, 1);
        assert_eq!(
            repo.count_published_with_status(ProjectStatus::Completed).await.unwrap(),
            2
        );
    }
}

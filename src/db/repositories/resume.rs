//! Resume repository
//!
//! Skills, experience, education and achievements of a member. Every
//! record is owned by one user and removed with them.

use crate::models::{Achievement, Degree, Education, Experience, Proficiency, Skill};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait ResumeRepository: Send + Sync {
    // Skills

    async fn create_skill(&self, skill: &Skill) -> Result<Skill>;

    async fn get_skill(&self, id: i64) -> Result<Option<Skill>>;

    async fn update_skill(&self, skill: &Skill) -> Result<Skill>;

    async fn delete_skill(&self, id: i64) -> Result<()>;

    /// Skills ordered by percentage descending, then name
    async fn list_skills(&self, user_id: i64) -> Result<Vec<Skill>>;

    async fn skill_name_taken(&self, user_id: i64, name: &str, exclude_id: Option<i64>) -> Result<bool>;

    // Experience

    async fn create_experience(&self, experience: &Experience) -> Result<Experience>;

    async fn get_experience(&self, id: i64) -> Result<Option<Experience>>;

    async fn update_experience(&self, experience: &Experience) -> Result<Experience>;

    async fn delete_experience(&self, id: i64) -> Result<()>;

    /// Experience ordered by start date descending
    async fn list_experience(&self, user_id: i64) -> Result<Vec<Experience>>;

    // Education

    async fn create_education(&self, education: &Education) -> Result<Education>;

    async fn get_education(&self, id: i64) -> Result<Option<Education>>;

    async fn update_education(&self, education: &Education) -> Result<Education>;

    async fn delete_education(&self, id: i64) -> Result<()>;

    /// Education ordered by start date descending
    async fn list_education(&self, user_id: i64) -> Result<Vec<Education>>;

    // Achievements

    async fn create_achievement(&self, achievement: &Achievement) -> Result<Achievement>;

    async fn get_achievement(&self, id: i64) -> Result<Option<Achievement>>;

    async fn update_achievement(&self, achievement: &Achievement) -> Result<Achievement>;

    async fn delete_achievement(&self, id: i64) -> Result<()>;

    /// Achievements ordered by date received descending
    async fn list_achievements(&self, user_id: i64, limit: Option<i64>) -> Result<Vec<Achievement>>;
}

pub struct SqlxResumeRepository {
    pool: SqlitePool,
}

impl SqlxResumeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn ResumeRepository> {
        Arc::new(Self::new(pool))
    }

    async fn delete_from(&self, table: &str, id: i64) -> Result<()> {
        sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table))
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete from {}", table))?;
        Ok(())
    }
}

const SKILL_COLUMNS: &str = "id, user_id, name, proficiency, percentage, icon, category, created_at";
const EXPERIENCE_COLUMNS: &str = "id, user_id, company, position, description, location, \
    start_date, end_date, is_current, company_url, skills_used";
const EDUCATION_COLUMNS: &str = "id, user_id, institution, degree, field_of_study, description, \
    start_date, end_date, is_current, grade, institution_url";
const ACHIEVEMENT_COLUMNS: &str = "id, user_id, title, description, issuer, date_received, \
    credential_id, credential_url, image";

#[async_trait]
impl ResumeRepository for SqlxResumeRepository {
    // ========================================================================
    // Skills
    // ========================================================================

    async fn create_skill(&self, skill: &Skill) -> Result<Skill> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO skills (user_id, name, proficiency, percentage, icon, category, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(skill.user_id)
        .bind(&skill.name)
        .bind(skill.proficiency.as_str())
        .bind(skill.percentage)
        .bind(&skill.icon)
        .bind(&skill.category)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create skill")?;

        Ok(Skill {
            id: result.last_insert_rowid(),
            created_at: now,
            ..skill.clone()
        })
    }

    async fn get_skill(&self, id: i64) -> Result<Option<Skill>> {
        let row = sqlx::query(&format!("SELECT {} FROM skills WHERE id = ?", SKILL_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get skill")?;
        Ok(row.as_ref().map(row_to_skill))
    }

    async fn update_skill(&self, skill: &Skill) -> Result<Skill> {
        sqlx::query(
            "UPDATE skills SET name = ?, proficiency = ?, percentage = ?, icon = ?, category = ? WHERE id = ?",
        )
        .bind(&skill.name)
        .bind(skill.proficiency.as_str())
        .bind(skill.percentage)
        .bind(&skill.icon)
        .bind(&skill.category)
        .bind(skill.id)
        .execute(&self.pool)
        .await
        .context("Failed to update skill")?;

        self.get_skill(skill.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Skill not found after update"))
    }

    async fn delete_skill(&self, id: i64) -> Result<()> {
        self.delete_from("skills", id).await
    }

    async fn list_skills(&self, user_id: i64) -> Result<Vec<Skill>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM skills WHERE user_id = ? ORDER BY percentage DESC, name ASC",
            SKILL_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list skills")?;
        Ok(rows.iter().map(row_to_skill).collect())
    }

    async fn skill_name_taken(&self, user_id: i64, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM skills WHERE user_id = ? AND name = ? AND id != COALESCE(?, 0)",
        )
        .bind(user_id)
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check skill name")?;
        Ok(count > 0)
    }

    // ========================================================================
    // Experience
    // ========================================================================

    async fn create_experience(&self, experience: &Experience) -> Result<Experience> {
        let result = sqlx::query(
            r#"
            INSERT INTO experiences (user_id, company, position, description, location,
                start_date, end_date, is_current, company_url, skills_used)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(experience.user_id)
        .bind(&experience.company)
        .bind(&experience.position)
        .bind(&experience.description)
        .bind(&experience.location)
        .bind(experience.start_date)
        .bind(experience.end_date)
        .bind(experience.is_current)
        .bind(&experience.company_url)
        .bind(&experience.skills_used)
        .execute(&self.pool)
        .await
        .context("Failed to create experience")?;

        Ok(Experience {
            id: result.last_insert_rowid(),
            ..experience.clone()
        })
    }

    async fn get_experience(&self, id: i64) -> Result<Option<Experience>> {
        let row = sqlx::query(&format!("SELECT {} FROM experiences WHERE id = ?", EXPERIENCE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get experience")?;
        Ok(row.as_ref().map(row_to_experience))
    }

    async fn update_experience(&self, experience: &Experience) -> Result<Experience> {
        sqlx::query(
            r#"
            UPDATE experiences
            SET company = ?, position = ?, description = ?, location = ?, start_date = ?,
                end_date = ?, is_current = ?, company_url = ?, skills_used = ?
            WHERE id = ?
            "#,
        )
        .bind(&experience.company)
        .bind(&experience.position)
        .bind(&experience.description)
        .bind(&experience.location)
        .bind(experience.start_date)
        .bind(experience.end_date)
        .bind(experience.is_current)
        .bind(&experience.company_url)
        .bind(&experience.skills_used)
        .bind(experience.id)
        .execute(&self.pool)
        .await
        .context("Failed to update experience")?;

        self.get_experience(experience.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Experience not found after update"))
    }

    async fn delete_experience(&self, id: i64) -> Result<()> {
        self.delete_from("experiences", id).await
    }

    async fn list_experience(&self, user_id: i64) -> Result<Vec<Experience>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM experiences WHERE user_id = ? ORDER BY start_date DESC, id DESC",
            EXPERIENCE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list experience")?;
        Ok(rows.iter().map(row_to_experience).collect())
    }

    // ========================================================================
    // Education
    // ========================================================================

    async fn create_education(&self, education: &Education) -> Result<Education> {
        let result = sqlx::query(
            r#"
            INSERT INTO education (user_id, institution, degree, field_of_study, description,
                start_date, end_date, is_current, grade, institution_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(education.user_id)
        .bind(&education.institution)
        .bind(education.degree.as_str())
        .bind(&education.field_of_study)
        .bind(&education.description)
        .bind(education.start_date)
        .bind(education.end_date)
        .bind(education.is_current)
        .bind(&education.grade)
        .bind(&education.institution_url)
        .execute(&self.pool)
        .await
        .context("Failed to create education")?;

        Ok(Education {
            id: result.last_insert_rowid(),
            ..education.clone()
        })
    }

    async fn get_education(&self, id: i64) -> Result<Option<Education>> {
        let row = sqlx::query(&format!("SELECT {} FROM education WHERE id = ?", EDUCATION_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get education")?;
        Ok(row.as_ref().map(row_to_education))
    }

    async fn update_education(&self, education: &Education) -> Result<Education> {
        sqlx::query(
            r#"
            UPDATE education
            SET institution = ?, degree = ?, field_of_study = ?, description = ?, start_date = ?,
                end_date = ?, is_current = ?, grade = ?, institution_url = ?
            WHERE id = ?
            "#,
        )
        .bind(&education.institution)
        .bind(education.degree.as_str())
        .bind(&education.field_of_study)
        .bind(&education.description)
        .bind(education.start_date)
        .bind(education.end_date)
        .bind(education.is_current)
        .bind(&education.grade)
        .bind(&education.institution_url)
        .bind(education.id)
        .execute(&self.pool)
        .await
        .context("Failed to update education")?;

        self.get_education(education.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Education not found after update"))
    }

    async fn delete_education(&self, id: i64) -> Result<()> {
        self.delete_from("education", id).await
    }

    async fn list_education(&self, user_id: i64) -> Result<Vec<Education>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM education WHERE user_id = ? ORDER BY start_date DESC, id DESC",
            EDUCATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list education")?;
        Ok(rows.iter().map(row_to_education).collect())
    }

    // ========================================================================
    // Achievements
    // ========================================================================

    async fn create_achievement(&self, achievement: &Achievement) -> Result<Achievement> {
        let result = sqlx::query(
            r#"
            INSERT INTO achievements (user_id, title, description, issuer, date_received,
                credential_id, credential_url, image)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(achievement.user_id)
        .bind(&achievement.title)
        .bind(&achievement.description)
        .bind(&achievement.issuer)
        .bind(achievement.date_received)
        .bind(&achievement.credential_id)
        .bind(&achievement.credential_url)
        .bind(&achievement.image)
        .execute(&self.pool)
        .await
        .context("Failed to create achievement")?;

        Ok(Achievement {
            id: result.last_insert_rowid(),
            ..achievement.clone()
        })
    }

    async fn get_achievement(&self, id: i64) -> Result<Option<Achievement>> {
        let row = sqlx::query(&format!("SELECT {} FROM achievements WHERE id = ?", ACHIEVEMENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get achievement")?;
        Ok(row.as_ref().map(row_to_achievement))
    }

    async fn update_achievement(&self, achievement: &Achievement) -> Result<Achievement> {
        sqlx::query(
            r#"
            UPDATE achievements
            SET title = ?, description = ?, issuer = ?, date_received = ?, credential_id = ?,
                credential_url = ?, image = ?
            WHERE id = ?
            "#,
        )
        .bind(&achievement.title)
        .bind(&achievement.description)
        .bind(&achievement.issuer)
        .bind(achievement.date_received)
        .bind(&achievement.credential_id)
        .bind(&achievement.credential_url)
        .bind(&achievement.image)
        .bind(achievement.id)
        .execute(&self.pool)
        .await
        .context("Failed to update achievement")?;

        self.get_achievement(achievement.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Achievement not found after update"))
    }

    async fn delete_achievement(&self, id: i64) -> Result<()> {
        self.delete_from("achievements", id).await
    }

    async fn list_achievements(&self, user_id: i64, limit: Option<i64>) -> Result<Vec<Achievement>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM achievements WHERE user_id = ? ORDER BY date_received DESC, id DESC LIMIT ?",
            ACHIEVEMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list achievements")?;
        Ok(rows.iter().map(row_to_achievement).collect())
    }
}

fn row_to_skill(row: &sqlx::sqlite::SqliteRow) -> Skill {
    let proficiency: String = row.get("proficiency");
    Skill {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        proficiency: Proficiency::from_db(&proficiency),
        percentage: row.get("percentage"),
        icon: row.get("icon"),
        category: row.get("category"),
        created_at: row.get("created_at"),
    }
}

fn row_to_experience(row: &sqlx::sqlite::SqliteRow) -> Experience {
    Experience {
        id: row.get("id"),
        user_id: row.get("user_id"),
        company: row.get("company"),
        position: row.get("position"),
        description: row.get("description"),
        location: row.get("location"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        is_current: row.get("is_current"),
        company_url: row.get("company_url"),
        skills_used: row.get("skills_used"),
    }
}

fn row_to_education(row: &sqlx::sqlite::SqliteRow) -> Education {
    let degree: String = row.get("degree");
    Education {
        id: row.get("id"),
        user_id: row.get("user_id"),
        institution: row.get("institution"),
        degree: Degree::from_db(&degree),
        field_of_study: row.get("field_of_study"),
        description: row.get("description"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        is_current: row.get("is_current"),
        grade: row.get("grade"),
        institution_url: row.get("institution_url"),
    }
}

fn row_to_achievement(row: &sqlx::sqlite::SqliteRow) -> Achievement {
    Achievement {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        description: row.get("description"),
        issuer: row.get("issuer"),
        date_received: row.get("date_received"),
        credential_id: row.get("credential_id"),
        credential_url: row.get("credential_url"),
        image: row.get("image"),
    }
}

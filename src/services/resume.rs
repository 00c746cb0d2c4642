//! Resume service
//!
//! Members manage their own skills, experience, education, achievements
//! and client testimonials. Administrators may manage anyone's.

use crate::db::repositories::{ProjectRepository, ResumeRepository, TestimonialRepository};
use crate::models::{
    Achievement, AchievementInput, Education, EducationInput, Experience, ExperienceInput, Skill,
    SkillInput, Testimonial, TestimonialInput, User,
};
use crate::services::portfolio::{ensure_can_edit, PortfolioServiceError};
use crate::services::validation::FieldErrors;
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

pub struct ResumeService {
    resume: Arc<dyn ResumeRepository>,
    testimonials: Arc<dyn TestimonialRepository>,
    projects: Arc<dyn ProjectRepository>,
}

impl ResumeService {
    pub fn new(
        resume: Arc<dyn ResumeRepository>,
        testimonials: Arc<dyn TestimonialRepository>,
        projects: Arc<dyn ProjectRepository>,
    ) -> Self {
        Self {
            resume,
            testimonials,
            projects,
        }
    }

    // ========================================================================
    // Skills
    // ========================================================================

    pub async fn list_skills(&self, user_id: i64) -> Result<Vec<Skill>, PortfolioServiceError> {
        Ok(self
            .resume
            .list_skills(user_id)
            .await
            .context("Failed to list skills")?)
    }

    pub async fn create_skill(
        &self,
        user: &User,
        input: SkillInput,
    ) -> Result<Skill, PortfolioServiceError> {
        let skill = Skill {
            id: 0,
            user_id: user.id,
            name: input.name.trim().to_string(),
            proficiency: input.proficiency,
            percentage: input.percentage,
            icon: input.icon.trim().to_string(),
            category: input.category.trim().to_string(),
            created_at: Utc::now(),
        };
        self.validate_skill(&skill, None).await?;

        Ok(self
            .resume
            .create_skill(&skill)
            .await
            .context("Failed to create skill")?)
    }

    pub async fn update_skill(
        &self,
        user: &User,
        id: i64,
        input: SkillInput,
    ) -> Result<Skill, PortfolioServiceError> {
        let existing = self.get_skill(user, id).await?;
        let skill = Skill {
            name: input.name.trim().to_string(),
            proficiency: input.proficiency,
            percentage: input.percentage,
            icon: input.icon.trim().to_string(),
            category: input.category.trim().to_string(),
            ..existing
        };
        self.validate_skill(&skill, Some(id)).await?;

        Ok(self
            .resume
            .update_skill(&skill)
            .await
            .context("Failed to update skill")?)
    }

    pub async fn delete_skill(&self, user: &User, id: i64) -> Result<(), PortfolioServiceError> {
        self.get_skill(user, id).await?;
        self.resume
            .delete_skill(id)
            .await
            .context("Failed to delete skill")?;
        Ok(())
    }

    async fn get_skill(&self, user: &User, id: i64) -> Result<Skill, PortfolioServiceError> {
        let skill = self
            .resume
            .get_skill(id)
            .await
            .context("Failed to get skill")?
            .ok_or_else(|| PortfolioServiceError::NotFound(format!("Skill {}", id)))?;
        ensure_can_edit(user, skill.user_id)?;
        Ok(skill)
    }

    async fn validate_skill(
        &self,
        skill: &Skill,
        exclude_id: Option<i64>,
    ) -> Result<(), PortfolioServiceError> {
        let mut errors = FieldErrors::new();
        if errors.require("name", &skill.name) {
            errors.max_len("name", &skill.name, 100);
            if self
                .resume
                .skill_name_taken(skill.user_id, &skill.name, exclude_id)
                .await
                .context("Failed to check skill name")?
            {
                errors.add("name", "Skill with this Name and User already exists.");
            }
        }
        if !(0..=100).contains(&skill.percentage) {
            errors.add("percentage", "Ensure this value is between 0 and 100.");
        }
        errors.max_len("icon", &skill.icon, 50);
        errors.max_len("category", &skill.category, 50);
        errors.into_result().map_err(PortfolioServiceError::ValidationError)
    }

    // ========================================================================
    // Experience
    // ========================================================================

    pub async fn list_experience(&self, user_id: i64) -> Result<Vec<Experience>, PortfolioServiceError> {
        Ok(self
            .resume
            .list_experience(user_id)
            .await
            .context("Failed to list experience")?)
    }

    pub async fn create_experience(
        &self,
        user: &User,
        input: ExperienceInput,
    ) -> Result<Experience, PortfolioServiceError> {
        let experience = experience_from(0, user.id, input);
        validate_experience(&experience)?;

        Ok(self
            .resume
            .create_experience(&experience)
            .await
            .context("Failed to create experience")?)
    }

    pub async fn update_experience(
        &self,
        user: &User,
        id: i64,
        input: ExperienceInput,
    ) -> Result<Experience, PortfolioServiceError> {
        let existing = self
            .resume
            .get_experience(id)
            .await
            .context("Failed to get experience")?
            .ok_or_else(|| PortfolioServiceError::NotFound(format!("Experience {}", id)))?;
        ensure_can_edit(user, existing.user_id)?;

        let experience = experience_from(id, existing.user_id, input);
        validate_experience(&experience)?;

        Ok(self
            .resume
            .update_experience(&experience)
            .await
            .context("Failed to update experience")?)
    }

    pub async fn delete_experience(&self, user: &User, id: i64) -> Result<(), PortfolioServiceError> {
        let existing = self
            .resume
            .get_experience(id)
            .await
            .context("Failed to get experience")?
            .ok_or_else(|| PortfolioServiceError::NotFound(format!("Experience {}", id)))?;
        ensure_can_edit(user, existing.user_id)?;

        self.resume
            .delete_experience(id)
            .await
            .context("Failed to delete experience")?;
        Ok(())
    }

    // ========================================================================
    // Education
    // ========================================================================

    pub async fn list_education(&self, user_id: i64) -> Result<Vec<Education>, PortfolioServiceError> {
        Ok(self
            .resume
            .list_education(user_id)
            .await
            .context("Failed to list education")?)
    }

    pub async fn create_education(
        &self,
        user: &User,
        input: EducationInput,
    ) -> Result<Education, PortfolioServiceError> {
        let education = education_from(0, user.id, input);
        validate_education(&education)?;

        Ok(self
            .resume
            .create_education(&education)
            .await
            .context("Failed to create education")?)
    }

    pub async fn update_education(
        &self,
        user: &User,
        id: i64,
        input: EducationInput,
    ) -> Result<Education, PortfolioServiceError> {
        let existing = self
            .resume
            .get_education(id)
            .await
            .context("Failed to get education")?
            .ok_or_else(|| PortfolioServiceError::NotFound(format!("Education {}", id)))?;
        ensure_can_edit(user, existing.user_id)?;

        let education = education_from(id, existing.user_id, input);
        validate_education(&education)?;

        Ok(self
            .resume
            .update_education(&education)
            .await
            .context("Failed to update education")?)
    }

    pub async fn delete_education(&self, user: &User, id: i64) -> Result<(), PortfolioServiceError> {
        let existing = self
            .resume
            .get_education(id)
            .await
            .context("Failed to get education")?
            .ok_or_else(|| PortfolioServiceError::NotFound(format!("Education {}", id)))?;
        ensure_can_edit(user, existing.user_id)?;

        self.resume
            .delete_education(id)
            .await
            .context("Failed to delete education")?;
        Ok(())
    }

    // ========================================================================
    // Achievements
    // ========================================================================

    pub async fn list_achievements(&self, user_id: i64) -> Result<Vec<Achievement>, PortfolioServiceError> {
        Ok(self
            .resume
            .list_achievements(user_id, None)
            .await
            .context("Failed to list achievements")?)
    }

    pub async fn create_achievement(
        &self,
        user: &User,
        input: AchievementInput,
    ) -> Result<Achievement, PortfolioServiceError> {
        let achievement = achievement_from(0, user.id, input);
        validate_achievement(&achievement)?;

        Ok(self
            .resume
            .create_achievement(&achievement)
            .await
            .context("Failed to create achievement")?)
    }

    pub async fn update_achievement(
        &self,
        user: &User,
        id: i64,
        input: AchievementInput,
    ) -> Result<Achievement, PortfolioServiceError> {
        let existing = self
            .resume
            .get_achievement(id)
            .await
            .context("Failed to get achievement")?
            .ok_or_else(|| PortfolioServiceError::NotFound(format!("Achievement {}", id)))?;
        ensure_can_edit(user, existing.user_id)?;

        let achievement = achievement_from(id, existing.user_id, input);
        validate_achievement(&achievement)?;

        Ok(self
            .resume
            .update_achievement(&achievement)
            .await
            .context("Failed to update achievement")?)
    }

    pub async fn delete_achievement(&self, user: &User, id: i64) -> Result<(), PortfolioServiceError> {
        let existing = self
            .resume
            .get_achievement(id)
            .await
            .context("Failed to get achievement")?
            .ok_or_else(|| PortfolioServiceError::NotFound(format!("Achievement {}", id)))?;
        ensure_can_edit(user, existing.user_id)?;

        self.resume
            .delete_achievement(id)
            .await
            .context("Failed to delete achievement")?;
        Ok(())
    }

    // ========================================================================
    // Testimonials
    // ========================================================================

    pub async fn list_testimonials(&self, user_id: i64) -> Result<Vec<Testimonial>, PortfolioServiceError> {
        Ok(self
            .testimonials
            .list_by_user(user_id, None)
            .await
            .context("Failed to list testimonials")?)
    }

    pub async fn create_testimonial(
        &self,
        user: &User,
        input: TestimonialInput,
    ) -> Result<Testimonial, PortfolioServiceError> {
        let testimonial = Testimonial {
            id: 0,
            user_id: user.id,
            client_name: input.client_name.trim().to_string(),
            client_position: input.client_position.trim().to_string(),
            client_company: input.client_company.trim().to_string(),
            client_image: input.client_image,
            testimonial: input.testimonial,
            rating: input.rating,
            project_id: input.project_id,
            is_featured: input.is_featured,
            created_at: Utc::now(),
        };
        self.validate_testimonial(&testimonial).await?;

        Ok(self
            .testimonials
            .create(&testimonial)
            .await
            .context("Failed to create testimonial")?)
    }

    pub async fn update_testimonial(
        &self,
        user: &User,
        id: i64,
        input: TestimonialInput,
    ) -> Result<Testimonial, PortfolioServiceError> {
        let existing = self.get_testimonial(user, id).await?;
        let testimonial = Testimonial {
            client_name: input.client_name.trim().to_string(),
            client_position: input.client_position.trim().to_string(),
            client_company: input.client_company.trim().to_string(),
            client_image: input.client_image,
            testimonial: input.testimonial,
            rating: input.rating,
            project_id: input.project_id,
            is_featured: input.is_featured,
            ..existing
        };
        self.validate_testimonial(&testimonial).await?;

        Ok(self
            .testimonials
            .update(&testimonial)
            .await
            .context("Failed to update testimonial")?)
    }

    pub async fn delete_testimonial(&self, user: &User, id: i64) -> Result<(), PortfolioServiceError> {
        self.get_testimonial(user, id).await?;
        self.testimonials
            .delete(id)
            .await
            .context("Failed to delete testimonial")?;
        Ok(())
    }

    async fn get_testimonial(&self, user: &User, id: i64) -> Result<Testimonial, PortfolioServiceError> {
        let testimonial = self
            .testimonials
            .get_by_id(id)
            .await
            .context("Failed to get testimonial")?
            .ok_or_else(|| PortfolioServiceError::NotFound(format!("Testimonial {}", id)))?;
        ensure_can_edit(user, testimonial.user_id)?;
        Ok(testimonial)
    }

    async fn validate_testimonial(&self, testimonial: &Testimonial) -> Result<(), PortfolioServiceError> {
        let mut errors = FieldErrors::new();
        if errors.require("client_name", &testimonial.client_name) {
            errors.max_len("client_name", &testimonial.client_name, 100);
        }
        errors.max_len("client_position", &testimonial.client_position, 100);
        errors.max_len("client_company", &testimonial.client_company, 100);
        errors.require("testimonial", &testimonial.testimonial);
        if !(1..=5).contains(&testimonial.rating) {
            errors.add("rating", "Ensure this value is between 1 and 5.");
        }
        if let Some(project_id) = testimonial.project_id {
            let project = self
                .projects
                .get_by_id(project_id)
                .await
                .context("Failed to check project")?;
            if project.is_none() {
                errors.add(
                    "project_id",
                    "Select a valid choice. That choice is not one of the available choices.",
                );
            }
        }
        errors.into_result().map_err(PortfolioServiceError::ValidationError)
    }
}

// ============================================================================
// Record builders and validation
// ============================================================================

fn experience_from(id: i64, user_id: i64, input: ExperienceInput) -> Experience {
    Experience {
        id,
        user_id,
        company: input.company.trim().to_string(),
        position: input.position.trim().to_string(),
        description: input.description,
        location: input.location.trim().to_string(),
        start_date: input.start_date,
        end_date: if input.is_current { None } else { input.end_date },
        is_current: input.is_current,
        company_url: input.company_url.trim().to_string(),
        skills_used: input.skills_used,
    }
}

fn education_from(id: i64, user_id: i64, input: EducationInput) -> Education {
    Education {
        id,
        user_id,
        institution: input.institution.trim().to_string(),
        degree: input.degree,
        field_of_study: input.field_of_study.trim().to_string(),
        description: input.description,
        start_date: input.start_date,
        end_date: if input.is_current { None } else { input.end_date },
        is_current: input.is_current,
        grade: input.grade.trim().to_string(),
        institution_url: input.institution_url.trim().to_string(),
    }
}

fn achievement_from(id: i64, user_id: i64, input: AchievementInput) -> Achievement {
    Achievement {
        id,
        user_id,
        title: input.title.trim().to_string(),
        description: input.description,
        issuer: input.issuer.trim().to_string(),
        date_received: input.date_received,
        credential_id: input.credential_id.trim().to_string(),
        credential_url: input.credential_url.trim().to_string(),
        image: input.image,
    }
}

fn check_date_range(errors: &mut FieldErrors, start: NaiveDate, end: Option<NaiveDate>) {
    if end.map(|end| end < start).unwrap_or(false) {
        errors.add("end_date", "End date cannot be before the start date.");
    }
}

fn validate_experience(experience: &Experience) -> Result<(), PortfolioServiceError> {
    let mut errors = FieldErrors::new();
    if errors.require("company", &experience.company) {
        errors.max_len("company", &experience.company, 200);
    }
    if errors.require("position", &experience.position) {
        errors.max_len("position", &experience.position, 200);
    }
    errors.max_len("location", &experience.location, 100);
    errors.url("company_url", &experience.company_url);
    check_date_range(&mut errors, experience.start_date, experience.end_date);
    errors.into_result().map_err(PortfolioServiceError::ValidationError)
}

fn validate_education(education: &Education) -> Result<(), PortfolioServiceError> {
    let mut errors = FieldErrors::new();
    if errors.require("institution", &education.institution) {
        errors.max_len("institution", &education.institution, 200);
    }
    if errors.require("field_of_study", &education.field_of_study) {
        errors.max_len("field_of_study", &education.field_of_study, 200);
    }
    errors.max_len("grade", &education.grade, 50);
    errors.url("institution_url", &education.institution_url);
    check_date_range(&mut errors, education.start_date, education.end_date);
    errors.into_result().map_err(PortfolioServiceError::ValidationError)
}

fn validate_achievement(achievement: &Achievement) -> Result<(), PortfolioServiceError> {
    let mut errors = FieldErrors::new();
    if errors.require("title", &achievement.title) {
        errors.max_len("title", &achievement.title, 200);
    }
    if errors.require("issuer", &achievement.issuer) {
        errors.max_len("issuer", &achievement.issuer, 200);
    }
    errors.max_len("credential_id", &achievement.credential_id, 100);
    errors.url("credential_url", &achievement.credential_url);
    errors.into_result().map_err(PortfolioServiceError::ValidationError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_project, insert_user, setup_pool};
    use crate::db::repositories::{
        SqlxProjectRepository, SqlxResumeRepository, SqlxTestimonialRepository,
        SqlxUserRepository, UserRepository,
    };
    use crate::models::{Degree, Proficiency, UserRole};

    async fn setup() -> (sqlx::SqlitePool, ResumeService, User, User) {
        let pool = setup_pool().await;
        let service = ResumeService::new(
            SqlxResumeRepository::boxed(pool.clone()),
            SqlxTestimonialRepository::boxed(pool.clone()),
            SqlxProjectRepository::boxed(pool.clone()),
        );
        let users = SqlxUserRepository::new(pool.clone());
        let ada = insert_user(&pool, "ada").await;
        let bob = insert_user(&pool, "bob").await;

        (
            pool,
            service,
            users.get_by_id(ada).await.unwrap().unwrap(),
            users.get_by_id(bob).await.unwrap().unwrap(),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_skill_rules() {
        let (_pool, service, ada, bob) = setup().await;

        let skill = service
            .create_skill(&ada, SkillInput::new("Rust", Proficiency::Expert, 95))
            .await
            .unwrap();

        let duplicate = service
            .create_skill(&ada, SkillInput::new("Rust", Proficiency::Advanced, 80))
            .await;
        assert!(matches!(duplicate, Err(PortfolioServiceError::ValidationError(ref e)) if e.contains("name")));

        // same name is fine for another member
        service
            .create_skill(&bob, SkillInput::new("Rust", Proficiency::Beginner, 10))
            .await
            .unwrap();

        let out_of_range = service
            .create_skill(&ada, SkillInput::new("Go", Proficiency::Beginner, 101))
            .await;
        assert!(matches!(out_of_range, Err(PortfolioServiceError::ValidationError(ref e)) if e.contains("percentage")));

        assert!(matches!(
            service.delete_skill(&bob, skill.id).await,
            Err(PortfolioServiceError::PermissionDenied(_))
        ));

        let updated = service
            .update_skill(&ada, skill.id, SkillInput::new("Rust", Proficiency::Expert, 99))
            .await
            .unwrap();
        assert_eq!(updated.percentage, 99);
    }

    #[tokio::test]
    async fn test_current_experience_drops_end_date() {
        let (_pool, service, ada, _bob) = setup().await;

        let experience = service
            .create_experience(
                &ada,
                ExperienceInput {
                    company: "Acme".to_string(),
                    position: "Engineer".to_string(),
                    description: String::new(),
                    location: String::new(),
                    start_date: date(2020, 1, 1),
                    end_date: Some(date(2021, 1, 1)),
                    is_current: true,
                    company_url: String::new(),
                    skills_used: "Rust, SQL".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(experience.end_date, None);
        assert_eq!(experience.skill_list(), vec!["Rust", "SQL"]);
    }

    #[tokio::test]
    async fn test_education_date_order() {
        let (_pool, service, ada, _bob) = setup().await;

        let result = service
            .create_education(
                &ada,
                EducationInput {
                    institution: "MIT".to_string(),
                    degree: Degree::Master,
                    field_of_study: "CS".to_string(),
                    description: String::new(),
                    start_date: date(2020, 9, 1),
                    end_date: Some(date(2019, 6, 1)),
                    is_current: false,
                    grade: String::new(),
                    institution_url: String::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(PortfolioServiceError::ValidationError(ref e)) if e.contains("end_date")));
    }

    #[tokio::test]
    async fn test_achievement_admin_can_edit() {
        let (pool, service, ada, _bob) = setup().await;
        let admin_id = insert_user(&pool, "root").await;
        let users = SqlxUserRepository::new(pool.clone());
        users.set_role(admin_id, UserRole::Admin).await.unwrap();
        let admin = users.get_by_id(admin_id).await.unwrap().unwrap();

        let input = AchievementInput {
            title: "Certified".to_string(),
            description: String::new(),
            issuer: "Cloud Inc".to_string(),
            date_received: date(2023, 5, 1),
            credential_id: String::new(),
            credential_url: "https://cloud.example/cert/1".to_string(),
            image: String::new(),
        };
        let achievement = service.create_achievement(&ada, input.clone()).await.unwrap();

        let updated = service
            .update_achievement(
                &admin,
                achievement.id,
                AchievementInput {
                    title: "Certified Architect".to_string(),
                    ..input
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Certified Architect");
        assert_eq!(updated.user_id, ada.id);

        service.delete_achievement(&admin, achievement.id).await.unwrap();
        assert!(service.list_achievements(ada.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_testimonial_validation() {
        let (pool, service, ada, _bob) = setup().await;
        let project_id = insert_project(&pool, ada.id, "site", true).await;

        let mut bad = TestimonialInput::new("", "Great work");
        bad.rating = 6;
        bad.project_id = Some(999);
        match service.create_testimonial(&ada, bad).await {
            Err(PortfolioServiceError::ValidationError(errors)) => {
                assert!(errors.contains("client_name"));
                assert!(errors.contains("rating"));
                assert!(errors.contains("project_id"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let mut good = TestimonialInput::new("Client Co", "Great work").featured();
        good.project_id = Some(project_id);
        let testimonial = service.create_testimonial(&ada, good).await.unwrap();
        assert_eq!(testimonial.rating, 5);
        assert_eq!(service.list_testimonials(ada.id).await.unwrap().len(), 1);
    }
}

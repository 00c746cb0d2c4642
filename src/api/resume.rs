//! Resume API endpoints
//!
//! The signed-in member manages their own skills, experience, education,
//! achievements and testimonials. Public visitors read them through
//! `GET /portfolio/users/{username}`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    Achievement, AchievementInput, Education, EducationInput, Experience, ExperienceInput, Skill,
    SkillInput, Testimonial, TestimonialInput,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/portfolio/skills", get(list_skills).post(create_skill))
        .route("/portfolio/skills/{id}", put(update_skill).delete(delete_skill))
        .route("/portfolio/experience", get(list_experience).post(create_experience))
        .route(
            "/portfolio/experience/{id}",
            put(update_experience).delete(delete_experience),
        )
        .route("/portfolio/education", get(list_education).post(create_education))
        .route(
            "/portfolio/education/{id}",
            put(update_education).delete(delete_education),
        )
        .route(
            "/portfolio/achievements",
            get(list_achievements).post(create_achievement),
        )
        .route(
            "/portfolio/achievements/{id}",
            put(update_achievement).delete(delete_achievement),
        )
        .route(
            "/portfolio/testimonials",
            get(list_testimonials).post(create_testimonial),
        )
        .route(
            "/portfolio/testimonials/{id}",
            put(update_testimonial).delete(delete_testimonial),
        )
}

// ============================================================================
// Skills
// ============================================================================

async fn list_skills(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Skill>>, ApiError> {
    Ok(Json(state.resume_service.list_skills(user.id).await?))
}

async fn create_skill(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<SkillInput>,
) -> Result<impl IntoResponse, ApiError> {
    let skill = state.resume_service.create_skill(&user, body).await?;
    Ok((StatusCode::CREATED, Json(skill)))
}

async fn update_skill(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<SkillInput>,
) -> Result<Json<Skill>, ApiError> {
    Ok(Json(state.resume_service.update_skill(&user, id, body).await?))
}

async fn delete_skill(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.resume_service.delete_skill(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Experience
// ============================================================================

async fn list_experience(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Experience>>, ApiError> {
    Ok(Json(state.resume_service.list_experience(user.id).await?))
}

async fn create_experience(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<ExperienceInput>,
) -> Result<impl IntoResponse, ApiError> {
    let experience = state.resume_service.create_experience(&user, body).await?;
    Ok((StatusCode::CREATED, Json(experience)))
}

async fn update_experience(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<ExperienceInput>,
) -> Result<Json<Experience>, ApiError> {
    Ok(Json(state.resume_service.update_experience(&user, id, body).await?))
}

async fn delete_experience(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.resume_service.delete_experience(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Education
// ============================================================================

async fn list_education(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Education>>, ApiError> {
    Ok(Json(state.resume_service.list_education(user.id).await?))
}

async fn create_education(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<EducationInput>,
) -> Result<impl IntoResponse, ApiError> {
    let education = state.resume_service.create_education(&user, body).await?;
    Ok((StatusCode::CREATED, Json(education)))
}

async fn update_education(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<EducationInput>,
) -> Result<Json<Education>, ApiError> {
    Ok(Json(state.resume_service.update_education(&user, id, body).await?))
}

async fn delete_education(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.resume_service.delete_education(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Achievements
// ============================================================================

async fn list_achievements(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Achievement>>, ApiError> {
    Ok(Json(state.resume_service.list_achievements(user.id).await?))
}

async fn create_achievement(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<AchievementInput>,
) -> Result<impl IntoResponse, ApiError> {
    let achievement = state.resume_service.create_achievement(&user, body).await?;
    Ok((StatusCode::CREATED, Json(achievement)))
}

async fn update_achievement(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<AchievementInput>,
) -> Result<Json<Achievement>, ApiError> {
    Ok(Json(state.resume_service.update_achievement(&user, id, body).await?))
}

async fn delete_achievement(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.resume_service.delete_achievement(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Testimonials
// ============================================================================

async fn list_testimonials(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Testimonial>>, ApiError> {
    Ok(Json(state.resume_service.list_testimonials(user.id).await?))
}

async fn create_testimonial(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<TestimonialInput>,
) -> Result<impl IntoResponse, ApiError> {
    let testimonial = state.resume_service.create_testimonial(&user, body).await?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

async fn update_testimonial(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<TestimonialInput>,
) -> Result<Json<Testimonial>, ApiError> {
    Ok(Json(state.resume_service.update_testimonial(&user, id, body).await?))
}

async fn delete_testimonial(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.resume_service.delete_testimonial(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

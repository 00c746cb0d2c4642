//! Resume models
//!
//! Skills, work experience, education and achievements shown on a member's
//! portfolio page. Every record belongs to exactly one user.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::split_csv;

string_enum! {
    /// Self-assessed skill level
    pub enum Proficiency {
        Beginner => ("beginner", "Beginner"),
        Intermediate => ("intermediate", "Intermediate"),
        Advanced => ("advanced", "Advanced"),
        Expert => ("expert", "Expert"),
    }
    default = Intermediate;
}

string_enum! {
    /// Degree earned
    pub enum Degree {
        HighSchool => ("high_school", "High School"),
        Associate => ("associate", "Associate Degree"),
        Bachelor => ("bachelor", "Bachelor's Degree"),
        Master => ("master", "Master's Degree"),
        Phd => ("phd", "PhD"),
        Certificate => ("certificate", "Certificate"),
        Other => ("other", "Other"),
    }
    default = Bachelor;
}

// ============================================================================
// Skill
// ============================================================================

/// Skill shown as a progress bar, ordered by percentage then name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub proficiency: Proficiency,
    /// 0..=100
    pub percentage: i64,
    pub icon: String,
    /// e.g. Frontend, Backend, Database
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillInput {
    pub name: String,
    pub proficiency: Proficiency,
    pub percentage: i64,
    pub icon: String,
    pub category: String,
}

impl SkillInput {
    pub fn new(name: impl Into<String>, proficiency: Proficiency, percentage: i64) -> Self {
        Self {
            name: name.into(),
            proficiency,
            percentage,
            ..Self::default()
        }
    }
}

// ============================================================================
// Experience
// ============================================================================

/// Work history entry, ordered by start date descending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub id: i64,
    pub user_id: i64,
    pub company: String,
    pub position: String,
    pub description: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub company_url: String,
    /// Comma-separated list of skills used
    pub skills_used: String,
}

impl Experience {
    /// Elapsed time as "N year(s), M month(s)".
    ///
    /// Current positions (or ones without an end date) run until `today`.
    pub fn duration_until(&self, today: NaiveDate) -> String {
        let end = if self.is_current {
            today
        } else {
            self.end_date.unwrap_or(today)
        };
        let days = (end - self.start_date).num_days().max(0);
        let years = days / 365;
        let months = (days % 365) / 30;

        if years > 0 {
            format!("{} year(s), {} month(s)", years, months)
        } else {
            format!("{} month(s)", months)
        }
    }

    pub fn duration(&self) -> String {
        self.duration_until(Utc::now().date_naive())
    }

    pub fn skill_list(&self) -> Vec<String> {
        split_csv(&self.skills_used)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceInput {
    pub company: String,
    pub position: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub company_url: String,
    #[serde(default)]
    pub skills_used: String,
}

// ============================================================================
// Education
// ============================================================================

/// Education entry, ordered by start date descending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub id: i64,
    pub user_id: i64,
    pub institution: String,
    pub degree: Degree,
    pub field_of_study: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub grade: String,
    pub institution_url: String,
}

impl Education {
    pub fn degree_label(&self) -> &'static str {
        self.degree.label()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EducationInput {
    pub institution: String,
    #[serde(default)]
    pub degree: Degree,
    pub field_of_study: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub institution_url: String,
}

// ============================================================================
// Achievement
// ============================================================================

/// Certification or award, ordered by date received descending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub issuer: String,
    pub date_received: NaiveDate,
    pub credential_id: String,
    pub credential_url: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub issuer: String,
    pub date_received: NaiveDate,
    #[serde(default)]
    pub credential_id: String,
    #[serde(default)]
    pub credential_url: String,
    #[serde(default)]
    pub image: String,
}

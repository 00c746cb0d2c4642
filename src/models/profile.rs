//! Profile model
//!
//! One-to-one extension of `User` carrying resume and hiring details.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{double_option, split_csv};

/// Extended profile information for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub company: String,
    pub position: String,
    /// Comma-separated list of skills
    pub skills: String,
    /// Relative path of the uploaded resume
    pub resume: String,
    pub is_available_for_hire: bool,
    pub hourly_rate: Option<f64>,
}

impl Profile {
    /// Empty profile for a user, available for hire by default
    pub fn new(user_id: i64) -> Self {
        Self {
            id: 0,
            user_id,
            phone: String::new(),
            date_of_birth: None,
            company: String::new(),
            position: String::new(),
            skills: String::new(),
            resume: String::new(),
            is_available_for_hire: true,
            hourly_rate: None,
        }
    }

    /// Skills as a trimmed list
    pub fn skill_list(&self) -> Vec<String> {
        split_csv(&self.skills)
    }

    pub fn apply(&mut self, input: &UpdateProfileInput) {
        if let Some(ref v) = input.phone {
            self.phone = v.trim().to_string();
        }
        if let Some(v) = input.date_of_birth {
            self.date_of_birth = v;
        }
        if let Some(ref v) = input.company {
            self.company = v.clone();
        }
        if let Some(ref v) = input.position {
            self.position = v.clone();
        }
        if let Some(ref v) = input.skills {
            self.skills = v.clone();
        }
        if let Some(ref v) = input.resume {
            self.resume = v.clone();
        }
        if let Some(v) = input.is_available_for_hire {
            self.is_available_for_hire = v;
        }
        if let Some(v) = input.hourly_rate {
            self.hourly_rate = v;
        }
    }
}

/// Editable profile fields; `null` clears nullable values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateProfileInput {
    pub phone: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub skills: Option<String>,
    pub resume: Option<String>,
    pub is_available_for_hire: Option<bool>,
    #[serde(deserialize_with = "double_option")]
    pub hourly_rate: Option<Option<f64>>,
}

impl UpdateProfileInput {
    pub fn has_changes(&self) -> bool {
        self.phone.is_some()
            || self.date_of_birth.is_some()
            || self.company.is_some()
            || self.position.is_some()
            || self.skills.is_some()
            || self.resume.is_some()
            || self.is_available_for_hire.is_some()
            || self.hourly_rate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_available_for_hire() {
        let profile = Profile::new(7);
        assert_eq!(profile.user_id, 7);
        assert!(profile.is_available_for_hire);
        assert!(profile.skill_list().is_empty());
    }

    #[test]
    fn test_skill_list_trims() {
        let mut profile = Profile::new(1);
        profile.skills = "Python, Django ,Rust".to_string();
        assert_eq!(profile.skill_list(), vec!["Python", "Django", "Rust"]);
    }

    #[test]
    fn test_apply_clears_hourly_rate() {
        let mut profile = Profile::new(1);
        profile.hourly_rate = Some(80.0);

        let input: UpdateProfileInput =
            serde_json::from_str(r#"{"hourly_rate": null, "company": "Acme"}"#).unwrap();
        profile.apply(&input);

        assert_eq!(profile.hourly_rate, None);
        assert_eq!(profile.company, "Acme");
    }
}

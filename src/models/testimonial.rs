//! Testimonial model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client feedback attached to a member and optionally a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: i64,
    pub user_id: i64,
    pub client_name: String,
    pub client_position: String,
    pub client_company: String,
    pub client_image: String,
    pub testimonial: String,
    /// 1..=5
    pub rating: i64,
    pub project_id: Option<i64>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestimonialInput {
    pub client_name: String,
    #[serde(default)]
    pub client_position: String,
    #[serde(default)]
    pub client_company: String,
    #[serde(default)]
    pub client_image: String,
    pub testimonial: String,
    #[serde(default = "default_rating")]
    pub rating: i64,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub is_featured: bool,
}

fn default_rating() -> i64 {
    5
}

impl TestimonialInput {
    pub fn new(client_name: impl Into<String>, testimonial: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            client_position: String::new(),
            client_company: String::new(),
            client_image: String::new(),
            testimonial: testimonial.into(),
            rating: default_rating(),
            project_id: None,
            is_featured: false,
        }
    }

    pub fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_defaults_to_five() {
        let input: TestimonialInput =
            serde_json::from_str(r#"{"client_name": "Jo", "testimonial": "Great"}"#).unwrap();
        assert_eq!(input.rating, 5);
        assert_eq!(TestimonialInput::new("a", "b").rating, 5);
    }
}

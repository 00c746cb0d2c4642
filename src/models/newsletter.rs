//! Newsletter subscription model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Newsletter {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
}

impl std::fmt::Display for Newsletter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = if self.name.is_empty() { "No name" } else { &self.name };
        write!(f, "{} ({})", self.email, name)
    }
}

//! User model
//!
//! Account records for site members. Email is the login identifier and the
//! first registered account becomes the site administrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default avatar assigned to new accounts
pub const DEFAULT_PROFILE_PICTURE: &str = "default_profile.jpg";

/// User entity representing a registered member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Username (unique, used in profile URLs)
    pub username: String,
    /// Email address (unique, login identifier)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub location: String,
    pub website: String,
    pub github: String,
    pub linkedin: String,
    pub twitter: String,
    /// Relative path of the uploaded avatar
    pub profile_picture: String,
    pub is_verified: bool,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password should already be hashed with
    /// `services::password::hash_password()`.
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash,
            first_name,
            last_name,
            bio: String::new(),
            location: String::new(),
            website: String::new(),
            github: String::new(),
            linkedin: String::new(),
            twitter: String::new(),
            profile_picture: DEFAULT_PROFILE_PICTURE.to_string(),
            is_verified: false,
            role,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// "First Last", trimmed when either part is blank
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Check if the user is a site administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Check if the account may log in
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Administrators may edit anything; members only what they own.
    pub fn can_edit(&self, owner_id: i64) -> bool {
        self.is_admin() || self.id == owner_id
    }

    /// Apply a profile update to the account fields
    pub fn apply(&mut self, input: &UpdateUserInput) {
        if let Some(ref v) = input.first_name {
            self.first_name = v.trim().to_string();
        }
        if let Some(ref v) = input.last_name {
            self.last_name = v.trim().to_string();
        }
        if let Some(ref v) = input.bio {
            self.bio = v.clone();
        }
        if let Some(ref v) = input.location {
            self.location = v.clone();
        }
        if let Some(ref v) = input.website {
            self.website = v.trim().to_string();
        }
        if let Some(ref v) = input.github {
            self.github = v.trim().to_string();
        }
        if let Some(ref v) = input.linkedin {
            self.linkedin = v.trim().to_string();
        }
        if let Some(ref v) = input.twitter {
            self.twitter = v.trim().to_string();
        }
        if let Some(ref v) = input.profile_picture {
            self.profile_picture = if v.trim().is_empty() {
                DEFAULT_PROFILE_PICTURE.to_string()
            } else {
                v.clone()
            };
        }
    }
}

string_enum! {
    /// Site-wide role
    pub enum UserRole {
        /// Staff: manages categories, FAQs, contact messages and moderation
        Admin => ("admin", "Administrator"),
        /// Regular member managing their own portfolio and posts
        Member => ("member", "Member"),
    }
    default = Member;
}

string_enum! {
    /// Account state; inactive accounts cannot log in and are hidden from listings
    pub enum UserStatus {
        Active => ("active", "Active"),
        Inactive => ("inactive", "Inactive"),
    }
    default = Active;
}

/// Editable account fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateUserInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub profile_picture: Option<String>,
}

impl UpdateUserInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.first_name.is_some()
            || self.last_name.is_some()
            || self.bio.is_some()
            || self.location.is_some()
            || self.website.is_some()
            || self.github.is_some()
            || self.linkedin.is_some()
            || self.twitter.is_some()
            || self.profile_picture.is_some()
    }
}

/// A member shown on the home and about pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeveloperSummary {
    #[serde(flatten)]
    pub user: User,
    /// Number of projects owned by the member
    pub project_count: i64,
}

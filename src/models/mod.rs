//! Data models
//!
//! Entities for the four apps (accounts, portfolio, blog, contact), the
//! request inputs that create and update them, and the pagination types
//! shared by every list endpoint.

use serde::{Deserialize, Deserializer};

/// Declare a string-backed enum stored as lowercase text.
///
/// Generates `as_str`, `label`, `ALL`, `Display`, `FromStr` and a
/// `from_db` helper that falls back to the default variant.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => ($value:literal, $label:literal) ),+ $(,)?
        }
        default = $default:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $value)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Database string representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            /// Human-readable label
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Parse a stored value, falling back to the default variant
            pub fn from_db(s: &str) -> Self {
                s.parse().unwrap_or_default()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($value => Ok($name::$variant),)+
                    _ => Err(anyhow::anyhow!(concat!("Invalid ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

mod blog_category;
mod comment;
mod contact;
mod newsletter;
mod pagination;
mod portfolio_category;
mod post;
mod profile;
mod project;
mod resume;
mod series;
mod session;
mod tag;
mod testimonial;
mod user;

pub use blog_category::{BlogCategory, BlogCategoryInput, CategoryWithCount};
pub use comment::{Comment, CommentThread, CreateCommentInput};
pub use contact::{
    ContactInfo, ContactInfoInput, ContactMessage, ContactReply, Faq, FaqCategory, FaqInput,
    MessageStats, MessageStatus, MessageSubject, Priority, SubmitContactInput, UpdateFaqInput,
};
pub use newsletter::Newsletter;
pub use pagination::{deserialize_page, deserialize_page_or_first, ListParams, PagedResult};
pub use portfolio_category::{PortfolioCategory, PortfolioCategoryInput};
pub use post::{CreatePostInput, Post, PostFilter, PostSort, PostStatus, UpdatePostInput};
pub use profile::{Profile, UpdateProfileInput};
pub use project::{
    CreateProjectInput, Project, ProjectFilter, ProjectImage, ProjectImageInput, ProjectSort,
    ProjectStatus, UpdateProjectInput,
};
pub use resume::{
    Achievement, AchievementInput, Degree, Education, EducationInput, Experience,
    ExperienceInput, Proficiency, Skill, SkillInput,
};
pub use series::{BlogSeries, SeriesInput};
pub use session::Session;
pub use tag::{Tag, TagWithCount};
pub use testimonial::{Testimonial, TestimonialInput};
pub use user::{DeveloperSummary, UpdateUserInput, User, UserRole, UserStatus};

/// Result of toggling a like on a post or project
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LikeStatus {
    pub liked: bool,
    pub like_count: i64,
}

/// Deserialize a field that distinguishes "absent" from "explicit null".
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>`: a missing key stays `None`, `null` becomes
/// `Some(None)` (clear the value) and a value becomes `Some(Some(v))`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Split a comma-separated list into trimmed, non-empty items
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod blog_category;
pub mod comment;
pub mod contact;
pub mod contact_info;
pub mod faq;
pub mod newsletter;
pub mod portfolio_category;
pub mod post;
pub mod project;
pub mod resume;
pub mod series;
pub mod session;
pub mod tag;
pub mod testimonial;
pub mod user;

pub use blog_category::{BlogCategoryRepository, SqlxBlogCategoryRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use contact::{ContactRepository, SqlxContactRepository};
pub use contact_info::{ContactInfoRepository, SqlxContactInfoRepository};
pub use faq::{FaqRepository, SqlxFaqRepository};
pub use newsletter::{NewsletterRepository, SqlxNewsletterRepository};
pub use portfolio_category::{PortfolioCategoryRepository, SqlxPortfolioCategoryRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use project::{ProjectRepository, SqlxProjectRepository};
pub use resume::{ResumeRepository, SqlxResumeRepository};
pub use series::{SeriesRepository, SqlxSeriesRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use testimonial::{SqlxTestimonialRepository, TestimonialRepository};
pub use user::{SqlxUserRepository, UserRepository};

/// Escape clause paired with every pattern from [`contains_pattern`]
pub(crate) const LIKE_ESCAPE: &str = " ESCAPE '\\'";

/// Escape `\`, `%` and `_` so user input matches literally in LIKE
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Substring pattern for `LIKE ? ESCAPE '\'`
pub fn contains_pattern(query: &str) -> String {
    format!("%{}%", escape_like(query))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(contains_pattern("_"), "%\\_%");
    }
}

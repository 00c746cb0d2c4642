//! Services layer - Business logic
//!
//! This module contains the business logic of the four apps.
//! Services are responsible for:
//! - Implementing business rules and form validation
//! - Coordinating between repositories and cache
//! - Enforcing ownership checks on writes

pub mod blog;
pub mod comment;
pub mod contact;
pub mod email;
pub mod newsletter;
pub mod password;
pub mod portfolio;
pub mod rate_limiter;
pub mod resume;
pub mod tag;
pub mod text;
pub mod user;
pub mod validation;

pub use blog::{BlogService, BlogServiceError};
pub use comment::{CommentService, CommentServiceError};
pub use contact::{ClientInfo, ContactService, ContactServiceError};
pub use email::{create_transport, EmailService, EmailTransport};
pub use newsletter::{NewsletterService, NewsletterServiceError};
pub use password::{hash_password, verify_password};
pub use portfolio::{PortfolioService, PortfolioServiceError};
pub use rate_limiter::RateLimiter;
pub use resume::ResumeService;
pub use tag::{TagService, TagServiceError};
pub use text::{generate_slug, reading_time};
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
pub use validation::FieldErrors;

//! Database layer
//!
//! SQLite storage for every app: a connection pool, embedded migrations and
//! one repository per aggregate.
//!
//! # Usage
//!
//! ```ignore
//! use portfolio_platform::config::DatabaseConfig;
//! use portfolio_platform::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, ping};

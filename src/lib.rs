//! Portfolio Platform - portfolio showcase, blog and contact management
//!
//! This library provides the core functionality behind the platform's JSON
//! API: user accounts and profiles, portfolio projects with their resume
//! sections, a blog with comments and a newsletter, and a contact inbox.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

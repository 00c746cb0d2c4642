//! Common API utilities and shared types
//!
//! This module contains shared utilities used across multiple API endpoints.

use serde::{Deserialize, Serialize};

use crate::models::deserialize_page_or_first;

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// `?page=N` on paginated endpoints
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page", deserialize_with = "deserialize_page_or_first")]
    pub page: u32,
}

/// Listing filtered by a free-text query
#[derive(Debug, Deserialize)]
pub struct SearchPageQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default = "default_page", deserialize_with = "deserialize_page_or_first")]
    pub page: u32,
}

/// Flash-style confirmation returned by write endpoints
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An entity together with its confirmation message
#[derive(Debug, Serialize)]
pub struct WithMessage<T> {
    #[serde(flatten)]
    pub data: T,
    pub message: String,
}

impl<T> WithMessage<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
        }
    }
}

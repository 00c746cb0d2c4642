//! Contact models
//!
//! Inbound contact messages with their admin replies, FAQ entries and the
//! business contact card shown on the contact page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::double_option;

string_enum! {
    /// Topic picked on the contact form
    pub enum MessageSubject {
        General => ("general", "General Inquiry"),
        Project => ("project", "Project Collaboration"),
        Freelance => ("freelance", "Freelance Work"),
        Support => ("support", "Technical Support"),
        Partnership => ("partnership", "Partnership Opportunity"),
        Other => ("other", "Other"),
    }
    default = General;
}

string_enum! {
    /// Handling state of a contact message
    pub enum MessageStatus {
        New => ("new", "New"),
        Read => ("read", "Read"),
        Replied => ("replied", "Replied"),
        Archived => ("archived", "Archived"),
    }
    default = New;
}

string_enum! {
    pub enum Priority {
        Low => ("low", "Low"),
        Medium => ("medium", "Medium"),
        High => ("high", "High"),
    }
    default = Medium;
}

string_enum! {
    pub enum FaqCategory {
        General => ("general", "General"),
        Services => ("services", "Services"),
        Pricing => ("pricing", "Pricing"),
        Technical => ("technical", "Technical"),
        Support => ("support", "Support"),
    }
    default = General;
}

// ============================================================================
// Messages
// ============================================================================

/// Message submitted through the contact form, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub website: String,
    pub subject: MessageSubject,
    pub subject_custom: String,
    pub message: String,
    pub project_budget: String,
    pub project_timeline: String,
    pub status: MessageStatus,
    pub priority: Priority,
    pub ip_address: Option<String>,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub replied_at: Option<DateTime<Utc>>,
}

impl ContactMessage {
    /// Custom subject text when the subject is "other", else the label
    pub fn display_subject(&self) -> String {
        if self.subject == MessageSubject::Other && !self.subject_custom.trim().is_empty() {
            self.subject_custom.clone()
        } else {
            self.subject.label().to_string()
        }
    }

    /// Subject line prefilled on the admin reply form
    pub fn default_reply_subject(&self) -> String {
        format!("Re: {}", self.display_subject())
    }
}

/// Admin reply to a contact message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactReply {
    pub id: i64,
    pub message_id: i64,
    pub admin_user_id: i64,
    pub subject: String,
    pub message: String,
    pub is_sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Contact form submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitContactInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub website: String,
    pub subject: MessageSubject,
    pub subject_custom: String,
    pub message: String,
    pub project_budget: String,
    pub project_timeline: String,
}

impl SubmitContactInput {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_subject(mut self, subject: MessageSubject) -> Self {
        self.subject = subject;
        self
    }
}

/// Message counters for the admin inbox
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageStats {
    pub total: i64,
    pub new: i64,
    pub read: i64,
    pub replied: i64,
}

// ============================================================================
// FAQ
// ============================================================================

/// Frequently asked question, ordered by `order` then newest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faq {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: FaqCategory,
    pub is_featured: bool,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqInput {
    pub question: String,
    pub answer: String,
    pub category: FaqCategory,
    pub is_featured: bool,
    pub order: i64,
}

impl FaqInput {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateFaqInput {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<FaqCategory>,
    pub is_featured: Option<bool>,
    pub order: Option<i64>,
}

impl UpdateFaqInput {
    pub fn apply(&self, faq: &mut Faq) {
        if let Some(ref v) = self.question {
            faq.question = v.trim().to_string();
        }
        if let Some(ref v) = self.answer {
            faq.answer = v.clone();
        }
        if let Some(v) = self.category {
            faq.category = v;
        }
        if let Some(v) = self.is_featured {
            faq.is_featured = v;
        }
        if let Some(v) = self.order {
            faq.order = v;
        }
    }
}

// ============================================================================
// Contact info
// ============================================================================

pub const DEFAULT_BUSINESS_NAME: &str = "Portfolio Platform";

/// Business contact card; the first active record is shown publicly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    pub id: i64,
    pub business_name: String,
    pub tagline: String,
    pub description: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub website: String,
    pub linkedin: String,
    pub twitter: String,
    pub facebook: String,
    pub instagram: String,
    pub github: String,
    pub business_hours: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfoInput {
    #[serde(default = "default_business_name")]
    pub business_name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub description: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub business_hours: String,
    #[serde(default, deserialize_with = "double_option")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub longitude: Option<Option<f64>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_business_name() -> String {
    DEFAULT_BUSINESS_NAME.to_string()
}

fn default_active() -> bool {
    true
}

impl ContactInfoInput {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            business_name: default_business_name(),
            tagline: String::new(),
            description: String::new(),
            email: email.into(),
            phone: String::new(),
            address: String::new(),
            website: String::new(),
            linkedin: String::new(),
            twitter: String::new(),
            facebook: String::new(),
            instagram: String::new(),
            github: String::new(),
            business_hours: String::new(),
            latitude: None,
            longitude: None,
            is_active: true,
        }
    }
}

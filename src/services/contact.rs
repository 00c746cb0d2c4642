//! Contact service
//!
//! Public side: the contact page (contact card and featured FAQs), the
//! full and quick contact forms, and the FAQ page. Submissions are
//! rate-limited per IP and trigger a best-effort notification email.
//!
//! Admin side: the message inbox with statistics, message detail (which
//! marks new messages read), emailed replies, status and priority
//! changes, FAQ management and the contact card.

use crate::cache::{keys, Cache, CacheLayer};
use crate::db::repositories::{ContactInfoRepository, ContactRepository, FaqRepository};
use crate::models::{
    deserialize_page, ContactInfo, ContactInfoInput, ContactMessage, ContactReply, Faq, FaqCategory, FaqInput,
    ListParams, MessageStats, MessageStatus, MessageSubject, PagedResult, Priority,
    SubmitContactInput, UpdateFaqInput, User,
};
use crate::services::email::EmailService;
use crate::services::rate_limiter::RateLimiter;
use crate::services::validation::FieldErrors;
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;

/// Messages per page in the admin inbox
pub const MESSAGES_PER_PAGE: u32 = 20;

const FEATURED_FAQS: i64 = 10;

pub const SUBMITTED_MESSAGE: &str =
    "Thank you for your message! We will get back to you within 24 hours.";
pub const QUICK_CONTACT_MESSAGE: &str = "Thank you! Your message has been sent successfully.";
pub const REPLY_SENT_MESSAGE: &str = "Reply sent successfully!";
pub const RATE_LIMITED_MESSAGE: &str =
    "Too many messages sent from this address. Please try again later.";

/// Error types for contact operations
#[derive(Debug, thiserror::Error)]
pub enum ContactServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("{0}")]
    RateLimited(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

// ============================================================================
// Page and request types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ContactPage {
    pub contact_info: Option<ContactInfo>,
    pub faqs: Vec<Faq>,
}

/// Where a submission came from
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: Option<IpAddr>,
    pub user_agent: String,
}

impl ClientInfo {
    pub fn new(ip: Option<IpAddr>, user_agent: impl Into<String>) -> Self {
        Self {
            ip,
            user_agent: user_agent.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub id: i64,
    pub message: &'static str,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuickContactInput {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Response of the quick contact form, success or field errors
#[derive(Debug, Clone, Serialize)]
pub struct QuickContactResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqGroup {
    pub category: FaqCategory,
    pub label: String,
    pub faqs: Vec<Faq>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryChoice {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FaqListPage {
    pub faq_categories: Vec<FaqGroup>,
    pub current_category: Option<FaqCategory>,
    pub categories: Vec<CategoryChoice>,
}

/// Query string of the admin inbox
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    #[serde(deserialize_with = "deserialize_page")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageListPage {
    pub messages: PagedResult<ContactMessage>,
    pub stats: MessageStats,
    pub current_status: Option<MessageStatus>,
    pub search_query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageDetail {
    pub message: ContactMessage,
    pub display_subject: String,
    pub replies: Vec<ContactReply>,
    pub default_reply_subject: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReplyInput {
    pub subject: String,
    pub message: String,
}

impl ReplyInput {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// A stored reply and whether the email went out
#[derive(Debug, Clone, Serialize)]
pub struct ReplyOutcome {
    pub reply: ContactReply,
    pub sent: bool,
    pub message: String,
}

/// Contact service
pub struct ContactService {
    messages: Arc<dyn ContactRepository>,
    faqs: Arc<dyn FaqRepository>,
    info: Arc<dyn ContactInfoRepository>,
    email: Arc<EmailService>,
    rate_limiter: Arc<RateLimiter>,
    cache: Arc<Cache>,
}

impl ContactService {
    pub fn new(
        messages: Arc<dyn ContactRepository>,
        faqs: Arc<dyn FaqRepository>,
        info: Arc<dyn ContactInfoRepository>,
        email: Arc<EmailService>,
        rate_limiter: Arc<RateLimiter>,
        cache: Arc<Cache>,
    ) -> Self {
        Self {
            messages,
            faqs,
            info,
            email,
            rate_limiter,
            cache,
        }
    }

    // ========================================================================
    // Public pages
    // ========================================================================

    pub async fn contact_page(&self) -> Result<ContactPage, ContactServiceError> {
        let contact_info = self.contact_info().await?;

        let key = keys::featured_faqs(FEATURED_FAQS);
        let faqs = match self.cache.get::<Vec<Faq>>(&key).await.ok().flatten() {
            Some(faqs) => faqs,
            None => {
                let faqs = self
                    .faqs
                    .list_featured(FEATURED_FAQS)
                    .await
                    .context("Failed to load featured FAQs")?;
                let _ = self.cache.set(&key, &faqs, self.cache.default_ttl()).await;
                faqs
            }
        };

        Ok(ContactPage { contact_info, faqs })
    }

    /// The active contact card, cached
    pub async fn contact_info(&self) -> Result<Option<ContactInfo>, ContactServiceError> {
        if let Some(info) = self
            .cache
            .get::<Option<ContactInfo>>(keys::CONTACT_INFO)
            .await
            .ok()
            .flatten()
        {
            return Ok(info);
        }

        let info = self
            .info
            .get_active()
            .await
            .context("Failed to load contact info")?;
        let _ = self
            .cache
            .set(keys::CONTACT_INFO, &info, self.cache.default_ttl())
            .await;
        Ok(info)
    }

    /// Store a contact form submission and notify the site owner
    pub async fn submit(
        &self,
        input: SubmitContactInput,
        client: &ClientInfo,
    ) -> Result<SubmitOutcome, ContactServiceError> {
        self.check_rate_limit(client).await?;
        validate_submission(&input).map_err(ContactServiceError::ValidationError)?;

        let message = self.store(input, client).await?;
        Ok(SubmitOutcome {
            id: message.id,
            message: SUBMITTED_MESSAGE,
        })
    }

    /// Short form with name, email and message only. Field errors are part
    /// of the response rather than an error.
    pub async fn quick_contact(
        &self,
        input: QuickContactInput,
        client: &ClientInfo,
    ) -> Result<QuickContactResponse, ContactServiceError> {
        self.check_rate_limit(client).await?;

        let submission = SubmitContactInput::new(input.name, input.email, input.message)
            .with_subject(MessageSubject::General);
        if let Err(errors) = validate_submission(&submission) {
            return Ok(QuickContactResponse {
                success: false,
                message: None,
                errors: Some(errors),
            });
        }

        self.store(submission, client).await?;
        Ok(QuickContactResponse {
            success: true,
            message: Some(QUICK_CONTACT_MESSAGE.to_string()),
            errors: None,
        })
    }

    /// FAQs grouped by category, in display order
    pub async fn faq_list(
        &self,
        category: Option<FaqCategory>,
    ) -> Result<FaqListPage, ContactServiceError> {
        let key = keys::faqs(category.map(|c| c.as_str()));
        let faq_categories = match self.cache.get::<Vec<FaqGroup>>(&key).await.ok().flatten() {
            Some(groups) => groups,
            None => {
                let faqs = self
                    .faqs
                    .list(category)
                    .await
                    .context("Failed to list FAQs")?;
                let groups = group_faqs(faqs);
                let _ = self.cache.set(&key, &groups, self.cache.default_ttl()).await;
                groups
            }
        };

        Ok(FaqListPage {
            faq_categories,
            current_category: category,
            categories: FaqCategory::ALL
                .iter()
                .map(|c| CategoryChoice {
                    value: c.as_str(),
                    label: c.label(),
                })
                .collect(),
        })
    }

    // ========================================================================
    // Admin: messages
    // ========================================================================

    pub async fn list_messages(
        &self,
        query: &MessageListQuery,
    ) -> Result<MessageListPage, ContactServiceError> {
        let status = query
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<MessageStatus>().ok());
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let total = self
            .messages
            .count(status, search)
            .await
            .context("Failed to count messages")?;
        let params = ListParams::new(query.page.unwrap_or(1), MESSAGES_PER_PAGE).clamp_to(total);
        let items = self
            .messages
            .list(status, search, params)
            .await
            .context("Failed to list messages")?;
        let stats = self
            .messages
            .stats()
            .await
            .context("Failed to load message stats")?;

        Ok(MessageListPage {
            messages: PagedResult::new(items, total, &params),
            stats,
            current_status: status,
            search_query: search.unwrap_or_default().to_string(),
        })
    }

    /// Open a message; a new message becomes read
    pub async fn message_detail(&self, id: i64) -> Result<MessageDetail, ContactServiceError> {
        self.get_message(id).await?;
        if self
            .messages
            .mark_read(id)
            .await
            .context("Failed to mark message read")?
        {
            tracing::debug!(message_id = id, "Contact message marked read");
        }

        let message = self.get_message(id).await?;
        let replies = self
            .messages
            .list_replies(id)
            .await
            .context("Failed to load replies")?;

        Ok(MessageDetail {
            display_subject: message.display_subject(),
            default_reply_subject: message.default_reply_subject(),
            message,
            replies,
        })
    }

    pub async fn get_message(&self, id: i64) -> Result<ContactMessage, ContactServiceError> {
        self.messages
            .get_by_id(id)
            .await
            .context("Failed to get message")?
            .ok_or_else(|| ContactServiceError::NotFound(format!("Message {}", id)))
    }

    /// Store a reply and email it. The reply is kept even when sending
    /// fails; only a sent reply marks the message replied.
    pub async fn reply(
        &self,
        id: i64,
        admin: &User,
        input: ReplyInput,
    ) -> Result<ReplyOutcome, ContactServiceError> {
        let message = self.get_message(id).await?;

        let subject = match input.subject.trim() {
            "" => message.default_reply_subject(),
            s => s.to_string(),
        };
        let mut errors = FieldErrors::new();
        errors.max_len("subject", &subject, 200);
        errors.require("message", &input.message);
        errors.into_result().map_err(ContactServiceError::ValidationError)?;

        let reply = self
            .messages
            .create_reply(&ContactReply {
                id: 0,
                message_id: id,
                admin_user_id: admin.id,
                subject,
                message: input.message,
                is_sent: false,
                sent_at: None,
                created_at: Utc::now(),
            })
            .await
            .context("Failed to store reply")?;

        match self.email.send_reply(&message, &reply).await {
            Ok(()) => {
                let reply = self
                    .messages
                    .mark_reply_sent(reply.id)
                    .await
                    .context("Failed to mark reply sent")?;
                self.messages
                    .mark_replied(id)
                    .await
                    .context("Failed to mark message replied")?;
                tracing::info!(message_id = id, reply_id = reply.id, "Contact reply sent");
                Ok(ReplyOutcome {
                    reply,
                    sent: true,
                    message: REPLY_SENT_MESSAGE.to_string(),
                })
            }
            Err(e) => {
                tracing::warn!(message_id = id, error = %e, "Failed to send contact reply");
                Ok(ReplyOutcome {
                    reply,
                    sent: false,
                    message: format!("Failed to send reply: {}", e),
                })
            }
        }
    }

    pub async fn set_status(
        &self,
        id: i64,
        status: MessageStatus,
    ) -> Result<ContactMessage, ContactServiceError> {
        self.get_message(id).await?;
        self.messages
            .set_status(id, status)
            .await
            .context("Failed to update message status")?;
        self.get_message(id).await
    }

    pub async fn set_priority(
        &self,
        id: i64,
        priority: Priority,
    ) -> Result<ContactMessage, ContactServiceError> {
        self.get_message(id).await?;
        self.messages
            .set_priority(id, priority)
            .await
            .context("Failed to update message priority")?;
        self.get_message(id).await
    }

    pub async fn delete_message(&self, id: i64) -> Result<(), ContactServiceError> {
        self.get_message(id).await?;
        self.messages
            .delete(id)
            .await
            .context("Failed to delete message")?;
        Ok(())
    }

    // ========================================================================
    // Admin: FAQ and contact card
    // ========================================================================

    pub async fn get_faq(&self, id: i64) -> Result<Faq, ContactServiceError> {
        self.faqs
            .get_by_id(id)
            .await
            .context("Failed to get FAQ")?
            .ok_or_else(|| ContactServiceError::NotFound(format!("FAQ {}", id)))
    }

    pub async fn create_faq(&self, input: FaqInput) -> Result<Faq, ContactServiceError> {
        let now = Utc::now();
        let faq = Faq {
            id: 0,
            question: input.question.trim().to_string(),
            answer: input.answer,
            category: input.category,
            is_featured: input.is_featured,
            order: input.order,
            created_at: now,
            updated_at: now,
        };
        validate_faq(&faq)?;

        let created = self.faqs.create(&faq).await.context("Failed to create FAQ")?;
        self.invalidate_faqs().await;
        Ok(created)
    }

    pub async fn update_faq(&self, id: i64, input: UpdateFaqInput) -> Result<Faq, ContactServiceError> {
        let mut faq = self.get_faq(id).await?;
        input.apply(&mut faq);
        validate_faq(&faq)?;

        let updated = self.faqs.update(&faq).await.context("Failed to update FAQ")?;
        self.invalidate_faqs().await;
        Ok(updated)
    }

    pub async fn delete_faq(&self, id: i64) -> Result<(), ContactServiceError> {
        self.get_faq(id).await?;
        self.faqs.delete(id).await.context("Failed to delete FAQ")?;
        self.invalidate_faqs().await;
        Ok(())
    }

    pub async fn update_contact_info(
        &self,
        input: ContactInfoInput,
    ) -> Result<ContactInfo, ContactServiceError> {
        let mut errors = FieldErrors::new();
        if errors.require("business_name", &input.business_name) {
            errors.max_len("business_name", &input.business_name, 100);
        }
        errors.max_len("tagline", &input.tagline, 200);
        errors.email("email", input.email.trim());
        errors.max_len("phone", &input.phone, 20);
        for (field, value) in [
            ("website", &input.website),
            ("linkedin", &input.linkedin),
            ("twitter", &input.twitter),
            ("facebook", &input.facebook),
            ("instagram", &input.instagram),
            ("github", &input.github),
        ] {
            errors.url(field, value);
        }
        if let Some(Some(lat)) = input.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                errors.add("latitude", "Ensure latitude is between -90 and 90.");
            }
        }
        if let Some(Some(lng)) = input.longitude {
            if !(-180.0..=180.0).contains(&lng) {
                errors.add("longitude", "Ensure longitude is between -180 and 180.");
            }
        }
        errors.into_result().map_err(ContactServiceError::ValidationError)?;

        let info = self
            .info
            .upsert(&input)
            .await
            .context("Failed to save contact info")?;
        let _ = self.cache.delete(keys::CONTACT_INFO).await;
        Ok(info)
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    async fn check_rate_limit(&self, client: &ClientInfo) -> Result<(), ContactServiceError> {
        if let Some(ip) = client.ip {
            if self.rate_limiter.is_contact_limited(ip).await {
                tracing::warn!(ip = %ip, "Contact form rate limit hit");
                return Err(ContactServiceError::RateLimited(RATE_LIMITED_MESSAGE.to_string()));
            }
        }
        Ok(())
    }

    async fn store(
        &self,
        input: SubmitContactInput,
        client: &ClientInfo,
    ) -> Result<ContactMessage, ContactServiceError> {
        let now = Utc::now();
        let message = self
            .messages
            .create(&ContactMessage {
                id: 0,
                name: input.name.trim().to_string(),
                email: input.email.trim().to_string(),
                phone: input.phone.trim().to_string(),
                company: input.company.trim().to_string(),
                website: input.website.trim().to_string(),
                subject: input.subject,
                subject_custom: input.subject_custom.trim().to_string(),
                message: input.message,
                project_budget: input.project_budget.trim().to_string(),
                project_timeline: input.project_timeline.trim().to_string(),
                status: MessageStatus::New,
                priority: Priority::default(),
                ip_address: client.ip.map(|ip| ip.to_string()),
                user_agent: client.user_agent.clone(),
                created_at: now,
                updated_at: now,
                read_at: None,
                replied_at: None,
            })
            .await
            .context("Failed to store contact message")?;

        if let Some(ip) = client.ip {
            self.rate_limiter.record_contact(ip).await;
        }
        tracing::info!(message_id = message.id, subject = %message.subject, "Contact message received");

        if let Err(e) = self.email.send_contact_notification(&message).await {
            tracing::warn!(message_id = message.id, error = %e, "Failed to send notification email");
        }
        Ok(message)
    }

    async fn invalidate_faqs(&self) {
        let _ = self.cache.delete_pattern(keys::FAQ_PREFIX).await;
    }
}

fn validate_submission(input: &SubmitContactInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if errors.require("name", &input.name) {
        errors.max_len("name", input.name.trim(), 100);
    }
    errors.email("email", input.email.trim());
    errors.require("message", &input.message);
    errors.max_len("phone", input.phone.trim(), 20);
    errors.max_len("company", input.company.trim(), 100);
    errors.url("website", input.website.trim());
    errors.max_len("subject_custom", input.subject_custom.trim(), 200);
    errors.max_len("project_budget", input.project_budget.trim(), 50);
    errors.max_len("project_timeline", input.project_timeline.trim(), 100);
    errors.into_result()
}

fn validate_faq(faq: &Faq) -> Result<(), ContactServiceError> {
    let mut errors = FieldErrors::new();
    if errors.require("question", &faq.question) {
        errors.max_len("question", &faq.question, 300);
    }
    errors.require("answer", &faq.answer);
    errors.into_result().map_err(ContactServiceError::ValidationError)
}

/// Group an ordered FAQ list by category, keeping first-seen order
fn group_faqs(faqs: Vec<Faq>) -> Vec<FaqGroup> {
    let mut groups: Vec<FaqGroup> = Vec::new();
    for faq in faqs {
        match groups.iter_mut().find(|g| g.category == faq.category) {
            Some(group) => group.faqs.push(faq),
            None => groups.push(FaqGroup {
                category: faq.category,
                label: faq.category.label().to_string(),
                faqs: vec![faq],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmailBackend, EmailConfig, SecurityConfig, SiteConfig};
    use crate::db::repositories::test_support::{insert_user, setup_pool};
    use crate::db::repositories::{
        SqlxContactInfoRepository, SqlxContactRepository, SqlxFaqRepository, SqlxUserRepository,
    };
    use crate::services::email::MemoryTransport;

    struct Fixture {
        service: ContactService,
        transport: Arc<MemoryTransport>,
        admin: User,
    }

    async fn setup_with(transport: MemoryTransport, security: SecurityConfig) -> Fixture {
        let pool = setup_pool().await;
        let transport = Arc::new(transport);
        let email = EmailService::new(
            transport.clone(),
            EmailConfig {
                backend: EmailBackend::Memory,
                from_address: "noreply@example.com".to_string(),
                contact_email: Some("owner@example.com".to_string()),
                ..EmailConfig::default()
            },
            SiteConfig {
                name: "Test Site".to_string(),
                base_url: "https://example.com".to_string(),
            },
        );
        let service = ContactService::new(
            SqlxContactRepository::boxed(pool.clone()),
            SqlxFaqRepository::boxed(pool.clone()),
            SqlxContactInfoRepository::boxed(pool.clone()),
            Arc::new(email),
            Arc::new(RateLimiter::new(&security)),
            Arc::new(Cache::new()),
        );
        let admin_id = insert_user(&pool, "admin").await;
        let admin = SqlxUserRepository::boxed(pool.clone())
            .get_by_id(admin_id)
            .await
            .unwrap()
            .unwrap();

        Fixture {
            service,
            transport,
            admin,
        }
    }

    async fn setup() -> Fixture {
        setup_with(MemoryTransport::new(), SecurityConfig::default()).await
    }

    fn client() -> ClientInfo {
        ClientInfo::new(Some("203.0.113.7".parse().unwrap()), "test-agent")
    }

    #[tokio::test]
    async fn test_submit_stores_and_notifies() {
        let f = setup().await;
        let input = SubmitContactInput::new("Jo Doe", "jo@example.com", "Let's build something")
            .with_subject(MessageSubject::Project);

        let outcome = f.service.submit(input, &client()).await.unwrap();
        assert_eq!(outcome.message, SUBMITTED_MESSAGE);

        let message = f.service.get_message(outcome.id).await.unwrap();
        assert_eq!(message.status, MessageStatus::New);
        assert_eq!(message.priority, Priority::Medium);
        assert_eq!(message.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(message.user_agent, "test-agent");

        let sent = f.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "owner@example.com");
        assert_eq!(sent[0].subject, "New Contact Message: Project Collaboration");
    }

    #[tokio::test]
    async fn test_submit_survives_notification_failure() {
        let f = setup_with(MemoryTransport::failing("smtp down"), SecurityConfig::default()).await;
        let outcome = f
            .service
            .submit(SubmitContactInput::new("Jo", "jo@example.com", "Hi"), &client())
            .await
            .unwrap();
        assert!(f.service.get_message(outcome.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let f = setup().await;
        let mut input = SubmitContactInput::new("", "nope", "");
        input.website = "ftp:/broken".to_string();

        match f.service.submit(input, &client()).await {
            Err(ContactServiceError::ValidationError(errors)) => {
                assert!(errors.contains("name"));
                assert!(errors.contains("email"));
                assert!(errors.contains("message"));
                assert!(errors.contains("website"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(f.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_submit_rate_limited_per_ip() {
        let security = SecurityConfig {
            contact_max_per_hour: 2,
            ..SecurityConfig::default()
        };
        let f = setup_with(MemoryTransport::new(), security).await;

        for _ in 0..2 {
            f.service
                .submit(SubmitContactInput::new("Jo", "jo@example.com", "Hi"), &client())
                .await
                .unwrap();
        }
        assert!(matches!(
            f.service
                .submit(SubmitContactInput::new("Jo", "jo@example.com", "Hi"), &client())
                .await,
            Err(ContactServiceError::RateLimited(_))
        ));

        // another address is unaffected
        let other = ClientInfo::new(Some("198.51.100.1".parse().unwrap()), "");
        f.service
            .submit(SubmitContactInput::new("Al", "al@example.com", "Hi"), &other)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_quick_contact() {
        let f = setup().await;

        let ok = f
            .service
            .quick_contact(
                QuickContactInput {
                    name: "Jo".to_string(),
                    email: "jo@example.com".to_string(),
                    message: "Quick hello".to_string(),
                },
                &client(),
            )
            .await
            .unwrap();
        assert!(ok.success);
        assert_eq!(ok.message.as_deref(), Some(QUICK_CONTACT_MESSAGE));

        let bad = f
            .service
            .quick_contact(QuickContactInput::default(), &client())
            .await
            .unwrap();
        assert!(!bad.success);
        let errors = bad.errors.unwrap();
        assert!(errors.contains("name"));
        assert!(errors.contains("email"));

        let inbox = f.service.list_messages(&MessageListQuery::default()).await.unwrap();
        assert_eq!(inbox.messages.total, 1);
        assert_eq!(inbox.messages.items[0].subject, MessageSubject::General);
    }

    #[tokio::test]
    async fn test_detail_marks_read_and_stats() {
        let f = setup().await;
        let first = f
            .service
            .submit(SubmitContactInput::new("Jo", "jo@example.com", "One"), &client())
            .await
            .unwrap();
        f.service
            .submit(SubmitContactInput::new("Al", "al@example.com", "Two"), &client())
            .await
            .unwrap();

        let detail = f.service.message_detail(first.id).await.unwrap();
        assert_eq!(detail.message.status, MessageStatus::Read);
        assert!(detail.message.read_at.is_some());
        assert_eq!(detail.default_reply_subject, "Re: General Inquiry");

        let inbox = f.service.list_messages(&MessageListQuery::default()).await.unwrap();
        assert_eq!(
            inbox.stats,
            MessageStats {
                total: 2,
                new: 1,
                read: 1,
                replied: 0
            }
        );

        let filtered = f
            .service
            .list_messages(&MessageListQuery {
                status: Some("new".to_string()),
                search: Some("al@".to_string()),
                page: None,
            })
            .await
            .unwrap();
        assert_eq!(filtered.messages.total, 1);
        assert_eq!(filtered.current_status, Some(MessageStatus::New));
        assert_eq!(filtered.search_query, "al@");
    }

    #[tokio::test]
    async fn test_reply_marks_replied() {
        let f = setup().await;
        let submitted = f
            .service
            .submit(SubmitContactInput::new("Jo", "jo@example.com", "Question"), &client())
            .await
            .unwrap();

        let outcome = f
            .service
            .reply(submitted.id, &f.admin, ReplyInput::new("", "Here is the answer"))
            .await
            .unwrap();
        assert!(outcome.sent);
        assert!(outcome.reply.is_sent);
        assert_eq!(outcome.reply.subject, "Re: General Inquiry");
        assert_eq!(outcome.message, REPLY_SENT_MESSAGE);

        let message = f.service.get_message(submitted.id).await.unwrap();
        assert_eq!(message.status, MessageStatus::Replied);
        assert!(message.replied_at.is_some());

        let sent = f.transport.sent();
        assert_eq!(sent.last().map(|e| e.to.as_str()), Some("jo@example.com"));
    }

    #[tokio::test]
    async fn test_reply_failure_keeps_unsent_reply() {
        let f = setup_with(MemoryTransport::failing("smtp down"), SecurityConfig::default()).await;
        let submitted = f
            .service
            .submit(SubmitContactInput::new("Jo", "jo@example.com", "Question"), &client())
            .await
            .unwrap();

        let outcome = f
            .service
            .reply(submitted.id, &f.admin, ReplyInput::new("Hello", "Answer"))
            .await
            .unwrap();
        assert!(!outcome.sent);
        assert!(!outcome.reply.is_sent);
        assert!(outcome.message.starts_with("Failed to send reply: "));

        let detail = f.service.message_detail(submitted.id).await.unwrap();
        assert_eq!(detail.replies.len(), 1);
        assert_ne!(detail.message.status, MessageStatus::Replied);
    }

    #[tokio::test]
    async fn test_status_priority_and_delete() {
        let f = setup().await;
        let submitted = f
            .service
            .submit(SubmitContactInput::new("Jo", "jo@example.com", "Hi"), &client())
            .await
            .unwrap();

        let archived = f
            .service
            .set_status(submitted.id, MessageStatus::Archived)
            .await
            .unwrap();
        assert_eq!(archived.status, MessageStatus::Archived);
        let urgent = f.service.set_priority(submitted.id, Priority::High).await.unwrap();
        assert_eq!(urgent.priority, Priority::High);

        f.service.delete_message(submitted.id).await.unwrap();
        assert!(matches!(
            f.service.message_detail(submitted.id).await,
            Err(ContactServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_faqs_grouped_and_cache_invalidated() {
        let f = setup().await;
        let mut pricing = FaqInput::new("How much?", "It depends.");
        pricing.category = FaqCategory::Pricing;
        pricing.is_featured = true;
        f.service.create_faq(pricing).await.unwrap();
        let general = f
            .service
            .create_faq(FaqInput::new("Who are you?", "A developer."))
            .await
            .unwrap();

        let page = f.service.faq_list(None).await.unwrap();
        assert_eq!(page.faq_categories.len(), 2);
        assert_eq!(page.categories.len(), 5);

        let only_pricing = f.service.faq_list(Some(FaqCategory::Pricing)).await.unwrap();
        assert_eq!(only_pricing.faq_categories.len(), 1);
        assert_eq!(only_pricing.faq_categories[0].label, "Pricing");

        assert_eq!(f.service.contact_page().await.unwrap().faqs.len(), 1);

        let update = UpdateFaqInput {
            is_featured: Some(true),
            ..UpdateFaqInput::default()
        };
        f.service.update_faq(general.id, update).await.unwrap();
        assert_eq!(f.service.contact_page().await.unwrap().faqs.len(), 2);

        f.service.delete_faq(general.id).await.unwrap();
        let page = f.service.faq_list(None).await.unwrap();
        assert_eq!(page.faq_categories.len(), 1);

        match f.service.create_faq(FaqInput::new("", "")).await {
            Err(ContactServiceError::ValidationError(errors)) => {
                assert!(errors.contains("question"));
                assert!(errors.contains("answer"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_contact_info_upsert_refreshes_cache() {
        let f = setup().await;
        assert!(f.service.contact_page().await.unwrap().contact_info.is_none());

        let info = f
            .service
            .update_contact_info(ContactInfoInput::new("hello@example.com"))
            .await
            .unwrap();
        assert_eq!(info.business_name, "Portfolio Platform");

        let page = f.service.contact_page().await.unwrap();
        assert_eq!(page.contact_info.map(|i| i.email), Some("hello@example.com".to_string()));

        let mut bad = ContactInfoInput::new("broken");
        bad.github = "github.com/nope".to_string();
        bad.latitude = Some(Some(120.0));
        match f.service.update_contact_info(bad).await {
            Err(ContactServiceError::ValidationError(errors)) => {
                assert!(errors.contains("email"));
                assert!(errors.contains("github"));
                assert!(errors.contains("latitude"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}

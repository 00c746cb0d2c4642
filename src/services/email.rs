//! Outgoing email
//!
//! Contact notifications and admin replies are rendered with Tera and
//! handed to an `EmailTransport`:
//! - `SmtpTransport`: lettre async SMTP relay
//! - `ConsoleTransport`: writes the message to the log
//! - `MemoryTransport`: keeps messages in memory for tests

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::error::Error as _;
use std::sync::{Arc, Mutex};
use tera::{Context as TeraContext, Tera};

use crate::config::{EmailBackend, EmailConfig, SiteConfig};
use crate::models::{ContactMessage, ContactReply};

const NOTIFICATION_TEMPLATE: &str = "\
New contact message received:

Name: {{ name }}
Email: {{ email }}
Subject: {{ subject }}
{% if company %}Company: {{ company }}
{% endif %}{% if phone %}Phone: {{ phone }}
{% endif %}
Message:
{{ message }}

View and reply: {{ base_url }}/admin/contact/messages/{{ id }}/
";

const REPLY_TEMPLATE: &str = "\
Hi {{ name }},

{{ body }}

Best regards,
{{ site_name }}

---
Your original message:
{{ original }}
";

/// A rendered plain-text email
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery mechanism for outgoing email
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

/// SMTP relay using lettre
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let host = config
            .smtp_host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| anyhow!("SMTP host not configured"))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            from: sender(config)?,
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(email.to.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;
        Ok(())
    }
}

/// Logs messages instead of delivering them
pub struct ConsoleTransport {
    from: String,
}

#[async_trait]
impl EmailTransport for ConsoleTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        tracing::info!(
            from = %self.from,
            to = %email.to,
            subject = %email.subject,
            "Email (console backend):\n{}",
            email.body
        );
        Ok(())
    }
}

/// Collects messages in memory
#[derive(Default)]
pub struct MemoryTransport {
    outbox: Mutex<Vec<OutgoingEmail>>,
    fail_with: Option<String>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every send fails with the given reason
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outbox: Mutex::new(Vec::new()),
            fail_with: Some(reason.into()),
        }
    }

    /// Messages sent so far
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox.lock().map(|outbox| outbox.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailTransport for MemoryTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        if let Some(ref reason) = self.fail_with {
            return Err(anyhow!("{}", reason));
        }
        self.outbox
            .lock()
            .map_err(|_| anyhow!("Email outbox lock poisoned"))?
            .push(email.clone());
        Ok(())
    }
}

/// Build the configured transport
pub fn create_transport(config: &EmailConfig) -> Result<Arc<dyn EmailTransport>> {
    Ok(match config.backend {
        EmailBackend::Smtp => Arc::new(SmtpTransport::from_config(config)?),
        EmailBackend::Console => Arc::new(ConsoleTransport {
            from: config.from_address.clone(),
        }),
        EmailBackend::Memory => Arc::new(MemoryTransport::new()),
    })
}

fn sender(config: &EmailConfig) -> Result<Mailbox> {
    format!("{} <{}>", config.from_name, config.from_address)
        .parse()
        .map_err(|e| anyhow!("Invalid from address: {}", e))
}

/// Renders and sends the contact emails
pub struct EmailService {
    transport: Arc<dyn EmailTransport>,
    config: EmailConfig,
    site: SiteConfig,
}

impl EmailService {
    pub fn new(transport: Arc<dyn EmailTransport>, config: EmailConfig, site: SiteConfig) -> Self {
        Self {
            transport,
            config,
            site,
        }
    }

    /// Tell the site owner about a new contact message
    pub async fn send_contact_notification(&self, message: &ContactMessage) -> Result<()> {
        let mut context = TeraContext::new();
        context.insert("id", &message.id);
        context.insert("name", &message.name);
        context.insert("email", &message.email);
        context.insert("subject", &message.display_subject());
        context.insert("company", &message.company);
        context.insert("phone", &message.phone);
        context.insert("message", &message.message);
        context.insert("base_url", self.site.base_url.trim_end_matches('/'));

        let email = OutgoingEmail {
            to: self.config.notification_recipient().to_string(),
            subject: format!("New Contact Message: {}", message.display_subject()),
            body: render(NOTIFICATION_TEMPLATE, &context)?,
        };

        self.transport.send(&email).await
    }

    /// Send an admin reply to the original sender
    pub async fn send_reply(&self, message: &ContactMessage, reply: &ContactReply) -> Result<()> {
        let mut context = TeraContext::new();
        context.insert("name", &message.name);
        context.insert("body", &reply.message);
        context.insert("original", &message.message);
        context.insert("site_name", &self.site.name);

        let email = OutgoingEmail {
            to: message.email.clone(),
            subject: reply.subject.clone(),
            body: render(REPLY_TEMPLATE, &context)?,
        };

        self.transport.send(&email).await
    }
}

/// Render a one-off plain-text template, keeping the full error chain
fn render(template: &str, context: &TeraContext) -> Result<String> {
    Tera::one_off(template, context, false).map_err(|e| {
        let mut error_msg = format!("Failed to render email: {}", e);
        let mut source = e.source();
        while let Some(s) = source {
            error_msg.push_str(&format!("\n  Caused by: {}", s));
            source = s.source();
        }
        anyhow!(error_msg)
    })
    .context("Email template error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageStatus, MessageSubject, Priority};
    use chrono::Utc;

    fn message(subject: MessageSubject, custom: &str) -> ContactMessage {
        let now = Utc::now();
        ContactMessage {
            id: 42,
            name: "Jo Doe".to_string(),
            email: "jo@example.com".to_string(),
            phone: String::new(),
            company: "Acme".to_string(),
            website: String::new(),
            subject,
            subject_custom: custom.to_string(),
            message: "Can we talk?".to_string(),
            project_budget: String::new(),
            project_timeline: String::new(),
            status: MessageStatus::New,
            priority: Priority::Medium,
            ip_address: None,
            user_agent: String::new(),
            created_at: now,
            updated_at: now,
            read_at: None,
            replied_at: None,
        }
    }

    fn service(transport: Arc<MemoryTransport>, contact_email: Option<&str>) -> EmailService {
        let config = EmailConfig {
            backend: EmailBackend::Memory,
            from_address: "noreply@example.com".to_string(),
            contact_email: contact_email.map(str::to_string),
            ..EmailConfig::default()
        };
        let site = SiteConfig {
            name: "Test Site".to_string(),
            base_url: "https://example.com/".to_string(),
        };
        EmailService::new(transport, config, site)
    }

    #[tokio::test]
    async fn test_notification_content() {
        let transport = Arc::new(MemoryTransport::new());
        let service = service(transport.clone(), Some("owner@example.com"));

        service
            .send_contact_notification(&message(MessageSubject::Other, "Speaking gig"))
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "owner@example.com");
        assert_eq!(sent[0].subject, "New Contact Message: Speaking gig");
        assert!(sent[0].body.contains("Name: Jo Doe"));
        assert!(sent[0].body.contains("Company: Acme"));
        assert!(!sent[0].body.contains("Phone:"));
        assert!(sent[0]
            .body
            .contains("View and reply: https://example.com/admin/contact/messages/42/"));
    }

    #[tokio::test]
    async fn test_notification_falls_back_to_from_address() {
        let transport = Arc::new(MemoryTransport::new());
        let service = service(transport.clone(), None);

        service
            .send_contact_notification(&message(MessageSubject::Project, ""))
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].to, "noreply@example.com");
        assert_eq!(sent[0].subject, "New Contact Message: Project Collaboration");
    }

    #[tokio::test]
    async fn test_reply_goes_to_sender() {
        let transport = Arc::new(MemoryTransport::new());
        let service = service(transport.clone(), None);
        let msg = message(MessageSubject::General, "");
        let reply = ContactReply {
            id: 1,
            message_id: msg.id,
            admin_user_id: 1,
            subject: msg.default_reply_subject(),
            message: "Sure, let's talk.".to_string(),
            is_sent: false,
            sent_at: None,
            created_at: Utc::now(),
        };

        service.send_reply(&msg, &reply).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].to, "jo@example.com");
        assert_eq!(sent[0].subject, "Re: General Inquiry");
        assert!(sent[0].body.starts_with("Hi Jo Doe,"));
        assert!(sent[0].body.contains("Test Site"));
    }

    #[tokio::test]
    async fn test_failing_transport() {
        let transport = Arc::new(MemoryTransport::failing("connection refused"));
        let service = service(transport.clone(), None);

        let err = service
            .send_contact_notification(&message(MessageSubject::General, ""))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_smtp_requires_host() {
        let config = EmailConfig {
            backend: EmailBackend::Smtp,
            ..EmailConfig::default()
        };
        assert!(create_transport(&config).is_err());
    }
}

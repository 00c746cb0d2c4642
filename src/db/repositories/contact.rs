//! Contact message repository
//!
//! Inbound messages and the admin replies attached to them.

use super::{contains_pattern, LIKE_ESCAPE};
use crate::models::{
    ContactMessage, ContactReply, ListParams, MessageStats, MessageStatus, MessageSubject, Priority,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::sync::Arc;

/// Contact message repository trait
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, message: &ContactMessage) -> Result<ContactMessage>;

    async fn get_by_id(&self, id: i64) -> Result<Option<ContactMessage>>;

    /// Messages newest first, optionally narrowed by status and a search
    /// over name, email, company and message text
    async fn list(
        &self,
        status: Option<MessageStatus>,
        search: Option<&str>,
        params: ListParams,
    ) -> Result<Vec<ContactMessage>>;

    async fn count(&self, status: Option<MessageStatus>, search: Option<&str>) -> Result<i64>;

    async fn stats(&self) -> Result<MessageStats>;

    /// Move a `new` message to `read`, stamping `read_at`.
    ///
    /// Returns `false` when the message was not new.
    async fn mark_read(&self, id: i64) -> Result<bool>;

    async fn set_status(&self, id: i64, status: MessageStatus) -> Result<()>;

    async fn set_priority(&self, id: i64, priority: Priority) -> Result<()>;

    /// Move a message to `replied`, stamping `replied_at`
    async fn mark_replied(&self, id: i64) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;

    // Replies

    async fn create_reply(&self, reply: &ContactReply) -> Result<ContactReply>;

    async fn mark_reply_sent(&self, reply_id: i64) -> Result<ContactReply>;

    /// Replies to one message, oldest first
    async fn list_replies(&self, message_id: i64) -> Result<Vec<ContactReply>>;
}

/// SQLx-based contact repository implementation
pub struct SqlxContactRepository {
    pool: SqlitePool,
}

impl SqlxContactRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }

    async fn get_reply(&self, id: i64) -> Result<Option<ContactReply>> {
        let row = sqlx::query(&format!("SELECT {} FROM contact_replies WHERE id = ?", REPLY_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get contact reply")?;
        Ok(row.as_ref().map(row_to_reply))
    }
}

const MESSAGE_COLUMNS: &str = "id, name, email, phone, company, website, subject, subject_custom, \
    message, project_budget, project_timeline, status, priority, ip_address, user_agent, \
    created_at, updated_at, read_at, replied_at";

const REPLY_COLUMNS: &str =
    "id, message_id, admin_user_id, subject, message, is_sent, sent_at, created_at";

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn create(&self, message: &ContactMessage) -> Result<ContactMessage> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO contact_messages (name, email, phone, company, website, subject,
                subject_custom, message, project_budget, project_timeline, status, priority,
                ip_address, user_agent, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.phone)
        .bind(&message.company)
        .bind(&message.website)
        .bind(message.subject.as_str())
        .bind(&message.subject_custom)
        .bind(&message.message)
        .bind(&message.project_budget)
        .bind(&message.project_timeline)
        .bind(message.status.as_str())
        .bind(message.priority.as_str())
        .bind(&message.ip_address)
        .bind(&message.user_agent)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create contact message")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("Contact message not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ContactMessage>> {
        let row = sqlx::query(&format!("SELECT {} FROM contact_messages WHERE id = ?", MESSAGE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get contact message by ID")?;
        Ok(row.as_ref().map(row_to_message))
    }

    async fn list(
        &self,
        status: Option<MessageStatus>,
        search: Option<&str>,
        params: ListParams,
    ) -> Result<Vec<ContactMessage>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM contact_messages", MESSAGE_COLUMNS));
        push_filters(&mut qb, status, search);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list contact messages")?;
        Ok(rows.iter().map(row_to_message).collect())
    }

    async fn count(&self, status: Option<MessageStatus>, search: Option<&str>) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM contact_messages");
        push_filters(&mut qb, status, search);

        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count contact messages")?;
        Ok(row.get(0))
    }

    async fn stats(&self) -> Result<MessageStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(status = 'new'), 0) AS new_count,
                   COALESCE(SUM(status = 'read'), 0) AS read_count,
                   COALESCE(SUM(status = 'replied'), 0) AS replied_count
            FROM contact_messages
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute contact message stats")?;

        Ok(MessageStats {
            total: row.get("total"),
            new: row.get("new_count"),
            read: row.get("read_count"),
            replied: row.get("replied_count"),
        })
    }

    async fn mark_read(&self, id: i64) -> Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE contact_messages SET status = 'read', read_at = ?, updated_at = ? WHERE id = ? AND status = 'new'",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to mark contact message read")?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_status(&self, id: i64, status: MessageStatus) -> Result<()> {
        sqlx::query("UPDATE contact_messages SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update contact message status")?;
        Ok(())
    }

    async fn set_priority(&self, id: i64, priority: Priority) -> Result<()> {
        sqlx::query("UPDATE contact_messages SET priority = ?, updated_at = ? WHERE id = ?")
            .bind(priority.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update contact message priority")?;
        Ok(())
    }

    async fn mark_replied(&self, id: i64) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE contact_messages SET status = 'replied', replied_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to mark contact message replied")?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM contact_messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete contact message")?;
        Ok(())
    }

    // ========================================================================
    // Replies
    // ========================================================================

    async fn create_reply(&self, reply: &ContactReply) -> Result<ContactReply> {
        let result = sqlx::query(
            r#"
            INSERT INTO contact_replies (message_id, admin_user_id, subject, message, is_sent, sent_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reply.message_id)
        .bind(reply.admin_user_id)
        .bind(&reply.subject)
        .bind(&reply.message)
        .bind(reply.is_sent)
        .bind(reply.sent_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to create contact reply")?;

        self.get_reply(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("Contact reply not found after insert"))
    }

    async fn mark_reply_sent(&self, reply_id: i64) -> Result<ContactReply> {
        sqlx::query("UPDATE contact_replies SET is_sent = 1, sent_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(reply_id)
            .execute(&self.pool)
            .await
            .context("Failed to mark contact reply sent")?;

        self.get_reply(reply_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Contact reply not found after update"))
    }

    async fn list_replies(&self, message_id: i64) -> Result<Vec<ContactReply>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM contact_replies WHERE message_id = ? ORDER BY created_at ASC, id ASC",
            REPLY_COLUMNS
        ))
        .bind(message_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list contact replies")?;
        Ok(rows.iter().map(row_to_reply).collect())
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, status: Option<MessageStatus>, search: Option<&str>) {
    qb.push(" WHERE 1 = 1");

    if let Some(status) = status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }

    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        let mut any = qb.separated(" OR ");
        any.push_unseparated(" AND (");
        for column in ["name", "email", "company", "message"] {
            any.push(column)
                .push_unseparated(" LIKE ")
                .push_bind_unseparated(pattern.clone())
                .push_unseparated(LIKE_ESCAPE);
        }
        any.push_unseparated(")");
    }
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> ContactMessage {
    let subject: String = row.get("subject");
    let status: String = row.get("status");
    let priority: String = row.get("priority");

    ContactMessage {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        company: row.get("company"),
        website: row.get("website"),
        subject: MessageSubject::from_db(&subject),
        subject_custom: row.get("subject_custom"),
        message: row.get("message"),
        project_budget: row.get("project_budget"),
        project_timeline: row.get("project_timeline"),
        status: MessageStatus::from_db(&status),
        priority: Priority::from_db(&priority),
        ip_address: row.get("ip_address"),
        user_agent: row.get("user_agent"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        read_at: row.get("read_at"),
        replied_at: row.get("replied_at"),
    }
}

fn row_to_reply(row: &sqlx::sqlite::SqliteRow) -> ContactReply {
    ContactReply {
        id: row.get("id"),
        message_id: row.get("message_id"),
        admin_user_id: row.get("admin_user_id"),
        subject: row.get("subject"),
        message: row.get("message"),
        is_sent: row.get("is_sent"),
        sent_at: row.get("sent_at"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, setup_pool};

    fn message(name: &str, email: &str, text: &str) -> ContactMessage {
        let now = Utc::now();
        ContactMessage {
            id: 0,
            name: name.to_string(),
            email: email.to_string(),
            phone: String::new(),
            company: String::new(),
            website: String::new(),
            subject: MessageSubject::General,
            subject_custom: String::new(),
            message: text.to_string(),
            project_budget: String::new(),
            project_timeline: String::new(),
            status: MessageStatus::New,
            priority: Priority::Medium,
            ip_address: Some("127.0.0.1".to_string()),
            user_agent: "test".to_string(),
            created_at: now,
            updated_at: now,
            read_at: None,
            replied_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_mark_read_once() {
        let repo = SqlxContactRepository::new(setup_pool().await);

        let created = repo.create(&message("Jo", "jo@example.com", "Hello")).await.unwrap();
        assert_eq!(created.status, MessageStatus::New);
        assert_eq!(created.ip_address.as_deref(), Some("127.0.0.1"));

        assert!(repo.mark_read(created.id).await.unwrap());
        assert!(!repo.mark_read(created.id).await.unwrap());

        let read = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(read.status, MessageStatus::Read);
        assert!(read.read_at.is_some());
    }

    #[tokio::test]
    async fn test_list_filters_and_stats() {
        let repo = SqlxContactRepository::new(setup_pool().await);
        let a = repo.create(&message("Ann", "ann@example.com", "Need a website")).await.unwrap();
        repo.create(&message("Bob", "bob@example.com", "Question about pricing")).await.unwrap();
        let c = repo.create(&message("Cy", "cy@example.com", "Website redesign")).await.unwrap();

        repo.mark_read(a.id).await.unwrap();
        repo.mark_replied(c.id).await.unwrap();

        let found = repo.list(None, Some("website"), ListParams::new(1, 20)).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, c.id);

        assert_eq!(repo.count(Some(MessageStatus::New), None).await.unwrap(), 1);
        assert_eq!(
            repo.stats().await.unwrap(),
            MessageStats { total: 3, new: 1, read: 1, replied: 1 }
        );
    }

    #[tokio::test]
    async fn test_replies_cascade_with_message() {
        let pool = setup_pool().await;
        let admin = insert_user(&pool, "admin").await;
        let repo = SqlxContactRepository::new(pool);

        let msg = repo.create(&message("Jo", "jo@example.com", "Hi")).await.unwrap();
        let reply = repo
            .create_reply(&ContactReply {
                id: 0,
                message_id: msg.id,
                admin_user_id: admin,
                subject: msg.default_reply_subject(),
                message: "Thanks".to_string(),
                is_sent: false,
                sent_at: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        assert!(!reply.is_sent);
        assert_eq!(reply.subject, "Re: General Inquiry");

        let sent = repo.mark_reply_sent(reply.id).await.unwrap();
        assert!(sent.is_sent && sent.sent_at.is_some());

        repo.delete(msg.id).await.unwrap();
        assert!(repo.list_replies(msg.id).await.unwrap().is_empty());
    }
}

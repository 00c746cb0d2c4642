//! Newsletter subscriptions

use crate::db::repositories::NewsletterRepository;
use crate::models::Newsletter;
use crate::services::validation::{FieldErrors, NON_FIELD_ERRORS};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SUBSCRIBED_MESSAGE: &str = "Thank you for subscribing to our newsletter!";
pub const ALREADY_SUBSCRIBED_MESSAGE: &str = "You are already subscribed to our newsletter.";
pub const INVALID_EMAIL_MESSAGE: &str = "Please provide a valid email address.";

#[derive(Debug, thiserror::Error)]
pub enum NewsletterServiceError {
    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubscribeInput {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscribeOutcome {
    /// False when the address was already on the list
    pub created: bool,
    pub message: &'static str,
}

pub struct NewsletterService {
    repo: Arc<dyn NewsletterRepository>,
}

impl NewsletterService {
    pub fn new(repo: Arc<dyn NewsletterRepository>) -> Self {
        Self { repo }
    }

    pub async fn subscribe(
        &self,
        input: &SubscribeInput,
    ) -> Result<SubscribeOutcome, NewsletterServiceError> {
        let email = input.email.trim();
        let name = input.name.trim();

        let mut errors = FieldErrors::new();
        errors.email("email", email);
        errors.max_len("name", name, 100);
        if !errors.is_empty() {
            errors.add(NON_FIELD_ERRORS, INVALID_EMAIL_MESSAGE);
        }
        errors.into_result().map_err(NewsletterServiceError::ValidationError)?;

        let (_, created) = self
            .repo
            .get_or_create(email, name)
            .await
            .context("Failed to subscribe")?;

        if created {
            tracing::info!(email = %email, "Newsletter subscription created");
        }
        Ok(SubscribeOutcome {
            created,
            message: if created {
                SUBSCRIBED_MESSAGE
            } else {
                ALREADY_SUBSCRIBED_MESSAGE
            },
        })
    }

    /// Active subscribers, newest first
    pub async fn list_subscribers(&self) -> Result<Vec<Newsletter>, NewsletterServiceError> {
        Ok(self
            .repo
            .list_active()
            .await
            .context("Failed to list subscribers")?)
    }

    pub async fn set_active(&self, email: &str, active: bool) -> Result<(), NewsletterServiceError> {
        self.repo
            .set_active(email.trim(), active)
            .await
            .context("Failed to update subscription")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::setup_pool;
    use crate::db::repositories::SqlxNewsletterRepository;

    fn input(email: &str, name: &str) -> SubscribeInput {
        SubscribeInput {
            email: email.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_subscribe_messages() {
        let service = NewsletterService::new(SqlxNewsletterRepository::boxed(setup_pool().await));

        let first = service.subscribe(&input("reader@example.com", "Reader")).await.unwrap();
        assert!(first.created);
        assert_eq!(first.message, SUBSCRIBED_MESSAGE);

        let again = service.subscribe(&input(" Reader@Example.com ", "")).await.unwrap();
        assert!(!again.created);
        assert_eq!(again.message, ALREADY_SUBSCRIBED_MESSAGE);

        match service.subscribe(&input("not-an-email", "")).await {
            Err(NewsletterServiceError::ValidationError(errors)) => {
                assert!(errors.contains("email"));
                assert_eq!(
                    errors.get(NON_FIELD_ERRORS),
                    Some(&[INVALID_EMAIL_MESSAGE.to_string()][..])
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_and_deactivate() {
        let service = NewsletterService::new(SqlxNewsletterRepository::boxed(setup_pool().await));
        service.subscribe(&input("a@example.com", "")).await.unwrap();
        service.subscribe(&input("b@example.com", "")).await.unwrap();

        service.set_active("a@example.com", false).await.unwrap();
        let active = service.list_subscribers().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].email, "b@example.com");
    }
}

//! Sliding-window rate limiting
//!
//! Guards the login form and the contact form:
//! - failed logins per email (default 5 per 15 minutes)
//! - login requests per IP address (10 per minute)
//! - contact submissions per IP address (default 10 per hour)

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::SecurityConfig;

/// Requests per minute one IP may make to the login endpoint
const LOGIN_IP_LIMIT: usize = 10;

/// Timestamps of recent events per key, trimmed to a fixed window
pub struct SlidingWindow {
    limit: usize,
    window: Duration,
    events: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
}

impl SlidingWindow {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            events: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Whether the key has reached the limit inside the window
    pub async fn is_limited(&self, key: &str) -> bool {
        let mut events = self.events.write().await;
        let cutoff = Utc::now() - self.window;

        match events.get_mut(key) {
            Some(times) => {
                times.retain(|time| *time > cutoff);
                times.len() >= self.limit
            }
            None => false,
        }
    }

    pub async fn record(&self, key: &str) {
        let mut events = self.events.write().await;
        events.entry(key.to_string()).or_default().push(Utc::now());
    }

    pub async fn clear(&self, key: &str) {
        self.events.write().await.remove(key);
    }

    /// Drop expired timestamps and empty keys
    pub async fn cleanup(&self) {
        let cutoff = Utc::now() - self.window;
        let mut events = self.events.write().await;
        events.retain(|_, times| {
            times.retain(|time| *time > cutoff);
            !times.is_empty()
        });
    }

    /// Number of keys currently tracked
    pub async fn tracked_keys(&self) -> usize {
        self.events.read().await.len()
    }
}

/// Rate limits for authentication and the contact form
pub struct RateLimiter {
    login_failures: SlidingWindow,
    login_ips: SlidingWindow,
    contact_ips: SlidingWindow,
}

impl RateLimiter {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            login_failures: SlidingWindow::new(
                config.login_max_attempts,
                Duration::minutes(config.login_window_minutes),
            ),
            login_ips: SlidingWindow::new(LOGIN_IP_LIMIT, Duration::minutes(1)),
            contact_ips: SlidingWindow::new(config.contact_max_per_hour, Duration::hours(1)),
        }
    }

    /// Check if an email has too many recent failed logins
    pub async fn is_email_limited(&self, email: &str) -> bool {
        self.login_failures.is_limited(&email.to_lowercase()).await
    }

    pub async fn record_failed_login(&self, email: &str) {
        self.login_failures.record(&email.to_lowercase()).await;
    }

    /// Forget failed attempts after a successful login
    pub async fn clear_failed_logins(&self, email: &str) {
        self.login_failures.clear(&email.to_lowercase()).await;
    }

    pub async fn is_login_ip_limited(&self, ip: IpAddr) -> bool {
        self.login_ips.is_limited(&ip.to_string()).await
    }

    pub async fn record_login_ip(&self, ip: IpAddr) {
        self.login_ips.record(&ip.to_string()).await;
    }

    pub async fn is_contact_limited(&self, ip: IpAddr) -> bool {
        self.contact_ips.is_limited(&ip.to_string()).await
    }

    pub async fn record_contact(&self, ip: IpAddr) {
        self.contact_ips.record(&ip.to_string()).await;
    }

    /// Prune every window; called by the periodic cleanup task
    pub async fn cleanup(&self) {
        self.login_failures.cleanup().await;
        self.login_ips.cleanup().await;
        self.contact_ips.cleanup().await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(&SecurityConfig::default())
    }
}

//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Login session; the id doubles as the bearer token / cookie value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Seconds until expiry, zero when already expired
    pub fn max_age_seconds(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let live = Session {
            id: "a".to_string(),
            user_id: 1,
            expires_at: now + Duration::days(7),
            created_at: now,
        };
        assert!(!live.is_expired());
        assert!(live.max_age_seconds() > 6 * 24 * 3600);

        let dead = Session {
            expires_at: now - Duration::seconds(1),
            ..live
        };
        assert!(dead.is_expired());
        assert_eq!(dead.max_age_seconds(), 0);
    }
}

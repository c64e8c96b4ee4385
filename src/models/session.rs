use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A session row: one authenticated device/browser instance tied to the
/// hash of its refresh token.
///
/// The plaintext refresh token is never stored; `refresh_token_hash` is the
/// sole lookup key and is unique across all sessions.
#[derive(Debug, Clone)]
pub struct Session {
    /// The session's unique identifier.
    pub id: Uuid,
    /// The ID of the user this session belongs to.
    pub user_id: Uuid,
    /// SHA-256 hex digest of the current refresh token.
    pub refresh_token_hash: String,
    /// Display-only device summary parsed from the User-Agent.
    pub device_info: Option<String>,
    /// The raw User-Agent header, capped in length.
    pub user_agent: Option<String>,
    /// The client IP address at creation time.
    pub ip_address: Option<String>,
    /// A display-only location hint.
    pub location: Option<String>,
    /// The timestamp of the last successful activity refresh.
    pub last_active_at: Option<DateTime<Utc>>,
    /// The absolute expiry deadline.
    pub expires_at: DateTime<Utc>,
    /// Whether the session was manually terminated.
    pub is_revoked: bool,
    /// When the session was revoked, if it was.
    pub revoked_at: Option<DateTime<Utc>>,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// The single validity predicate: not revoked and not expired.
    ///
    /// Every read/validate path goes through this (or its SQL twin,
    /// `repositories::session::VALID_PREDICATE`); the two must not diverge.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && self.expires_at > now
    }

    /// Converts the row into its API representation.
    ///
    /// `is_current` is derived per request and never persisted.
    pub fn into_view(self, current_session_id: Option<Uuid>) -> SessionView {
        let is_current = current_session_id == Some(self.id);
        SessionView {
            id: self.id,
            device_info: self.device_info,
            user_agent: self.user_agent,
            ip_address: self.ip_address,
            location: self.location,
            last_active_at: self.last_active_at,
            expires_at: self.expires_at,
            is_revoked: self.is_revoked,
            created_at: self.created_at,
            is_current,
        }
    }
}

/// The API representation of a session.
///
/// Omits the token hash and the owning user id (responses are always scoped
/// to the caller).
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub device_info: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub location: Option<String>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub created_at: DateTime<Utc>,
    pub is_current: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_in: Duration, is_revoked: bool) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            refresh_token_hash: "deadbeef".to_string(),
            device_info: None,
            user_agent: None,
            ip_address: None,
            location: None,
            last_active_at: Some(now),
            expires_at: now + expires_in,
            is_revoked,
            revoked_at: is_revoked.then_some(now),
            created_at: now,
        }
    }

    #[test]
    fn valid_iff_not_revoked_and_not_expired() {
        let now = Utc::now();
        assert!(session(Duration::days(7), false).is_valid(now));
        assert!(!session(Duration::days(7), true).is_valid(now));
        assert!(!session(Duration::seconds(-1), false).is_valid(now));
        assert!(!session(Duration::seconds(-1), true).is_valid(now));
    }

    #[test]
    fn view_marks_current_by_id() {
        let s = session(Duration::days(7), false);
        let id = s.id;
        assert!(s.clone().into_view(Some(id)).is_current);
        assert!(!s.clone().into_view(Some(Uuid::new_v4())).is_current);
        assert!(!s.into_view(None).is_current);
    }
}

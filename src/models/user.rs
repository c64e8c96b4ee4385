use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Represents a user in the system.
#[derive(Clone, Debug)]
pub struct User {
    /// The unique identifier for the user.
    pub id: Uuid,
    /// The user's full name.
    pub name: String,
    /// The user's username.
    pub username: String,
    /// The user's email address.
    pub email: Option<String>,
    /// The user's hashed password.
    pub password: String,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// The timestamp of the user's last password change.
    pub last_password_change: Option<DateTime<Utc>>,
    /// Whether the user is active.
    pub is_active: bool,
}

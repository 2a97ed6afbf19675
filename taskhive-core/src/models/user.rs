/// User accounts and roles
///
/// Users carry their password hash and the reference to the currently valid
/// refresh token. Both fields are skipped during serialization so they can
/// never leak through an API response body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a user account
///
/// Wire spellings match the persisted values: "User", "Admin", "Super Admin".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
    #[serde(rename = "Super Admin")]
    SuperAdmin,
}

impl Role {
    /// True for Admin and Super Admin, the roles that bypass ownership checks.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
            Role::SuperAdmin => "Super Admin",
        }
    }

    /// Parses a persisted or requested role value.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "User" => Some(Role::User),
            "Admin" => Some(Role::Admin),
            "Super Admin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account
///
/// Invariant: at most one active refresh token per user. A new login
/// overwrites `refresh_token`, implicitly invalidating the previous session.
/// Only `auth::session::SessionService` may write that field.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub full_name: String,

    /// Email address, unique with case-insensitive lookup
    pub email: String,

    /// Argon2id password hash, never serialized outward
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Account role
    pub role: Role,

    /// Currently valid refresh token, `None` when no session is active
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a fresh account with the default `User` role and no session.
    pub fn new(full_name: impl Into<String>, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role: Role::User,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bumps `updated_at`; call after any field mutation, before persisting.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Account role as issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum Role {
    Admin,
    Staff,
    User,
}

impl Role {
    /// Parse the backend's role string. Matching is exact: the backend
    /// only ever sends lowercase names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "staff" => Some(Role::Staff),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User object from `/auth/login`, `/auth/me` and `/auth/register`.
/// Every field is optional: the backend is not trusted to send them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// The signed-in user, held in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    /// `None` when the backend sent no role or one we don't know.
    pub role: Option<Role>,
}

impl UserProfile {
    pub fn is_staff(&self) -> bool {
        self.role == Some(Role::Staff)
    }

    /// Name to show in menus, falling back to the email address.
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            &self.email
        } else {
            &self.username
        }
    }
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        let role = match record.role.as_deref() {
            Some(raw) => {
                let parsed = Role::parse(raw);
                if parsed.is_none() {
                    warn!(role = raw, "Unrecognised role in user record");
                }
                parsed
            }
            None => {
                warn!("User record has no role");
                None
            }
        };

        Self {
            username: record.username.unwrap_or_default(),
            email: record.email.unwrap_or_default(),
            role,
        }
    }
}

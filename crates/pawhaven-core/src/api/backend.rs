//! The authentication endpoints the session layer depends on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Role, UserRecord};

use super::ApiError;

/// Payload of a successful `POST /auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginReply {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserRecord>,
}

/// Payload of a successful `GET /auth/me`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentUserReply {
    #[serde(default)]
    pub user: Option<UserRecord>,
}

/// Payload of a successful `POST /auth/register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterReply {
    #[serde(default)]
    pub user: Option<UserRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(rename = "staffCode", skip_serializing_if = "Option::is_none")]
    pub staff_code: Option<String>,
}

/// Backend operations used by the auth session manager.
///
/// `Ok` means the backend answered `success: true`; whether the payload is
/// complete is for the caller to judge.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginReply, ApiError>;

    async fn current_user(&self, token: &str) -> Result<CurrentUserReply, ApiError>;
}

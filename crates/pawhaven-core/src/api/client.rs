//! API client for communicating with the shelter backend.
//!
//! This module provides the `ApiClient` struct for the authentication
//! endpoints. Authenticated requests carry `Authorization: Bearer <token>`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::backend::{AuthBackend, CurrentUserReply, LoginReply, RegisterReply, RegisterRequest};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

const LOGIN_PATH: &str = "/auth/login";
const CURRENT_USER_PATH: &str = "/auth/me";
const REGISTER_PATH: &str = "/auth/register";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// API client for the shelter backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the backend at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /auth/register`. Registration issues no token.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterReply, ApiError> {
        debug!(email = %request.email, role = %request.role, "Registering account");
        let builder = self.client.post(self.url(REGISTER_PATH)).json(request);
        self.send(builder, REGISTER_PATH).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = builder
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(path, error = %e, "Request failed to reach backend");
                ApiError::NetworkError(e)
            })?;

        let status = response.status();
        let body = response.text().await?;
        debug!(path, %status, bytes = body.len(), "Backend replied");

        parse_envelope(status, &body).inspect_err(|e| {
            debug!(path, error = %e, "Backend reply treated as failure");
        })
    }
}

/// Interpret a reply body as `{success, ...}`.
///
/// A missing or false `success` is a rejection whatever the HTTP status.
/// Bodies that are not JSON objects fall back to status classification.
pub(crate) fn parse_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<T, ApiError> {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        _ if !status.is_success() => return Err(ApiError::from_status(status, body)),
        _ => {
            return Err(ApiError::InvalidResponse(
                "reply body is not a JSON object".to_string(),
            ))
        }
    };

    let success = value.get("success").and_then(Value::as_bool).unwrap_or(false);
    if !success {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginReply, ApiError> {
        debug!(email, "Submitting login");
        let builder = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(&LoginRequest { email, password });
        self.send(builder, LOGIN_PATH).await
    }

    async fn current_user(&self, token: &str) -> Result<CurrentUserReply, ApiError> {
        let builder = self
            .client
            .get(self.url(CURRENT_USER_PATH))
            .bearer_auth(token);
        self.send(builder, CURRENT_USER_PATH).await
    }
}

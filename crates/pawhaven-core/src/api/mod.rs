//! REST client module for the shelter backend.
//!
//! This module provides the `ApiClient` for the authentication endpoints
//! (`/auth/login`, `/auth/me`, `/auth/register`) and the `AuthBackend`
//! seam the session manager is written against.
//!
//! Every reply is treated as an untrusted envelope: `success: true` with
//! optional fields, `success: false` with an optional `message`, or a
//! transport failure.

pub mod backend;
pub mod client;
pub mod error;

pub use backend::{AuthBackend, CurrentUserReply, LoginReply, RegisterReply, RegisterRequest};
pub use client::ApiClient;
pub use error::{ApiError, GENERIC_ERROR_MESSAGE};

//! PawHaven client core.
//!
//! Session and navigation logic for the pet shelter front end: the persisted
//! credential token, the authentication state machine that revalidates it on
//! startup, the route guard, and a thin client for the backend's auth API.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod nav;
pub mod notify;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthSessionManager, AuthState, RouteGuard, TokenStore};
pub use config::Config;

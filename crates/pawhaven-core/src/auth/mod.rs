//! Authentication module for the client session.
//!
//! This module provides:
//! - `TokenStore`: persisted storage for the one bearer token (file, OS keychain, memory)
//! - `AuthSessionManager`: sole owner of `AuthState`; rehydrate, login, logout
//! - `RouteGuard`: optimistic token-presence check for protected pages
//! - `register`: account sign-up with client-side form checks
//!
//! Tokens carry no client-side expiry; the backend decides on every startup.

pub mod guard;
pub mod manager;
pub mod register;
pub mod state;
pub mod store;

pub use guard::RouteGuard;
pub use manager::{AuthSessionManager, Rehydration};
pub use register::{register, FormError, RegistrationForm, RegistrationOutcome};
pub use state::{AuthPhase, AuthState};
pub use store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};

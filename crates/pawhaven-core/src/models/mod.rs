//! Data models shared between the API client and the session layer.
//!
//! - `UserRecord`: the user object exactly as the backend sends it
//! - `UserProfile`, `Role`: the validated, in-memory view of the signed-in user

pub mod user;

pub use user::{Role, UserProfile, UserRecord};

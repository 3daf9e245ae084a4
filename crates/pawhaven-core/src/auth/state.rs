use serde::Serialize;

use crate::models::UserProfile;

/// In-memory authentication state.
///
/// Only the auth session manager writes it; everyone else sees snapshots.
/// `is_authenticated` implies `user` is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct AuthState {
    pub(crate) is_authenticated: bool,
    pub(crate) is_loading: bool,
    pub(crate) user: Option<UserProfile>,
}

/// The three states a consumer has to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// A rehydrate or login call is in flight; the other fields are not final.
    Loading,
    Authenticated,
    Anonymous,
}

impl AuthState {
    pub fn phase(&self) -> AuthPhase {
        if self.is_loading {
            AuthPhase::Loading
        } else if self.is_authenticated && self.user.is_some() {
            AuthPhase::Authenticated
        } else {
            AuthPhase::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_staff(&self) -> bool {
        self.is_authenticated && self.user.as_ref().is_some_and(UserProfile::is_staff)
    }
}

use std::sync::Arc;

use tracing::warn;

use super::TokenStore;

/// Optimistic access check for protected pages.
///
/// Passes whenever a token is stored, valid or not. It never asks the
/// backend or the session manager; a stale token is only caught by the next
/// rehydration, and pages must cope with an unauthenticated API reply.
#[derive(Clone)]
pub struct RouteGuard {
    store: Arc<dyn TokenStore>,
}

impl RouteGuard {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn can_access(&self) -> bool {
        match self.store.current_token() {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(error = %e, "Token store unreadable, denying access");
                false
            }
        }
    }
}

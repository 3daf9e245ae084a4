//! Navigation layer: the route table, the guard-aware router, the header
//! menu model and the hard-redirect seam.
//!
//! Two kinds of navigation exist. A soft redirect (`Navigation::Redirect`)
//! swaps the view and keeps client state. A hard redirect goes through a
//! `Navigator` and means "discard all client state and run startup again".

pub mod menu;
pub mod route;

use std::sync::Mutex;

use tracing::info;

pub use menu::{HeaderMenu, MenuItem};
pub use route::{Navigation, Route, Router};

/// Receiver of hard redirects.
pub trait Navigator: Send + Sync {
    fn hard_redirect(&self, target: Route);
}

/// A `Navigator` that records the request for the front end's main loop to
/// act on after the current operation returns.
#[derive(Default)]
pub struct RestartSignal {
    pending: Mutex<Option<Route>>,
}

impl RestartSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pending redirect, leaving none behind.
    pub fn take(&self) -> Option<Route> {
        self.pending.lock().ok().and_then(|mut pending| pending.take())
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.is_some())
            .unwrap_or(false)
    }
}

impl Navigator for RestartSignal {
    fn hard_redirect(&self, target: Route) {
        info!(target = %target, "Hard redirect requested");
        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_signal_take_clears() {
        let signal = RestartSignal::new();
        assert!(!signal.is_pending());

        signal.hard_redirect(Route::Home);
        assert!(signal.is_pending());
        assert_eq!(signal.take(), Some(Route::Home));
        assert_eq!(signal.take(), None);
    }
}

//! Application state for the pawhaven CLI.
//!
//! `App` plays the part of one page load: it owns the session manager and
//! router, runs startup rehydration, and honours hard redirects by
//! throwing the session away and starting over.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use pawhaven_core::api::ApiClient;
use pawhaven_core::auth::{
    self, AuthSessionManager, AuthState, RegistrationForm, RegistrationOutcome, Rehydration,
    RouteGuard, TokenStore,
};
use pawhaven_core::config::Config;
use pawhaven_core::nav::{HeaderMenu, Navigation, RestartSignal, Route, Router};
use pawhaven_core::notify::{Notice, NoticeLevel, Notifier};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound on back-to-back restarts. A restart clears the token, so the
/// second startup is always tokenless; more than that means a broken store.
const MAX_RESTARTS: usize = 3;

/// Prints notifications to stderr.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => eprintln!("✓ {}", notice),
            NoticeLevel::Error => eprintln!("✗ {}", notice),
        }
    }
}

pub struct App {
    pub config: Config,
    store: Arc<dyn TokenStore>,
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    restart: Arc<RestartSignal>,
    session: AuthSessionManager,
    router: Router,
}

impl App {
    /// Create a new application instance
    pub fn new(
        config: Config,
        store: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        debug!(backend_url = %config.backend_url, storage = ?config.token_storage, "App::new()");
        let api = ApiClient::new(&config.backend_url, config.request_timeout())?;
        let restart = Arc::new(RestartSignal::new());
        let session = Self::build_session(&store, &api, &notifier, &restart);
        let router = Router::new(RouteGuard::new(store.clone()));

        Ok(Self {
            config,
            store,
            api,
            notifier,
            restart,
            session,
            router,
        })
    }

    fn build_session(
        store: &Arc<dyn TokenStore>,
        api: &ApiClient,
        notifier: &Arc<dyn Notifier>,
        restart: &Arc<RestartSignal>,
    ) -> AuthSessionManager {
        AuthSessionManager::new(
            store.clone(),
            Arc::new(api.clone()),
            notifier.clone(),
            restart.clone(),
        )
    }

    pub fn state(&self) -> AuthState {
        self.session.state()
    }

    pub fn has_stored_token(&self) -> bool {
        RouteGuard::new(self.store.clone()).can_access()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Startup: rehydrate once, then honour any hard redirect it asked for.
    pub async fn start(&mut self) -> Result<Rehydration> {
        let outcome = self.session.rehydrate().await?;
        debug!(?outcome, "Startup rehydration finished");
        self.settle().await?;
        Ok(outcome)
    }

    /// Carry out pending hard redirects: drop all client state and run
    /// startup again.
    pub async fn settle(&mut self) -> Result<()> {
        let mut restarts = 0;
        while let Some(target) = self.restart.take() {
            restarts += 1;
            if restarts > MAX_RESTARTS {
                anyhow::bail!("Session kept restarting; the token store may be broken");
            }
            info!(target = %target, "Restarting session");
            self.session =
                Self::build_session(&self.store, &self.api, &self.notifier, &self.restart);
            self.session.rehydrate().await?;
        }
        Ok(())
    }

    // =========================================================================
    // Commands
    // =========================================================================

    pub async fn login(&mut self, email: &str, password: &str) -> Result<bool> {
        if self.state().is_authenticated() {
            info!("Already signed in, replacing session");
        }
        let ok = self.session.login(email, password).await?;
        self.settle().await?;
        Ok(ok)
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.session.logout()?;
        self.settle().await
    }

    pub async fn register(&self, form: &RegistrationForm) -> RegistrationOutcome {
        auth::register(&self.api, self.notifier.as_ref(), form).await
    }

    /// Resolve `path` and describe the header that would be shown with it.
    pub fn open(&self, path: &str) -> (Navigation, HeaderMenu) {
        let navigation = self.router.resolve(path);
        let shown = match &navigation {
            Navigation::Render(route) => route.clone(),
            Navigation::Redirect(target) => {
                warn!(path, target = %target, "Protected page needs a session");
                target.clone()
            }
            Navigation::NotFound => Route::Home,
        };
        let menu = HeaderMenu::for_state(&self.state(), &shown);
        (navigation, menu)
    }
}

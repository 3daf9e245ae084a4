//! Owner of the authentication state.
//!
//! `AuthSessionManager` is the only writer of `AuthState`. It sits between
//! the token store and the backend's auth endpoints and exposes the three
//! operations that move the session: `rehydrate`, `login` and `logout`.
//! Front ends read the state through `subscribe()`.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{AuthBackend, CurrentUserReply, LoginReply, GENERIC_ERROR_MESSAGE};
use crate::models::UserProfile;
use crate::nav::{Navigator, Route};
use crate::notify::{Notice, Notifier};

use super::{AuthState, TokenStore};

/// How startup rehydration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rehydration {
    /// Nothing stored; the backend was not contacted.
    NoToken,
    /// The backend confirmed the stored token.
    Restored,
    /// The stored token was rejected or could not be checked. It has been
    /// cleared and a hard redirect to the root requested.
    Expired,
}

pub struct AuthSessionManager {
    store: Arc<dyn TokenStore>,
    backend: Arc<dyn AuthBackend>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<AuthState>,
}

impl AuthSessionManager {
    pub fn new(
        store: Arc<dyn TokenStore>,
        backend: Arc<dyn AuthBackend>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            store,
            backend,
            notifier,
            navigator,
            state,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Live view of the state for UI consumers.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    fn update(&self, modify: impl FnOnce(&mut AuthState)) {
        self.state.send_modify(modify);
    }

    // =========================================================================
    // Rehydrate
    // =========================================================================

    /// Rebuild the session from the stored token. Call once, at startup.
    ///
    /// The token is never trusted on sight: it is revalidated with the
    /// backend, and any failure is treated as an expired session. There is
    /// no retry.
    pub async fn rehydrate(&self) -> Result<Rehydration> {
        let Some(token) = self
            .store
            .current_token()
            .context("Failed to read stored token")?
        else {
            debug!("No stored token, starting signed out");
            return Ok(Rehydration::NoToken);
        };

        self.update(|s| s.is_loading = true);

        let outcome = match self.backend.current_user(&token).await {
            Ok(CurrentUserReply { user: Some(record) }) => {
                let profile = UserProfile::from(record);
                info!(email = %profile.email, role = ?profile.role, "Session restored");
                self.update(|s| {
                    s.user = Some(profile);
                    s.is_authenticated = true;
                });
                Ok(Rehydration::Restored)
            }
            Ok(CurrentUserReply { user: None }) => {
                warn!("Backend confirmed session without a user, treating as expired");
                self.expire_session()
            }
            Err(e) => {
                warn!(error = %e, "Session validation failed, treating as expired");
                self.expire_session()
            }
        };

        self.update(|s| s.is_loading = false);
        outcome
    }

    fn expire_session(&self) -> Result<Rehydration> {
        self.update(|s| {
            s.is_authenticated = false;
            s.user = None;
        });
        self.store
            .clear()
            .context("Failed to clear expired token")?;
        self.navigator.hard_redirect(Route::Home);
        Ok(Rehydration::Expired)
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Sign in with email and password. Returns whether the session is now
    /// authenticated.
    ///
    /// Rejections are not errors: the state is left alone and the reason is
    /// shown through the notifier. `Err` means the token store failed.
    pub async fn login(&self, email: &str, password: &str) -> Result<bool> {
        self.update(|s| s.is_loading = true);

        let outcome = match self.backend.login(email, password).await {
            Ok(LoginReply {
                token: Some(token),
                user: Some(record),
            }) if !token.is_empty() => self.establish(&token, UserProfile::from(record)),
            Ok(_) => {
                warn!(email, "Login reply lacked token or user");
                self.notifier.notify(Notice::error(GENERIC_ERROR_MESSAGE));
                Ok(false)
            }
            Err(e) => {
                warn!(email, error = %e, "Login failed");
                self.notifier.notify(Notice::error(e.user_message()));
                Ok(false)
            }
        };

        self.update(|s| s.is_loading = false);
        outcome
    }

    fn establish(&self, token: &str, profile: UserProfile) -> Result<bool> {
        self.store
            .save(token)
            .context("Failed to persist session token")?;
        info!(email = %profile.email, role = ?profile.role, "Login successful");
        self.update(|s| {
            s.user = Some(profile);
            s.is_authenticated = true;
        });
        Ok(true)
    }

    // =========================================================================
    // Logout
    // =========================================================================

    /// Sign out locally and request a hard redirect to the root. The backend
    /// is not contacted.
    pub fn logout(&self) -> Result<()> {
        self.update(|s| {
            s.user = None;
            s.is_authenticated = false;
        });
        self.store.clear().context("Failed to clear session token")?;
        self.navigator.hard_redirect(Route::Home);
        info!("Signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::api::ApiError;
    use crate::auth::MemoryTokenStore;
    use crate::models::{Role, UserRecord};
    use crate::nav::RestartSignal;

    // ------------------------------------------------------------------
    // Fakes
    // ------------------------------------------------------------------

    type Reply<T> = Box<dyn Fn() -> Result<T, ApiError> + Send + Sync>;

    struct FakeBackend {
        login_reply: Reply<LoginReply>,
        me_reply: Reply<CurrentUserReply>,
        calls: AtomicUsize,
        seen_tokens: Mutex<Vec<String>>,
        /// Loading flag as observed while the call was in flight.
        loading_during_call: Mutex<Option<watch::Receiver<AuthState>>>,
        observed_loading: Mutex<Vec<bool>>,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                login_reply: Box::new(|| Err(ApiError::InvalidResponse("unused".into()))),
                me_reply: Box::new(|| Err(ApiError::InvalidResponse("unused".into()))),
                calls: AtomicUsize::new(0),
                seen_tokens: Mutex::new(Vec::new()),
                loading_during_call: Mutex::new(None),
                observed_loading: Mutex::new(Vec::new()),
            }
        }

        fn on_login(
            mut self,
            reply: impl Fn() -> Result<LoginReply, ApiError> + Send + Sync + 'static,
        ) -> Self {
            self.login_reply = Box::new(reply);
            self
        }

        fn on_me(
            mut self,
            reply: impl Fn() -> Result<CurrentUserReply, ApiError> + Send + Sync + 'static,
        ) -> Self {
            self.me_reply = Box::new(reply);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record_call(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(rx) = self.loading_during_call.lock().unwrap().as_ref() {
                self.observed_loading.lock().unwrap().push(rx.borrow().is_loading());
            }
        }
    }

    #[async_trait]
    impl AuthBackend for FakeBackend {
        async fn login(&self, _email: &str, _password: &str) -> Result<LoginReply, ApiError> {
            self.record_call();
            (self.login_reply)()
        }

        async fn current_user(&self, token: &str) -> Result<CurrentUserReply, ApiError> {
            self.record_call();
            self.seen_tokens.lock().unwrap().push(token.to_string());
            (self.me_reply)()
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        fn texts(&self) -> Vec<String> {
            self.notices.lock().unwrap().iter().map(|n| n.text.clone()).collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    #[derive(Default)]
    struct CountingNavigator {
        redirects: Mutex<Vec<Route>>,
    }

    impl CountingNavigator {
        fn redirects(&self) -> Vec<Route> {
            self.redirects.lock().unwrap().clone()
        }
    }

    impl Navigator for CountingNavigator {
        fn hard_redirect(&self, target: Route) {
            self.redirects.lock().unwrap().push(target);
        }
    }

    struct Harness {
        manager: AuthSessionManager,
        store: Arc<MemoryTokenStore>,
        backend: Arc<FakeBackend>,
        notifier: Arc<RecordingNotifier>,
        navigator: Arc<CountingNavigator>,
    }

    fn harness(store: MemoryTokenStore, backend: FakeBackend) -> Harness {
        let store = Arc::new(store);
        let backend = Arc::new(backend);
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(CountingNavigator::default());
        let manager = AuthSessionManager::new(
            store.clone(),
            backend.clone(),
            notifier.clone(),
            navigator.clone(),
        );
        *backend.loading_during_call.lock().unwrap() = Some(manager.subscribe());
        Harness {
            manager,
            store,
            backend,
            notifier,
            navigator,
        }
    }

    fn staff_record() -> UserRecord {
        UserRecord {
            username: Some("a".to_string()),
            email: Some("a@x.com".to_string()),
            role: Some("staff".to_string()),
        }
    }

    fn staff_profile() -> UserProfile {
        UserProfile {
            username: "a".to_string(),
            email: "a@x.com".to_string(),
            role: Some(Role::Staff),
        }
    }

    // ------------------------------------------------------------------
    // Rehydrate
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_rehydrate_without_token_stays_initial() {
        let h = harness(MemoryTokenStore::new(), FakeBackend::new());

        let outcome = h.manager.rehydrate().await.unwrap();

        assert_eq!(outcome, Rehydration::NoToken);
        assert_eq!(h.manager.state(), AuthState::default());
        assert_eq!(h.backend.calls(), 0);
        assert!(h.navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_rehydrate_empty_token_is_no_token() {
        let h = harness(MemoryTokenStore::with_token(""), FakeBackend::new());

        let outcome = h.manager.rehydrate().await.unwrap();

        assert_eq!(outcome, Rehydration::NoToken);
        assert_eq!(h.manager.state(), AuthState::default());
        assert_eq!(h.backend.calls(), 0);
        assert!(h.navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_rehydrate_restores_session() {
        let backend = FakeBackend::new().on_me(|| {
            Ok(CurrentUserReply {
                user: Some(staff_record()),
            })
        });
        let h = harness(MemoryTokenStore::with_token("tok-123"), backend);

        let outcome = h.manager.rehydrate().await.unwrap();

        assert_eq!(outcome, Rehydration::Restored);
        assert_eq!(
            h.manager.state(),
            AuthState {
                is_authenticated: true,
                is_loading: false,
                user: Some(staff_profile()),
            }
        );
        assert_eq!(*h.backend.seen_tokens.lock().unwrap(), vec!["tok-123".to_string()]);
        assert_eq!(*h.backend.observed_loading.lock().unwrap(), vec![true]);
        assert_eq!(h.store.read().unwrap().as_deref(), Some("tok-123"));
        assert!(h.navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_rehydrate_defaults_missing_profile_fields() {
        let backend = FakeBackend::new().on_me(|| {
            Ok(CurrentUserReply {
                user: Some(UserRecord {
                    role: Some("user".to_string()),
                    ..Default::default()
                }),
            })
        });
        let h = harness(MemoryTokenStore::with_token("tok"), backend);

        h.manager.rehydrate().await.unwrap();

        let state = h.manager.state();
        let user = state.user().expect("user should be set");
        assert_eq!(user.username, "");
        assert_eq!(user.email, "");
        assert_eq!(user.role, Some(Role::User));
    }

    async fn assert_rehydrate_expires(backend: FakeBackend) {
        let h = harness(MemoryTokenStore::with_token("tok-123"), backend);

        let outcome = h.manager.rehydrate().await.unwrap();

        assert_eq!(outcome, Rehydration::Expired);
        assert_eq!(h.store.read().unwrap(), None);
        assert_eq!(h.manager.state(), AuthState::default());
        assert_eq!(h.navigator.redirects(), vec![Route::Home]);
        assert_eq!(h.backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_rehydrate_rejected_token_expires_session() {
        assert_rehydrate_expires(FakeBackend::new().on_me(|| {
            Err(ApiError::Rejected {
                status: 401,
                message: Some("jwt expired".to_string()),
            })
        }))
        .await;
    }

    #[tokio::test]
    async fn test_rehydrate_missing_user_expires_session() {
        assert_rehydrate_expires(FakeBackend::new().on_me(|| Ok(CurrentUserReply { user: None })))
            .await;
    }

    #[tokio::test]
    async fn test_rehydrate_transport_failure_expires_session() {
        assert_rehydrate_expires(
            FakeBackend::new().on_me(|| Err(ApiError::ServerError("bad gateway".to_string()))),
        )
        .await;
    }

    #[tokio::test]
    async fn test_rehydrate_failure_does_not_notify() {
        let backend = FakeBackend::new().on_me(|| Err(ApiError::Unauthorized));
        let h = harness(MemoryTokenStore::with_token("tok"), backend);

        h.manager.rehydrate().await.unwrap();

        assert!(h.notifier.texts().is_empty());
    }

    // ------------------------------------------------------------------
    // Login
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_login_success_persists_token() {
        let backend = FakeBackend::new().on_login(|| {
            Ok(LoginReply {
                token: Some("tok-new".to_string()),
                user: Some(staff_record()),
            })
        });
        let h = harness(MemoryTokenStore::new(), backend);
        let rx = h.manager.subscribe();

        let ok = h.manager.login("a@x.com", "pw").await.unwrap();

        assert!(ok);
        assert_eq!(h.store.read().unwrap().as_deref(), Some("tok-new"));
        let state = rx.borrow().clone();
        assert!(state.is_authenticated());
        assert!(!state.is_loading());
        assert_eq!(state.user(), Some(&staff_profile()));
        assert_eq!(*h.backend.observed_loading.lock().unwrap(), vec![true]);
        assert!(h.notifier.texts().is_empty());
    }

    #[tokio::test]
    async fn test_login_rejected_shows_backend_message() {
        let backend = FakeBackend::new().on_login(|| {
            Err(ApiError::Rejected {
                status: 200,
                message: Some("Invalid credentials".to_string()),
            })
        });
        let h = harness(MemoryTokenStore::new(), backend);

        let ok = h.manager.login("a@x.com", "bad").await.unwrap();

        assert!(!ok);
        assert_eq!(h.manager.state(), AuthState::default());
        assert_eq!(h.store.read().unwrap(), None);
        assert_eq!(h.notifier.texts(), vec!["Invalid credentials".to_string()]);
    }

    #[tokio::test]
    async fn test_login_transport_failure_shows_generic_message() {
        let backend = FakeBackend::new().on_login(|| Err(ApiError::RateLimited));
        let h = harness(MemoryTokenStore::new(), backend);

        assert!(!h.manager.login("a@x.com", "pw").await.unwrap());
        assert_eq!(h.notifier.texts(), vec![GENERIC_ERROR_MESSAGE.to_string()]);
        assert_eq!(h.manager.state(), AuthState::default());
    }

    #[tokio::test]
    async fn test_login_without_token_is_failure() {
        let backend = FakeBackend::new().on_login(|| {
            Ok(LoginReply {
                token: Some(String::new()),
                user: Some(staff_record()),
            })
        });
        let h = harness(MemoryTokenStore::new(), backend);

        assert!(!h.manager.login("a@x.com", "pw").await.unwrap());
        assert_eq!(h.store.read().unwrap(), None);
        assert!(!h.manager.state().is_authenticated());
        assert_eq!(h.notifier.texts(), vec![GENERIC_ERROR_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn test_login_failure_keeps_existing_token() {
        let backend = FakeBackend::new().on_login(|| Err(ApiError::Unauthorized));
        let h = harness(MemoryTokenStore::with_token("previous"), backend);

        h.manager.login("a@x.com", "bad").await.unwrap();

        assert_eq!(h.store.read().unwrap().as_deref(), Some("previous"));
    }

    // ------------------------------------------------------------------
    // Logout
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_logout_clears_everything_and_redirects() {
        let backend = FakeBackend::new().on_login(|| {
            Ok(LoginReply {
                token: Some("tok".to_string()),
                user: Some(staff_record()),
            })
        });
        let h = harness(MemoryTokenStore::new(), backend);
        h.manager.login("a@x.com", "pw").await.unwrap();
        let calls_before = h.backend.calls();

        h.manager.logout().unwrap();

        assert_eq!(h.manager.state(), AuthState::default());
        assert_eq!(h.store.read().unwrap(), None);
        assert_eq!(h.navigator.redirects(), vec![Route::Home]);
        assert_eq!(h.backend.calls(), calls_before);
    }

    #[tokio::test]
    async fn test_logout_twice_is_harmless() {
        let h = harness(MemoryTokenStore::new(), FakeBackend::new());

        h.manager.logout().unwrap();
        h.manager.logout().unwrap();

        assert_eq!(h.manager.state(), AuthState::default());
        assert_eq!(h.store.read().unwrap(), None);
        assert_eq!(h.navigator.redirects(), vec![Route::Home, Route::Home]);
    }

    #[tokio::test]
    async fn test_restart_signal_receives_logout_redirect() {
        let signal = Arc::new(RestartSignal::new());
        let manager = AuthSessionManager::new(
            Arc::new(MemoryTokenStore::with_token("tok")),
            Arc::new(FakeBackend::new()),
            Arc::new(RecordingNotifier::default()),
            signal.clone(),
        );

        manager.logout().unwrap();

        assert_eq!(signal.take(), Some(Route::Home));
    }
}

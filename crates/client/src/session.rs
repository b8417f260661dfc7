//! Session store: auth tokens and the cached user profile.
//!
//! [`SessionHandle`] is the shared token state the gateway reads on every
//! request and updates after a refresh. [`SessionStore`] layers the login,
//! registration, restore and logout flows on top of it.
//!
//! Holding a non-empty access token counts as authenticated. Tokens are
//! never decoded or checked for expiry locally; the API is the judge, and a
//! rejected token is handled by the gateway's refresh-and-replay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use secrecy::{ExposeSecret, SecretString};
use tiffin_core::UserProfile;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::error::{ClientError, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::gateway::{ApiGateway, TokenPair};
use crate::storage::{SharedStore, keys};
use crate::validation::Registration;

/// Authentication state broadcast to front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// No session.
    Anonymous,
    /// An access token is held.
    Authenticated,
    /// The session expired and could not be refreshed; the user must log in again.
    LoginRequired,
}

#[derive(Default)]
struct SessionState {
    access: Option<SecretString>,
    refresh: Option<SecretString>,
    user: Option<UserProfile>,
}

/// Shared, persisted session state.
///
/// Cheap to clone. Every mutation is written through to storage
/// immediately; storage failures are logged and otherwise ignored.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    storage: SharedStore,
    state: RwLock<SessionState>,
    status: watch::Sender<AuthStatus>,
    /// Bumped whenever the signed-in identity may have changed.
    generation: AtomicU64,
}

impl SessionHandle {
    /// Create an empty, anonymous session over `storage`.
    ///
    /// Nothing is read from storage until [`SessionStore::restore`] runs.
    #[must_use]
    pub fn new(storage: SharedStore) -> Self {
        let (status, _) = watch::channel(AuthStatus::Anonymous);
        Self {
            inner: Arc::new(SessionInner {
                storage,
                state: RwLock::new(SessionState::default()),
                status,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// The current bearer token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.read().access.clone()
    }

    /// The stored refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.read().refresh.clone()
    }

    /// The cached profile of the signed-in user.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.read().user.clone()
    }

    /// Whether a non-empty access token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read()
            .access
            .as_ref()
            .is_some_and(|token| !token.expose_secret().is_empty())
    }

    /// The current auth status.
    #[must_use]
    pub fn status(&self) -> AuthStatus {
        *self.inner.status.borrow()
    }

    /// Watch auth status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.inner.status.subscribe()
    }

    /// Identity generation. Changes on login, logout, expiry and restore,
    /// but not when a refresh replaces the access token of the same session.
    pub(crate) fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    fn next_generation(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Store a freshly issued token pair.
    pub fn set_tokens(&self, tokens: &TokenPair) {
        {
            let mut state = self.write();
            state.access = Some(tokens.access.clone());
            state.refresh = Some(tokens.refresh.clone());
        }
        self.next_generation();
        self.persist(keys::ACCESS_TOKEN, Some(tokens.access.expose_secret()));
        self.persist(keys::REFRESH_TOKEN, Some(tokens.refresh.expose_secret()));
        self.inner.status.send_replace(AuthStatus::Authenticated);
    }

    /// Replace the access token after a refresh.
    pub fn set_access_token(&self, access: SecretString) {
        self.persist(keys::ACCESS_TOKEN, Some(access.expose_secret()));
        self.write().access = Some(access);
    }

    /// Replace the refresh token when the API rotates it.
    pub fn set_refresh_token(&self, refresh: SecretString) {
        self.persist(keys::REFRESH_TOKEN, Some(refresh.expose_secret()));
        self.write().refresh = Some(refresh);
    }

    /// Cache and persist the signed-in user's profile.
    pub fn set_user(&self, user: &UserProfile) {
        match serde_json::to_string(user) {
            Ok(json) => self.persist(keys::USER, Some(&json)),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize user profile"),
        }
        self.write().user = Some(user.clone());
    }

    /// Drop every session key and move to `status`.
    pub(crate) fn clear(&self, status: AuthStatus) {
        *self.write() = SessionState::default();
        self.next_generation();
        for key in keys::SESSION_KEYS {
            self.persist(key, None);
        }
        self.inner.status.send_replace(status);
    }

    /// The session could not be refreshed; clear it and require a login.
    pub(crate) fn expire(&self) {
        tracing::info!("Session expired, login required");
        self.clear(AuthStatus::LoginRequired);
    }

    /// Load tokens and the raw profile JSON from storage into memory.
    fn load_persisted(&self) -> Option<String> {
        let access = self.read_key(keys::ACCESS_TOKEN).filter(|token| !token.is_empty());
        let refresh = self.read_key(keys::REFRESH_TOKEN).filter(|token| !token.is_empty());
        let user = self.read_key(keys::USER);

        {
            let mut state = self.write();
            state.access = access.map(SecretString::from);
            state.refresh = refresh.map(SecretString::from);
        }
        self.next_generation();
        user
    }

    fn read_key(&self, key: &str) -> Option<String> {
        self.inner.storage.get(key).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Failed to read session state");
            None
        })
    }

    fn persist(&self, key: &str, value: Option<&str>) {
        let result = match value {
            Some(value) => self.inner.storage.set(key, value),
            None => self.inner.storage.remove(key),
        };
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "Failed to persist session state");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SessionHandle")
            .field("access", &state.access.as_ref().map(|_| "[REDACTED]"))
            .field("refresh", &state.refresh.as_ref().map(|_| "[REDACTED]"))
            .field("user", &state.user.as_ref().map(|u| &u.username))
            .field("status", &self.status())
            .finish()
    }
}

/// Login, registration and session lifecycle.
#[derive(Clone, Debug)]
pub struct SessionStore {
    gateway: ApiGateway,
}

impl SessionStore {
    /// Create a session store that authenticates through `gateway`.
    #[must_use]
    pub const fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// The shared session state.
    #[must_use]
    pub fn handle(&self) -> &SessionHandle {
        self.gateway.session()
    }

    /// Whether a non-empty access token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.handle().is_authenticated()
    }

    /// The cached user profile.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.handle().current_user()
    }

    /// Watch auth status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.handle().subscribe()
    }

    /// Restore the persisted session and revalidate it against the API.
    ///
    /// A session is restored only when both an access token and a cached
    /// profile are stored. The profile is trusted immediately, then
    /// `/users/me/` is fetched. Success refreshes the cached profile;
    /// any failure, or a cached profile that does not parse, logs out.
    ///
    /// Returns whether the session is still authenticated.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> bool {
        if !self.load_optimistic() {
            return false;
        }
        self.revalidate().await
    }

    /// Like [`restore`](Self::restore), but the revalidation runs on a
    /// spawned task so the caller can render the optimistic state at once.
    ///
    /// Returns `None` when there was no session to revalidate.
    pub fn restore_in_background(&self) -> Option<JoinHandle<bool>> {
        if !self.load_optimistic() {
            return None;
        }
        let store = self.clone();
        Some(tokio::spawn(async move { store.revalidate().await }))
    }

    /// Exchange credentials for tokens, then fetch and cache the profile.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AuthRejected` with the server's message when the
    /// credentials are refused. If the profile fetch fails the new tokens are
    /// discarded and that error is returned.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<UserProfile, ClientError> {
        let tokens = self.gateway.obtain_token(username, password).await?;
        self.handle().set_tokens(&tokens);

        match self.gateway.current_user().await {
            Ok(user) => {
                self.handle().set_user(&user);
                set_sentry_user(&user.id, &user.username, Some(&user.email));
                add_breadcrumb("auth", "Logged in", None);
                tracing::info!(user_id = %user.id, "Logged in");
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile fetch after login failed");
                self.handle().clear(AuthStatus::Anonymous);
                Err(e)
            }
        }
    }

    /// Validate and submit a registration, then log in with the same credentials.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` before any request when the form is
    /// invalid, or with the API's field errors when registration is refused.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<UserProfile, ClientError> {
        registration.validate()?;
        self.gateway.register(registration).await?;
        add_breadcrumb("auth", "Registered", None);
        self.login(registration.username.trim(), &registration.password)
            .await
    }

    /// Forget the session. The cart is left alone.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        self.handle().clear(AuthStatus::Anonymous);
        clear_sentry_user();
        add_breadcrumb("auth", "Logged out", None);
    }

    /// Replace the cached profile.
    ///
    /// Only the local copy changes.
    // TODO: PATCH /users/me/ once the API exposes profile updates, and cache the server's response instead.
    pub fn update_profile(&self, profile: &UserProfile) {
        self.handle().set_user(profile);
    }

    /// Load persisted state and mark the session authenticated without a
    /// round trip. Returns whether there is a session to revalidate.
    fn load_optimistic(&self) -> bool {
        let handle = self.handle();
        let user_json = handle.load_persisted();

        let Some(json) = user_json.filter(|_| handle.is_authenticated()) else {
            // Storage is left as found; only the in-memory session stays empty.
            *handle.write() = SessionState::default();
            return false;
        };

        match serde_json::from_str::<UserProfile>(&json) {
            Ok(user) => handle.write().user = Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Cached user profile is corrupt");
                self.logout();
                return false;
            }
        }

        handle.inner.status.send_replace(AuthStatus::Authenticated);
        true
    }

    async fn revalidate(&self) -> bool {
        match self.gateway.current_user().await {
            Ok(user) => {
                self.handle().set_user(&user);
                set_sentry_user(&user.id, &user.username, Some(&user.email));
                tracing::debug!(user_id = %user.id, "Session revalidated");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session revalidation failed");
                self.logout();
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ClientConfig;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn profile_json() -> serde_json::Value {
        json!({"id": 2, "username": "asha", "email": "asha@example.com", "role": "member"})
    }

    fn store_for(server: &MockServer, storage: Arc<MemoryStore>) -> SessionStore {
        let config = ClientConfig::for_base_url(&server.uri()).unwrap();
        let session = SessionHandle::new(storage);
        SessionStore::new(ApiGateway::new(&config, session).unwrap())
    }

    fn persisted_session() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_entries([
            (keys::ACCESS_TOKEN, "stale-access".to_string()),
            (keys::REFRESH_TOKEN, "stale-refresh".to_string()),
            (keys::USER, profile_json().to_string()),
        ]))
    }

    #[tokio::test]
    async fn test_login_persists_tokens_and_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/"))
            .and(body_json(json!({"username": "asha", "password": "correct-horse"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a1", "refresh": "r1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/me/"))
            .and(header("Authorization", "Bearer a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryStore::new());
        let store = store_for(&server, Arc::clone(&storage));
        let mut status = store.subscribe();

        let user = store
            .login("asha", &SecretString::from("correct-horse"))
            .await
            .unwrap();

        assert_eq!(user.username, "asha");
        assert!(store.is_authenticated());
        assert_eq!(*status.borrow_and_update(), AuthStatus::Authenticated);
        assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("a1"));
        assert_eq!(storage.get(keys::REFRESH_TOKEN).unwrap().as_deref(), Some("r1"));
        assert!(storage.get(keys::USER).unwrap().unwrap().contains("asha"));
    }

    #[tokio::test]
    async fn test_rejected_login_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                json!({"detail": "No active account found with the given credentials"}),
            ))
            .mount(&server)
            .await;

        let store = store_for(&server, Arc::new(MemoryStore::new()));
        let err = store
            .login("asha", &SecretString::from("wrong"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, ClientError::AuthRejected(ref message) if message == "No active account found with the given credentials")
        );
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_revalidates_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/"))
            .and(header("Authorization", "Bearer stale-access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 2, "username": "asha", "email": "asha@example.com",
                "first_name": "Asha", "role": "member"
            })))
            .mount(&server)
            .await;

        let storage = persisted_session();
        let store = store_for(&server, Arc::clone(&storage));

        assert!(store.restore().await);
        assert_eq!(store.current_user().unwrap().first_name, "Asha");
        assert!(storage.get(keys::USER).unwrap().unwrap().contains("Asha"));
    }

    #[tokio::test]
    async fn test_restore_with_failing_revalidation_logs_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let storage = persisted_session();
        let store = store_for(&server, Arc::clone(&storage));

        assert!(!store.restore().await);
        assert!(!store.is_authenticated());
        assert!(store.current_user().is_none());
        for key in keys::SESSION_KEYS {
            assert_eq!(storage.get(key).unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_restore_in_background_resolves() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
            .mount(&server)
            .await;

        let store = store_for(&server, persisted_session());
        let task = store.restore_in_background().unwrap();
        assert!(store.is_authenticated());
        assert!(task.await.unwrap());
    }

    #[tokio::test]
    async fn test_restore_without_token_is_anonymous() {
        let server = MockServer::start().await;
        let store = store_for(&server, Arc::new(MemoryStore::new()));

        assert!(!store.restore().await);
        assert!(store.restore_in_background().is_none());
        assert_eq!(store.handle().status(), AuthStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_token_without_cached_profile_is_not_restored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
            .expect(0)
            .mount(&server)
            .await;
        let storage = Arc::new(MemoryStore::with_entries([(keys::ACCESS_TOKEN, "a1")]));
        let store = store_for(&server, Arc::clone(&storage));

        assert!(!store.restore().await);
        assert!(store.restore_in_background().is_none());
        assert!(!store.is_authenticated());
        assert!(store.handle().access_token().is_none());
        assert_eq!(store.handle().status(), AuthStatus::Anonymous);
        assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_corrupt_cached_profile_logs_out() {
        let server = MockServer::start().await;
        let storage = Arc::new(MemoryStore::with_entries([
            (keys::ACCESS_TOKEN, "a1"),
            (keys::USER, "{not json"),
        ]));
        let store = store_for(&server, Arc::clone(&storage));

        assert!(!store.restore().await);
        assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_keeps_cart() {
        let server = MockServer::start().await;
        let storage = persisted_session();
        storage.set(keys::CART, "[]").unwrap();
        let store = store_for(&server, Arc::clone(&storage));

        store.logout();

        assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap(), None);
        assert_eq!(storage.get(keys::CART).unwrap().as_deref(), Some("[]"));
        assert_eq!(store.handle().status(), AuthStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_register_validates_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/register/"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let store = store_for(&server, Arc::new(MemoryStore::new()));
        let registration = Registration {
            username: "asha".to_string(),
            email: "asha@example.com".to_string(),
            password: SecretString::from("short"),
            password2: SecretString::from("short"),
            first_name: String::new(),
            last_name: String::new(),
            country: None,
            phone: String::new(),
        };

        let err = store.register(&registration).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref errors) if errors.get("password").is_some()));
    }

    #[test]
    fn test_update_profile_is_local() {
        let storage = Arc::new(MemoryStore::new());
        let handle = SessionHandle::new(Arc::clone(&storage) as SharedStore);
        let mut user: UserProfile = serde_json::from_value(profile_json()).unwrap();
        user.phone = Some("+91 98450 00000".to_string());

        handle.set_user(&user);

        assert_eq!(handle.current_user().unwrap().phone, user.phone);
        assert!(storage.get(keys::USER).unwrap().unwrap().contains("98450"));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let handle = SessionHandle::new(Arc::new(MemoryStore::new()));
        handle.set_tokens(&TokenPair {
            access: SecretString::from("super-secret-access"),
            refresh: SecretString::from("super-secret-refresh"),
        });
        let debug = format!("{handle:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}

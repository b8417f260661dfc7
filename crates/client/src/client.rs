//! The client bundle a front end holds for its whole lifetime.

use std::sync::Arc;

use tiffin_core::Order;

use crate::cart::CartStore;
use crate::checkout::{self, CheckoutRequest};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::gateway::ApiGateway;
use crate::session::{SessionHandle, SessionStore};
use crate::storage::{FileStore, SharedStore};

/// Gateway, session store and cart store sharing one storage backend.
///
/// This struct is cheaply cloneable via `Arc`. Create it once at startup and
/// hand clones to whatever needs it.
#[derive(Clone)]
pub struct TiffinClient {
    inner: Arc<TiffinClientInner>,
}

struct TiffinClientInner {
    config: ClientConfig,
    gateway: ApiGateway,
    session: SessionStore,
    cart: CartStore,
}

impl TiffinClient {
    /// Build a client over `storage`.
    ///
    /// The cart is loaded immediately. The session is not; call
    /// [`SessionStore::restore`] to pick up a persisted login.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, storage: SharedStore) -> Result<Self, ClientError> {
        let gateway = ApiGateway::new(&config, SessionHandle::new(Arc::clone(&storage)))?;
        let session = SessionStore::new(gateway.clone());
        let cart = CartStore::load(storage);

        Ok(Self {
            inner: Arc::new(TiffinClientInner {
                config,
                gateway,
                session,
                cart,
            }),
        })
    }

    /// Build a client persisting to the JSON file at `config.state_path`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the state file cannot be opened or
    /// is corrupt.
    pub fn open(config: ClientConfig) -> Result<Self, ClientError> {
        let storage = FileStore::open(&config.state_path)?;
        tracing::debug!(path = %storage.path().display(), "Using state file");
        Self::new(config, Arc::new(storage))
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get a reference to the API gateway.
    #[must_use]
    pub fn api(&self) -> &ApiGateway {
        &self.inner.gateway
    }

    /// Get a reference to the session store.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Place an order for the current cart and clear it on success.
    ///
    /// # Errors
    ///
    /// See [`checkout::place_order`].
    pub async fn place_order(&self, request: &CheckoutRequest) -> Result<Order, ClientError> {
        checkout::place_order(&self.inner.gateway, &self.inner.cart, request).await
    }
}

impl std::fmt::Debug for TiffinClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiffinClient")
            .field("gateway", &self.inner.gateway)
            .field("session", self.inner.session.handle())
            .field("cart", &self.inner.cart)
            .finish_non_exhaustive()
    }
}

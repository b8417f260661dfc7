//! Durable key-value storage for the session and cart.
//!
//! Both stores write through a [`KeyValueStore`] after every mutation, the
//! way a browser front end writes to local storage. Two implementations
//! are provided:
//!
//! - [`MemoryStore`] - process-local, for tests and ephemeral sessions
//! - [`FileStore`] - one JSON document on disk, replaced atomically

mod file;
mod memory;

use std::sync::Arc;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a JSON object of strings.
    #[error("corrupt state file {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A previous writer panicked while holding the lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// A string-to-string store with local-storage semantics.
///
/// Implementations must be safe to share between the session and cart
/// stores. Writes are expected to be durable when the call returns.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to a storage backend.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Storage keys for session and cart state.
pub mod keys {
    /// Key for the bearer access token.
    pub const ACCESS_TOKEN: &str = "access_token";

    /// Key for the refresh token.
    pub const REFRESH_TOKEN: &str = "refresh_token";

    /// Key for the serialized cached user profile.
    pub const USER: &str = "user";

    /// Key for the serialized cart lines.
    pub const CART: &str = "cart";

    /// Key for the serialized selected-restaurant marker.
    pub const SELECTED_RESTAURANT: &str = "selected_restaurant";

    /// Every key owned by the session store.
    pub const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN, REFRESH_TOKEN, USER];
}

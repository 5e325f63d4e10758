//! Key-value storage abstraction for persisted authentication state
//!
//! Defines the `Storage` trait that decouples the SDK from the physical
//! persistence mechanism. The SDK only ever reads and writes opaque byte
//! records under string keys; any backend that offers durable, atomic
//! single-key get/set/remove satisfies the contract (preferences store,
//! keychain, flat file, in-memory for tests).
//!
//! Two reference backends ship with the crate:
//! - `MemoryStorage`: process-local, non-durable; the test backend.
//! - `FileStorage`: a single JSON file with atomic writes; the default
//!   backend for hosts without a platform-native store.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::future::Future;
use std::pin::Pin;

/// Errors from storage backends.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("storage file is corrupt: {0}")]
    Corrupt(String),
}

/// Result alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Abstraction over durable key-value persistence.
///
/// Implementations own thread safety and durability; callers may assume
/// single-key operations are atomic. Values are opaque bytes; no backend
/// may inspect or transform them beyond its own encoding needs.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn Storage>`).
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    fn get<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>>> + Send + 'a>>;

    /// Store `value` under `key`, replacing any existing value.
    fn set<'a>(
        &'a self,
        key: &'a str,
        value: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Remove the value stored under `key`. Removing an absent key is a
    /// no-op success.
    fn remove<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

//! Storage and retrieval of the persisted authentication state
//!
//! Wraps the pluggable `Storage` collaborator under the fixed `"authState"`
//! key. This store exclusively owns the encoding and decoding of the
//! record; no other component touches the raw stored bytes.

use std::sync::Arc;

use storage::Storage;
use tracing::debug;

use crate::codec;
use crate::constants::AUTH_STATE_KEY;
use crate::error::StorageError;
use crate::state::AuthState;

/// Persists and retrieves the `AuthState` record.
///
/// The backing `Storage` is supplied externally (the platform's durable
/// key-value store) and outlives this wrapper.
#[derive(Clone, Default)]
pub struct TokenStore {
    storage: Option<Arc<dyn Storage>>,
}

impl TokenStore {
    /// A store with no backend attached. Reads answer `None`; writes fail
    /// with `NotConfigured`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store persisting through the given backend.
    pub fn with_storage(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    /// Read the persisted AuthState.
    ///
    /// Returns `Ok(None)` when nothing is stored (or no backend is
    /// attached). A record that fails to decode propagates
    /// `StorageError::DecodeFailed` instead of silently reading as
    /// unauthenticated; the caller decides the recovery policy.
    pub async fn get_auth_state(&self) -> Result<Option<AuthState>, StorageError> {
        let Some(storage) = &self.storage else {
            return Ok(None);
        };
        match storage.get(AUTH_STATE_KEY).await? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Persist the given AuthState, replacing any previous record.
    pub async fn save_auth_state(&self, state: &AuthState) -> Result<(), StorageError> {
        let storage = self.storage.as_ref().ok_or(StorageError::NotConfigured)?;
        storage.set(AUTH_STATE_KEY, &codec::encode(state)).await?;
        debug!("auth state persisted");
        Ok(())
    }

    /// Remove the persisted AuthState. Clearing an already-absent record is
    /// a no-op success.
    pub async fn clear_auth_state(&self) -> Result<(), StorageError> {
        let storage = self.storage.as_ref().ok_or(StorageError::NotConfigured)?;
        storage.remove(AUTH_STATE_KEY).await?;
        debug!("auth state cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::MemoryStorage;

    fn test_state() -> AuthState {
        AuthState {
            access_token: Some("at_test".into()),
            access_token_expiration_time: Some(1_735_500_000_000),
            id_token: Some("it_test".into()),
            refresh_token: Some("rt_test".into()),
        }
    }

    fn backed_store() -> (TokenStore, Arc<MemoryStorage>) {
        let backend = Arc::new(MemoryStorage::new());
        (TokenStore::with_storage(backend.clone()), backend)
    }

    #[tokio::test]
    async fn get_without_backend_returns_none() {
        let store = TokenStore::new();
        assert_eq!(store.get_auth_state().await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_without_backend_fails_not_configured() {
        let store = TokenStore::new();
        let result = store.save_auth_state(&test_state()).await;
        assert!(matches!(result, Err(StorageError::NotConfigured)));
    }

    #[tokio::test]
    async fn clear_without_backend_fails_not_configured() {
        let store = TokenStore::new();
        let result = store.clear_auth_state().await;
        assert!(matches!(result, Err(StorageError::NotConfigured)));
    }

    #[tokio::test]
    async fn save_then_get_returns_identical_state() {
        let (store, _) = backed_store();
        let state = test_state();
        store.save_auth_state(&state).await.unwrap();
        assert_eq!(store.get_auth_state().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn get_absent_state_returns_none() {
        let (store, _) = backed_store();
        assert_eq!(store.get_auth_state().await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let (store, backend) = backed_store();
        store.save_auth_state(&test_state()).await.unwrap();

        store.clear_auth_state().await.unwrap();
        assert_eq!(store.get_auth_state().await.unwrap(), None);

        // Clearing an empty store must also succeed
        store.clear_auth_state().await.unwrap();
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn corrupted_record_surfaces_decode_failed() {
        let (store, backend) = backed_store();
        backend
            .set(AUTH_STATE_KEY, &[0xde, 0xad, 0xbe, 0xef])
            .await
            .unwrap();

        let result = store.get_auth_state().await;
        assert!(matches!(result, Err(StorageError::DecodeFailed(_))));
    }
}

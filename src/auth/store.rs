//! In-memory token store with best-effort persistence
//!
//! Holds the current credential. OAuth tokens are additionally mirrored to
//! a [`TokenStorage`] backend when one is configured together with a
//! client id; secret tokens only ever live in process memory.

use super::storage::{storage_key, TokenStorage};
use super::types::TokenInfo;
use crate::error::StorageResult;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Token store owned by one client instance
pub struct TokenStore {
    /// Current credential
    current: RwLock<Option<TokenInfo>>,
    /// Persistent mirror for OAuth tokens
    storage: Option<Arc<dyn TokenStorage>>,
    /// Namespaces the storage key
    client_id: Option<String>,
}

impl TokenStore {
    /// Create a store that keeps tokens in memory only
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            storage: None,
            client_id: None,
        }
    }

    /// Create a store that mirrors OAuth tokens to `storage`
    pub fn with_storage(client_id: impl Into<String>, storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            current: RwLock::new(None),
            storage: Some(storage),
            client_id: Some(client_id.into()),
        }
    }

    /// Key of the persisted entry, if persistence is configured
    pub fn storage_key(&self) -> Option<String> {
        match (&self.storage, &self.client_id) {
            (Some(_), Some(client_id)) => Some(storage_key(client_id)),
            _ => None,
        }
    }

    /// Store a token in memory, and persist it if it is an OAuth token
    pub async fn set_token(&self, info: TokenInfo) {
        if info.is_oauth() {
            if let Err(e) = self.persist(&info) {
                warn!("Failed to persist token, keeping it in memory only: {e}");
            }
        }
        debug!("Stored {:?} token", info.token_type);
        *self.current.write().await = Some(info);
    }

    /// Populate memory from the persisted entry.
    ///
    /// Returns false when nothing usable is persisted. Corrupt, invalid or
    /// already expired entries are removed.
    pub async fn load_from_storage(&self) -> bool {
        let (Some(storage), Some(key)) = (&self.storage, self.storage_key()) else {
            return false;
        };

        let raw = match storage.read(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                warn!("Failed to read persisted token '{key}': {e}");
                return false;
            }
        };

        let info: TokenInfo = match serde_json::from_str(&raw) {
            Ok(info) => info,
            Err(e) => {
                warn!("Discarding corrupt persisted token '{key}': {e}");
                self.discard(storage.as_ref(), &key);
                return false;
            }
        };

        if info.is_expired() {
            debug!("Discarding expired persisted token '{key}'");
            self.discard(storage.as_ref(), &key);
            return false;
        }

        info!("Restored {:?} token from storage", info.token_type);
        *self.current.write().await = Some(info);
        true
    }

    /// Current credential
    pub async fn token_info(&self) -> Option<TokenInfo> {
        self.current.read().await.clone()
    }

    /// Current token string
    pub async fn token(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|t| t.token.clone())
    }

    /// A token is held and it has not expired
    pub async fn has_valid_token(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .is_some_and(|t| !Self::is_token_expired(t))
    }

    /// False without a known expiry; otherwise true iff now >= expiry
    pub fn is_token_expired(info: &TokenInfo) -> bool {
        info.is_expired()
    }

    /// Drop the credential; an OAuth token's persisted entry goes with it
    pub async fn clear_token(&self) {
        let previous = self.current.write().await.take();
        if previous.as_ref().is_some_and(TokenInfo::is_oauth) {
            if let (Some(storage), Some(key)) = (&self.storage, self.storage_key()) {
                self.discard(storage.as_ref(), &key);
            }
        }
        debug!("Cleared token");
    }

    fn persist(&self, info: &TokenInfo) -> StorageResult<()> {
        let (Some(storage), Some(key)) = (&self.storage, self.storage_key()) else {
            return Ok(());
        };
        let serialized = serde_json::to_string(info)?;
        storage.write(&key, &serialized)
    }

    fn discard(&self, storage: &dyn TokenStorage, key: &str) {
        if let Err(e) = storage.remove(key) {
            warn!("Failed to remove persisted token '{key}': {e}");
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("client_id", &self.client_id)
            .field("has_storage", &self.storage.is_some())
            .finish_non_exhaustive()
    }
}

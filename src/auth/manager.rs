//! Token refresh coordination
//!
//! [`TokenManager`] hands out valid bearer tokens and refreshes expired
//! OAuth tokens. At most one refresh request is outstanding per manager:
//! it runs on a spawned task, and callers arriving while it is in flight
//! await its shared result instead of sending their own (refresh tokens are
//! single use).

use super::store::TokenStore;
use super::types::{AuthToken, TokenInfo, TokenResponse, TokenType};
use crate::error::{Error, RefreshError, Result};
use crate::http::{Transport, TransportRequest};
use crate::types::Method;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default budget for one refresh round-trip
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

type RefreshOutcome = std::result::Result<AuthToken, RefreshError>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Where and how to refresh OAuth tokens
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// OAuth token endpoint
    pub token_url: String,
    /// Public client id sent with the refresh grant
    pub client_id: String,
    /// Space separated scopes requested on refresh
    pub scope: Option<String>,
    /// Budget for one refresh round-trip
    pub timeout: Duration,
}

impl RefreshSettings {
    pub fn new(token_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            scope: None,
            timeout: DEFAULT_REFRESH_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

struct Inner {
    store: TokenStore,
    transport: Arc<dyn Transport>,
    settings: RefreshSettings,
    /// The in-flight refresh, if any
    pending: Mutex<Option<PendingRefresh>>,
}

/// Token lifecycle manager for one client
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<Inner>,
}

impl TokenManager {
    pub fn new(store: TokenStore, transport: Arc<dyn Transport>, settings: RefreshSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                settings,
                pending: Mutex::new(None),
            }),
        }
    }

    /// The underlying store
    pub fn store(&self) -> &TokenStore {
        &self.inner.store
    }

    pub fn settings(&self) -> &RefreshSettings {
        &self.inner.settings
    }

    pub async fn set_token(&self, info: TokenInfo) {
        self.inner.store.set_token(info).await;
    }

    pub async fn token_info(&self) -> Option<TokenInfo> {
        self.inner.store.token_info().await
    }

    pub async fn has_valid_token(&self) -> bool {
        self.inner.store.has_valid_token().await
    }

    pub async fn clear_token(&self) {
        self.inner.store.clear_token().await;
    }

    /// Restore a persisted OAuth token, see [`TokenStore::load_from_storage`]
    pub async fn load_from_storage(&self) -> bool {
        self.inner.store.load_from_storage().await
    }

    /// Whether a refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.inner.pending_slot().is_some()
    }

    /// Return a usable bearer token, refreshing an expired OAuth token first
    pub async fn get_valid_token(&self) -> Result<String> {
        let info = self
            .inner
            .store
            .token_info()
            .await
            .ok_or_else(|| Error::auth("No authentication token available, authenticate first"))?;

        if info.token_type == TokenType::Secret || !TokenStore::is_token_expired(&info) {
            return Ok(info.token);
        }

        debug!("Access token expired, refreshing");
        match self.start_or_join(RefreshMode::IfExpired).await {
            Ok(token) => Ok(token.access_token),
            Err(e) => Err(Error::auth(format!("Failed to refresh access token: {e}"))),
        }
    }

    /// Refresh the OAuth token, joining a refresh already in flight
    pub async fn refresh_access_token(&self) -> Result<AuthToken> {
        self.start_or_join(RefreshMode::Always)
            .await
            .map_err(Error::TokenRefresh)
    }

    /// Join the in-flight refresh or spawn a new one.
    ///
    /// The refresh runs on its own task, so it completes and clears the
    /// pending slot even when every caller stops waiting.
    pub(super) fn start_or_join(&self, mode: RefreshMode) -> PendingRefresh {
        let mut slot = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = slot.as_ref() {
            debug!("Joining in-flight token refresh");
            return existing.clone();
        }

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let _clear = ClearPending(Arc::clone(&inner));
            inner.refresh_with_timeout(mode).await
        });

        let pending = task
            .map(|joined| joined.unwrap_or_else(|e| Err(RefreshError::Aborted(e.to_string()))))
            .boxed()
            .shared();
        *slot = Some(pending.clone());
        pending
    }
}

/// Whether a refresh may be skipped when the stored token is already fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RefreshMode {
    IfExpired,
    Always,
}

/// Empties the pending slot when the refresh task ends, even by panic or abort
struct ClearPending(Arc<Inner>);

impl Drop for ClearPending {
    fn drop(&mut self) {
        self.0.clear_pending();
    }
}

impl Inner {
    fn pending_slot(&self) -> Option<PendingRefresh> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear_pending(&self) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    async fn refresh_with_timeout(&self, mode: RefreshMode) -> RefreshOutcome {
        match tokio::time::timeout(self.settings.timeout, self.perform_refresh(mode)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Token refresh timed out after {:?}", self.settings.timeout);
                Err(RefreshError::Timeout {
                    timeout_ms: self.settings.timeout.as_millis() as u64,
                })
            }
        }
    }

    /// The refresh-token grant round-trip
    async fn perform_refresh(&self, mode: RefreshMode) -> RefreshOutcome {
        let current = self.store.token_info().await.ok_or(RefreshError::NoToken)?;
        if mode == RefreshMode::IfExpired && !TokenStore::is_token_expired(&current) {
            debug!("Token already refreshed by an earlier refresh, reusing it");
            return Ok(AuthToken::from_info(&current));
        }
        let refresh_token = current
            .refresh_token
            .clone()
            .ok_or(RefreshError::MissingRefreshToken)?;

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.settings.client_id.as_str()),
            ("refresh_token", refresh_token.as_str()),
        ];
        if let Some(scope) = self.settings.scope.as_deref() {
            form.push(("scope", scope));
        }
        let request = TransportRequest::new(Method::POST, &self.settings.token_url).form(form);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        if !response.is_success() {
            warn!(
                "Token endpoint rejected refresh with status {}, clearing token",
                response.status
            );
            self.store.clear_token().await;
            return Err(RefreshError::Rejected {
                status: response.status,
                body: response.data,
            });
        }

        let parsed: TokenResponse = serde_json::from_value(response.data)
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
        let token = parsed.into_auth_token(Utc::now());

        let refresh_token = token.refresh_token.clone().or(Some(refresh_token));
        self.store
            .set_token(TokenInfo::oauth(
                token.access_token.clone(),
                token.expires_at,
                refresh_token,
            ))
            .await;

        info!("Access token refreshed");
        Ok(token)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("store", &self.inner.store)
            .field("settings", &self.inner.settings)
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}

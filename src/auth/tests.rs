//! Tests for the auth module

use super::manager::RefreshMode;
use super::*;
use crate::error::{Error, RefreshError, StorageError, StorageResult};
use crate::http::{HttpClient, HttpClientConfig, Transport};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLIENT_ID: &str = "client-123";

fn transport() -> Arc<dyn Transport> {
    let config = HttpClientConfig::builder().max_retries(0).build();
    Arc::new(HttpClient::with_config(config).unwrap())
}

fn manager_for(server: &MockServer) -> TokenManager {
    TokenManager::new(
        TokenStore::new(),
        transport(),
        RefreshSettings::new(format!("{}/identity_/connect/token", server.uri()), CLIENT_ID),
    )
}

fn persisting_store() -> (TokenStore, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let store = TokenStore::with_storage(CLIENT_ID, storage.clone());
    (store, storage)
}

/// Storage whose writes and removes always fail
struct BrokenStorage;

impl TokenStorage for BrokenStorage {
    fn read(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable("read".to_string()))
    }

    fn write(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    fn remove(&self, _key: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("remove".to_string()))
    }
}

// ============================================================================
// Storage
// ============================================================================

#[test]
fn test_storage_key_is_namespaced_by_client_id() {
    assert_eq!(storage_key("abc"), "autocloud_sdk_user_token-abc");
}

#[test]
fn test_file_storage_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("tokens"));
    let key = storage_key(CLIENT_ID);

    assert_eq!(storage.read(&key).unwrap(), None);

    storage.write(&key, "{\"token\":\"a\"}").unwrap();
    assert_eq!(storage.read(&key).unwrap().as_deref(), Some("{\"token\":\"a\"}"));
    assert!(storage.path_for(&key).exists());

    storage.remove(&key).unwrap();
    assert_eq!(storage.read(&key).unwrap(), None);
    storage.remove(&key).unwrap();
}

#[test]
fn test_file_storage_sanitizes_key() {
    let storage = FileStorage::new("/tmp/tokens");
    let path = storage.path_for("prefix-a/b:c");
    assert_eq!(path.file_name().unwrap(), "prefix-a_b_c.json");
}

// ============================================================================
// TokenStore
// ============================================================================

#[tokio::test]
async fn test_secret_token_is_not_persisted() {
    let (store, storage) = persisting_store();

    store.set_token(TokenInfo::secret("pat-1")).await;

    assert_eq!(store.token().await.as_deref(), Some("pat-1"));
    assert!(store.has_valid_token().await);
    assert_eq!(storage.read(&storage_key(CLIENT_ID)).unwrap(), None);
}

#[tokio::test]
async fn test_oauth_token_is_persisted_under_client_key() {
    let (store, storage) = persisting_store();
    let info = TokenInfo::oauth_expiring_in("access", 3600, Some("refresh".to_string()));

    store.set_token(info.clone()).await;

    let raw = storage.read(&storage_key(CLIENT_ID)).unwrap().unwrap();
    let persisted: TokenInfo = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted, info);
}

#[tokio::test]
async fn test_storage_write_failure_is_not_fatal() {
    let store = TokenStore::with_storage(CLIENT_ID, Arc::new(BrokenStorage));

    store
        .set_token(TokenInfo::oauth_expiring_in("access", 3600, None))
        .await;

    assert_eq!(store.token().await.as_deref(), Some("access"));
    assert!(!store.load_from_storage().await);
    store.clear_token().await;
    assert!(store.token_info().await.is_none());
}

#[tokio::test]
async fn test_load_from_storage_restores_token() {
    let storage = Arc::new(MemoryStorage::new());
    let info = TokenInfo::oauth_expiring_in("restored", 3600, Some("r".to_string()));
    storage
        .write(
            &storage_key(CLIENT_ID),
            &serde_json::to_string(&info).unwrap(),
        )
        .unwrap();

    let store = TokenStore::with_storage(CLIENT_ID, storage);
    assert!(store.load_from_storage().await);
    assert_eq!(store.token_info().await, Some(info));
}

#[tokio::test]
async fn test_load_from_storage_without_backend() {
    let store = TokenStore::new();
    assert!(store.storage_key().is_none());
    assert!(!store.load_from_storage().await);
}

#[tokio::test]
async fn test_load_from_storage_discards_corrupt_entry() {
    let (store, storage) = persisting_store();
    let key = storage_key(CLIENT_ID);
    storage.write(&key, "not json at all").unwrap();

    assert!(!store.load_from_storage().await);
    assert_eq!(storage.read(&key).unwrap(), None);
    assert!(store.token_info().await.is_none());
}

#[tokio::test]
async fn test_load_from_storage_discards_invalid_shape() {
    let (store, storage) = persisting_store();
    let key = storage_key(CLIENT_ID);

    for bad in [
        json!({"type": "oauth"}),
        json!({"token": 17, "type": "oauth"}),
        json!({"token": "abc", "type": "session"}),
        json!(["abc"]),
    ] {
        storage.write(&key, &bad.to_string()).unwrap();
        assert!(!store.load_from_storage().await, "accepted {bad}");
        assert_eq!(storage.read(&key).unwrap(), None);
    }
}

#[tokio::test]
async fn test_load_from_storage_rejects_expired_token() {
    let (store, storage) = persisting_store();
    let key = storage_key(CLIENT_ID);
    let expired = TokenInfo::oauth_expiring_in("old", -60, Some("r".to_string()));
    storage
        .write(&key, &serde_json::to_string(&expired).unwrap())
        .unwrap();

    assert!(!store.load_from_storage().await);
    assert!(store.token_info().await.is_none());
    assert_eq!(storage.read(&key).unwrap(), None);
}

#[tokio::test]
async fn test_clear_token_removes_persisted_oauth_entry() {
    let (store, storage) = persisting_store();
    let key = storage_key(CLIENT_ID);
    store
        .set_token(TokenInfo::oauth_expiring_in("access", 3600, None))
        .await;
    assert!(storage.read(&key).unwrap().is_some());

    store.clear_token().await;

    assert!(store.token_info().await.is_none());
    assert!(!store.has_valid_token().await);
    assert_eq!(storage.read(&key).unwrap(), None);
}

#[tokio::test]
async fn test_has_valid_token_false_when_expired() {
    let store = TokenStore::new();
    assert!(!store.has_valid_token().await);

    store
        .set_token(TokenInfo::oauth_expiring_in("old", -1, None))
        .await;
    assert!(!store.has_valid_token().await);
}

#[test]
fn test_is_token_expired_without_expiry() {
    assert!(!TokenStore::is_token_expired(&TokenInfo::secret("s")));
    assert!(!TokenStore::is_token_expired(&TokenInfo::oauth("o", None, None)));
}

// ============================================================================
// TokenManager
// ============================================================================

#[tokio::test]
async fn test_get_valid_token_without_token_fails() {
    let server = MockServer::start().await;
    let manager = manager_for(&server);

    let err = manager.get_valid_token().await.unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }));
}

#[tokio::test]
async fn test_secret_token_never_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    manager.set_token(TokenInfo::secret("pat")).await;

    assert_eq!(manager.get_valid_token().await.unwrap(), "pat");
}

#[tokio::test]
async fn test_unexpired_oauth_token_returned_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    manager
        .set_token(TokenInfo::oauth_expiring_in("fresh", 3600, Some("r".to_string())))
        .await;

    assert_eq!(manager.get_valid_token().await.unwrap(), "fresh");
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity_/connect/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("client_id=client-123"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "expires_in": 3600,
            "refresh_token": "refresh-2",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    manager
        .set_token(TokenInfo::oauth_expiring_in(
            "access-1",
            -10,
            Some("refresh-1".to_string()),
        ))
        .await;

    let before = Utc::now();
    assert_eq!(manager.get_valid_token().await.unwrap(), "access-2");

    let info = manager.token_info().await.unwrap();
    assert_eq!(info.token, "access-2");
    assert_eq!(info.token_type, TokenType::Oauth);
    assert_eq!(info.refresh_token.as_deref(), Some("refresh-2"));
    let expires_at = info.expires_at.unwrap();
    assert!(expires_at >= before + ChronoDuration::seconds(3600));
    assert!(expires_at <= Utc::now() + ChronoDuration::seconds(3600));
    assert!(!manager.is_refreshing());
}

#[tokio::test]
async fn test_refresh_keeps_old_refresh_token_when_not_rotated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "expires_in": 60
        })))
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    manager
        .set_token(TokenInfo::oauth_expiring_in("a", -1, Some("keep-me".to_string())))
        .await;

    let token = manager.refresh_access_token().await.unwrap();
    assert_eq!(token.access_token, "access-2");
    assert_eq!(token.refresh_token, None);
    assert_eq!(
        manager.token_info().await.unwrap().refresh_token.as_deref(),
        Some("keep-me")
    );
}

#[tokio::test]
async fn test_concurrent_callers_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity_/connect/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "access_token": "shared-token",
                    "expires_in": 3600,
                    "refresh_token": "refresh-2"
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    manager
        .set_token(TokenInfo::oauth_expiring_in(
            "stale",
            -10,
            Some("refresh-1".to_string()),
        ))
        .await;

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.get_valid_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "shared-token");
    }
    assert!(!manager.is_refreshing());
}

#[tokio::test]
async fn test_rejected_refresh_clears_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (store, storage) = persisting_store();
    let manager = TokenManager::new(
        store,
        transport(),
        RefreshSettings::new(format!("{}/token", server.uri()), CLIENT_ID),
    );
    manager
        .set_token(TokenInfo::oauth_expiring_in("stale", -1, Some("r".to_string())))
        .await;

    let err = manager.refresh_access_token().await.unwrap_err();
    match err {
        Error::TokenRefresh(RefreshError::Rejected { status, body }) => {
            assert_eq!(status, 400);
            assert_eq!(body["error"], "invalid_grant");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(manager.token_info().await.is_none());
    assert_eq!(storage.read(&storage_key(CLIENT_ID)).unwrap(), None);
    assert!(!manager.is_refreshing());

    let err = manager.get_valid_token().await.unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }));
}

#[tokio::test]
async fn test_missing_refresh_token_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    manager
        .set_token(TokenInfo::oauth_expiring_in("stale", -1, None))
        .await;

    let err = manager.get_valid_token().await.unwrap_err();
    assert!(matches!(err, Error::Authentication { ref message } if message.contains("re-authentication")));

    let err = manager.refresh_access_token().await.unwrap_err();
    assert!(matches!(
        err,
        Error::TokenRefresh(RefreshError::MissingRefreshToken)
    ));
}

#[tokio::test]
async fn test_refresh_times_out_and_clears_pending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "late", "expires_in": 60}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let manager = TokenManager::new(
        TokenStore::new(),
        transport(),
        RefreshSettings::new(format!("{}/token", server.uri()), CLIENT_ID)
            .with_timeout(Duration::from_millis(50)),
    );
    manager
        .set_token(TokenInfo::oauth_expiring_in("stale", -1, Some("r".to_string())))
        .await;

    let err = manager.refresh_access_token().await.unwrap_err();
    assert!(matches!(
        err,
        Error::TokenRefresh(RefreshError::Timeout { timeout_ms: 50 })
    ));
    assert!(!manager.is_refreshing());
}

#[tokio::test]
async fn test_abandoned_refresh_still_times_out_and_clears_pending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "late", "expires_in": 60}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let manager = TokenManager::new(
        TokenStore::new(),
        transport(),
        RefreshSettings::new(format!("{}/token", server.uri()), CLIENT_ID)
            .with_timeout(Duration::from_millis(100)),
    );
    manager
        .set_token(TokenInfo::oauth_expiring_in("stale", -1, Some("r".to_string())))
        .await;

    let waited = tokio::time::timeout(Duration::from_millis(20), manager.get_valid_token()).await;
    assert!(waited.is_err());
    assert!(manager.is_refreshing());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!manager.is_refreshing());
    assert_eq!(manager.token_info().await.unwrap().token, "stale");
}

#[tokio::test]
async fn test_abandoned_refresh_completes_in_background() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "access_token": "access-2",
                    "expires_in": 3600,
                    "refresh_token": "refresh-2"
                }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    manager
        .set_token(TokenInfo::oauth_expiring_in("stale", -1, Some("refresh-1".to_string())))
        .await;

    let waited = tokio::time::timeout(Duration::from_millis(20), manager.get_valid_token()).await;
    assert!(waited.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!manager.is_refreshing());

    let info = manager.token_info().await.unwrap();
    assert_eq!(info.token, "access-2");
    assert_eq!(info.refresh_token.as_deref(), Some("refresh-2"));
    assert_eq!(manager.get_valid_token().await.unwrap(), "access-2");
}

#[tokio::test]
async fn test_refresh_after_expiry_reuses_token_renewed_meanwhile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "forced",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    manager
        .set_token(TokenInfo::oauth_expiring_in("renewed", 3600, Some("rotated".to_string())))
        .await;

    // A caller that saw the old expired token arrives after the refresh finished
    let token = manager
        .start_or_join(RefreshMode::IfExpired)
        .await
        .unwrap();
    assert_eq!(token.access_token, "renewed");
    assert_eq!(token.refresh_token.as_deref(), Some("rotated"));
    assert!(!manager.is_refreshing());

    // An explicit refresh always goes to the token endpoint
    let token = manager.refresh_access_token().await.unwrap();
    assert_eq!(token.access_token, "forced");
}

#[tokio::test]
async fn test_refresh_sends_configured_scope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("scope=openid+offline_access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "scoped",
            "expires_in": 60,
            "scope": "openid offline_access"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = TokenManager::new(
        TokenStore::new(),
        transport(),
        RefreshSettings::new(format!("{}/token", server.uri()), CLIENT_ID)
            .with_scope(Some("openid offline_access".to_string())),
    );
    manager
        .set_token(TokenInfo::oauth_expiring_in("stale", -1, Some("r".to_string())))
        .await;

    let token = manager.refresh_access_token().await.unwrap();
    assert_eq!(token.access_token, "scoped");
    assert_eq!(token.scope.as_deref(), Some("openid offline_access"));
}

#[tokio::test]
async fn test_invalid_token_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "wrong-shape"})))
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    manager
        .set_token(TokenInfo::oauth_expiring_in("stale", -1, Some("r".to_string())))
        .await;

    let err = manager.refresh_access_token().await.unwrap_err();
    assert!(matches!(
        err,
        Error::TokenRefresh(RefreshError::InvalidResponse(_))
    ));
}

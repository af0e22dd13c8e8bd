//! Client session object
//!
//! A [`Client`] binds one [`ClientConfig`] to one transport and one
//! [`TokenManager`]. Every resource call goes through
//! [`ServiceAccess::request`], which attaches a valid bearer token and the
//! folder header before handing the request to the transport.

use crate::auth::{
    FileStorage, MemoryStorage, RefreshSettings, TokenInfo, TokenManager, TokenStorage, TokenStore,
};
use crate::config::{AuthConfigDef, ClientConfig, StorageConfig};
use crate::error::Result;
use crate::http::{HttpClient, Transport, TransportRequest, TransportResponse};
use crate::services::{BucketService, EntityService, ProcessInstanceService, TaskService};
use crate::template::{self, PathParams};
use crate::types::{JsonValue, Method, StringMap};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};

/// Header carrying the folder a request is scoped to
pub const FOLDER_HEADER: &str = "X-UIPATH-OrganizationUnitId";

/// Per-request options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub headers: StringMap,
    pub body: Option<JsonValue>,
    /// Scope the request to one folder
    pub folder_id: Option<i64>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn folder(mut self, folder_id: Option<i64>) -> Self {
        self.folder_id = folder_id;
        self
    }
}

/// Authenticated access to tenant-scoped service paths
#[async_trait]
pub trait ServiceAccess: Send + Sync {
    /// Send a request to a service path, returning the raw response
    async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<TransportResponse>;
}

/// A list endpoint with an optional folder-scoped variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Path used across all folders
    pub path: String,
    /// Path used when a folder is given; may reference `{{ folder_id }}`
    pub folder_path: Option<String>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            folder_path: None,
        }
    }

    #[must_use]
    pub fn with_folder_path(mut self, path: impl Into<String>) -> Self {
        self.folder_path = Some(path.into());
        self
    }

    /// Pick the variant for `folder_id` and render it
    pub fn resolve(&self, folder_id: Option<i64>) -> Result<String> {
        match (folder_id, &self.folder_path) {
            (Some(folder_id), Some(folder_path)) => template::render(
                folder_path,
                &PathParams::new().with("folder_id", folder_id),
            ),
            _ => Ok(self.path.clone()),
        }
    }
}

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    tokens: TokenManager,
}

/// SDK session for one tenant
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Create a client with a reqwest transport built from `config.http`
    pub async fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpClient::with_config(config.http.to_client_config())?;
        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Create a client on top of an existing transport.
    ///
    /// Secret auth seeds the token store immediately; OAuth auth restores a
    /// persisted token when one is available.
    pub async fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let store = match (config.client_id(), build_storage(&config.storage)) {
            (Some(client_id), Some(storage)) => TokenStore::with_storage(client_id, storage),
            _ => TokenStore::new(),
        };
        let settings = RefreshSettings::new(
            config.token_url(),
            config.client_id().unwrap_or_default(),
        )
        .with_scope(config.scope().map(str::to_string))
        .with_timeout(config.refresh_timeout());
        let tokens = TokenManager::new(store, Arc::clone(&transport), settings);

        match &config.auth {
            AuthConfigDef::Secret { secret } => {
                tokens.set_token(TokenInfo::secret(secret.clone())).await;
            }
            AuthConfigDef::Oauth { client_id, .. } => {
                if tokens.load_from_storage().await {
                    info!("Restored persisted token for client '{client_id}'");
                } else {
                    debug!("No persisted token for client '{client_id}', authenticate first");
                }
            }
        }

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                tokens,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The token manager owned by this client
    pub fn tokens(&self) -> &TokenManager {
        &self.inner.tokens
    }

    /// Absolute URL of a service path; absolute URLs pass through
    pub fn api_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let config = &self.inner.config;
        format!(
            "{}/{}/{}/{}",
            config.base_url(),
            config.org_name,
            config.tenant_name,
            path.trim_start_matches('/')
        )
    }

    /// Send a request and deserialize a successful JSON body
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let response = self.request(method, path, options).await?.error_for_status()?;
        Ok(serde_json::from_value(response.data)?)
    }

    pub fn tasks(&self) -> TaskService<'_> {
        TaskService::new(self)
    }

    pub fn buckets(&self) -> BucketService<'_> {
        BucketService::new(self)
    }

    pub fn entities(&self) -> EntityService<'_> {
        EntityService::new(self)
    }

    pub fn process_instances(&self) -> ProcessInstanceService<'_> {
        ProcessInstanceService::new(self)
    }
}

#[async_trait]
impl ServiceAccess for Client {
    async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<TransportResponse> {
        let token = self.inner.tokens.get_valid_token().await?;

        let mut request = TransportRequest::new(method, self.api_url(path))
            .header("Authorization", format!("Bearer {token}"));
        for (key, value) in options.headers {
            request = request.header(key, value);
        }
        if let Some(folder_id) = options.folder_id {
            request = request.header(FOLDER_HEADER, folder_id.to_string());
        }
        for (key, value) in options.query {
            request = request.query(key, value);
        }
        if let Some(body) = options.body {
            request = request.json(body);
        }

        debug!("{} {}", request.method, request.url);
        self.inner.transport.send(request).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.config.base_url)
            .field("org_name", &self.inner.config.org_name)
            .field("tenant_name", &self.inner.config.tenant_name)
            .field("tokens", &self.inner.tokens)
            .finish_non_exhaustive()
    }
}

fn build_storage(config: &StorageConfig) -> Option<Arc<dyn TokenStorage>> {
    match config {
        StorageConfig::Memory => Some(Arc::new(MemoryStorage::new())),
        StorageConfig::File { directory } => Some(Arc::new(FileStorage::new(directory))),
        StorageConfig::None => None,
    }
}

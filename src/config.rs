//! Client configuration
//!
//! Describes which cloud tenant a client talks to, how it authenticates,
//! how its transport behaves, and where OAuth tokens are persisted.
//! Configs load from YAML/JSON files or from `AUTOCLOUD_*` environment
//! variables.

use crate::auth::DEFAULT_REFRESH_TIMEOUT;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::types::{BackoffType, OptionStringExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Prefix of every environment variable read by [`ClientConfig::from_env`]
pub const ENV_PREFIX: &str = "AUTOCLOUD_";

/// Identity service path appended to the base URL when no token URL is set
const DEFAULT_TOKEN_PATH: &str = "/identity_/connect/token";

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Cloud base URL (e.g., `https://cloud.example.com`)
    pub base_url: String,

    /// Organization name, the first path segment of every API URL
    pub org_name: String,

    /// Tenant name, the second path segment of every API URL
    pub tenant_name: String,

    /// Authentication configuration
    pub auth: AuthConfigDef,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Token persistence configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        org_name: impl Into<String>,
        tenant_name: impl Into<String>,
        auth: AuthConfigDef,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            org_name: org_name.into(),
            tenant_name: tenant_name.into(),
            auth,
            http: HttpConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read client config {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: Self = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Build from `AUTOCLOUD_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Build from a variable lookup; `from_env` with an injectable source.
    ///
    /// `AUTOCLOUD_SECRET` selects secret auth and takes precedence over
    /// `AUTOCLOUD_CLIENT_ID`. `AUTOCLOUD_STORAGE_DIR` switches token
    /// persistence to files in that directory.
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).none_if_empty();
        let required = |name: &str| {
            var(name).ok_or_else(|| Error::missing_field(format!("{ENV_PREFIX}{name}")))
        };

        let auth = if let Some(secret) = var("SECRET") {
            AuthConfigDef::Secret { secret }
        } else if let Some(client_id) = var("CLIENT_ID") {
            AuthConfigDef::Oauth {
                client_id,
                token_url: var("TOKEN_URL"),
                scope: var("SCOPE"),
                refresh_timeout_secs: None,
            }
        } else {
            return Err(Error::config(format!(
                "either {ENV_PREFIX}SECRET or {ENV_PREFIX}CLIENT_ID must be set"
            )));
        };

        let storage = match var("STORAGE_DIR") {
            Some(directory) => StorageConfig::File {
                directory: PathBuf::from(directory),
            },
            None => StorageConfig::default(),
        };

        let config = Self {
            base_url: required("BASE_URL")?,
            org_name: required("ORG_NAME")?,
            tenant_name: required("TENANT_NAME")?,
            auth,
            http: HttpConfig::default(),
            storage,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and the base URL scheme
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::missing_field("base_url"));
        }
        let url = Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_config(
                "base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.org_name.trim().is_empty() {
            return Err(Error::missing_field("org_name"));
        }
        if self.tenant_name.trim().is_empty() {
            return Err(Error::missing_field("tenant_name"));
        }

        match &self.auth {
            AuthConfigDef::Secret { secret } if secret.trim().is_empty() => {
                Err(Error::missing_field("auth.secret"))
            }
            AuthConfigDef::Oauth { client_id, .. } if client_id.trim().is_empty() => {
                Err(Error::missing_field("auth.client_id"))
            }
            _ => Ok(()),
        }
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Token endpoint for OAuth refresh
    pub fn token_url(&self) -> String {
        match &self.auth {
            AuthConfigDef::Oauth {
                token_url: Some(url),
                ..
            } => url.clone(),
            _ => format!("{}{DEFAULT_TOKEN_PATH}", self.base_url()),
        }
    }

    /// OAuth client id, if OAuth is configured
    pub fn client_id(&self) -> Option<&str> {
        match &self.auth {
            AuthConfigDef::Oauth { client_id, .. } => Some(client_id),
            AuthConfigDef::Secret { .. } => None,
        }
    }

    /// Scopes requested when refreshing OAuth tokens
    pub fn scope(&self) -> Option<&str> {
        match &self.auth {
            AuthConfigDef::Oauth { scope, .. } => scope.as_deref(),
            AuthConfigDef::Secret { .. } => None,
        }
    }

    /// Budget for one token refresh round-trip
    pub fn refresh_timeout(&self) -> Duration {
        match &self.auth {
            AuthConfigDef::Oauth {
                refresh_timeout_secs: Some(secs),
                ..
            } => Duration::from_secs(*secs),
            _ => DEFAULT_REFRESH_TIMEOUT,
        }
    }
}

// ============================================================================
// Auth Config Definition
// ============================================================================

/// Authentication configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfigDef {
    /// Long-lived bearer secret (personal access token); never expires
    Secret {
        /// The secret value
        secret: String,
    },

    /// OAuth tokens obtained out of band and refreshed by the SDK
    Oauth {
        /// Public client id, also namespaces persisted tokens
        client_id: String,
        /// Token endpoint (defaults to the identity service under base_url)
        #[serde(default)]
        token_url: Option<String>,
        /// Requested scopes, space separated
        #[serde(default)]
        scope: Option<String>,
        /// Refresh round-trip budget in seconds (defaults to 10)
        #[serde(default)]
        refresh_timeout_secs: Option<u64>,
    },
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of retries on 429/5xx and connection failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff strategy between retries
    #[serde(default)]
    pub backoff: BackoffType,

    /// First backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound on a single backoff delay in seconds
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Client-side rate limit; unlimited when absent
    #[serde(default)]
    pub requests_per_second: Option<u32>,

    /// Burst allowance for the rate limiter
    #[serde(default)]
    pub burst_size: Option<u32>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            backoff: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_secs: default_max_backoff_secs(),
            requests_per_second: None,
            burst_size: None,
        }
    }
}

impl HttpConfig {
    /// Transport settings for [`crate::http::HttpClient`]
    pub fn to_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries)
            .backoff(
                self.backoff,
                Duration::from_millis(self.initial_backoff_ms),
                Duration::from_secs(self.max_backoff_secs),
            );

        if let Some(rps) = self.requests_per_second {
            let burst = self.burst_size.unwrap_or(rps);
            builder = builder.rate_limit(RateLimiterConfig::new(rps, burst));
        }

        builder.build()
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_secs() -> u64 {
    60
}

// ============================================================================
// Storage Config
// ============================================================================

/// Where OAuth tokens are persisted between client instances
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Process-local map, shared by nothing else
    #[default]
    Memory,

    /// One JSON file per client id in `directory`
    File { directory: PathBuf },

    /// Tokens live in the store only
    None,
}

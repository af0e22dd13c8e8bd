//! Authentication module
//!
//! Token lifecycle for every request the SDK sends:
//!
//! - `TokenStore` - holds the credential, mirrors OAuth tokens to storage
//! - `TokenStorage` - persistence backends (memory, file)
//! - `TokenManager` - expiry detection and single-flight refresh

mod manager;
mod storage;
mod store;
mod types;

pub use manager::{RefreshSettings, TokenManager, DEFAULT_REFRESH_TIMEOUT};
pub use storage::{storage_key, FileStorage, MemoryStorage, TokenStorage, STORAGE_KEY_PREFIX};
pub use store::TokenStore;
pub use types::{AuthToken, TokenInfo, TokenType};

#[cfg(test)]
mod tests;

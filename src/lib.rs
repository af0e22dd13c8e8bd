// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Automation Cloud SDK
//!
//! Typed async client for the Automation Cloud REST services.
//!
//! ## Features
//!
//! - **One list vocabulary**: `page_size`, `cursor` and `jump_to_page` work the
//!   same over offset, continuation-token and OData endpoints
//! - **Opaque cursors**: every page hands back the cursor for the next one
//! - **Token lifecycle**: secret or OAuth tokens, persisted OAuth tokens,
//!   single-flight refresh of expired tokens
//! - **Resilient transport**: retries with backoff and client-side rate limiting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use autocloud_sdk::{Client, ClientConfig, ListOptions, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::new(ClientConfig::from_env()?).await?;
//!
//!     // First page of pending tasks
//!     let options = ListOptions::new().page_size(20).filter("Status eq 'Pending'");
//!     let mut page = client.tasks().get_all(&options).await?.into_paginated();
//!
//!     // Follow cursors until the last page
//!     while let Some(current) = page {
//!         for task in &current.items {
//!             println!("{} {:?}", task.id, task.title);
//!         }
//!         page = match current.next_cursor {
//!             Some(cursor) => client
//!                 .tasks()
//!                 .get_all(&ListOptions::new().cursor(cursor))
//!                 .await?
//!                 .into_paginated(),
//!             None => None,
//!         };
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Resource Services                        │
//! │   tasks()   buckets()   entities()   process_instances()        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────────┬───────────┴───────────┬──────────────────────┐
//! │    Pagination    │        Client         │        Auth          │
//! ├──────────────────┼───────────────────────┼──────────────────────┤
//! │ Cursor codec     │ Tenant-scoped URLs    │ Token store          │
//! │ Strategy select  │ Bearer + folder header│ Token storage        │
//! │ get_all          │                       │ Single-flight refresh│
//! └──────────────────┴───────────┬───────────┴──────────────────────┘
//!                                │
//! ┌──────────────────────────────┴──────────────────────────────────┐
//! │                 HTTP transport (retry, rate limit)              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the SDK
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client configuration
pub mod config;

/// Endpoint path templates
pub mod template;

/// Per-item response transforms
pub mod transform;

/// HTTP transport with retry and rate limiting
pub mod http;

/// Token store, storage backends and refresh coordination
pub mod auth;

/// Cursor-based pagination over offset, token and OData endpoints
pub mod pagination;

/// Client session object
pub mod client;

/// Resource services
pub mod services;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use auth::{AuthToken, TokenInfo, TokenManager, TokenType};
pub use client::{Client, RequestOptions, ServiceAccess};
pub use config::{AuthConfigDef, ClientConfig, HttpConfig, StorageConfig};
pub use pagination::{
    Cursor, ListOptions, ListResponse, NonPaginatedResponse, PaginatedResponse,
    PaginationOptions, PaginationType,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

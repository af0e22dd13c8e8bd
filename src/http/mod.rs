//! HTTP transport module
//!
//! # Features
//!
//! - **Transport trait**: method/url/headers/query/body in, status + JSON out
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor

mod client;
mod rate_limit;
mod transport;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use transport::{RequestBody, Transport, TransportRequest, TransportResponse};

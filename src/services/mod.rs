//! Resource services
//!
//! Thin per-resource facades over [`crate::pagination::get_all`] and
//! [`crate::Client`]. Each borrows the client and declares its endpoints,
//! paging style and item transform.

pub mod endpoints;
mod buckets;
mod entities;
mod process_instances;
mod tasks;

pub use buckets::{Bucket, BucketService};
pub use entities::{EntityRecord, EntityService};
pub use process_instances::{ProcessInstance, ProcessInstanceService};
pub use tasks::{Task, TaskAction, TaskService};

use crate::error::Result;
use crate::transform::TransformFn;
use crate::types::JsonValue;
use serde::de::DeserializeOwned;

/// Transform and deserialize a single-item response body
fn decode_item<R: DeserializeOwned>(data: JsonValue, transform: TransformFn) -> Result<R> {
    Ok(serde_json::from_value(transform(data))?)
}

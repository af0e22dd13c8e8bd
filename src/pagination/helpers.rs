//! Unified list entry point
//!
//! [`get_all`] is what every resource list method calls. Options carrying
//! any paging field fetch one page and hand back a cursor; options without
//! them fetch the whole collection in one request.

use super::cursor::{encode_cursor, CursorState};
use super::strategies::{page_query, resolve_pagination};
use super::types::{
    InternalPaginationOptions, ListOptions, ListResponse, NonPaginatedResponse,
    PaginatedResponse, PaginationDescriptor, PaginationType,
};
use crate::client::{Endpoint, RequestOptions, ServiceAccess};
use crate::error::{Error, Result};
use crate::transform::TransformFn;
use crate::types::{json_count, json_path, JsonValue, Method};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Everything a list method declares about its endpoint
#[derive(Debug, Clone)]
pub struct GetAllConfig {
    pub endpoint: Endpoint,
    pub pagination: PaginationDescriptor,
    /// Applied to every raw item before deserialization
    pub transform: Option<TransformFn>,
    /// Prefix for caller query options (`$` for OData)
    pub query_prefix: Option<String>,
    /// Query options sent without the prefix
    pub exclude_from_prefix: Vec<String>,
}

impl GetAllConfig {
    pub fn new(endpoint: Endpoint, pagination: PaginationDescriptor) -> Self {
        let query_prefix =
            (pagination.pagination_type == PaginationType::Odata).then(|| "$".to_string());
        Self {
            endpoint,
            pagination,
            transform: None,
            query_prefix,
            exclude_from_prefix: Vec::new(),
        }
    }

    #[must_use]
    pub fn transform(mut self, transform: TransformFn) -> Self {
        self.transform = Some(transform);
        self
    }

    #[must_use]
    pub fn query_prefix(mut self, prefix: Option<&str>) -> Self {
        self.query_prefix = prefix.map(str::to_string);
        self
    }

    #[must_use]
    pub fn exclude_from_prefix<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_from_prefix = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Caller query options with the prefix applied
    fn option_query(&self, options: &ListOptions) -> Vec<(String, String)> {
        options
            .query
            .iter()
            .map(|(key, value)| {
                let key = match &self.query_prefix {
                    Some(prefix)
                        if !key.starts_with(prefix.as_str())
                            && !self.exclude_from_prefix.iter().any(|k| k == key) =>
                    {
                        format!("{prefix}{key}")
                    }
                    _ => key.clone(),
                };
                (key, value.clone())
            })
            .collect()
    }
}

/// List items, paginated or not depending on `options`
pub async fn get_all<R, A>(
    access: &A,
    config: &GetAllConfig,
    options: &ListOptions,
) -> Result<ListResponse<R>>
where
    R: DeserializeOwned,
    A: ServiceAccess + ?Sized,
{
    if options.pagination.is_paginated() {
        let internal =
            resolve_pagination(&options.pagination, config.pagination.pagination_type)?;
        fetch_page(access, config, &internal, options)
            .await
            .map(ListResponse::Paginated)
    } else {
        fetch_all(access, config, options)
            .await
            .map(ListResponse::NonPaginated)
    }
}

/// Fetch one page described by `internal`
pub async fn fetch_page<R, A>(
    access: &A,
    config: &GetAllConfig,
    internal: &InternalPaginationOptions,
    options: &ListOptions,
) -> Result<PaginatedResponse<R>>
where
    R: DeserializeOwned,
    A: ServiceAccess + ?Sized,
{
    let descriptor = &config.pagination;
    let path = config.endpoint.resolve(options.folder_id)?;

    let mut query = page_query(internal, descriptor.pagination_type, &descriptor.params);
    query.extend(config.option_query(options));

    let data = send(access, &path, query, options.folder_id).await?;
    let items = extract_items(&data, config)?;
    let total_count = extract_total(&data, descriptor);

    let page_size = internal.effective_page_size();
    let page_number = internal.effective_page_number();
    let next = match descriptor.pagination_type {
        PaginationType::Token => descriptor
            .continuation_token_field
            .as_deref()
            .and_then(|field| json_path(&data, field))
            .and_then(JsonValue::as_str)
            .filter(|token| !token.is_empty())
            .map(|token| CursorState {
                pagination_type: Some(PaginationType::Token),
                page_number: Some(page_number.saturating_add(1)),
                page_size: Some(page_size),
                continuation_token: Some(token.to_string()),
            }),
        pagination_type @ (PaginationType::Offset | PaginationType::Odata) => total_count
            .filter(|total| u64::from(page_number) * u64::from(page_size) < *total)
            .map(|_| CursorState {
                pagination_type: Some(pagination_type),
                page_number: Some(page_number.saturating_add(1)),
                page_size: Some(page_size),
                continuation_token: None,
            }),
    };

    let next_cursor = next.as_ref().map(encode_cursor).transpose()?;
    debug!(
        "Fetched page {} of {} ({} items, more: {})",
        page_number,
        path,
        items.len(),
        next_cursor.is_some()
    );

    Ok(PaginatedResponse::new(items, next_cursor, total_count))
}

/// Fetch the whole collection in one request
pub async fn fetch_all<R, A>(
    access: &A,
    config: &GetAllConfig,
    options: &ListOptions,
) -> Result<NonPaginatedResponse<R>>
where
    R: DeserializeOwned,
    A: ServiceAccess + ?Sized,
{
    let descriptor = &config.pagination;
    let path = config.endpoint.resolve(options.folder_id)?;

    let mut query = Vec::new();
    if descriptor.pagination_type == PaginationType::Odata {
        if let Some(name) = &descriptor.params.count {
            query.push((name.clone(), "true".to_string()));
        }
    }
    query.extend(config.option_query(options));

    let data = send(access, &path, query, options.folder_id).await?;
    let items = extract_items(&data, config)?;
    let total_count = extract_total(&data, descriptor);

    debug!("Fetched {} items from {}", items.len(), path);
    Ok(NonPaginatedResponse { items, total_count })
}

async fn send<A>(
    access: &A,
    path: &str,
    query: Vec<(String, String)>,
    folder_id: Option<i64>,
) -> Result<JsonValue>
where
    A: ServiceAccess + ?Sized,
{
    let options = RequestOptions {
        query,
        folder_id,
        ..RequestOptions::default()
    };
    let response = access
        .request(Method::GET, path, options)
        .await?
        .error_for_status()?;
    Ok(response.data)
}

/// Items at the descriptor's field, transformed and deserialized.
///
/// A missing or non-array field is an empty page.
fn extract_items<R: DeserializeOwned>(data: &JsonValue, config: &GetAllConfig) -> Result<Vec<R>> {
    let field = &config.pagination.items_field;
    let Some(raw) = json_path(data, field).and_then(JsonValue::as_array) else {
        warn!("Response has no '{field}' array, treating as empty page");
        return Ok(Vec::new());
    };

    raw.iter()
        .cloned()
        .map(|item| {
            let item = match config.transform {
                Some(transform) => transform(item),
                None => item,
            };
            serde_json::from_value(item).map_err(Error::from)
        })
        .collect()
}

fn extract_total(data: &JsonValue, descriptor: &PaginationDescriptor) -> Option<u64> {
    descriptor
        .total_count_field
        .as_deref()
        .and_then(|field| json_path(data, field))
        .and_then(json_count)
}

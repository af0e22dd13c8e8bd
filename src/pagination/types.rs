//! Pagination types
//!
//! Caller-facing options and responses, the internal derived parameters,
//! and the per-endpoint descriptor naming where a backend expects and
//! returns paging data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Page size used in paginated mode when the caller gives none
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Paging style of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationType {
    /// Page size + offset, total count in the body
    Offset,
    /// Page size + opaque continuation token issued by the backend
    Token,
    /// OData `$top` / `$skip` / `$count`
    Odata,
}

impl PaginationType {
    /// Whether arbitrary pages can be requested directly
    pub fn supports_random_access(self) -> bool {
        !matches!(self, Self::Token)
    }
}

impl std::fmt::Display for PaginationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Offset => "offset",
            Self::Token => "token",
            Self::Odata => "odata",
        };
        f.write_str(name)
    }
}

/// Opaque pagination cursor handed back to callers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Caller-supplied paging input.
///
/// Setting any field selects paginated mode; leaving all empty asks for
/// the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jump_to_page: Option<u32>,
}

impl PaginationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow a cursor from a previous page
    pub fn from_cursor(cursor: Cursor) -> Self {
        Self {
            cursor: Some(cursor),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn with_jump_to_page(mut self, page: u32) -> Self {
        self.jump_to_page = Some(page);
        self
    }

    /// Whether any paging field is set
    pub fn is_paginated(&self) -> bool {
        self.cursor.is_some() || self.page_size.is_some() || self.jump_to_page.is_some()
    }
}

/// Paging parameters derived from [`PaginationOptions`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InternalPaginationOptions {
    pub page_size: Option<u32>,
    pub page_number: Option<u32>,
    pub continuation_token: Option<String>,
    /// Type tag carried over from a followed cursor
    pub pagination_type: Option<PaginationType>,
}

impl InternalPaginationOptions {
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn effective_page_number(&self) -> u32 {
        self.page_number.unwrap_or(1)
    }
}

/// One page of a paginated listing.
///
/// `next_cursor` is present iff `has_next_page`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub has_next_page: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<Cursor>, total_count: Option<u64>) -> Self {
        Self {
            items,
            has_next_page: next_cursor.is_some(),
            next_cursor,
            total_count,
        }
    }
}

/// Whole collection, no cursor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonPaginatedResponse<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

/// Result of a unified list call; the variant follows the options' mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paginated(PaginatedResponse<T>),
    NonPaginated(NonPaginatedResponse<T>),
}

impl<T> ListResponse<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Self::Paginated(page) => &page.items,
            Self::NonPaginated(all) => &all.items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Paginated(page) => page.items,
            Self::NonPaginated(all) => all.items,
        }
    }

    pub fn total_count(&self) -> Option<u64> {
        match self {
            Self::Paginated(page) => page.total_count,
            Self::NonPaginated(all) => all.total_count,
        }
    }

    pub fn is_paginated(&self) -> bool {
        matches!(self, Self::Paginated(_))
    }

    pub fn into_paginated(self) -> Option<PaginatedResponse<T>> {
        match self {
            Self::Paginated(page) => Some(page),
            Self::NonPaginated(_) => None,
        }
    }

    pub fn into_non_paginated(self) -> Option<NonPaginatedResponse<T>> {
        match self {
            Self::Paginated(_) => None,
            Self::NonPaginated(all) => Some(all),
        }
    }
}

/// Query parameter names an endpoint uses for paging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationParams {
    /// Page size (`$top`, `limit`, `pageSize`)
    pub page_size: String,
    /// Offset (`$skip`, `start`)
    pub offset: Option<String>,
    /// Count flag (`$count`)
    pub count: Option<String>,
    /// Continuation token (`nextPage`)
    pub token: Option<String>,
}

impl PaginationParams {
    /// `$top` / `$skip` / `$count`
    pub fn odata() -> Self {
        Self {
            page_size: "$top".to_string(),
            offset: Some("$skip".to_string()),
            count: Some("$count".to_string()),
            token: None,
        }
    }

    pub fn offset(page_size: impl Into<String>, offset: impl Into<String>) -> Self {
        Self {
            page_size: page_size.into(),
            offset: Some(offset.into()),
            count: None,
            token: None,
        }
    }

    pub fn token(page_size: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            page_size: page_size.into(),
            offset: None,
            count: None,
            token: Some(token.into()),
        }
    }
}

/// How an endpoint pages and where its response keeps items and totals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationDescriptor {
    pub pagination_type: PaginationType,
    /// Path of the items array in the body
    pub items_field: String,
    /// Path of the total count in the body
    pub total_count_field: Option<String>,
    /// Path of the next continuation token in the body
    pub continuation_token_field: Option<String>,
    pub params: PaginationParams,
}

impl PaginationDescriptor {
    /// OData collection: items in `value`, total in `@odata.count`
    pub fn odata() -> Self {
        Self {
            pagination_type: PaginationType::Odata,
            items_field: "value".to_string(),
            total_count_field: Some("@odata.count".to_string()),
            continuation_token_field: None,
            params: PaginationParams::odata(),
        }
    }

    pub fn offset(
        items_field: impl Into<String>,
        total_count_field: impl Into<String>,
        params: PaginationParams,
    ) -> Self {
        Self {
            pagination_type: PaginationType::Offset,
            items_field: items_field.into(),
            total_count_field: Some(total_count_field.into()),
            continuation_token_field: None,
            params,
        }
    }

    pub fn token(
        items_field: impl Into<String>,
        continuation_token_field: impl Into<String>,
        params: PaginationParams,
    ) -> Self {
        Self {
            pagination_type: PaginationType::Token,
            items_field: items_field.into(),
            total_count_field: None,
            continuation_token_field: Some(continuation_token_field.into()),
            params,
        }
    }

    #[must_use]
    pub fn with_total_count_field(mut self, field: impl Into<String>) -> Self {
        self.total_count_field = Some(field.into());
        self
    }
}

/// Options accepted by every list method
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub pagination: PaginationOptions,
    /// Restrict to one folder
    pub folder_id: Option<i64>,
    /// Filter / sort / projection options, unprefixed (`filter`, `orderby`)
    pub query: BTreeMap<String, String>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.pagination.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.pagination.cursor = Some(cursor);
        self
    }

    #[must_use]
    pub fn jump_to_page(mut self, page: u32) -> Self {
        self.pagination.jump_to_page = Some(page);
        self
    }

    #[must_use]
    pub fn folder(mut self, folder_id: i64) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    #[must_use]
    pub fn filter(self, expression: impl Into<String>) -> Self {
        self.param("filter", expression)
    }

    #[must_use]
    pub fn order_by(self, expression: impl Into<String>) -> Self {
        self.param("orderby", expression)
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

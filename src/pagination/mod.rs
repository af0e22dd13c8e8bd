//! Pagination module
//!
//! One caller vocabulary (`cursor`, `page_size`, `jump_to_page`) over three
//! backend paging styles: offset, continuation token and OData.
//!
//! # Overview
//!
//! - [`resolve_pagination`] validates caller options and derives the page to
//!   request, decoding cursors issued by earlier calls.
//! - [`get_all`] performs the request, maps items through the endpoint's
//!   transform and issues the next cursor.
//! - Cursors are base64 JSON (see [`encode_cursor`]) and are only accepted
//!   by endpoints of the pagination type that issued them.

mod cursor;
mod helpers;
mod strategies;
mod types;

pub use cursor::{decode_cursor, encode_cursor, CursorState};
pub use helpers::{fetch_all, fetch_page, get_all, GetAllConfig};
pub use strategies::{page_query, resolve_pagination};
pub use types::{
    Cursor, InternalPaginationOptions, ListOptions, ListResponse, NonPaginatedResponse,
    PaginatedResponse, PaginationDescriptor, PaginationOptions, PaginationParams,
    PaginationType, DEFAULT_PAGE_SIZE,
};

//! Paging strategy selection
//!
//! Turns caller options into internal paging parameters for one endpoint
//! type, and those parameters into query pairs for the endpoint's naming.

use super::cursor::decode_cursor;
use super::types::{
    InternalPaginationOptions, PaginationOptions, PaginationParams, PaginationType,
};
use crate::error::{Error, Result};
use tracing::debug;

/// Derive internal paging parameters from caller options.
///
/// Validation runs first and fails before any I/O. A cursor then wins over
/// `jump_to_page`, though a `page_size` given on this call still overrides
/// the one the cursor carries. Without either, paging starts at page one.
pub fn resolve_pagination(
    options: &PaginationOptions,
    pagination_type: PaginationType,
) -> Result<InternalPaginationOptions> {
    if options.page_size == Some(0) {
        return Err(Error::invalid_parameter(
            "pageSize",
            "must be a positive integer",
        ));
    }
    if options.jump_to_page == Some(0) {
        return Err(Error::invalid_parameter(
            "jumpToPage",
            "must be a positive integer",
        ));
    }
    if options.jump_to_page.is_some() && !pagination_type.supports_random_access() {
        return Err(Error::unsupported(
            "jumpToPage is not supported for token-based pagination, use cursor-based navigation",
        ));
    }

    if let Some(cursor) = &options.cursor {
        let state = decode_cursor(cursor, Some(pagination_type))?;
        debug!(
            "Following {} cursor to page {:?}",
            pagination_type, state.page_number
        );
        return Ok(InternalPaginationOptions {
            page_size: options.page_size.or(state.page_size),
            page_number: state.page_number,
            continuation_token: state.continuation_token,
            pagination_type: state.pagination_type,
        });
    }

    Ok(InternalPaginationOptions {
        page_size: options.page_size,
        page_number: Some(options.jump_to_page.unwrap_or(1)),
        continuation_token: None,
        pagination_type: None,
    })
}

/// Query pairs requesting one page
pub fn page_query(
    internal: &InternalPaginationOptions,
    pagination_type: PaginationType,
    params: &PaginationParams,
) -> Vec<(String, String)> {
    let page_size = internal.effective_page_size();
    let mut query = vec![(params.page_size.clone(), page_size.to_string())];

    match pagination_type {
        PaginationType::Offset | PaginationType::Odata => {
            let skip = u64::from(internal.effective_page_number().saturating_sub(1))
                * u64::from(page_size);
            if let Some(name) = &params.offset {
                query.push((name.clone(), skip.to_string()));
            }
            if pagination_type == PaginationType::Odata {
                if let Some(name) = &params.count {
                    query.push((name.clone(), "true".to_string()));
                }
            }
        }
        PaginationType::Token => {
            if let (Some(name), Some(token)) = (&params.token, &internal.continuation_token) {
                query.push((name.clone(), token.clone()));
            }
        }
    }

    query
}

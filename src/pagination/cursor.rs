//! Cursor codec
//!
//! A cursor is base64 over a JSON envelope
//! `{type, pageNumber?, pageSize?, continuationToken?}`.

use super::types::{Cursor, PaginationType};
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Position state carried inside a cursor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorState {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub pagination_type: Option<PaginationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

/// Serialize a state into a cursor
pub fn encode_cursor(state: &CursorState) -> Result<Cursor> {
    let json = serde_json::to_vec(state)?;
    Ok(Cursor::new(STANDARD.encode(json)))
}

/// Decode a cursor, checking its type tag against `expected` when given
pub fn decode_cursor(cursor: &Cursor, expected: Option<PaginationType>) -> Result<CursorState> {
    let bytes = STANDARD
        .decode(cursor.as_str().trim())
        .map_err(|e| Error::invalid_cursor(format!("not valid base64: {e}")))?;

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::invalid_cursor(format!("not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(Error::invalid_cursor("payload is not an object"));
    }

    let state: CursorState = serde_json::from_value(value)
        .map_err(|e| Error::invalid_cursor(format!("malformed payload: {e}")))?;

    if let Some(expected) = expected {
        match state.pagination_type {
            Some(actual) if actual == expected => {}
            Some(actual) => {
                return Err(Error::invalid_cursor(format!(
                    "cursor was issued for {actual} pagination, endpoint uses {expected}"
                )))
            }
            None => {
                return Err(Error::invalid_cursor(format!(
                    "cursor carries no pagination type, endpoint uses {expected}"
                )))
            }
        }
    }

    Ok(state)
}

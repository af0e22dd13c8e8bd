//! Token types
//!
//! `TokenInfo` is the credential held by the token store and mirrored to
//! persistent storage; `AuthToken` is what a successful refresh returns.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Kind of credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Long-lived secret (personal access token, client secret). Never expires.
    Secret,
    /// OAuth bearer token, refreshable with a refresh token
    Oauth,
}

/// The credential owned by a [`TokenStore`](super::TokenStore).
///
/// Serialized form is the persisted layout:
/// `{token, type, expiresAt?: ISO-8601, refreshToken?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenInfo {
    /// A secret token with no expiry
    pub fn secret(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            token_type: TokenType::Secret,
            expires_at: None,
            refresh_token: None,
        }
    }

    /// An OAuth token
    pub fn oauth(
        token: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            token: token.into(),
            token_type: TokenType::Oauth,
            expires_at,
            refresh_token,
        }
    }

    /// An OAuth token that expires `seconds` from now
    pub fn oauth_expiring_in(
        token: impl Into<String>,
        seconds: i64,
        refresh_token: Option<String>,
    ) -> Self {
        Self::oauth(
            token,
            Some(Utc::now() + Duration::seconds(seconds)),
            refresh_token,
        )
    }

    pub fn is_oauth(&self) -> bool {
        self.token_type == TokenType::Oauth
    }

    /// True iff an expiry is known and has been reached
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry check against an explicit clock reading
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }
}

/// Result of a successful refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub access_token: String,
    /// Usually `Bearer`
    pub token_type: String,
    /// Lifetime in seconds as declared by the backend
    pub expires_in: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

impl AuthToken {
    /// Describe a stored OAuth credential as a refresh result
    pub fn from_info(info: &TokenInfo) -> Self {
        Self {
            access_token: info.token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: info
                .expires_at
                .map(|expires_at| (expires_at - Utc::now()).num_seconds()),
            expires_at: info.expires_at,
            refresh_token: info.refresh_token.clone(),
            scope: None,
        }
    }
}

/// Token endpoint response body
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    pub(crate) fn into_auth_token(self, issued_at: DateTime<Utc>) -> AuthToken {
        AuthToken {
            expires_at: self
                .expires_in
                .map(|secs| issued_at + Duration::seconds(secs)),
            access_token: self.access_token,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_in: self.expires_in,
            refresh_token: self.refresh_token,
            scope: self.scope,
        }
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_not_expired() {
        let token = TokenInfo::oauth_expiring_in("t", 3600, None);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_expired() {
        let token = TokenInfo::oauth_expiring_in("t", -100, None);
        assert!(token.is_expired());
    }

    #[test]
    fn test_expiry_boundary_is_expired() {
        let now = Utc::now();
        let token = TokenInfo::oauth("t", Some(now), None);
        assert!(token.is_expired_at(now));
        assert!(!token.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_token_without_expiry_never_expires() {
        let far_future = Utc::now() + Duration::days(365 * 100);
        assert!(!TokenInfo::secret("pat").is_expired_at(far_future));
        assert!(!TokenInfo::oauth("t", None, None).is_expired_at(far_future));
    }

    #[test]
    fn test_persisted_layout() {
        let info = TokenInfo::oauth(
            "abc",
            Some("2030-01-02T03:04:05Z".parse().unwrap()),
            Some("r1".to_string()),
        );
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(
            value,
            json!({
                "token": "abc",
                "type": "oauth",
                "expiresAt": "2030-01-02T03:04:05Z",
                "refreshToken": "r1"
            })
        );

        let secret = serde_json::to_value(TokenInfo::secret("s")).unwrap();
        assert_eq!(secret, json!({"token": "s", "type": "secret"}));
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        let result: Result<TokenInfo, _> =
            serde_json::from_value(json!({"token": "abc", "type": "cookie"}));
        assert!(result.is_err());

        let result: Result<TokenInfo, _> =
            serde_json::from_value(json!({"token": 42, "type": "oauth"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_token_response_into_auth_token() {
        let issued = Utc::now();
        let response: TokenResponse = serde_json::from_value(json!({
            "access_token": "new",
            "expires_in": 60,
            "refresh_token": "r2"
        }))
        .unwrap();

        let token = response.into_auth_token(issued);
        assert_eq!(token.access_token, "new");
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_at, Some(issued + Duration::seconds(60)));
        assert_eq!(token.refresh_token.as_deref(), Some("r2"));
    }
}

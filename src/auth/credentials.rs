//! OAuth2 credentials issued by the token endpoint.

use crate::errors::{CalendarError, CalendarResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Calendar service profile the account was linked through.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkingProfile {
    /// Provider name, such as `google`.
    #[serde(default)]
    pub provider_name: Option<String>,
    /// Profile identifier.
    #[serde(default)]
    pub profile_id: Option<String>,
    /// Human readable profile name.
    #[serde(default)]
    pub profile_name: Option<String>,
}

/// Token response from the authorization server.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    account_id: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    application_calendar_id: Option<String>,
    #[serde(default)]
    linking_profile: Option<LinkingProfile>,
}

/// Access credentials for one user account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token for API requests.
    pub access_token: String,
    /// Token used to obtain a new access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// When the access token expires.
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
    /// Lifetime of the access token in seconds, as issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Space-delimited granted scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Account identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Subject identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Calendar created for an application calendar grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_calendar_id: Option<String>,
    /// Profile the account was linked through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linking_profile: Option<LinkingProfile>,
}

impl Credentials {
    /// Creates credentials from a token pair alone.
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: None,
            expires_in: None,
            scope: None,
            account_id: None,
            sub: None,
            application_calendar_id: None,
            linking_profile: None,
        }
    }

    /// Parses a token endpoint response body.
    ///
    /// `expires_at` is computed from `expires_in` relative to now, and left
    /// unset when that instant is out of range.
    pub fn from_token_response(body: &str) -> CalendarResult<Self> {
        let response: TokenResponse = serde_json::from_str(body).map_err(|e| {
            CalendarError::decode(format!("Failed to parse token response: {}", e)).with_cause(e)
        })?;

        let expires_at = response
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));

        Ok(Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
            expires_in: response.expires_in,
            scope: response.scope,
            account_id: response.account_id,
            sub: response.sub,
            application_calendar_id: response.application_calendar_id,
            linking_profile: response.linking_profile,
        })
    }

    /// Granted scopes as a list.
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Check if the access token is expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| exp <= Utc::now())
            .unwrap_or(false)
    }

    /// Check if a refresh token is held.
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Credentials as a map, suitable for persisting.
    ///
    /// Absent optional fields are omitted.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("account_id", &self.account_id)
            .field("sub", &self.sub)
            .field("application_calendar_id", &self.application_calendar_id)
            .field("linking_profile", &self.linking_profile)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_token_response() {
        let body = json!({
            "token_type": "bearer",
            "access_token": "fffff",
            "expires_in": 3600,
            "refresh_token": "2222",
            "scope": "read_events create_event",
            "account_id": "acc_567236000909002",
            "sub": "acc_567236000909002",
            "linking_profile": {
                "provider_name": "google",
                "profile_id": "pro_n23kjnwrw2",
                "profile_name": "example@example.com"
            }
        })
        .to_string();

        let credentials = Credentials::from_token_response(&body).unwrap();

        assert_eq!(credentials.access_token, "fffff");
        assert_eq!(credentials.refresh_token.as_deref(), Some("2222"));
        assert_eq!(credentials.expires_in, Some(3600));
        assert_eq!(credentials.scopes(), vec!["read_events", "create_event"]);
        assert_eq!(credentials.account_id.as_deref(), Some("acc_567236000909002"));
        assert_eq!(
            credentials.linking_profile,
            Some(LinkingProfile {
                provider_name: Some("google".to_string()),
                profile_id: Some("pro_n23kjnwrw2".to_string()),
                profile_name: Some("example@example.com".to_string()),
            })
        );

        let expires_at = credentials.expires_at.unwrap();
        let remaining = (expires_at - Utc::now()).num_seconds();
        assert!(remaining > 3500 && remaining <= 3600);
        assert!(!credentials.is_expired());
    }

    #[test]
    fn test_out_of_range_lifetime_leaves_expiry_unset() {
        for expires_in in [100_000_000_000_000u64, 10_000_000_000_000_000, u64::MAX] {
            let body = json!({ "access_token": "a", "expires_in": expires_in }).to_string();
            let credentials = Credentials::from_token_response(&body).unwrap();

            assert_eq!(credentials.expires_in, Some(expires_in));
            assert_eq!(credentials.expires_at, None);
            assert!(!credentials.is_expired());
        }
    }

    #[test]
    fn test_to_map_omits_absent_fields() {
        let credentials = Credentials::new("access", Some("refresh".to_string()));
        let map = credentials.to_map();

        assert_eq!(map.get("access_token"), Some(&json!("access")));
        assert_eq!(map.get("refresh_token"), Some(&json!("refresh")));
        assert!(!map.contains_key("account_id"));
        assert!(!map.contains_key("linking_profile"));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let credentials = Credentials::new("secret_access", Some("secret_refresh".to_string()));
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("secret_access"));
        assert!(!debug.contains("secret_refresh"));
    }

    #[test]
    fn test_invalid_token_response() {
        let err = Credentials::from_token_response("{}").unwrap_err();
        assert_eq!(err.kind(), crate::errors::CalendarErrorKind::Decode);
    }
}

//! Error types for the calendar client.
//!
//! Every failure is a [`CalendarError`] carrying a closed [`CalendarErrorKind`].
//! Non-2xx responses are classified by status code; local failures (missing
//! credentials, undecodable bodies, bad time values) have kinds of their own.

use crate::transport::HttpResponse;
use crate::types::BatchResponse;
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;

/// Error kinds for categorizing calendar API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarErrorKind {
    // Classified from HTTP status
    /// Malformed request (400).
    BadRequest,
    /// Access token missing, invalid or expired (401).
    AuthenticationFailure,
    /// Token lacks the rights for the operation (403).
    AuthorizationFailure,
    /// Resource not found (404).
    NotFound,
    /// Request failed validation (422).
    InvalidRequest,
    /// Account is locked (423).
    AccountLocked,
    /// Rate limit exceeded (429).
    TooManyRequests,
    /// Server side failure (5xx).
    ServerError,
    /// Any other non-success status.
    Unknown,

    // Raised locally
    /// Required authentication material is absent; no request was sent.
    CredentialsMissing,
    /// A date or time value could not be coerced.
    Coercion,
    /// A response body did not have the expected JSON shape.
    Decode,
    /// A batch request returned at least one non-2xx entry.
    PartialSuccess,

    // Ambient
    /// The request never produced an HTTP response.
    Transport,
    /// Invalid client configuration.
    InvalidConfiguration,
    /// A request parameter could not be encoded.
    InvalidParameter,
}

impl CalendarErrorKind {
    /// Maps an HTTP status code to an error kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::AuthenticationFailure,
            403 => Self::AuthorizationFailure,
            404 => Self::NotFound,
            422 => Self::InvalidRequest,
            423 => Self::AccountLocked,
            429 => Self::TooManyRequests,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Returns a stable snake_case name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::AuthenticationFailure => "authentication_failure",
            Self::AuthorizationFailure => "authorization_failure",
            Self::NotFound => "not_found",
            Self::InvalidRequest => "invalid_request",
            Self::AccountLocked => "account_locked",
            Self::TooManyRequests => "too_many_requests",
            Self::ServerError => "server_error",
            Self::Unknown => "unknown",
            Self::CredentialsMissing => "credentials_missing",
            Self::Coercion => "coercion",
            Self::Decode => "decode",
            Self::PartialSuccess => "partial_success",
            Self::Transport => "transport",
            Self::InvalidConfiguration => "invalid_configuration",
            Self::InvalidParameter => "invalid_parameter",
        }
    }

    /// Returns true for kinds produced from an HTTP response.
    pub fn is_api_error(&self) -> bool {
        matches!(
            self,
            Self::BadRequest
                | Self::AuthenticationFailure
                | Self::AuthorizationFailure
                | Self::NotFound
                | Self::InvalidRequest
                | Self::AccountLocked
                | Self::TooManyRequests
                | Self::ServerError
                | Self::Unknown
        )
    }
}

impl fmt::Display for CalendarErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar API error with the raw response kept for introspection.
#[derive(Error, Debug)]
pub struct CalendarError {
    kind: CalendarErrorKind,
    message: String,
    status_code: Option<u16>,
    response: Option<HttpResponse>,
    validation_errors: OnceCell<Map<String, Value>>,
    batch: Option<Box<BatchResponse>>,
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;

        let errors = self.errors();
        if !errors.is_empty() {
            let serialized = serde_json::to_string(errors).map_err(|_| fmt::Error)?;
            write!(f, " - {}", serialized)?;
        }

        Ok(())
    }
}

impl CalendarError {
    /// Creates a new error.
    pub fn new(kind: CalendarErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            response: None,
            validation_errors: OnceCell::new(),
            batch: None,
            cause: None,
        }
    }

    /// Classifies a non-success response.
    ///
    /// The message is the status line's reason phrase and the whole response
    /// is retained.
    pub fn from_response(response: HttpResponse) -> Self {
        let kind = CalendarErrorKind::from_status(response.status);
        Self::classified(kind, response)
    }

    /// Classifies a non-success response from the OAuth token endpoint.
    ///
    /// A 400 there means the grant was rejected, which is an authorization
    /// failure rather than a malformed request.
    pub fn from_token_response(response: HttpResponse) -> Self {
        let kind = match response.status {
            400 => CalendarErrorKind::AuthorizationFailure,
            status => CalendarErrorKind::from_status(status),
        };
        Self::classified(kind, response)
    }

    fn classified(kind: CalendarErrorKind, response: HttpResponse) -> Self {
        let message = if response.status_text.is_empty() {
            format!("HTTP {}", response.status)
        } else {
            response.status_text.clone()
        };

        let mut error = Self::new(kind, message).with_status(response.status);
        error.response = Some(response);
        error
    }

    /// Sets the HTTP status code.
    pub fn with_status(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    // Convenience constructors

    /// Creates a missing credentials error.
    pub fn credentials_missing(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorKind::CredentialsMissing, message)
    }

    /// Creates a coercion error.
    pub fn coercion(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorKind::Coercion, message)
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorKind::Decode, message)
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorKind::Transport, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorKind::InvalidConfiguration, message)
    }

    /// Creates an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorKind::InvalidParameter, message)
    }

    /// Creates a partial success error carrying the whole batch result.
    pub fn partial_success(batch: BatchResponse) -> Self {
        let failed = batch.errors().count();
        let mut error = Self::new(
            CalendarErrorKind::PartialSuccess,
            format!("Batch contains {} failed request(s)", failed),
        );
        error.batch = Some(Box::new(batch));
        error
    }

    /// Gets the error kind.
    pub fn kind(&self) -> CalendarErrorKind {
        self.kind
    }

    /// Gets the base message, without structured errors.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Gets the HTTP status code.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Gets the raw response, if the error was classified from one.
    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    /// Gets the raw response body.
    pub fn body(&self) -> Option<&str> {
        self.response.as_ref().map(|r| r.body.as_str())
    }

    /// Gets the batch result of a partial success.
    pub fn batch_response(&self) -> Option<&BatchResponse> {
        self.batch.as_deref()
    }

    /// Structured validation errors of an invalid request.
    ///
    /// Read from the `errors` key of the body on first access. A body that is
    /// not JSON, or has no `errors` object, yields an empty map.
    pub fn errors(&self) -> &Map<String, Value> {
        self.validation_errors.get_or_init(|| {
            if self.kind != CalendarErrorKind::InvalidRequest {
                return Map::new();
            }

            self.response
                .as_ref()
                .and_then(|r| serde_json::from_str::<Value>(&r.body).ok())
                .and_then(|mut json| json.get_mut("errors").map(Value::take))
                .and_then(|errors| match errors {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .unwrap_or_default()
        })
    }

    /// Seconds to wait as advertised by a 429 response.
    pub fn retry_after(&self) -> Option<Duration> {
        if self.kind != CalendarErrorKind::TooManyRequests {
            return None;
        }

        self.response
            .as_ref()
            .and_then(|r| r.header("retry-after"))
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

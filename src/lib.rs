//! # Calendar Integration Library
//!
//! A client for a calendar-integration API with:
//! - OAuth2 authorization code flow, token refresh and revocation
//! - Typed domain objects with date/time coercion
//! - Lazy pagination exposed as a `Stream`
//! - Batch requests with per-entry results
//! - Push notification HMAC verification
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::TryStreamExt;
//! use integrations_calendar::{CalendarClient, CalendarConfig, ReadEventsParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CalendarConfig::builder()
//!         .client_id("client_id")
//!         .client_secret("client_secret")
//!         .build()?;
//!
//!     let client = CalendarClient::new(config)?
//!         .with_tokens("access_token", Some("refresh_token".to_string()));
//!
//!     for calendar in client.calendars().list().await? {
//!         println!("{}", calendar.calendar_id);
//!     }
//!
//!     let events = client
//!         .events()
//!         .read(&ReadEventsParams::new().tzid("Europe/London"))
//!         .await?;
//!     let mut events = Box::pin(events.into_stream());
//!     while let Some(event) = events.try_next().await? {
//!         println!("{:?} {:?}", event.summary, event.start);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod types;

// Authentication
pub mod auth;

// HTTP client and transport
pub mod client;
pub mod transport;

// Response handling
pub mod decode;
pub mod pagination;

// API Services
pub mod services;

// Webhooks
pub mod webhooks;

#[cfg(test)]
mod mocks;

// Re-exports for convenience
pub use auth::{AuthFlow, CredentialStore, Credentials, LinkingProfile, Scope};
pub use client::{CalendarClient, RequestExecutor};
pub use config::{CalendarConfig, CalendarConfigBuilder};
pub use decode::ResponseParser;
pub use errors::{CalendarError, CalendarErrorKind, CalendarResult};
pub use pagination::Paginator;
pub use services::*;
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::*;
pub use webhooks::HmacVerifier;

//! Calendar API client.

mod executor;

pub use executor::{Bearer, Query, RequestExecutor, JSON_CONTENT_TYPE};

use crate::auth::{AuthFlow, CredentialStore};
use crate::config::CalendarConfig;
use crate::decode::ResponseParser;
use crate::errors::{CalendarError, CalendarResult};
use crate::services::{
    AccountService, AvailabilityService, BatchService, CalendarsService, ChannelsService,
    EventsService, FreeBusyService, SmartInvitesService,
};
use crate::transport::{HttpMethod, HttpResponse, HttpTransport, ReqwestTransport};
use crate::webhooks::HmacVerifier;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Client for the calendar API.
///
/// Owns its configuration and credentials; a client represents one
/// account. Calls are made one at a time: each awaits its response before
/// returning.
pub struct CalendarClient {
    config: Arc<CalendarConfig>,
    credentials: Arc<CredentialStore>,
    executor: RequestExecutor,
}

impl CalendarClient {
    /// Creates a client with the default HTTP transport.
    pub fn new(config: CalendarConfig) -> CalendarResult<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client with a custom transport.
    pub fn with_transport(config: CalendarConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let config = Arc::new(config);
        let credentials = Arc::new(CredentialStore::new());
        let executor = RequestExecutor::new(transport, config.clone(), credentials.clone());

        Self {
            config,
            credentials,
            executor,
        }
    }

    /// Stores a token pair and returns the client.
    pub fn with_tokens(self, access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        self.credentials.set(access_token, refresh_token);
        self
    }

    /// Gets the configuration.
    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    /// Gets the credential store.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Gets the request executor.
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    // Services

    /// OAuth2 token lifecycle.
    pub fn auth(&self) -> AuthFlow<'_> {
        AuthFlow::new(self)
    }

    /// Calendar operations.
    pub fn calendars(&self) -> CalendarsService<'_> {
        CalendarsService::new(self)
    }

    /// Event operations.
    pub fn events(&self) -> EventsService<'_> {
        EventsService::new(self)
    }

    /// Free/busy operations.
    pub fn free_busy(&self) -> FreeBusyService<'_> {
        FreeBusyService::new(self)
    }

    /// Notification channel operations.
    pub fn channels(&self) -> ChannelsService<'_> {
        ChannelsService::new(self)
    }

    /// Account and profile operations.
    pub fn account(&self) -> AccountService<'_> {
        AccountService::new(self)
    }

    /// Availability queries.
    pub fn availability(&self) -> AvailabilityService<'_> {
        AvailabilityService::new(self)
    }

    /// Smart invite operations.
    pub fn smart_invites(&self) -> SmartInvitesService<'_> {
        SmartInvitesService::new(self)
    }

    /// Batch requests.
    pub fn batch(&self) -> BatchService<'_> {
        BatchService::new(self)
    }

    /// Verifies the HMAC of a push notification against the client secret.
    pub fn hmac_valid(&self, hmac: &str, body: &[u8]) -> CalendarResult<bool> {
        let secret = self.config.client_secret().ok_or_else(|| {
            CalendarError::credentials_missing("OAuth client_id and client_secret must be set")
        })?;
        Ok(HmacVerifier::new(secret).verify(hmac, body))
    }

    // Request helpers used by services

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
        attribute: Option<&str>,
    ) -> CalendarResult<T> {
        let response = self
            .executor
            .execute(HttpMethod::Get, path, query, None)
            .await?;
        ResponseParser::new(&response.body).parse_json(attribute)
    }

    pub(crate) async fn get_collection<T: DeserializeOwned>(
        &self,
        path: &str,
        attribute: &str,
    ) -> CalendarResult<Vec<T>> {
        let response = self
            .executor
            .execute(HttpMethod::Get, path, &[], None)
            .await?;
        ResponseParser::new(&response.body).parse_collection(Some(attribute))
    }

    pub(crate) async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> CalendarResult<HttpResponse> {
        self.executor
            .execute(method, path, &[], Some(json_body(body)?))
            .await
    }
}

impl std::fmt::Debug for CalendarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Serializes a request body.
pub(crate) fn json_body<B: Serialize + ?Sized>(body: &B) -> CalendarResult<String> {
    serde_json::to_string(body).map_err(|e| {
        CalendarError::invalid_parameter(format!("Failed to encode request body: {}", e))
            .with_cause(e)
    })
}

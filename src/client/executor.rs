//! Authenticated request executor.

use crate::auth::CredentialStore;
use crate::config::CalendarConfig;
use crate::errors::{CalendarError, CalendarResult};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

/// Content type of JSON request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Query string parameters, in order. Keys may repeat.
pub type Query = [(String, String)];

/// Bearer credential presented with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bearer {
    /// The user's access token from the credential store.
    AccessToken,
    /// The application's client secret.
    ClientSecret,
}

/// Issues API requests with credentials attached and failures classified.
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    config: Arc<CalendarConfig>,
    credentials: Arc<CredentialStore>,
}

impl RequestExecutor {
    /// Creates a new executor.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        config: Arc<CalendarConfig>,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        Self {
            transport,
            config,
            credentials,
        }
    }

    /// Builds an absolute API URL from a path and query.
    pub fn api_url(&self, path: &str, query: &Query) -> CalendarResult<Url> {
        let mut url = Url::parse(&format!("{}{}", self.config.api_url, path)).map_err(|e| {
            CalendarError::invalid_parameter(format!("Invalid request path {}: {}", path, e))
                .with_cause(e)
        })?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }

        Ok(url)
    }

    /// Executes a request against an API path with the user's access token.
    ///
    /// Fails with a credentials error, without sending anything, when no
    /// access token is held. Non-2xx responses are returned as classified
    /// errors.
    pub async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        query: &Query,
        body: Option<String>,
    ) -> CalendarResult<HttpResponse> {
        self.execute_as(Bearer::AccessToken, method, path, query, body)
            .await
    }

    /// Executes a request against an API path with the given credential.
    pub async fn execute_as(
        &self,
        bearer: Bearer,
        method: HttpMethod,
        path: &str,
        query: &Query,
        body: Option<String>,
    ) -> CalendarResult<HttpResponse> {
        let token = self.bearer_token(bearer)?;
        let url = self.api_url(path, query)?;
        self.send_authenticated(&token, method, url.as_str(), body)
            .await
    }

    /// Executes a request against an absolute URL, such as a page link.
    ///
    /// The URL must share the configured API origin, so the access token is
    /// never sent to another host.
    pub async fn execute_url(&self, method: HttpMethod, url: &str) -> CalendarResult<HttpResponse> {
        let token = self.bearer_token(Bearer::AccessToken)?;
        let url = self.api_link(url)?;
        self.send_authenticated(&token, method, url.as_str(), None)
            .await
    }

    /// Posts a form to an OAuth token endpoint.
    ///
    /// No bearer credential is attached; failures are classified the way the
    /// token endpoint reports them.
    #[instrument(skip(self, form))]
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> CalendarResult<HttpResponse> {
        let body = serde_urlencoded::to_string(form).map_err(|e| {
            CalendarError::invalid_parameter(format!("Failed to encode form: {}", e)).with_cause(e)
        })?;

        let request = self
            .base_request(HttpMethod::Post, url)
            .header("Content-Type", FORM_CONTENT_TYPE)
            .body(body);

        let response = self.transport.send(request).await?;

        if response.is_success() {
            Ok(response)
        } else {
            warn!(status = response.status, url = %url, "Token endpoint request failed");
            Err(CalendarError::from_token_response(response))
        }
    }

    fn api_link(&self, link: &str) -> CalendarResult<Url> {
        let url = Url::parse(link).map_err(|e| {
            CalendarError::decode(format!("Invalid link {}: {}", link, e)).with_cause(e)
        })?;
        let api = Url::parse(&self.config.api_url).map_err(|e| {
            CalendarError::configuration(format!("Invalid API URL: {}", e)).with_cause(e)
        })?;

        if url.origin() != api.origin() {
            warn!(link = %link, "Link is not on the API host");
            return Err(CalendarError::decode(format!(
                "Link {} is not on the API host {}",
                link, self.config.api_url
            )));
        }

        Ok(url)
    }

    fn bearer_token(&self, bearer: Bearer) -> CalendarResult<String> {
        match bearer {
            Bearer::AccessToken => self
                .credentials
                .access_token()
                .ok_or_else(|| CalendarError::credentials_missing("No access token available")),
            Bearer::ClientSecret => self
                .config
                .client_secret()
                .map(String::from)
                .ok_or_else(|| {
                    CalendarError::credentials_missing(
                        "OAuth client_id and client_secret must be set",
                    )
                }),
        }
    }

    fn base_request(&self, method: HttpMethod, url: &str) -> HttpRequest {
        HttpRequest::new(method, url)
            .header("User-Agent", self.config.user_agent.as_str())
            .header("Accept", "application/json")
    }

    async fn send_authenticated(
        &self,
        token: &str,
        method: HttpMethod,
        url: &str,
        body: Option<String>,
    ) -> CalendarResult<HttpResponse> {
        let mut request = self
            .base_request(method, url)
            .header("Authorization", format!("Bearer {}", token));

        if let Some(body) = body {
            request = request.header("Content-Type", JSON_CONTENT_TYPE).body(body);
        }

        debug!(method = %method, url = %url, "Sending request");
        let response = self.transport.send(request).await?;

        if response.is_success() {
            Ok(response)
        } else {
            warn!(method = %method, url = %url, status = response.status, "Request failed");
            Err(CalendarError::from_response(response))
        }
    }
}

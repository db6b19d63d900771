//! OAuth2 authorization code flow.

use super::Credentials;
use crate::client::CalendarClient;
use crate::errors::{CalendarError, CalendarResult};
use tracing::{debug, instrument};
use url::Url;

/// Requested OAuth scope, as a list or a pre-joined string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Individual scopes, joined with single spaces on the wire.
    List(Vec<String>),
    /// A space-delimited scope string, sent as is.
    Joined(String),
}

impl Scope {
    /// Returns the scope as sent in the `scope` parameter.
    pub fn as_param(&self) -> String {
        match self {
            Self::List(scopes) => scopes.join(" "),
            Self::Joined(scope) => scope.clone(),
        }
    }
}

impl From<&str> for Scope {
    fn from(scope: &str) -> Self {
        Self::Joined(scope.to_string())
    }
}

impl From<String> for Scope {
    fn from(scope: String) -> Self {
        Self::Joined(scope)
    }
}

impl From<Vec<String>> for Scope {
    fn from(scopes: Vec<String>) -> Self {
        Self::List(scopes)
    }
}

impl From<Vec<&str>> for Scope {
    fn from(scopes: Vec<&str>) -> Self {
        Self::List(scopes.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Scope {
    fn from(scopes: &[&str]) -> Self {
        Self::List(scopes.iter().map(|s| s.to_string()).collect())
    }
}

/// Drives the OAuth2 token lifecycle of a client.
///
/// Tokens obtained here are written to the client's credential store, so
/// later API calls pick them up.
pub struct AuthFlow<'a> {
    client: &'a CalendarClient,
}

impl<'a> AuthFlow<'a> {
    /// Creates a new auth flow.
    pub fn new(client: &'a CalendarClient) -> Self {
        Self { client }
    }

    /// Builds the URL to send a user to for authorization.
    ///
    /// `state` is only included when given. No request is made.
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        scope: impl Into<Scope>,
        state: Option<&str>,
    ) -> CalendarResult<Url> {
        let config = self.client.config();
        let client_id = config
            .client_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| CalendarError::credentials_missing("OAuth client_id must be set"))?;

        let mut url = Url::parse(&format!("{}/oauth/authorize", config.app_url)).map_err(|e| {
            CalendarError::configuration(format!("Invalid app URL: {}", e)).with_cause(e)
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", client_id)
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &scope.into().as_param());

            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }

        Ok(url)
    }

    /// Exchanges an authorization code for credentials.
    ///
    /// The credentials are stored on the client and returned.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> CalendarResult<Credentials> {
        let config = self.client.config();
        let (client_id, client_secret) = config.client_credentials()?;

        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let url = format!("{}/oauth/token", config.app_url);
        let response = self.client.executor().post_form(&url, &form).await?;
        let credentials = Credentials::from_token_response(&response.body)?;

        self.client.credentials().replace(credentials.clone());
        debug!("Exchanged authorization code");

        Ok(credentials)
    }

    /// Refreshes the access token.
    ///
    /// Fails without a request when no refresh token is held, even if an
    /// access token is. A response that carries no new refresh token keeps
    /// the current one.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> CalendarResult<Credentials> {
        let store = self.client.credentials();
        let refresh_token = store
            .refresh_token()
            .ok_or_else(|| CalendarError::credentials_missing("No refresh token available"))?;

        let config = self.client.config();
        let (client_id, client_secret) = config.client_credentials()?;

        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token.as_str()),
        ];

        let url = format!("{}/oauth/token", config.api_url);
        let response = self.client.executor().post_form(&url, &form).await?;
        let mut credentials = Credentials::from_token_response(&response.body)?;

        if credentials.refresh_token.is_none() {
            credentials.refresh_token = Some(refresh_token);
        }

        store.replace(credentials.clone());
        debug!("Refreshed access token");

        Ok(credentials)
    }

    /// Revokes the held refresh token, or the access token if there is none.
    ///
    /// The credential store is cleared once the server accepts the request.
    #[instrument(skip(self))]
    pub async fn revoke(&self) -> CalendarResult<()> {
        let store = self.client.credentials();
        let token = store
            .refresh_token()
            .or_else(|| store.access_token())
            .ok_or_else(|| CalendarError::credentials_missing("No credentials to revoke"))?;

        let config = self.client.config();
        let (client_id, client_secret) = config.client_credentials()?;

        let form = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("token", token.as_str()),
        ];

        let url = format!("{}/oauth/token/revoke", config.api_url);
        self.client.executor().post_form(&url, &form).await?;

        store.clear();
        debug!("Revoked credentials");

        Ok(())
    }
}

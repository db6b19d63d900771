//! Configuration types for the calendar client.

use crate::errors::{CalendarError, CalendarResult};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Default API host.
pub const DEFAULT_API_URL: &str = "https://api.example.com";

/// Default application host, serving the OAuth authorize page.
pub const DEFAULT_APP_URL: &str = "https://app.example.com";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header.
pub const DEFAULT_USER_AGENT: &str = concat!("integrations-calendar/", env!("CARGO_PKG_VERSION"));

/// Returns the API host for a data center, or the default host.
pub fn api_url_for(data_center: Option<&str>) -> String {
    match data_center {
        Some(dc) => format!("https://api.{}.example.com", dc),
        None => DEFAULT_API_URL.to_string(),
    }
}

/// Returns the application host for a data center, or the default host.
pub fn app_url_for(data_center: Option<&str>) -> String {
    match data_center {
        Some(dc) => format!("https://app.{}.example.com", dc),
        None => DEFAULT_APP_URL.to_string(),
    }
}

/// Calendar client configuration.
pub struct CalendarConfig {
    /// OAuth client identifier.
    pub client_id: Option<String>,
    /// OAuth client secret.
    pub client_secret: Option<SecretString>,
    /// Data center the account lives in.
    pub data_center: Option<String>,
    /// API base URL.
    pub api_url: String,
    /// Application base URL.
    pub app_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            data_center: None,
            api_url: DEFAULT_API_URL.to_string(),
            app_url: DEFAULT_APP_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl std::fmt::Debug for CalendarConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("data_center", &self.data_center)
            .field("api_url", &self.api_url)
            .field("app_url", &self.app_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl CalendarConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CalendarConfigBuilder {
        CalendarConfigBuilder::new()
    }

    /// Returns the client secret, if configured and not blank.
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// Returns the client id and secret needed by the token endpoints.
    pub fn client_credentials(&self) -> CalendarResult<(&str, &str)> {
        let client_id = self
            .client_id
            .as_deref()
            .filter(|s| !s.trim().is_empty());

        match (client_id, self.client_secret()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(CalendarError::credentials_missing(
                "OAuth client_id and client_secret must be set",
            )),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CalendarResult<()> {
        for (name, url) in [("API", &self.api_url), ("App", &self.app_url)] {
            if url.is_empty() {
                return Err(CalendarError::configuration(format!(
                    "{} URL cannot be empty",
                    name
                )));
            }

            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CalendarError::configuration(format!(
                    "{} URL must start with http:// or https://",
                    name
                )));
            }
        }

        if self.user_agent.is_empty() {
            return Err(CalendarError::configuration("User-Agent cannot be empty"));
        }

        Ok(())
    }
}

/// Builder for CalendarConfig.
#[derive(Default)]
pub struct CalendarConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    data_center: Option<String>,
    api_url: Option<String>,
    app_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl CalendarConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the OAuth client id.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the OAuth client secret.
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(secret.into()));
        self
    }

    /// Selects the data center, changing both hosts.
    pub fn data_center(mut self, data_center: impl Into<String>) -> Self {
        self.data_center = Some(data_center.into());
        self
    }

    /// Overrides the API base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Overrides the application base URL.
    pub fn app_url(mut self, url: impl Into<String>) -> Self {
        self.app_url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> CalendarResult<CalendarConfig> {
        let data_center = self.data_center.filter(|dc| !dc.trim().is_empty());

        let config = CalendarConfig {
            client_id: self.client_id,
            client_secret: self.client_secret,
            api_url: self
                .api_url
                .unwrap_or_else(|| api_url_for(data_center.as_deref()))
                .trim_end_matches('/')
                .to_string(),
            app_url: self
                .app_url
                .unwrap_or_else(|| app_url_for(data_center.as_deref()))
                .trim_end_matches('/')
                .to_string(),
            data_center,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CalendarErrorKind;

    #[test]
    fn test_default_config() {
        let config = CalendarConfig::builder().build().unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.app_url, DEFAULT_APP_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.user_agent.starts_with("integrations-calendar/"));
    }

    #[test]
    fn test_data_center_changes_hosts() {
        let config = CalendarConfig::builder().data_center("de").build().unwrap();
        assert_eq!(config.api_url, "https://api.de.example.com");
        assert_eq!(config.app_url, "https://app.de.example.com");
        assert_eq!(config.data_center.as_deref(), Some("de"));
    }

    #[test]
    fn test_explicit_url_wins_over_data_center() {
        let config = CalendarConfig::builder()
            .data_center("de")
            .api_url("http://127.0.0.1:8080/")
            .build()
            .unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:8080");
        assert_eq!(config.app_url, "https://app.de.example.com");
    }

    #[test]
    fn test_invalid_url() {
        let result = CalendarConfig::builder().api_url("invalid-url").build();
        assert_eq!(
            result.unwrap_err().kind(),
            CalendarErrorKind::InvalidConfiguration
        );
    }

    #[test]
    fn test_client_credentials_required() {
        let config = CalendarConfig::builder()
            .client_id("client_id_123")
            .client_secret("  ")
            .build()
            .unwrap();
        let err = config.client_credentials().unwrap_err();
        assert_eq!(err.kind(), CalendarErrorKind::CredentialsMissing);

        let config = CalendarConfig::builder()
            .client_id("client_id_123")
            .client_secret("client_secret_456")
            .build()
            .unwrap();
        assert_eq!(
            config.client_credentials().unwrap(),
            ("client_id_123", "client_secret_456")
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = CalendarConfig::builder()
            .client_secret("client_secret_456")
            .build()
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("client_secret_456"));
        assert!(debug.contains("[REDACTED]"));
    }
}

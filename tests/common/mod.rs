//! Shared helpers for the WireMock integration tests.

#![allow(dead_code)]

use integrations_calendar::{CalendarClient, CalendarConfig};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "client_id_123";
pub const CLIENT_SECRET: &str = "client_secret_456";
pub const ACCESS_TOKEN: &str = "access_token_123";
pub const REFRESH_TOKEN: &str = "refresh_token_456";

/// Starts a mock server.
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server for both the API and app hosts.
pub fn unauthenticated_client(server: &MockServer) -> CalendarClient {
    let config = CalendarConfig::builder()
        .client_id(CLIENT_ID)
        .client_secret(CLIENT_SECRET)
        .api_url(server.uri())
        .app_url(server.uri())
        .build()
        .expect("valid config");

    CalendarClient::new(config).expect("client")
}

/// Client pointed at the mock server holding a token pair.
pub fn client(server: &MockServer) -> CalendarClient {
    unauthenticated_client(server).with_tokens(ACCESS_TOKEN, Some(REFRESH_TOKEN.to_string()))
}

/// Mock expecting the client's bearer token.
pub fn mock_with_auth(method_matcher: &str, path_matcher: &str) -> MockBuilder {
    Mock::given(method(method_matcher))
        .and(path(path_matcher))
        .and(header("Authorization", format!("Bearer {}", ACCESS_TOKEN).as_str()))
}

/// JSON response template.
pub fn json_response(status: u16, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

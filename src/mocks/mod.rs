//! Mock transport for unit tests.

use crate::errors::{CalendarError, CalendarResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Transport replaying queued responses in order and recording requests.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Creates a transport with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push(&self, response: HttpResponse) {
        self.responses.lock().push_back(response);
    }

    /// Queues a JSON response with the given status.
    pub fn push_json(&self, status: u16, body: &str) {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        self.push(HttpResponse {
            status,
            status_text: reason(status).to_string(),
            headers,
            body: body.to_string(),
        });
    }

    /// Requests sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }
}

fn reason(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or_default()
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> CalendarResult<HttpResponse> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| CalendarError::transport("No mock response queued"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpMethod;

    #[tokio::test]
    async fn test_status_text_follows_status() {
        let transport = MockTransport::new();
        transport.push_json(422, "{}");
        transport.push_json(423, "{}");
        transport.push_json(599, "{}");

        let mut texts = Vec::new();
        for _ in 0..3 {
            let request = HttpRequest::new(HttpMethod::Get, "https://api.example.com/v1/calendars");
            texts.push(transport.send(request).await.unwrap().status_text);
        }

        assert_eq!(texts, vec!["Unprocessable Entity", "Locked", ""]);
        assert_eq!(transport.requests().len(), 3);
    }
}

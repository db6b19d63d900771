//! Calendar operations.

use crate::client::CalendarClient;
use crate::decode::ResponseParser;
use crate::errors::CalendarResult;
use crate::transport::HttpMethod;
use crate::types::Calendar;
use serde::{Deserialize, Serialize};

/// Service for calendar operations.
pub struct CalendarsService<'a> {
    client: &'a CalendarClient,
}

impl<'a> CalendarsService<'a> {
    /// Creates a new calendars service.
    pub fn new(client: &'a CalendarClient) -> Self {
        Self { client }
    }

    /// Lists the calendars of every connected profile.
    pub async fn list(&self) -> CalendarResult<Vec<Calendar>> {
        self.client
            .get_collection("/v1/calendars", "calendars")
            .await
    }

    /// Creates a calendar within a profile.
    pub async fn create(
        &self,
        profile_id: impl Into<String>,
        name: impl Into<String>,
    ) -> CalendarResult<Calendar> {
        self.create_with(&CreateCalendarRequest::new(profile_id, name))
            .await
    }

    /// Creates a calendar from a full request.
    pub async fn create_with(&self, request: &CreateCalendarRequest) -> CalendarResult<Calendar> {
        let response = self
            .client
            .send_json(HttpMethod::Post, "/v1/calendars", request)
            .await?;
        ResponseParser::new(&response.body).parse_json(Some("calendar"))
    }
}

/// Request to create a calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCalendarRequest {
    /// Profile to create the calendar in.
    pub profile_id: String,
    /// Calendar name.
    pub name: String,
    /// Calendar color, such as `#49BED8`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CreateCalendarRequest {
    /// Creates a request.
    pub fn new(profile_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            profile_id: profile_id.into(),
            name: name.into(),
            color: None,
        }
    }

    /// Sets the color.
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

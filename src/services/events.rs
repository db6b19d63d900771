//! Event operations.

use super::{push_list, push_opt, push_time};
use crate::client::CalendarClient;
use crate::errors::CalendarResult;
use crate::pagination::Paginator;
use crate::transport::HttpMethod;
use crate::types::{Event, TimeValue};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::instrument;

/// Timezone events are read in unless another is given.
pub const DEFAULT_TZID: &str = "Etc/UTC";

/// Service for event operations.
pub struct EventsService<'a> {
    client: &'a CalendarClient,
}

impl<'a> EventsService<'a> {
    /// Creates a new events service.
    pub fn new(client: &'a CalendarClient) -> Self {
        Self { client }
    }

    /// Reads events across all calendars.
    ///
    /// The first page is fetched before returning; later pages are fetched
    /// as the paginator is iterated.
    #[instrument(skip(self, params))]
    pub async fn read(&self, params: &ReadEventsParams) -> CalendarResult<Paginator<'a, Event>> {
        Paginator::start(
            self.client.executor(),
            "/v1/events",
            params.to_query(),
            "events",
        )
        .await
    }

    /// Creates or updates the event with the request's `event_id`.
    #[instrument(skip(self, event))]
    pub async fn upsert(&self, calendar_id: &str, event: &UpsertEventRequest) -> CalendarResult<()> {
        self.client
            .send_json(
                HttpMethod::Post,
                &format!("/v1/calendars/{}/events", calendar_id),
                event,
            )
            .await?;
        Ok(())
    }

    /// Deletes an event created by this application.
    #[instrument(skip(self))]
    pub async fn delete(&self, calendar_id: &str, event_id: &str) -> CalendarResult<()> {
        self.client
            .send_json(
                HttpMethod::Delete,
                &format!("/v1/calendars/{}/events", calendar_id),
                &json!({ "event_id": event_id }),
            )
            .await?;
        Ok(())
    }

    /// Deletes an event managed outside this application.
    #[instrument(skip(self))]
    pub async fn delete_external(&self, calendar_id: &str, event_uid: &str) -> CalendarResult<()> {
        self.client
            .send_json(
                HttpMethod::Delete,
                &format!("/v1/calendars/{}/events", calendar_id),
                &json!({ "event_uid": event_uid }),
            )
            .await?;
        Ok(())
    }

    /// Changes the account owner's participation status for an event.
    #[instrument(skip(self))]
    pub async fn change_participation_status(
        &self,
        calendar_id: &str,
        event_uid: &str,
        status: ParticipationStatus,
    ) -> CalendarResult<()> {
        self.client
            .send_json(
                HttpMethod::Post,
                &format!(
                    "/v1/calendars/{}/events/{}/participation_status",
                    calendar_id, event_uid
                ),
                &json!({ "status": status }),
            )
            .await?;
        Ok(())
    }
}

/// Participation status of an attendee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    /// Accepted.
    Accepted,
    /// Tentatively accepted.
    Tentative,
    /// Declined.
    Declined,
}

/// Event location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Free text description.
    pub description: String,
    /// Latitude.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<String>,
    /// Longitude.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
}

/// Request to create or update an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertEventRequest {
    /// Identifier chosen by the application.
    pub event_id: String,
    /// Summary.
    pub summary: String,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Start.
    pub start: TimeValue,
    /// End.
    pub end: TimeValue,
    /// Timezone of the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tzid: Option<String>,
    /// Location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Any other fields to send.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UpsertEventRequest {
    /// Creates a request.
    pub fn new(
        event_id: impl Into<String>,
        summary: impl Into<String>,
        start: impl Into<TimeValue>,
        end: impl Into<TimeValue>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            summary: summary.into(),
            description: None,
            start: start.into(),
            end: end.into(),
            tzid: None,
            location: None,
            extra: Map::new(),
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the timezone.
    pub fn tzid(mut self, tzid: impl Into<String>) -> Self {
        self.tzid = Some(tzid.into());
        self
    }

    /// Sets the location description.
    pub fn location(mut self, description: impl Into<String>) -> Self {
        self.location = Some(Location {
            description: description.into(),
            lat: None,
            long: None,
        });
        self
    }

    /// Sets any other field.
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Parameters for reading events.
#[derive(Debug, Clone, Default)]
pub struct ReadEventsParams {
    /// Earliest date of events to return.
    pub from: Option<TimeValue>,
    /// Date to return events up until.
    pub to: Option<TimeValue>,
    /// Timezone to interpret dates in; `Etc/UTC` when unset.
    pub tzid: Option<String>,
    /// Include deleted events.
    pub include_deleted: Option<bool>,
    /// Include events that moved out of the window.
    pub include_moved: Option<bool>,
    /// Only return events modified on or after this time.
    pub last_modified: Option<TimeValue>,
    /// Include events managed by this application.
    pub include_managed: Option<bool>,
    /// Only return events managed by this application.
    pub only_managed: Option<bool>,
    /// Restrict to these calendars.
    pub calendar_ids: Vec<String>,
}

impl ReadEventsParams {
    /// Creates empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the start of the window.
    pub fn from(mut self, from: impl Into<TimeValue>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Sets the end of the window.
    pub fn to(mut self, to: impl Into<TimeValue>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Sets the timezone.
    pub fn tzid(mut self, tzid: impl Into<String>) -> Self {
        self.tzid = Some(tzid.into());
        self
    }

    /// Includes deleted events.
    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = Some(include);
        self
    }

    /// Includes moved events.
    pub fn include_moved(mut self, include: bool) -> Self {
        self.include_moved = Some(include);
        self
    }

    /// Sets the last modified threshold.
    pub fn last_modified(mut self, last_modified: impl Into<TimeValue>) -> Self {
        self.last_modified = Some(last_modified.into());
        self
    }

    /// Includes managed events.
    pub fn include_managed(mut self, include: bool) -> Self {
        self.include_managed = Some(include);
        self
    }

    /// Restricts results to events managed by this application.
    pub fn only_managed(mut self, only: bool) -> Self {
        self.only_managed = Some(only);
        self
    }

    /// Restricts to the given calendars.
    pub fn calendar_ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.calendar_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Encodes the parameters as a query string.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![(
            "tzid".to_string(),
            self.tzid.clone().unwrap_or_else(|| DEFAULT_TZID.to_string()),
        )];

        push_time(&mut query, "from", &self.from);
        push_time(&mut query, "to", &self.to);
        push_time(&mut query, "last_modified", &self.last_modified);
        push_opt(&mut query, "include_deleted", self.include_deleted);
        push_opt(&mut query, "include_moved", self.include_moved);
        push_opt(&mut query, "include_managed", self.include_managed);
        push_opt(&mut query, "only_managed", self.only_managed);
        push_list(&mut query, "calendar_ids", &self.calendar_ids);

        query
    }
}

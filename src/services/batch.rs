//! Batch requests.
//!
//! Several API calls are sent in one request; each succeeds or fails on its
//! own. A batch with any failed entry is reported as a partial success
//! error carrying every entry.

use super::events::{ParticipationStatus, UpsertEventRequest};
use crate::client::CalendarClient;
use crate::decode::ResponseParser;
use crate::errors::{CalendarError, CalendarResult};
use crate::transport::HttpMethod;
use crate::types::{BatchEntry, BatchEntryRequest, BatchEntryResponse, BatchResponse};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{instrument, warn};

/// Service for batch requests.
pub struct BatchService<'a> {
    client: &'a CalendarClient,
}

impl<'a> BatchService<'a> {
    /// Creates a new batch service.
    pub fn new(client: &'a CalendarClient) -> Self {
        Self { client }
    }

    /// Sends a batch.
    ///
    /// Returns every entry when all succeeded. When any entry has a status
    /// outside 2xx the result is a partial success error whose
    /// [`batch_response`](CalendarError::batch_response) holds every entry.
    #[instrument(skip(self, batch), fields(entries = batch.len()))]
    pub async fn execute(&self, batch: BatchBuilder) -> CalendarResult<BatchResponse> {
        let requests = batch.build();

        let response = self
            .client
            .send_json(HttpMethod::Post, "/v1/batch", &BatchRequest { batch: &requests })
            .await?;

        let responses: Vec<BatchEntryResponse> =
            ResponseParser::new(&response.body).parse_collection(Some("batch"))?;

        if responses.len() != requests.len() {
            return Err(CalendarError::decode(format!(
                "Batch response has {} entries for {} requests",
                responses.len(),
                requests.len()
            )));
        }

        let entries = requests
            .into_iter()
            .zip(responses)
            .map(|(request, response)| BatchEntry { request, response })
            .collect();
        let result = BatchResponse::new(entries);

        if result.has_errors() {
            warn!(failed = result.errors().count(), "Batch partially succeeded");
            return Err(CalendarError::partial_success(result));
        }

        Ok(result)
    }
}

#[derive(Serialize)]
struct BatchRequest<'r> {
    batch: &'r [BatchEntryRequest],
}

/// Collects the requests of a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchBuilder {
    entries: Vec<BatchEntryRequest>,
}

impl BatchBuilder {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests in the batch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the batch has no requests.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds an arbitrary request.
    pub fn add_entry(
        mut self,
        method: HttpMethod,
        relative_url: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        self.entries.push(BatchEntryRequest {
            method: method.as_str().to_string(),
            relative_url: relative_url.into(),
            data,
            extra: Map::new(),
        });
        self
    }

    /// Adds an event upsert.
    pub fn upsert_event(self, calendar_id: &str, event: &UpsertEventRequest) -> CalendarResult<Self> {
        let data = to_data(event)?;
        Ok(self.add_entry(HttpMethod::Post, events_path(calendar_id), Some(data)))
    }

    /// Adds an event deletion.
    pub fn delete_event(self, calendar_id: &str, event_id: &str) -> Self {
        self.add_entry(
            HttpMethod::Delete,
            events_path(calendar_id),
            Some(json!({ "event_id": event_id })),
        )
    }

    /// Adds an external event deletion.
    pub fn delete_external_event(self, calendar_id: &str, event_uid: &str) -> Self {
        self.add_entry(
            HttpMethod::Delete,
            events_path(calendar_id),
            Some(json!({ "event_uid": event_uid })),
        )
    }

    /// Adds a participation status change.
    pub fn change_participation_status(
        self,
        calendar_id: &str,
        event_uid: &str,
        status: ParticipationStatus,
    ) -> Self {
        self.add_entry(
            HttpMethod::Post,
            format!(
                "/v1/calendars/{}/events/{}/participation_status",
                calendar_id, event_uid
            ),
            Some(json!({ "status": status })),
        )
    }

    /// The requests collected so far.
    pub fn build(self) -> Vec<BatchEntryRequest> {
        self.entries
    }
}

fn events_path(calendar_id: &str) -> String {
    format!("/v1/calendars/{}/events", calendar_id)
}

fn to_data<T: Serialize>(value: &T) -> CalendarResult<Value> {
    serde_json::to_value(value).map_err(|e| {
        CalendarError::invalid_parameter(format!("Failed to encode batch entry: {}", e))
            .with_cause(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_builder_entries() {
        let event = UpsertEventRequest::new(
            "evt_1",
            "Board meeting",
            Utc.with_ymd_and_hms(2014, 8, 5, 15, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2014, 8, 5, 17, 0, 0).unwrap(),
        );

        let entries = BatchBuilder::new()
            .upsert_event("cal_123", &event)
            .unwrap()
            .delete_event("cal_123", "evt_2")
            .change_participation_status("cal_123", "evt_uid", ParticipationStatus::Accepted)
            .build();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].method, "POST");
        assert_eq!(entries[0].relative_url, "/v1/calendars/cal_123/events");
        assert_eq!(
            entries[0].data.as_ref().unwrap()["start"],
            json!("2014-08-05T15:30:00Z")
        );
        assert_eq!(entries[1].method, "DELETE");
        assert_eq!(entries[1].data, Some(json!({ "event_id": "evt_2" })));
        assert_eq!(
            entries[2].relative_url,
            "/v1/calendars/cal_123/events/evt_uid/participation_status"
        );
        assert_eq!(entries[2].data, Some(json!({ "status": "accepted" })));
    }
}

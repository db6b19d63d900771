//! Availability queries.

use crate::client::CalendarClient;
use crate::decode::ResponseParser;
use crate::errors::CalendarResult;
use crate::transport::HttpMethod;
use crate::types::{AvailablePeriod, AvailableSlot, TimeValue};
use serde::ser::Serializer;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::instrument;

/// Service for availability queries.
pub struct AvailabilityService<'a> {
    client: &'a CalendarClient,
}

impl<'a> AvailabilityService<'a> {
    /// Creates a new availability service.
    pub fn new(client: &'a CalendarClient) -> Self {
        Self { client }
    }

    /// Finds when the requested participants are available.
    ///
    /// Depending on the request the API answers with periods or with
    /// fixed-length slots.
    #[instrument(skip(self, request))]
    pub async fn query(&self, request: &AvailabilityRequest) -> CalendarResult<AvailabilityResult> {
        let response = self
            .client
            .send_json(HttpMethod::Post, "/v1/availability", request)
            .await?;

        ResponseParser::new(&response.body).parse_collections(&[
            ("available_periods", |parser, attribute| {
                parser
                    .parse_collection(Some(attribute))
                    .map(AvailabilityResult::Periods)
            }),
            ("available_slots", |parser, attribute| {
                parser
                    .parse_collection(Some(attribute))
                    .map(AvailabilityResult::Slots)
            }),
        ])
    }
}

/// Result of an availability query.
#[derive(Debug, Clone, PartialEq)]
pub enum AvailabilityResult {
    /// Periods of availability.
    Periods(Vec<AvailablePeriod>),
    /// Slots of availability.
    Slots(Vec<AvailableSlot>),
}

/// How many members of a group must be available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequiredParticipants {
    /// Every member.
    #[default]
    All,
    /// At least this many members.
    Count(u32),
}

impl Serialize for RequiredParticipants {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::Count(count) => serializer.serialize_u32(*count),
        }
    }
}

/// A member of a participant group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    /// Account or resource identifier.
    pub sub: String,
    /// Other member options, such as `calendar_ids`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&str> for Member {
    fn from(sub: &str) -> Self {
        Self {
            sub: sub.to_string(),
            extra: Map::new(),
        }
    }
}

impl From<String> for Member {
    fn from(sub: String) -> Self {
        Self {
            sub,
            extra: Map::new(),
        }
    }
}

/// A group of participants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantGroup {
    /// Members of the group.
    pub members: Vec<Member>,
    /// How many members must be available.
    pub required: RequiredParticipants,
}

impl ParticipantGroup {
    /// Creates a group in which every member is required.
    pub fn all(members: impl IntoIterator<Item = impl Into<Member>>) -> Self {
        Self {
            members: members.into_iter().map(Into::into).collect(),
            required: RequiredParticipants::All,
        }
    }

    /// Sets how many members are required.
    pub fn required(mut self, required: RequiredParticipants) -> Self {
        self.required = required;
        self
    }
}

impl From<&str> for ParticipantGroup {
    fn from(sub: &str) -> Self {
        Self::all([sub])
    }
}

impl From<Member> for ParticipantGroup {
    fn from(member: Member) -> Self {
        Self::all([member])
    }
}

/// Length of time participants must be available for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequiredDuration {
    /// Minutes.
    pub minutes: u32,
}

impl From<u32> for RequiredDuration {
    fn from(minutes: u32) -> Self {
        Self { minutes }
    }
}

/// A window to search for availability in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableWindow {
    /// Start.
    pub start: TimeValue,
    /// End.
    pub end: TimeValue,
}

impl AvailableWindow {
    /// Creates a window.
    pub fn new(start: impl Into<TimeValue>, end: impl Into<TimeValue>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Availability query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityRequest {
    /// Participant groups.
    pub participants: Vec<ParticipantGroup>,
    /// Length of time to find.
    pub required_duration: RequiredDuration,
    /// Windows to search in.
    pub available_periods: Vec<AvailableWindow>,
    /// Interval slots start on, requesting slots instead of periods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_interval: Option<RequiredDuration>,
    /// Any other fields to send, such as `buffer`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AvailabilityRequest {
    /// Creates a query.
    pub fn new(
        participants: impl IntoIterator<Item = impl Into<ParticipantGroup>>,
        required_duration: impl Into<RequiredDuration>,
        available_periods: Vec<AvailableWindow>,
    ) -> Self {
        Self {
            participants: participants.into_iter().map(Into::into).collect(),
            required_duration: required_duration.into(),
            available_periods,
            start_interval: None,
            extra: Map::new(),
        }
    }

    /// Requests slots starting on the given interval.
    pub fn start_interval(mut self, interval: impl Into<RequiredDuration>) -> Self {
        self.start_interval = Some(interval.into());
        self
    }

    /// Sets any other field.
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_conveniences() {
        let request = AvailabilityRequest::new(
            ["acc_567236000909002"],
            60u32,
            vec![AvailableWindow::new(
                Utc.with_ymd_and_hms(2017, 1, 3, 9, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2017, 1, 3, 18, 0, 0).unwrap(),
            )],
        );

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "participants": [
                    { "members": [{ "sub": "acc_567236000909002" }], "required": "all" }
                ],
                "required_duration": { "minutes": 60 },
                "available_periods": [
                    { "start": "2017-01-03T09:00:00Z", "end": "2017-01-03T18:00:00Z" }
                ]
            })
        );
    }

    #[test]
    fn test_explicit_group() {
        let group = ParticipantGroup::all(["acc_1", "acc_2"]).required(RequiredParticipants::Count(1));
        let request = AvailabilityRequest::new([group], 30u32, Vec::new()).start_interval(30u32);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["participants"][0]["required"], json!(1));
        assert_eq!(value["start_interval"], json!({ "minutes": 30 }));
    }

    fn client(transport: std::sync::Arc<crate::mocks::MockTransport>) -> CalendarClient {
        let config = crate::config::CalendarConfig::builder()
            .client_id("client_id_123")
            .client_secret("client_secret_456")
            .build()
            .unwrap();
        CalendarClient::with_transport(config, transport).with_tokens("token_123", None)
    }

    fn request() -> AvailabilityRequest {
        AvailabilityRequest::new(
            ["acc_567236000909002"],
            60u32,
            vec![AvailableWindow::new(
                Utc.with_ymd_and_hms(2017, 1, 3, 9, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2017, 1, 3, 18, 0, 0).unwrap(),
            )],
        )
    }

    #[tokio::test]
    async fn test_query_decodes_periods() {
        let transport = std::sync::Arc::new(crate::mocks::MockTransport::new());
        transport.push_json(
            200,
            &json!({
                "available_periods": [
                    {
                        "start": "2017-01-03T09:00:00Z",
                        "end": "2017-01-03T11:00:00Z",
                        "participants": [{ "sub": "acc_567236000909002" }]
                    }
                ]
            })
            .to_string(),
        );
        let client = client(transport.clone());

        let result = client.availability().query(&request()).await.unwrap();

        let periods = match result {
            AvailabilityResult::Periods(periods) => periods,
            other => panic!("expected periods, got {:?}", other),
        };
        assert_eq!(periods.len(), 1);
        assert_eq!(
            periods[0].start.time,
            crate::types::DateOrTime::Time(Utc.with_ymd_and_hms(2017, 1, 3, 9, 0, 0).unwrap())
        );
        assert_eq!(periods[0].participants[0].sub.as_deref(), Some("acc_567236000909002"));

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.url, "https://api.example.com/v1/availability");
        assert_eq!(sent.header_value("authorization"), Some("Bearer token_123"));
        let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::to_value(request()).unwrap());
    }

    #[tokio::test]
    async fn test_query_decodes_slots() {
        let transport = std::sync::Arc::new(crate::mocks::MockTransport::new());
        transport.push_json(
            200,
            &json!({
                "available_slots": [
                    { "start": "2017-01-03T09:00:00Z", "end": "2017-01-03T10:00:00Z" },
                    { "start": "2017-01-03T10:00:00Z", "end": "2017-01-03T11:00:00Z" }
                ]
            })
            .to_string(),
        );
        let client = client(transport);

        let result = client
            .availability()
            .query(&request().start_interval(60u32))
            .await
            .unwrap();

        match result {
            AvailabilityResult::Slots(slots) => {
                assert_eq!(slots.len(), 2);
                assert!(slots[1].participants.is_empty());
            }
            other => panic!("expected slots, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_without_known_attribute_is_decode_error() {
        let transport = std::sync::Arc::new(crate::mocks::MockTransport::new());
        transport.push_json(200, r#"{"sequence": []}"#);
        let client = client(transport);

        let err = client.availability().query(&request()).await.unwrap_err();
        assert_eq!(err.kind(), crate::errors::CalendarErrorKind::Decode);
    }
}

//! Smart invite operations.
//!
//! Smart invites belong to the application rather than to a user, so these
//! calls authenticate with the client secret.

use super::events::Location;
use crate::client::{json_body, Bearer, CalendarClient};
use crate::decode::ResponseParser;
use crate::errors::CalendarResult;
use crate::transport::HttpMethod;
use crate::types::{SmartInviteResponse, TimeValue};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::instrument;

const SMART_INVITES_PATH: &str = "/v1/smart_invites";

/// Service for smart invites.
pub struct SmartInvitesService<'a> {
    client: &'a CalendarClient,
}

impl<'a> SmartInvitesService<'a> {
    /// Creates a new smart invites service.
    pub fn new(client: &'a CalendarClient) -> Self {
        Self { client }
    }

    /// Creates or updates a smart invite.
    #[instrument(skip(self, request), fields(smart_invite_id = %request.smart_invite_id))]
    pub async fn upsert(&self, request: &SmartInviteRequest) -> CalendarResult<SmartInviteResponse> {
        self.post(json_body(request)?).await
    }

    /// Gets the state of a smart invite for one recipient.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        smart_invite_id: &str,
        recipient_email: &str,
    ) -> CalendarResult<SmartInviteResponse> {
        let query = [
            ("smart_invite_id".to_string(), smart_invite_id.to_string()),
            ("recipient_email".to_string(), recipient_email.to_string()),
        ];

        let response = self
            .client
            .executor()
            .execute_as(
                Bearer::ClientSecret,
                HttpMethod::Get,
                SMART_INVITES_PATH,
                &query,
                None,
            )
            .await?;
        ResponseParser::new(&response.body).parse_json(None)
    }

    /// Cancels a smart invite for one recipient.
    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        smart_invite_id: &str,
        recipient_email: &str,
    ) -> CalendarResult<SmartInviteResponse> {
        let request = CancelRequest {
            method: "cancel",
            smart_invite_id,
            recipient: Recipient::new(recipient_email),
        };
        self.post(json_body(&request)?).await
    }

    async fn post(&self, body: String) -> CalendarResult<SmartInviteResponse> {
        let response = self
            .client
            .executor()
            .execute_as(
                Bearer::ClientSecret,
                HttpMethod::Post,
                SMART_INVITES_PATH,
                &[],
                Some(body),
            )
            .await?;
        ResponseParser::new(&response.body).parse_json(None)
    }
}

#[derive(Serialize)]
struct CancelRequest<'r> {
    method: &'static str,
    smart_invite_id: &'r str,
    recipient: Recipient,
}

/// Recipient of a smart invite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    /// Email address.
    pub email: String,
}

impl Recipient {
    /// Creates a recipient.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

/// The event a smart invite is for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmartInviteEvent {
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

impl SmartInviteEvent {
    /// Creates an event.
    pub fn new(
        summary: impl Into<String>,
        start: impl Into<TimeValue>,
        end: impl Into<TimeValue>,
    ) -> Self {
        Self {
            summary: summary.into(),
            description: None,
            start: start.into(),
            end: end.into(),
            tzid: None,
            location: None,
            extra: Map::new(),
        }
    }
}

/// Request to create or update a smart invite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmartInviteRequest {
    /// Identifier chosen by the application.
    pub smart_invite_id: String,
    /// URL replies are posted to.
    pub callback_url: String,
    /// The invited event.
    pub event: SmartInviteEvent,
    /// Single recipient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Recipient>,
    /// Several recipients.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<Recipient>,
    /// Any other fields to send, such as `organizer`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SmartInviteRequest {
    /// Creates a request for a single recipient.
    pub fn new(
        smart_invite_id: impl Into<String>,
        callback_url: impl Into<String>,
        recipient: Recipient,
        event: SmartInviteEvent,
    ) -> Self {
        Self {
            smart_invite_id: smart_invite_id.into(),
            callback_url: callback_url.into(),
            event,
            recipient: Some(recipient),
            recipients: Vec::new(),
            extra: Map::new(),
        }
    }
}

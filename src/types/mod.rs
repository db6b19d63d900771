//! Calendar API domain types.
//!
//! Each type carries the fields the client relies on plus an `extra` map of
//! everything else the API returned, so decoding and re-encoding a value
//! loses nothing.

mod batch;
pub mod time;

pub use batch::{BatchEntry, BatchEntryRequest, BatchEntryResponse, BatchResponse};
pub use time::{DateOrTime, EventTime, IntoDateOrTime, TimeValue};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Page metadata of a paged response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pages {
    /// Current page number, from 1.
    #[serde(default)]
    pub current: u32,
    /// Total number of pages.
    #[serde(default)]
    pub total: u32,
    /// Absolute URL of the next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

/// A calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    /// Calendar identifier.
    pub calendar_id: String,
    /// Calendar name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_name: Option<String>,
    /// Provider name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    /// Profile the calendar belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    /// Profile name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    /// Whether the calendar is read only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_readonly: Option<bool>,
    /// Whether the calendar is deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_deleted: Option<bool>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A push notification channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel identifier.
    pub channel_id: String,
    /// URL notifications are posted to.
    pub callback_url: String,
    /// Notification filters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Calendar the event is in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
    /// Provider-wide event identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_uid: Option<String>,
    /// Identifier given by the application that created the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Start.
    pub start: EventTime,
    /// End.
    pub end: EventTime,
    /// Whether the event is deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    /// Participation status of the account owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participation_status: Option<String>,
    /// When the event was created.
    #[serde(
        default,
        with = "time::iso8601_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<DateTime<Utc>>,
    /// When the event was last updated.
    #[serde(
        default,
        with = "time::iso8601_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated: Option<DateTime<Utc>>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A busy period of a calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeBusy {
    /// Calendar the period belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
    /// Start.
    pub start: EventTime,
    /// End.
    pub end: EventTime,
    /// Status, such as `busy` or `tentative`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_busy_status: Option<String>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A participant of an available period or slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Account or resource identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A period in which the requested participants are available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailablePeriod {
    /// Start.
    pub start: EventTime,
    /// End.
    pub end: EventTime,
    /// Participants available for the period.
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A fixed-length slot in which the requested participants are available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableSlot {
    /// Start.
    pub start: EventTime,
    /// End.
    pub end: EventTime,
    /// Participants available for the slot.
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A time proposed in reply to a smart invite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposed start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    /// Proposed end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A recipient's reply to a smart invite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartInviteReply {
    /// Recipient email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Reply status, such as `accepted`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Comment left with the reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Alternative time proposed by the recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal: Option<Proposal>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// State of a smart invite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartInviteResponse {
    /// Smart invite identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_invite_id: Option<String>,
    /// URL replies are posted to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// The single recipient, for one-to-one invites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<SmartInviteReply>,
    /// Replies of all recipients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<SmartInviteReply>,
    /// The invited event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Value>,
    /// Attachments, such as the ICS invite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Value>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A calendar service profile connected to the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Provider name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    /// Profile identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    /// Profile name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    /// Whether the profile is connected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_connected: Option<bool>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Default timezone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tzid: Option<String>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// OpenID-style user information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Subject identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A bookable resource such as a meeting room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

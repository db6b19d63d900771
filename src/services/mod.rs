//! Calendar API services.
//!
//! Each service is a thin set of call sites over the client's request
//! pipeline.

mod account;
mod availability;
mod batch;
mod calendars;
mod channels;
mod events;
mod free_busy;
mod smart_invites;

pub use account::AccountService;
pub use availability::{
    AvailabilityRequest, AvailabilityResult, AvailabilityService, AvailableWindow, Member,
    ParticipantGroup, RequiredDuration, RequiredParticipants,
};
pub use batch::{BatchBuilder, BatchService};
pub use calendars::{CalendarsService, CreateCalendarRequest};
pub use channels::{ChannelFilters, ChannelsService};
pub use events::{
    EventsService, Location, ParticipationStatus, ReadEventsParams, UpsertEventRequest,
};
pub use free_busy::{FreeBusyParams, FreeBusyService};
pub use smart_invites::{Recipient, SmartInviteEvent, SmartInviteRequest, SmartInvitesService};

use crate::types::TimeValue;

/// Appends a time parameter to a query, encoded.
pub(crate) fn push_time(query: &mut Vec<(String, String)>, key: &str, value: &Option<TimeValue>) {
    if let Some(value) = value {
        query.push((key.to_string(), value.to_query_value()));
    }
}

/// Appends an optional parameter to a query.
pub(crate) fn push_opt<T: ToString>(query: &mut Vec<(String, String)>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        query.push((key.to_string(), value.to_string()));
    }
}

/// Appends a list parameter to a query, one `key[]` pair per element.
pub(crate) fn push_list(query: &mut Vec<(String, String)>, key: &str, values: &[String]) {
    let key = format!("{}[]", key);
    for value in values {
        query.push((key.clone(), value.clone()));
    }
}

//! Free/busy operations.

use super::events::DEFAULT_TZID;
use super::{push_list, push_opt, push_time};
use crate::client::CalendarClient;
use crate::errors::CalendarResult;
use crate::pagination::Paginator;
use crate::types::{FreeBusy, TimeValue};
use tracing::instrument;

/// Service for free/busy operations.
pub struct FreeBusyService<'a> {
    client: &'a CalendarClient,
}

impl<'a> FreeBusyService<'a> {
    /// Creates a new free/busy service.
    pub fn new(client: &'a CalendarClient) -> Self {
        Self { client }
    }

    /// Reads busy periods across all calendars.
    #[instrument(skip(self, params))]
    pub async fn read(&self, params: &FreeBusyParams) -> CalendarResult<Paginator<'a, FreeBusy>> {
        Paginator::start(
            self.client.executor(),
            "/v1/free_busy",
            params.to_query(),
            "free_busy",
        )
        .await
    }
}

/// Parameters for reading free/busy periods.
#[derive(Debug, Clone, Default)]
pub struct FreeBusyParams {
    /// Earliest date of periods to return.
    pub from: Option<TimeValue>,
    /// Date to return periods up until.
    pub to: Option<TimeValue>,
    /// Timezone to interpret dates in; `Etc/UTC` when unset.
    pub tzid: Option<String>,
    /// Include periods of events managed by this application.
    pub include_managed: Option<bool>,
    /// Restrict to these calendars.
    pub calendar_ids: Vec<String>,
}

impl FreeBusyParams {
    /// Creates empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the window.
    pub fn window(mut self, from: impl Into<TimeValue>, to: impl Into<TimeValue>) -> Self {
        self.from = Some(from.into());
        self.to = Some(to.into());
        self
    }

    /// Sets the timezone.
    pub fn tzid(mut self, tzid: impl Into<String>) -> Self {
        self.tzid = Some(tzid.into());
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
        push_opt(&mut query, "include_managed", self.include_managed);
        push_list(&mut query, "calendar_ids", &self.calendar_ids);

        query
    }
}

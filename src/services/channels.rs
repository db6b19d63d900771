//! Notification channel operations.

use crate::client::CalendarClient;
use crate::decode::ResponseParser;
use crate::errors::CalendarResult;
use crate::transport::HttpMethod;
use crate::types::Channel;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Service for notification channels.
pub struct ChannelsService<'a> {
    client: &'a CalendarClient,
}

impl<'a> ChannelsService<'a> {
    /// Creates a new channels service.
    pub fn new(client: &'a CalendarClient) -> Self {
        Self { client }
    }

    /// Creates a channel posting change notifications to `callback_url`.
    #[instrument(skip(self, filters))]
    pub async fn create(
        &self,
        callback_url: &str,
        filters: Option<ChannelFilters>,
    ) -> CalendarResult<Channel> {
        let request = CreateChannelRequest {
            callback_url,
            filters,
        };

        let response = self
            .client
            .send_json(HttpMethod::Post, "/v1/channels", &request)
            .await?;
        ResponseParser::new(&response.body).parse_json(Some("channel"))
    }

    /// Lists open channels.
    pub async fn list(&self) -> CalendarResult<Vec<Channel>> {
        self.client
            .get_collection("/v1/channels", "channels")
            .await
    }

    /// Closes a channel.
    #[instrument(skip(self))]
    pub async fn close(&self, channel_id: &str) -> CalendarResult<()> {
        self.client
            .executor()
            .execute(
                HttpMethod::Delete,
                &format!("/v1/channels/{}", channel_id),
                &[],
                None,
            )
            .await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct CreateChannelRequest<'r> {
    callback_url: &'r str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<ChannelFilters>,
}

/// Restricts which changes a channel notifies about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelFilters {
    /// Only notify about events managed by this application.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_managed: Option<bool>,
    /// Only notify about these calendars.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calendar_ids: Vec<String>,
}

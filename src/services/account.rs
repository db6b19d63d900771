//! Account, profile and resource operations.

use crate::client::CalendarClient;
use crate::errors::CalendarResult;
use crate::types::{Account, Profile, Resource, UserInfo};

/// Service for account information.
pub struct AccountService<'a> {
    client: &'a CalendarClient,
}

impl<'a> AccountService<'a> {
    /// Creates a new account service.
    pub fn new(client: &'a CalendarClient) -> Self {
        Self { client }
    }

    /// Gets the authenticated account.
    pub async fn account(&self) -> CalendarResult<Account> {
        self.client.get("/v1/account", &[], Some("account")).await
    }

    /// Gets user information for the access token.
    pub async fn userinfo(&self) -> CalendarResult<UserInfo> {
        self.client.get("/v1/userinfo", &[], None).await
    }

    /// Lists connected calendar profiles.
    pub async fn list_profiles(&self) -> CalendarResult<Vec<Profile>> {
        self.client
            .get_collection("/v1/profiles", "profiles")
            .await
    }

    /// Lists bookable resources of the account's organization.
    pub async fn resources(&self) -> CalendarResult<Vec<Resource>> {
        self.client
            .get_collection("/v1/resources", "resources")
            .await
    }
}

//! Authentication for the calendar client.
//!
//! Holds the current [`Credentials`] in a [`CredentialStore`] and drives the
//! OAuth2 token lifecycle through [`AuthFlow`].

mod credentials;
mod flow;

pub use credentials::{Credentials, LinkingProfile};
pub use flow::{AuthFlow, Scope};

use parking_lot::RwLock;

/// Holds the credentials of one client.
///
/// Reads and writes never fail and never touch the network.
#[derive(Default)]
pub struct CredentialStore {
    credentials: RwLock<Option<Credentials>>,
}

impl CredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a token pair, replacing any previous credentials.
    pub fn set(&self, access_token: impl Into<String>, refresh_token: Option<String>) {
        self.replace(Credentials::new(access_token, refresh_token));
    }

    /// Swaps in a full set of credentials.
    pub fn replace(&self, credentials: Credentials) {
        *self.credentials.write() = Some(credentials);
    }

    /// Returns true if an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Removes all tokens.
    pub fn clear(&self) {
        *self.credentials.write() = None;
    }

    /// Returns a copy of the current credentials.
    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials.read().clone()
    }

    /// Returns the current access token.
    pub fn access_token(&self) -> Option<String> {
        self.credentials
            .read()
            .as_ref()
            .map(|c| c.access_token.clone())
            .filter(|t| !t.is_empty())
    }

    /// Returns the current refresh token.
    pub fn refresh_token(&self) -> Option<String> {
        self.credentials
            .read()
            .as_ref()
            .and_then(|c| c.refresh_token.clone())
            .filter(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

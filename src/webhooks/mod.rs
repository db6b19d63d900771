//! Push notification verification.
//!
//! Notifications carry an HMAC header holding one or more comma-separated
//! base64 signatures of the body, keyed with the client secret.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::{debug, warn};

/// Verifies notification signatures.
pub struct HmacVerifier {
    secret: SecretString,
}

impl HmacVerifier {
    /// Creates a verifier for the given client secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Returns true if any of the comma-separated signatures matches the body.
    pub fn verify(&self, header: &str, body: &[u8]) -> bool {
        let Some(expected) = self.compute_signature(body) else {
            return false;
        };

        let valid = header
            .split(',')
            .map(str::trim)
            .filter(|candidate| !candidate.is_empty())
            .any(|candidate| constant_time_eq(candidate.as_bytes(), expected.as_bytes()));

        if valid {
            debug!("Notification signature verified");
        } else {
            warn!("Notification signature verification failed");
        }

        valid
    }

    /// Computes base64(HMAC-SHA256(secret, body)).
    pub fn compute_signature(&self, body: &[u8]) -> Option<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes()).ok()?;
        mac.update(body);
        Some(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for HmacVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

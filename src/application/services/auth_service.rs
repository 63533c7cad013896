//! Authentication service for the admin bearer token.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AppError;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// Checks bearer tokens against the configured admin token.
///
/// Both sides are MACed with a per-process random key and the MACs compared
/// in constant time, so response timing reveals nothing about the token.
pub struct AuthService {
    key: [u8; 32],
    expected_mac: Vec<u8>,
}

impl AuthService {
    /// Creates a service accepting exactly `admin_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS random source is unavailable.
    pub fn new(admin_token: &str) -> Result<Self, getrandom::Error> {
        let mut key = [0u8; 32];
        getrandom::fill(&mut key)?;
        Ok(Self::with_key(key, admin_token))
    }

    fn with_key(key: [u8; 32], admin_token: &str) -> Self {
        let expected_mac = Self::mac(&key, admin_token).finalize().into_bytes().to_vec();
        Self { key, expected_mac }
    }

    fn mac(key: &[u8], token: &str) -> HmacSha256 {
        let mut mac =
            <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
        mac.update(token.as_bytes());
        mac
    }

    /// Authenticates a raw bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token does not match.
    pub fn authenticate(&self, token: &str) -> Result<(), AppError> {
        Self::mac(&self.key, token)
            .verify_slice(&self.expected_mac)
            .map_err(|_| {
                AppError::unauthorized("Unauthorized", json!({"reason": "Invalid admin token"}))
            })
    }
}

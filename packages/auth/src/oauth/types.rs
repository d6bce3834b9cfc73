// ABOUTME: Core type definitions for the OAuth connection lifecycle
// ABOUTME: Stored credentials, provider wire responses, and status snapshots

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::oauth::platform::Platform;
use crate::oauth::profile::CanonicalProfile;

/// Refresh when within this many seconds of expiry
pub const REFRESH_BUFFER_SECS: i64 = 300;

/// Durable OAuth credential for one (user, platform) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub user_id: String,
    pub platform: Platform,
    pub access_token: String, // Encrypted in database
    pub refresh_token: Option<String>, // Encrypted in database
    /// Unix timestamp; None means the credential does not expire
    pub expires_at: Option<i64>,
    pub scope: Option<String>,
    pub profile: Option<CanonicalProfile>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl StoredToken {
    /// Check if the credential is past its expiry. Tokens without an
    /// expiry never expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now().timestamp() >= expires_at,
            None => false,
        }
    }

    /// Check if the credential is within the refresh buffer of expiry
    pub fn needs_refresh(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now().timestamp() >= expires_at - REFRESH_BUFFER_SECS,
            None => false,
        }
    }
}

/// Token endpoint response from a provider
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Seconds until expiry; absent for non-expiring tokens
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
}

/// Result of a completed callback, returned to the caller.
/// Carries profile and token metadata, never the raw secrets.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionData {
    pub platform: Platform,
    pub user_id: String,
    pub profile: CanonicalProfile,
    pub scope: Option<String>,
    pub expires_at: Option<i64>,
}

/// Read-only connection snapshot for one platform
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlatformStatus {
    pub connected: bool,
    pub expired: bool,
    pub profile: Option<CanonicalProfile>,
}

/// Authorization URL plus the state correlating the eventual callback
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizeUrl {
    pub auth_url: String,
    pub state: String,
}

/// Payload recovered when a state is consumed on callback
#[derive(Debug, Clone)]
pub struct StatePayload {
    pub platform: Platform,
    pub user_id: String,
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// PKCE challenge for the Twitter flow
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
    pub code_challenge_method: String, // Always "S256"
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test token with custom expiry offset from now
    fn token_expiring_in(expires_in_seconds: Option<i64>) -> StoredToken {
        StoredToken {
            user_id: "user-1".to_string(),
            platform: Platform::LinkedIn,
            access_token: "tok".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: expires_in_seconds.map(|s| Utc::now().timestamp() + s),
            scope: Some("openid profile".to_string()),
            profile: None,
            created_at: Utc::now().timestamp(),
            updated_at: Utc::now().timestamp(),
        }
    }

    #[test]
    fn test_token_within_buffer_needs_refresh() {
        // Expires in 4 minutes, inside the 5-minute buffer
        let token = token_expiring_in(Some(240));
        assert!(token.needs_refresh());
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_outside_buffer_does_not_need_refresh() {
        // Expires in 10 minutes, outside the buffer
        let token = token_expiring_in(Some(600));
        assert!(!token.needs_refresh());
        assert!(!token.is_expired());
    }

    #[test]
    fn test_expired_token() {
        let token = token_expiring_in(Some(-60));
        assert!(token.is_expired());
        assert!(token.needs_refresh());
    }

    #[test]
    fn test_non_expiring_token_always_valid() {
        let token = token_expiring_in(None);
        assert!(!token.is_expired());
        assert!(!token.needs_refresh());
    }

    #[test]
    fn test_refresh_buffer_boundary() {
        // Just inside the buffer
        let inside = token_expiring_in(Some(REFRESH_BUFFER_SECS - 1));
        assert!(inside.needs_refresh());

        // Just outside the buffer
        let outside = token_expiring_in(Some(REFRESH_BUFFER_SECS + 2));
        assert!(!outside.needs_refresh());
    }
}

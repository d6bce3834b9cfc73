// ABOUTME: Error types for OAuth connection and credential operations
// ABOUTME: Covers state validation, token exchange, refresh, and storage failures

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Platform not configured: {0}")]
    PlatformNotConfigured(String),

    #[error("Invalid or already-consumed OAuth state")]
    InvalidState,

    #[error("OAuth state expired")]
    StateExpired,

    #[error("Token exchange failed for {platform}: {detail}")]
    TokenExchangeFailed { platform: String, detail: String },

    #[error("Profile fetch failed for {platform}: {detail}")]
    ProfileFetchFailed { platform: String, detail: String },

    #[error("Token refresh failed for {platform}: {detail}")]
    RefreshFailed { platform: String, detail: String },

    #[error("Token expired with no refresh token for {0}, full reconnect required")]
    TokenExpiredNoRefresh(String),

    #[error("No connection for platform: {0}")]
    NoConnection(String),

    #[error("PKCE error: {0}")]
    Pkce(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Encryption error: {0}")]
    Encryption(#[from] crosspost_security::EncryptionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

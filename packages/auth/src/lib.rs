// ABOUTME: Crosspost authentication library providing OAuth flows for social platforms
// ABOUTME: Supports Twitter, LinkedIn, Facebook, Instagram, and YouTube connections

pub mod db;
pub mod error;
pub mod oauth;

// Re-export main types
pub use error::{AuthError, AuthResult};
pub use oauth::{
    AuthorizeUrl, CanonicalProfile, ConnectionData, OAuthManager, Platform, PlatformStatus,
    ProviderConfig, ProviderRegistry, StateStore, StoredToken, TokenResponse, TokenStore,
};

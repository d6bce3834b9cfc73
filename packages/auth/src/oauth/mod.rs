// ABOUTME: OAuth module covering the connection lifecycle for social platforms
// ABOUTME: Registry, state store, token store, orchestrator, and revocation

pub mod manager;
pub mod pkce;
pub mod platform;
pub mod profile;
pub mod registry;
pub mod retry;
pub mod revoke;
pub mod state;
pub mod storage;
pub mod types;

pub use manager::OAuthManager;
pub use platform::Platform;
pub use profile::CanonicalProfile;
pub use registry::{ProviderConfig, ProviderRegistry};
pub use state::StateStore;
pub use storage::TokenStore;
pub use types::{
    AuthorizeUrl, ConnectionData, PkceChallenge, PlatformStatus, StatePayload, StoredToken,
    TokenResponse,
};

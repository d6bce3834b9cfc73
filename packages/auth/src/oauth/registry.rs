// ABOUTME: Immutable provider registry built once from environment at startup
// ABOUTME: Answers config lookups and "is this platform usable" queries

use std::collections::HashMap;

use crate::error::{AuthError, AuthResult};
use crate::oauth::platform::Platform;

/// Static OAuth configuration for one platform
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub platform: Platform,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
    pub revoke_url: Option<String>,
    pub api_version: Option<String>,
}

impl ProviderConfig {
    /// Build the default config for a platform from environment variables
    fn from_env(platform: Platform, redirect_base: &str) -> Self {
        Self {
            platform,
            client_id: std::env::var(platform.client_id_env()).unwrap_or_default(),
            client_secret: std::env::var(platform.client_secret_env()).unwrap_or_default(),
            redirect_uri: format!("{}/api/oauth/callback/{}", redirect_base, platform),
            scopes: platform.scopes().iter().map(|s| s.to_string()).collect(),
            authorize_url: platform.authorize_url().to_string(),
            token_url: platform.token_url().to_string(),
            profile_url: platform.profile_url().to_string(),
            revoke_url: platform.revoke_url().map(|u| u.to_string()),
            api_version: None,
        }
    }

    /// True iff client id and secret are both non-empty
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Read-only lookup over static provider configuration.
///
/// Constructed once at process start and passed by reference to the
/// orchestrator; no runtime mutation.
#[derive(Debug)]
pub struct ProviderRegistry {
    configs: HashMap<Platform, ProviderConfig>,
}

impl ProviderRegistry {
    /// Load configuration for every supported platform from the environment.
    ///
    /// `OAUTH_REDIRECT_BASE_URL` sets the public base for callback URLs.
    pub fn from_env() -> Self {
        let redirect_base = std::env::var("OAUTH_REDIRECT_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:4173".to_string());

        let configs = Platform::all()
            .into_iter()
            .map(|p| (p, ProviderConfig::from_env(p, &redirect_base)))
            .collect();

        Self { configs }
    }

    /// Build a registry from explicit configs (tests point these at mock servers)
    pub fn with_configs(configs: Vec<ProviderConfig>) -> Self {
        Self {
            configs: configs.into_iter().map(|c| (c.platform, c)).collect(),
        }
    }

    /// Get the config for a platform, failing if credentials are missing
    pub fn get(&self, platform: Platform) -> AuthResult<&ProviderConfig> {
        self.configs
            .get(&platform)
            .filter(|c| c.is_configured())
            .ok_or_else(|| AuthError::PlatformNotConfigured(platform.to_string()))
    }

    /// True iff the platform has both client id and secret
    pub fn is_configured(&self, platform: Platform) -> bool {
        self.configs
            .get(&platform)
            .map(|c| c.is_configured())
            .unwrap_or(false)
    }

    /// All platforms with usable credentials
    pub fn configured_platforms(&self) -> Vec<Platform> {
        Platform::all()
            .into_iter()
            .filter(|p| self.is_configured(*p))
            .collect()
    }
}

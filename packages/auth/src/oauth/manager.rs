// ABOUTME: OAuth orchestrator coordinating the full connection lifecycle
// ABOUTME: Builds authorize URLs, handles callbacks, refreshes, and disconnects

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    error::{AuthError, AuthResult},
    oauth::{
        pkce::generate_pkce_challenge,
        platform::Platform,
        profile::{self, CanonicalProfile},
        registry::{ProviderConfig, ProviderRegistry},
        revoke,
        state::StateStore,
        storage::TokenStore,
        types::{AuthorizeUrl, ConnectionData, PlatformStatus, StoredToken, TokenResponse},
    },
};

/// Bound on every outbound provider call
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth manager coordinating connection flows for all platforms.
///
/// Per (user, platform) pair the connection moves through
/// DISCONNECTED -> PENDING -> CONNECTED -> (EXPIRED | REVOKED) -> DISCONNECTED.
pub struct OAuthManager {
    registry: Arc<ProviderRegistry>,
    states: StateStore,
    tokens: TokenStore,
    client: Client,
}

impl OAuthManager {
    /// Create a new OAuth manager with a database pool and provider registry
    pub fn new(pool: SqlitePool, registry: Arc<ProviderRegistry>) -> AuthResult<Self> {
        let client = Client::builder().timeout(PROVIDER_TIMEOUT).build()?;

        Ok(Self {
            registry,
            states: StateStore::new(pool.clone()),
            tokens: TokenStore::new(pool)?,
            client,
        })
    }

    /// DISCONNECTED -> PENDING: build the provider authorize URL for a new flow.
    ///
    /// `options` rides along in the state record and comes back on callback.
    /// Nothing is persisted in the token store at this point.
    pub async fn authorize_url(
        &self,
        platform: Platform,
        user_id: &str,
        mut options: serde_json::Map<String, Value>,
    ) -> AuthResult<AuthorizeUrl> {
        let config = self.registry.get(platform)?;
        info!("Starting OAuth flow for {} user {}", platform, user_id);

        let pkce = if platform.uses_pkce() {
            Some(generate_pkce_challenge()?)
        } else {
            None
        };
        if let Some(pkce) = &pkce {
            // The verifier must survive until the callback request
            options.insert(
                "code_verifier".to_string(),
                Value::String(pkce.code_verifier.clone()),
            );
        }

        let state = self.states.create(platform, user_id, options).await?;

        let mut url = Url::parse(&config.authorize_url)
            .map_err(|e| AuthError::Configuration(format!("Invalid authorize URL: {}", e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &config.client_id)
                .append_pair("redirect_uri", &config.redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &config.scopes.join(" "))
                .append_pair("state", &state);

            if let Some(pkce) = &pkce {
                pairs
                    .append_pair("code_challenge", &pkce.code_challenge)
                    .append_pair("code_challenge_method", &pkce.code_challenge_method);
            }
            if platform.offline_access() {
                pairs
                    .append_pair("access_type", "offline")
                    .append_pair("prompt", "consent");
            }
        }

        Ok(AuthorizeUrl {
            auth_url: url.to_string(),
            state,
        })
    }

    /// PENDING -> CONNECTED: validate the callback state, exchange the code,
    /// normalize the profile, and persist the credential.
    pub async fn handle_callback(
        &self,
        platform: Platform,
        code: &str,
        state: &str,
    ) -> AuthResult<ConnectionData> {
        let payload = self.states.consume(state).await?;
        if payload.platform != platform {
            error!(
                "State platform mismatch: expected {}, got {}",
                payload.platform, platform
            );
            return Err(AuthError::InvalidState);
        }

        let config = self.registry.get(platform)?;

        let code_verifier = payload.options.get("code_verifier").and_then(Value::as_str);
        let mut token = self.exchange_code(config, code, code_verifier).await?;

        if platform.long_lived_exchange() {
            match self.exchange_long_lived(config, &token.access_token).await {
                Some(long_lived) => {
                    token.access_token = long_lived.access_token;
                    token.expires_in = long_lived.expires_in;
                    if long_lived.refresh_token.is_some() {
                        token.refresh_token = long_lived.refresh_token;
                    }
                }
                None => warn!(
                    "Long-lived token exchange failed for {}, keeping short-lived token",
                    platform
                ),
            }
        }

        let profile = match self.fetch_profile(config, &token.access_token).await {
            Ok(profile) => profile,
            Err(e) => {
                // The connection is still usable for publishing even if we
                // cannot label it
                warn!("{} - storing placeholder profile", e);
                CanonicalProfile::unknown()
            }
        };

        let stored = self
            .tokens
            .save(&payload.user_id, platform, &token, &profile)
            .await?;

        info!("Connected {} for user {}", platform, stored.user_id);

        Ok(ConnectionData {
            platform,
            user_id: stored.user_id,
            profile,
            scope: stored.scope,
            expires_at: stored.expires_at,
        })
    }

    /// Return a usable access token, refreshing when within the 5-minute
    /// buffer of expiry and a refresh token is on file.
    pub async fn access_token(&self, user_id: &str, platform: Platform) -> AuthResult<String> {
        let token = self
            .tokens
            .get(user_id, platform)
            .await?
            .ok_or_else(|| AuthError::NoConnection(platform.to_string()))?;

        if token.needs_refresh() {
            if token.refresh_token.is_some() {
                debug!("Token for {} within refresh buffer, refreshing", platform);
                let refreshed = self.refresh(&token).await?;
                return Ok(refreshed.access_token);
            }
            if token.is_expired() {
                return Err(AuthError::TokenExpiredNoRefresh(platform.to_string()));
            }
            // Inside the buffer but not yet expired and not renewable:
            // hand out the stored token for its remaining lifetime
        }

        Ok(token.access_token)
    }

    /// CONNECTED -> DISCONNECTED: best-effort provider revocation, then
    /// local deletion. Idempotent; returns false when nothing was stored.
    pub async fn disconnect(&self, user_id: &str, platform: Platform) -> AuthResult<bool> {
        let Some(token) = self.tokens.get(user_id, platform).await? else {
            return Ok(false);
        };

        if let Ok(config) = self.registry.get(platform) {
            // Revocation failures are logged inside and never block deletion
            let _ = revoke::revoke(platform, config, &token.access_token, &self.client).await;
        }

        let deleted = self.tokens.delete(user_id, platform).await?;
        info!("Disconnected {} for user {}", platform, user_id);
        Ok(deleted)
    }

    /// Read-only connection snapshot for every supported platform.
    /// Never triggers a refresh; that only happens in `access_token`.
    pub async fn connection_status(
        &self,
        user_id: &str,
    ) -> AuthResult<HashMap<Platform, PlatformStatus>> {
        let mut statuses: HashMap<Platform, PlatformStatus> = Platform::all()
            .into_iter()
            .map(|p| (p, PlatformStatus::default()))
            .collect();

        for token in self.tokens.list_by_user(user_id).await? {
            let expired = token.is_expired();
            statuses.insert(
                token.platform,
                PlatformStatus {
                    connected: !expired,
                    expired,
                    profile: token.profile,
                },
            );
        }

        Ok(statuses)
    }

    /// Exchange an authorization code for tokens (form-encoded POST)
    async fn exchange_code(
        &self,
        config: &ProviderConfig,
        code: &str,
        code_verifier: Option<&str>,
    ) -> AuthResult<TokenResponse> {
        let platform = config.platform;

        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &config.redirect_uri),
            ("client_id", &config.client_id),
        ];
        if let Some(verifier) = code_verifier {
            form.push(("code_verifier", verifier));
        }

        let mut request = self.client.post(&config.token_url);
        if platform.uses_basic_auth() {
            request = request.basic_auth(&config.client_id, Some(&config.client_secret));
        } else {
            form.push(("client_secret", &config.client_secret));
        }

        let response =
            request
                .form(&form)
                .send()
                .await
                .map_err(|e| AuthError::TokenExchangeFailed {
                    platform: platform.to_string(),
                    detail: format!("request failed: {}", e),
                })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Token exchange failed for {} with status {}", platform, status);
            return Err(AuthError::TokenExchangeFailed {
                platform: platform.to_string(),
                detail: format!("status {}: {}", status, body),
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed {
                platform: platform.to_string(),
                detail: format!("invalid token response: {}", e),
            })
    }

    /// Best-effort exchange of a short-lived Facebook/Instagram token for a
    /// ~60-day one. None means "keep the short-lived token".
    async fn exchange_long_lived(
        &self,
        config: &ProviderConfig,
        short_lived: &str,
    ) -> Option<TokenResponse> {
        let platform = config.platform;

        let result = self
            .client
            .get(&config.token_url)
            .query(&[
                ("grant_type", "fb_exchange_token"),
                ("client_id", config.client_id.as_str()),
                ("client_secret", config.client_secret.as_str()),
                ("fb_exchange_token", short_lived),
            ])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<TokenResponse>().await {
                    Ok(token) => {
                        debug!("Exchanged {} token for long-lived token", platform);
                        Some(token)
                    }
                    Err(e) => {
                        warn!("Invalid long-lived token response from {}: {}", platform, e);
                        None
                    }
                }
            }
            Ok(response) => {
                warn!(
                    "Long-lived exchange rejected by {}: status {}",
                    platform,
                    response.status()
                );
                None
            }
            Err(e) => {
                warn!("Long-lived exchange request to {} failed: {}", platform, e);
                None
            }
        }
    }

    /// Fetch and normalize the user profile for display
    async fn fetch_profile(
        &self,
        config: &ProviderConfig,
        access_token: &str,
    ) -> AuthResult<CanonicalProfile> {
        let platform = config.platform;

        let response = self
            .client
            .get(&config.profile_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::ProfileFetchFailed {
                platform: platform.to_string(),
                detail: format!("request failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(AuthError::ProfileFetchFailed {
                platform: platform.to_string(),
                detail: format!("status {}", response.status()),
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| AuthError::ProfileFetchFailed {
                platform: platform.to_string(),
                detail: format!("invalid profile response: {}", e),
            })?;

        profile::normalize(platform, &raw).ok_or_else(|| AuthError::ProfileFetchFailed {
            platform: platform.to_string(),
            detail: "unrecognized profile shape".to_string(),
        })
    }

    /// CONNECTED -> CONNECTED: renew the credential with the refresh token
    async fn refresh(&self, existing: &StoredToken) -> AuthResult<StoredToken> {
        let platform = existing.platform;
        let config = self.registry.get(platform)?;
        let refresh_token =
            existing
                .refresh_token
                .as_deref()
                .ok_or_else(|| AuthError::RefreshFailed {
                    platform: platform.to_string(),
                    detail: "no refresh token available".to_string(),
                })?;

        info!("Refreshing {} token for user {}", platform, existing.user_id);

        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &config.client_id),
        ];

        let mut request = self.client.post(&config.token_url);
        if platform.uses_basic_auth() {
            request = request.basic_auth(&config.client_id, Some(&config.client_secret));
        } else {
            form.push(("client_secret", &config.client_secret));
        }

        let response = request
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed {
                platform: platform.to_string(),
                detail: format!("request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            error!("Token refresh failed for {} with status {}", platform, status);
            return Err(AuthError::RefreshFailed {
                platform: platform.to_string(),
                detail: format!("status {}", status),
            });
        }

        let mut token: TokenResponse =
            response.json().await.map_err(|e| AuthError::RefreshFailed {
                platform: platform.to_string(),
                detail: format!("invalid token response: {}", e),
            })?;

        // Providers don't always rotate the refresh token; keep the old one
        if token.refresh_token.is_none() {
            token.refresh_token = existing.refresh_token.clone();
        }

        let profile = existing
            .profile
            .clone()
            .unwrap_or_else(CanonicalProfile::unknown);
        let stored = self
            .tokens
            .save(&existing.user_id, platform, &token, &profile)
            .await?;

        info!("Refreshed {} token for user {}", platform, existing.user_id);
        Ok(stored)
    }
}

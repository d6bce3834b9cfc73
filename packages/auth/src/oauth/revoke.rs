// ABOUTME: Best-effort provider-side token revocation on disconnect
// ABOUTME: Zero or one HTTP call per platform; failures log and never block deletion

use reqwest::Client;
use tracing::{debug, warn};

use crate::oauth::platform::Platform;
use crate::oauth::registry::ProviderConfig;

/// Attempt to invalidate the token at the provider.
///
/// Returns Some(()) when the provider acknowledged the revocation and
/// None otherwise — including for platforms with no revoke endpoint
/// (LinkedIn), which is a deliberate no-op rather than an error.
pub async fn revoke(
    platform: Platform,
    config: &ProviderConfig,
    access_token: &str,
    client: &Client,
) -> Option<()> {
    let url = config.revoke_url.as_deref()?;

    let result = match platform {
        Platform::Twitter => {
            client
                .post(url)
                .basic_auth(&config.client_id, Some(&config.client_secret))
                .form(&[
                    ("token", access_token),
                    ("token_type_hint", "access_token"),
                ])
                .send()
                .await
        }
        // Graph API revokes by deleting the app's permissions
        Platform::Facebook | Platform::Instagram => {
            client
                .delete(url)
                .query(&[("access_token", access_token)])
                .send()
                .await
        }
        _ => client.post(url).form(&[("token", access_token)]).send().await,
    };

    match result {
        Ok(response) if response.status().is_success() => {
            debug!("Revoked {} token at provider", platform);
            Some(())
        }
        Ok(response) => {
            warn!(
                "Provider rejected {} token revocation: status {}",
                platform,
                response.status()
            );
            None
        }
        Err(e) => {
            warn!("Failed to reach {} revoke endpoint: {}", platform, e);
            None
        }
    }
}

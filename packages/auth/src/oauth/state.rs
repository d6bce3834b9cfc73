// ABOUTME: CSRF state store correlating flow initiation with its callback
// ABOUTME: States are unpredictable, expire after 10 minutes, and consume exactly once

use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::oauth::platform::Platform;
use crate::oauth::types::StatePayload;

/// States older than this are rejected (and removed) on consume
pub const STATE_TTL_SECS: i64 = 600;

/// Store for short-lived OAuth state records
pub struct StateStore {
    pool: SqlitePool,
}

impl StateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Generate and persist a state for a pending flow.
    ///
    /// `options` is threaded through the redirect and handed back on
    /// consume (PKCE verifier, requested scopes).
    pub async fn create(
        &self,
        platform: Platform,
        user_id: &str,
        options: serde_json::Map<String, serde_json::Value>,
    ) -> AuthResult<String> {
        let state = generate_state(platform, user_id);
        let now = Utc::now().timestamp();
        let options_json = serde_json::to_string(&options)?;

        sqlx::query(
            r#"
            INSERT INTO oauth_states (state, platform, user_id, options, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&state)
        .bind(platform.to_string())
        .bind(user_id)
        .bind(&options_json)
        .bind(now)
        .bind(now + STATE_TTL_SECS)
        .execute(&self.pool)
        .await?;

        debug!("Created OAuth state for {} user {}", platform, user_id);
        Ok(state)
    }

    /// Look up, delete, and return the payload for a state.
    ///
    /// The lookup and delete are a single statement, so two callbacks
    /// racing on the same state cannot both succeed. An expired state is
    /// removed by the same statement and reported as `StateExpired`.
    pub async fn consume(&self, state: &str) -> AuthResult<StatePayload> {
        let row = sqlx::query(
            r#"
            DELETE FROM oauth_states
            WHERE state = ?
            RETURNING platform, user_id, options, expires_at
            "#,
        )
        .bind(state)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(AuthError::InvalidState)?;

        let expires_at: i64 = row.try_get("expires_at")?;
        if Utc::now().timestamp() > expires_at {
            debug!("Consumed an expired OAuth state");
            return Err(AuthError::StateExpired);
        }

        let platform: String = row.try_get("platform")?;
        let options_json: String = row.try_get("options")?;
        let options = serde_json::from_str(&options_json)?;

        Ok(StatePayload {
            platform: platform.parse()?,
            user_id: row.try_get("user_id")?,
            options,
        })
    }

    /// Remove all expired states; returns how many were deleted
    pub async fn sweep_expired(&self) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM oauth_states WHERE expires_at < ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;

        let swept = result.rows_affected();
        if swept > 0 {
            debug!("Swept {} expired OAuth states", swept);
        }
        Ok(swept)
    }
}

/// Derive an unpredictable state value: SHA256 over the flow identity
/// plus a timestamp and 32 random bytes, hex-encoded.
fn generate_state(platform: Platform, user_id: &str) -> String {
    let mut random = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random);

    let mut hasher = Sha256::new();
    hasher.update(platform.to_string().as_bytes());
    hasher.update(user_id.as_bytes());
    hasher.update(Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.update(random);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_values_are_unique() {
        let a = generate_state(Platform::Twitter, "user-1");
        let b = generate_state(Platform::Twitter, "user-1");
        assert_ne!(a, b);
    }

    #[test]
    fn test_state_is_hex_sha256() {
        let state = generate_state(Platform::LinkedIn, "user-1");
        assert_eq!(state.len(), 64);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

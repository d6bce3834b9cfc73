// ABOUTME: Database storage layer for durable OAuth credentials
// ABOUTME: Encrypted upsert keyed on (user_id, platform) with retry on transient errors

use std::time::Duration;

use chrono::Utc;
use crosspost_security::TokenCipher;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, error};

use crate::{
    error::{AuthError, AuthResult},
    oauth::{
        platform::Platform,
        profile::CanonicalProfile,
        retry::{is_transient_db_error, retry_with_backoff},
        types::{StoredToken, TokenResponse},
    },
};

/// Write attempts before a transient storage error propagates:
/// the initial attempt plus three retries
const SAVE_ATTEMPTS: u32 = 4;
/// First backoff delay; doubles per retry (1s, 2s, 4s)
const SAVE_BACKOFF: Duration = Duration::from_secs(1);

/// Token store for database operations
pub struct TokenStore {
    pool: SqlitePool,
    cipher: TokenCipher,
}

impl TokenStore {
    /// Create a new token store with database pool
    pub fn new(pool: SqlitePool) -> AuthResult<Self> {
        let cipher = TokenCipher::new()
            .map_err(|e| AuthError::Storage(format!("Failed to initialize encryption: {}", e)))?;
        Ok(Self { pool, cipher })
    }

    /// Upsert the credential for (user_id, platform).
    ///
    /// `expires_at` is computed from the provider's `expires_in` seconds;
    /// absent means the token does not expire. Secrets are encrypted before
    /// they reach the database. Transient write failures are retried with
    /// exponential backoff.
    pub async fn save(
        &self,
        user_id: &str,
        platform: Platform,
        token: &TokenResponse,
        profile: &CanonicalProfile,
    ) -> AuthResult<StoredToken> {
        debug!("Storing OAuth token for platform: {}", platform);

        let now = Utc::now().timestamp();
        let expires_at = token.expires_in.map(|secs| now + secs);

        let encrypted_access_token = self.cipher.encrypt(&token.access_token).map_err(|e| {
            error!("Failed to encrypt access token: {}", e);
            AuthError::Storage(format!("Token encryption failed: {}", e))
        })?;

        let encrypted_refresh_token = match &token.refresh_token {
            Some(rt) => Some(self.cipher.encrypt(rt).map_err(|e| {
                error!("Failed to encrypt refresh token: {}", e);
                AuthError::Storage(format!("Token encryption failed: {}", e))
            })?),
            None => None,
        };

        let profile_json = serde_json::to_string(profile)?;
        let platform_name = platform.to_string();

        retry_with_backoff(SAVE_ATTEMPTS, SAVE_BACKOFF, is_transient_db_error, || {
            sqlx::query(
                r#"
                INSERT INTO oauth_tokens (
                    user_id, platform, access_token, refresh_token,
                    expires_at, scope, profile_data, created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, unixepoch(), unixepoch())
                ON CONFLICT(user_id, platform) DO UPDATE SET
                    access_token = excluded.access_token,
                    refresh_token = excluded.refresh_token,
                    expires_at = excluded.expires_at,
                    scope = excluded.scope,
                    profile_data = excluded.profile_data,
                    updated_at = unixepoch()
                "#,
            )
            .bind(user_id)
            .bind(&platform_name)
            .bind(&encrypted_access_token)
            .bind(&encrypted_refresh_token)
            .bind(expires_at)
            .bind(&token.scope)
            .bind(&profile_json)
            .execute(&self.pool)
        })
        .await
        .map_err(|e| {
            error!("Failed to store OAuth token: {}", e);
            AuthError::Database(e)
        })?;

        debug!("Successfully stored encrypted OAuth token");

        Ok(StoredToken {
            user_id: user_id.to_string(),
            platform,
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            expires_at,
            scope: token.scope.clone(),
            profile: Some(profile.clone()),
            created_at: now,
            updated_at: now,
        })
    }

    /// Get the credential for (user_id, platform), decrypted
    pub async fn get(&self, user_id: &str, platform: Platform) -> AuthResult<Option<StoredToken>> {
        debug!(
            "Fetching OAuth token for user {} platform {}",
            user_id, platform
        );

        let row = sqlx::query(
            r#"
            SELECT user_id, platform, access_token, refresh_token,
                   expires_at, scope, profile_data, created_at, updated_at
            FROM oauth_tokens
            WHERE user_id = ? AND platform = ?
            "#,
        )
        .bind(user_id)
        .bind(platform.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.token_from_row(&row)?)),
            None => {
                debug!("No OAuth token found");
                Ok(None)
            }
        }
    }

    /// Delete the credential; true if a row existed
    pub async fn delete(&self, user_id: &str, platform: Platform) -> AuthResult<bool> {
        debug!(
            "Deleting OAuth token for user {} platform {}",
            user_id, platform
        );

        let result = sqlx::query(
            r#"
            DELETE FROM oauth_tokens
            WHERE user_id = ? AND platform = ?
            "#,
        )
        .bind(user_id)
        .bind(platform.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All credentials for a user, one per connected platform
    pub async fn list_by_user(&self, user_id: &str) -> AuthResult<Vec<StoredToken>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, platform, access_token, refresh_token,
                   expires_at, scope, profile_data, created_at, updated_at
            FROM oauth_tokens
            WHERE user_id = ?
            ORDER BY platform
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| self.token_from_row(row)).collect()
    }

    fn token_from_row(&self, row: &SqliteRow) -> AuthResult<StoredToken> {
        let encrypted_access_token: String = row.try_get("access_token")?;
        let access_token = self.cipher.decrypt(&encrypted_access_token).map_err(|e| {
            error!("Failed to decrypt access token: {}", e);
            AuthError::Storage(format!("Token decryption failed: {}", e))
        })?;

        let encrypted_refresh_token: Option<String> = row.try_get("refresh_token")?;
        let refresh_token = match encrypted_refresh_token {
            Some(encrypted) => Some(self.cipher.decrypt(&encrypted).map_err(|e| {
                error!("Failed to decrypt refresh token: {}", e);
                AuthError::Storage(format!("Token decryption failed: {}", e))
            })?),
            None => None,
        };

        let platform: String = row.try_get("platform")?;
        let profile_json: Option<String> = row.try_get("profile_data")?;
        let profile = match profile_json {
            Some(json) => serde_json::from_str(&json)?,
            None => None,
        };

        Ok(StoredToken {
            user_id: row.try_get("user_id")?,
            platform: platform.parse()?,
            access_token,
            refresh_token,
            expires_at: row.try_get("expires_at")?,
            scope: row.try_get("scope")?,
            profile,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

// ABOUTME: Database schema bootstrap for OAuth state and token tables
// ABOUTME: Creates oauth_states and oauth_tokens with upsert-friendly keys

use sqlx::SqlitePool;

use crate::error::AuthResult;

/// Create the OAuth tables if they do not exist.
///
/// `oauth_states` holds short-lived CSRF correlation records; `oauth_tokens`
/// holds one durable credential per (user_id, platform).
pub async fn init_schema(pool: &SqlitePool) -> AuthResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS oauth_states (
            state TEXT PRIMARY KEY,
            platform TEXT NOT NULL,
            user_id TEXT NOT NULL,
            options TEXT NOT NULL DEFAULT '{}',
            created_at INTEGER NOT NULL DEFAULT (unixepoch()),
            expires_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS oauth_tokens (
            user_id TEXT NOT NULL,
            platform TEXT NOT NULL,
            access_token TEXT NOT NULL,
            refresh_token TEXT,
            expires_at INTEGER,
            scope TEXT,
            profile_data TEXT,
            created_at INTEGER NOT NULL DEFAULT (unixepoch()),
            updated_at INTEGER NOT NULL DEFAULT (unixepoch()),
            PRIMARY KEY (user_id, platform)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

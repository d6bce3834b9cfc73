// ABOUTME: Integration tests for the OAuth orchestrator
// ABOUTME: End-to-end flows against mocked provider endpoints

use std::sync::Arc;

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crosspost_auth::{
    db,
    error::AuthError,
    oauth::{
        manager::OAuthManager,
        platform::Platform,
        profile::CanonicalProfile,
        registry::{ProviderConfig, ProviderRegistry},
        storage::TokenStore,
        types::TokenResponse,
    },
};

/// Helper to create a test database with schema
async fn setup_test_db() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .unwrap();

    db::init_schema(&pool).await.unwrap();

    (pool, temp_dir)
}

/// Provider config pointing every endpoint at the mock server
fn mock_config(platform: Platform, base: &str) -> ProviderConfig {
    ProviderConfig {
        platform,
        client_id: "test-client-id".to_string(),
        client_secret: "test-client-secret".to_string(),
        redirect_uri: format!("http://localhost:4173/api/oauth/callback/{}", platform),
        scopes: platform.scopes().iter().map(|s| s.to_string()).collect(),
        authorize_url: format!("{}/authorize", base),
        token_url: format!("{}/token", base),
        profile_url: format!("{}/me", base),
        revoke_url: platform.revoke_url().map(|_| format!("{}/revoke", base)),
        api_version: None,
    }
}

async fn setup_manager(server: &MockServer) -> (OAuthManager, SqlitePool, TempDir) {
    let (pool, temp_dir) = setup_test_db().await;
    let configs = Platform::all()
        .into_iter()
        .map(|p| mock_config(p, &server.uri()))
        .collect();
    let registry = Arc::new(ProviderRegistry::with_configs(configs));
    let manager = OAuthManager::new(pool.clone(), registry).unwrap();
    (manager, pool, temp_dir)
}

fn seed_response(access: &str, refresh: Option<&str>, expires_in: Option<i64>) -> TokenResponse {
    TokenResponse {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        expires_in,
        scope: Some("openid profile".to_string()),
        token_type: Some("Bearer".to_string()),
    }
}

fn seed_profile() -> CanonicalProfile {
    CanonicalProfile {
        id: "u1".to_string(),
        name: "Jane".to_string(),
        username: None,
        profile_picture_url: None,
    }
}

#[tokio::test]
async fn test_end_to_end_linkedin_flow() {
    let server = MockServer::start().await;
    let (manager, _pool, _temp_dir) = setup_manager(&server).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tok1",
            "refresh_token": "r1",
            "expires_in": 3600,
            "scope": "openid profile",
            "token_type": "Bearer"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sub": "u1",
            "name": "Jane",
            "email": "jane@example.com",
            "picture": "https://media.licdn.com/jane.jpg"
        })))
        .mount(&server)
        .await;

    // Initiate: URL carries client_id, scopes, and the state
    let authorize = manager
        .authorize_url(Platform::LinkedIn, "user-1", serde_json::Map::new())
        .await
        .unwrap();
    assert!(authorize.auth_url.contains("client_id=test-client-id"));
    assert!(authorize.auth_url.contains("response_type=code"));
    assert!(authorize.auth_url.contains(&format!("state={}", authorize.state)));

    // Provider redirects back with code + state
    let connection = manager
        .handle_callback(Platform::LinkedIn, "xyz", &authorize.state)
        .await
        .unwrap();
    assert_eq!(connection.user_id, "user-1");
    assert_eq!(connection.profile.id, "u1");
    assert_eq!(connection.profile.name, "Jane");

    // Fresh token comes back without a refresh round-trip
    let token = manager
        .access_token("user-1", Platform::LinkedIn)
        .await
        .unwrap();
    assert_eq!(token, "tok1");

    // Status reflects the live connection
    let statuses = manager.connection_status("user-1").await.unwrap();
    let linkedin = &statuses[&Platform::LinkedIn];
    assert!(linkedin.connected);
    assert!(!linkedin.expired);
    assert_eq!(linkedin.profile.as_ref().unwrap().name, "Jane");
}

#[tokio::test]
async fn test_refresh_within_buffer_persists_new_token() {
    let server = MockServer::start().await;
    let (manager, pool, _temp_dir) = setup_manager(&server).await;

    // Credential expiring in 4 minutes, inside the 5-minute buffer
    let store = TokenStore::new(pool).unwrap();
    store
        .save(
            "user-1",
            Platform::LinkedIn,
            &seed_response("tok1", Some("r1"), Some(240)),
            &seed_profile(),
        )
        .await
        .unwrap();

    // Provider rotates the access token but not the refresh token
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tok2",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = manager
        .access_token("user-1", Platform::LinkedIn)
        .await
        .unwrap();
    assert_eq!(token, "tok2");

    // The store now holds tok2 and kept the old refresh token
    let stored = store
        .get("user-1", Platform::LinkedIn)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.access_token, "tok2");
    assert_eq!(stored.refresh_token.as_deref(), Some("r1"));
}

#[tokio::test]
async fn test_no_refresh_outside_buffer() {
    let server = MockServer::start().await;
    let (manager, pool, _temp_dir) = setup_manager(&server).await;

    // Expires in 10 minutes, outside the buffer: no refresh traffic at all
    let store = TokenStore::new(pool).unwrap();
    store
        .save(
            "user-1",
            Platform::LinkedIn,
            &seed_response("tok1", Some("r1"), Some(600)),
            &seed_profile(),
        )
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let token = manager
        .access_token("user-1", Platform::LinkedIn)
        .await
        .unwrap();
    assert_eq!(token, "tok1");
}

#[tokio::test]
async fn test_expired_without_refresh_token_is_terminal() {
    let server = MockServer::start().await;
    let (manager, pool, _temp_dir) = setup_manager(&server).await;

    let store = TokenStore::new(pool).unwrap();
    store
        .save(
            "user-1",
            Platform::Twitter,
            &seed_response("stale", None, Some(-3600)),
            &seed_profile(),
        )
        .await
        .unwrap();

    // No network attempt may be made for an unrenewable credential
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = manager.access_token("user-1", Platform::Twitter).await;
    assert!(matches!(result, Err(AuthError::TokenExpiredNoRefresh(_))));
}

#[tokio::test]
async fn test_refresh_failure_surfaces() {
    let server = MockServer::start().await;
    let (manager, pool, _temp_dir) = setup_manager(&server).await;

    let store = TokenStore::new(pool).unwrap();
    store
        .save(
            "user-1",
            Platform::YouTube,
            &seed_response("tok1", Some("r1"), Some(60)),
            &seed_profile(),
        )
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let result = manager.access_token("user-1", Platform::YouTube).await;
    assert!(matches!(result, Err(AuthError::RefreshFailed { .. })));
}

#[tokio::test]
async fn test_no_connection() {
    let server = MockServer::start().await;
    let (manager, _pool, _temp_dir) = setup_manager(&server).await;

    let result = manager.access_token("user-1", Platform::Facebook).await;
    assert!(matches!(result, Err(AuthError::NoConnection(_))));
}

#[tokio::test]
async fn test_callback_with_forged_state_fails() {
    let server = MockServer::start().await;
    let (manager, _pool, _temp_dir) = setup_manager(&server).await;

    let result = manager
        .handle_callback(Platform::LinkedIn, "xyz", "forged-state")
        .await;
    assert!(matches!(result, Err(AuthError::InvalidState)));
}

#[tokio::test]
async fn test_callback_with_expired_state_fails() {
    let server = MockServer::start().await;
    let (manager, pool, _temp_dir) = setup_manager(&server).await;

    let authorize = manager
        .authorize_url(Platform::LinkedIn, "user-1", serde_json::Map::new())
        .await
        .unwrap();

    sqlx::query("UPDATE oauth_states SET expires_at = ? WHERE state = ?")
        .bind(chrono::Utc::now().timestamp() - 1)
        .bind(&authorize.state)
        .execute(&pool)
        .await
        .unwrap();

    let result = manager
        .handle_callback(Platform::LinkedIn, "xyz", &authorize.state)
        .await;
    assert!(matches!(result, Err(AuthError::StateExpired)));
}

#[tokio::test]
async fn test_unconfigured_platform_cannot_start_flow() {
    let (pool, _temp_dir) = setup_test_db().await;

    // Registry with missing credentials
    let mut config = mock_config(Platform::LinkedIn, "http://localhost:1");
    config.client_secret = String::new();
    let registry = Arc::new(ProviderRegistry::with_configs(vec![config]));
    let manager = OAuthManager::new(pool, registry).unwrap();

    let result = manager
        .authorize_url(Platform::LinkedIn, "user-1", serde_json::Map::new())
        .await;
    assert!(matches!(result, Err(AuthError::PlatformNotConfigured(_))));
}

#[tokio::test]
async fn test_token_exchange_failure_persists_nothing() {
    let server = MockServer::start().await;
    let (manager, pool, _temp_dir) = setup_manager(&server).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "authorization code expired"
        })))
        .mount(&server)
        .await;

    let authorize = manager
        .authorize_url(Platform::LinkedIn, "user-1", serde_json::Map::new())
        .await
        .unwrap();
    let result = manager
        .handle_callback(Platform::LinkedIn, "bad-code", &authorize.state)
        .await;
    assert!(matches!(result, Err(AuthError::TokenExchangeFailed { .. })));

    // Nothing stored on a failed exchange
    let store = TokenStore::new(pool).unwrap();
    assert!(store
        .get("user-1", Platform::LinkedIn)
        .await
        .unwrap()
        .is_none());

    // The state was consumed by the attempt; a retry must restart the flow
    let result = manager
        .handle_callback(Platform::LinkedIn, "bad-code", &authorize.state)
        .await;
    assert!(matches!(result, Err(AuthError::InvalidState)));
}

#[tokio::test]
async fn test_profile_fetch_failure_stores_placeholder() {
    let server = MockServer::start().await;
    let (manager, _pool, _temp_dir) = setup_manager(&server).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tok1",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let authorize = manager
        .authorize_url(Platform::LinkedIn, "user-1", serde_json::Map::new())
        .await
        .unwrap();
    let connection = manager
        .handle_callback(Platform::LinkedIn, "xyz", &authorize.state)
        .await
        .unwrap();

    // Connect still succeeds with the placeholder profile
    assert_eq!(connection.profile.id, "unknown");
    assert_eq!(connection.profile.name, "Unknown User");

    let token = manager
        .access_token("user-1", Platform::LinkedIn)
        .await
        .unwrap();
    assert_eq!(token, "tok1");
}

#[tokio::test]
async fn test_twitter_flow_threads_pkce_verifier() {
    let server = MockServer::start().await;
    let (manager, _pool, _temp_dir) = setup_manager(&server).await;

    let authorize = manager
        .authorize_url(Platform::Twitter, "user-1", serde_json::Map::new())
        .await
        .unwrap();
    assert!(authorize.auth_url.contains("code_challenge="));
    assert!(authorize.auth_url.contains("code_challenge_method=S256"));

    // The exchange must present the verifier that was stashed in the state
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tw-tok",
            "refresh_token": "tw-refresh",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "id": "2244994945",
                "name": "Dev Account",
                "username": "devacct"
            }
        })))
        .mount(&server)
        .await;

    let connection = manager
        .handle_callback(Platform::Twitter, "tw-code", &authorize.state)
        .await
        .unwrap();
    assert_eq!(connection.profile.username.as_deref(), Some("devacct"));
}

#[tokio::test]
async fn test_youtube_authorize_requests_offline_access() {
    let server = MockServer::start().await;
    let (manager, _pool, _temp_dir) = setup_manager(&server).await;

    let authorize = manager
        .authorize_url(Platform::YouTube, "user-1", serde_json::Map::new())
        .await
        .unwrap();

    assert!(authorize.auth_url.contains("access_type=offline"));
    assert!(authorize.auth_url.contains("prompt=consent"));
}

#[tokio::test]
async fn test_facebook_long_lived_exchange() {
    let server = MockServer::start().await;
    let (manager, _pool, _temp_dir) = setup_manager(&server).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "short-lived",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/token"))
        .and(query_param("grant_type", "fb_exchange_token"))
        .and(query_param("fb_exchange_token", "short-lived"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "long-lived",
            "expires_in": 5184000
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "fb1",
            "name": "Page Owner"
        })))
        .mount(&server)
        .await;

    let authorize = manager
        .authorize_url(Platform::Facebook, "user-1", serde_json::Map::new())
        .await
        .unwrap();
    manager
        .handle_callback(Platform::Facebook, "fb-code", &authorize.state)
        .await
        .unwrap();

    let token = manager
        .access_token("user-1", Platform::Facebook)
        .await
        .unwrap();
    assert_eq!(token, "long-lived");
}

#[tokio::test]
async fn test_facebook_long_lived_failure_keeps_short_token() {
    let server = MockServer::start().await;
    let (manager, _pool, _temp_dir) = setup_manager(&server).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "short-lived",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    // Secondary exchange breaks; the connect must still succeed
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "fb1",
            "name": "Page Owner"
        })))
        .mount(&server)
        .await;

    let authorize = manager
        .authorize_url(Platform::Facebook, "user-1", serde_json::Map::new())
        .await
        .unwrap();
    manager
        .handle_callback(Platform::Facebook, "fb-code", &authorize.state)
        .await
        .unwrap();

    let token = manager
        .access_token("user-1", Platform::Facebook)
        .await
        .unwrap();
    assert_eq!(token, "short-lived");
}

#[tokio::test]
async fn test_status_snapshot_covers_every_platform() {
    let server = MockServer::start().await;
    let (manager, pool, _temp_dir) = setup_manager(&server).await;

    // No connections yet: every platform present, all disconnected
    let statuses = manager.connection_status("user-1").await.unwrap();
    assert_eq!(statuses.len(), Platform::all().len());
    assert!(statuses.values().all(|s| !s.connected && !s.expired));

    // One live, one expired connection
    let store = TokenStore::new(pool).unwrap();
    store
        .save(
            "user-1",
            Platform::LinkedIn,
            &seed_response("live", None, Some(3600)),
            &seed_profile(),
        )
        .await
        .unwrap();
    store
        .save(
            "user-1",
            Platform::Twitter,
            &seed_response("stale", None, Some(-60)),
            &seed_profile(),
        )
        .await
        .unwrap();

    let statuses = manager.connection_status("user-1").await.unwrap();
    assert_eq!(statuses.len(), Platform::all().len());

    assert!(statuses[&Platform::LinkedIn].connected);
    assert!(!statuses[&Platform::LinkedIn].expired);

    assert!(!statuses[&Platform::Twitter].connected);
    assert!(statuses[&Platform::Twitter].expired);

    assert!(!statuses[&Platform::Facebook].connected);
    assert!(statuses[&Platform::Facebook].profile.is_none());
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let server = MockServer::start().await;
    let (manager, pool, _temp_dir) = setup_manager(&server).await;

    Mock::given(method("POST"))
        .and(path("/revoke"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let store = TokenStore::new(pool).unwrap();
    store
        .save(
            "user-1",
            Platform::Twitter,
            &seed_response("tok", None, Some(3600)),
            &seed_profile(),
        )
        .await
        .unwrap();

    assert!(manager.disconnect("user-1", Platform::Twitter).await.unwrap());
    // Second disconnect finds nothing and returns false without error
    assert!(!manager.disconnect("user-1", Platform::Twitter).await.unwrap());
}

#[tokio::test]
async fn test_disconnect_deletes_even_when_revocation_fails() {
    let server = MockServer::start().await;
    let (manager, pool, _temp_dir) = setup_manager(&server).await;

    Mock::given(method("POST"))
        .and(path("/revoke"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = TokenStore::new(pool).unwrap();
    store
        .save(
            "user-1",
            Platform::YouTube,
            &seed_response("tok", None, Some(3600)),
            &seed_profile(),
        )
        .await
        .unwrap();

    assert!(manager.disconnect("user-1", Platform::YouTube).await.unwrap());
    assert!(store
        .get("user-1", Platform::YouTube)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_disconnect_linkedin_skips_revocation() {
    let server = MockServer::start().await;
    let (manager, pool, _temp_dir) = setup_manager(&server).await;

    // LinkedIn has no revoke endpoint; no call may be made
    Mock::given(method("POST"))
        .and(path("/revoke"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = TokenStore::new(pool).unwrap();
    store
        .save(
            "user-1",
            Platform::LinkedIn,
            &seed_response("tok", None, Some(3600)),
            &seed_profile(),
        )
        .await
        .unwrap();

    assert!(manager
        .disconnect("user-1", Platform::LinkedIn)
        .await
        .unwrap());
}

// ABOUTME: HTTP API layer for Crosspost platform connections
// ABOUTME: Routes the OAuth connect/callback/status/token/disconnect endpoints

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crosspost_auth::OAuthManager;

pub mod oauth_handlers;
pub mod response;

/// Shared state for the OAuth routes
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<OAuthManager>,
}

impl AppState {
    pub fn new(manager: Arc<OAuthManager>) -> Self {
        Self { manager }
    }
}

/// Creates the OAuth connections API router
pub fn create_oauth_router() -> Router<AppState> {
    Router::new()
        .route("/connect/{platform}", post(oauth_handlers::connect))
        .route("/callback/{platform}", get(oauth_handlers::callback))
        .route("/status", get(oauth_handlers::connection_status))
        .route("/token/{platform}", get(oauth_handlers::get_token))
        .route("/connections/{platform}", delete(oauth_handlers::disconnect))
}

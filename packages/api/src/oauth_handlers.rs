// ABOUTME: HTTP request handlers for platform connection management
// ABOUTME: Connect, callback, status, token, and disconnect endpoints

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json as ResponseJson, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::response::{ApiError, ApiResponse};
use crate::AppState;
use crosspost_auth::{AuthError, CanonicalProfile, Platform, PlatformStatus};

/// Identifies the requesting user from the X-User-Id header.
/// Session handling lives in the surrounding app; this layer only
/// needs the opaque id.
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| UserId(s.to_string()))
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    ResponseJson(ApiResponse::<()>::error(
                        "Missing X-User-Id header".to_string(),
                    )),
                )
                    .into_response()
            })
    }
}

fn parse_platform(name: &str) -> Result<Platform, Response> {
    name.parse().map_err(|e: AuthError| {
        (
            StatusCode::BAD_REQUEST,
            ResponseJson(ApiResponse::<()>::error(e.to_string())),
        )
            .into_response()
    })
}

/// Response for the connect endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub auth_url: String,
    pub state: String,
}

/// Response for the callback endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResponse {
    pub platform: String,
    pub profile: CanonicalProfile,
    pub scope: Option<String>,
    pub expires_at: Option<i64>,
}

/// Per-platform entry in the status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStatusResponse {
    pub connected: bool,
    pub expired: bool,
    pub profile: Option<CanonicalProfile>,
}

/// Response for the token endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatusResponse {
    pub connected: bool,
    pub expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Response for the disconnect endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectResponse {
    pub disconnected: bool,
}

/// Query parameters delivered by the provider redirect
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

/// Start an OAuth flow for a platform
pub async fn connect(
    State(app): State<AppState>,
    Path(platform): Path<String>,
    UserId(user_id): UserId,
) -> Result<Response, Response> {
    let platform = parse_platform(&platform)?;
    info!("Connect requested for {} by user {}", platform, user_id);

    let authorize = app
        .manager
        .authorize_url(platform, &user_id, serde_json::Map::new())
        .await
        .map_err(|e| ApiError(e).into_response())?;

    Ok(Json(ApiResponse::success(ConnectResponse {
        auth_url: authorize.auth_url,
        state: authorize.state,
    }))
    .into_response())
}

/// Complete an OAuth flow from the provider redirect
pub async fn callback(
    State(app): State<AppState>,
    Path(platform): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, Response> {
    let platform = parse_platform(&platform)?;

    let connection = app
        .manager
        .handle_callback(platform, &params.code, &params.state)
        .await
        .map_err(|e| ApiError(e).into_response())?;

    Ok(Json(ApiResponse::success(CallbackResponse {
        platform: connection.platform.to_string(),
        profile: connection.profile,
        scope: connection.scope,
        expires_at: connection.expires_at,
    }))
    .into_response())
}

/// Connection status for every supported platform
pub async fn connection_status(
    State(app): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Response, Response> {
    let statuses = app
        .manager
        .connection_status(&user_id)
        .await
        .map_err(|e| ApiError(e).into_response())?;

    let body: HashMap<String, PlatformStatusResponse> = statuses
        .into_iter()
        .map(|(platform, status)| {
            let PlatformStatus {
                connected,
                expired,
                profile,
            } = status;
            (
                platform.to_string(),
                PlatformStatusResponse {
                    connected,
                    expired,
                    profile,
                },
            )
        })
        .collect();

    Ok(Json(ApiResponse::success(body)).into_response())
}

/// Current access token for a platform, refreshed when close to expiry
pub async fn get_token(
    State(app): State<AppState>,
    Path(platform): Path<String>,
    UserId(user_id): UserId,
) -> Result<Response, Response> {
    let platform = parse_platform(&platform)?;

    let body = match app.manager.access_token(&user_id, platform).await {
        Ok(token) => TokenStatusResponse {
            connected: true,
            expired: false,
            access_token: Some(token),
        },
        Err(AuthError::NoConnection(_)) => TokenStatusResponse {
            connected: false,
            expired: false,
            access_token: None,
        },
        // connected = !expired, same rule as the status endpoint
        Err(AuthError::TokenExpiredNoRefresh(_)) => TokenStatusResponse {
            connected: false,
            expired: true,
            access_token: None,
        },
        Err(e) => return Err(ApiError(e).into_response()),
    };

    Ok(Json(ApiResponse::success(body)).into_response())
}

/// Disconnect a platform: best-effort revocation plus local deletion
pub async fn disconnect(
    State(app): State<AppState>,
    Path(platform): Path<String>,
    UserId(user_id): UserId,
) -> Result<Response, Response> {
    let platform = parse_platform(&platform)?;
    info!("Disconnect requested for {} by user {}", platform, user_id);

    let disconnected = app
        .manager
        .disconnect(&user_id, platform)
        .await
        .map_err(|e| ApiError(e).into_response())?;

    Ok(Json(ApiResponse::success(DisconnectResponse { disconnected })).into_response())
}

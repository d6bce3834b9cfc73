// ABOUTME: Shared API response types and error handling
// ABOUTME: Provides consistent response format across all OAuth endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
};
use serde::Serialize;

use crosspost_auth::AuthError;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Error wrapper carrying an HTTP status mapping for auth failures
pub struct ApiError(pub AuthError);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError(err)
    }
}

/// Convert auth errors to HTTP responses
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self.0 {
            AuthError::PlatformNotConfigured(_)
            | AuthError::InvalidState
            | AuthError::StateExpired => (StatusCode::BAD_REQUEST, self.0.to_string()),
            AuthError::NoConnection(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            AuthError::TokenExpiredNoRefresh(_) => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            AuthError::TokenExchangeFailed { .. }
            | AuthError::ProfileFetchFailed { .. }
            | AuthError::RefreshFailed { .. }
            | AuthError::Http(_) => (StatusCode::BAD_GATEWAY, self.0.to_string()),
            AuthError::Database(_) | AuthError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, ResponseJson(ApiResponse::<()>::error(message))).into_response()
    }
}

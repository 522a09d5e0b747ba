//! Drinks service error types.
//!
//! All errors map to an HTTP status code and the uniform error body
//! `{"success": false, "error": <status>, "message": <text>}` via the
//! `IntoResponse` impl. Infrastructure failures are logged server-side and
//! reported to clients with a generic message.

use crate::repositories::DUPLICATE_TITLE_MESSAGE;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Token verification failures.
///
/// The `Display` text is the description returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is expected")]
    MissingToken,

    #[error("{0}")]
    MalformedHeader(String),

    #[error("Unable to verify the token signature")]
    InvalidSignature,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Incorrect claims: {0}")]
    InvalidClaims(String),

    /// The issuer's key set could not be fetched. Not the client's fault.
    #[error("Unable to fetch the issuer key set")]
    KeySetUnavailable,
}

impl AuthError {
    /// Machine-readable code, used as the `error` parameter of
    /// `WWW-Authenticate` and as a metrics label.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "authorization_header_missing",
            AuthError::MalformedHeader(_) => "invalid_header",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::ExpiredToken => "token_expired",
            AuthError::InvalidClaims(_) => "invalid_claims",
            AuthError::KeySetUnavailable => "jwks_unavailable",
        }
    }
}

/// Drinks service error type.
///
/// Maps to HTTP status codes:
/// - BadRequest: 400
/// - Unauthorized: 401
/// - Forbidden: 403
/// - NotFound: 404
/// - Unprocessable: 422 (duplicate title, constraint violations, unreadable data)
/// - Database, Internal: 500
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(AuthError),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::BadRequest(reason)
            | ApiError::Forbidden(reason)
            | ApiError::Unprocessable(reason) => reason.clone(),
            ApiError::Unauthorized(auth) => auth.to_string(),
            ApiError::NotFound(resource) => {
                tracing::debug!(target: "drinks.errors", resource = %resource, "Resource not found");
                "resource not found".to_string()
            }
            ApiError::Database(err) => {
                tracing::error!(target: "drinks.database", error = %err, "Database operation failed");
                "internal server error".to_string()
            }
            ApiError::Internal => "internal server error".to_string(),
        };

        let body = ErrorResponse {
            success: false,
            error: status.as_u16(),
            message,
        };

        let mut response = (status, Json(body)).into_response();

        if let ApiError::Unauthorized(auth) = &self {
            let challenge = format!("Bearer realm=\"drinks\", error=\"{}\"", auth.code());
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, value);
            }
        }

        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::KeySetUnavailable => ApiError::Internal,
            other => ApiError::Unauthorized(other),
        }
    }
}

/// Convert sqlx errors, separating client-data conflicts from infrastructure
/// failures.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return ApiError::Unprocessable(DUPLICATE_TITLE_MESSAGE.to_string());
            }
            if db_err.is_check_violation() {
                return ApiError::Unprocessable("Drink violates a data constraint".to_string());
            }
        }
        ApiError::Database(err.to_string())
    }
}

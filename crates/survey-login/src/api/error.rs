//! Unified API error handling with structured responses.

use axum::{
    Json,
    extract::Request,
    http::{StatusCode, Uri, header::HOST},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::auth::AuthError;
use crate::store::StoreError;

/// API error type with structured responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unparseable body, header or query field.
    #[error("{0}")]
    MalformedRequest(String),

    /// Credential or unit not recognised.
    #[error("{0}")]
    AccessDenied(String),

    /// Missing, invalid or expired token.
    #[error("{0}")]
    Unauthorized(String),

    /// Valid token without the claim the endpoint needs.
    #[error("{0}")]
    IncompleteClaims(String),

    /// Resolved identity or unit no longer exists.
    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRequest(msg.into())
    }

    pub fn access_denied(msg: impl Into<String>) -> Self {
        Self::AccessDenied(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status. Unresolvable identities are reported as 400, not 404.
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::AccessDenied(_) => StatusCode::UNAUTHORIZED,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::IncompleteClaims(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "MALFORMED_REQUEST",
            Self::AccessDenied(_) => "ACCESS_DENIED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::IncompleteClaims(_) => "INCOMPLETE_CLAIMS",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Structured error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        match &self {
            ApiError::Internal(_) => error!(error_code = code, message = %message, "API error"),
            _ => debug!(error_code = code, message = %message, "Client error"),
        }

        let body = ErrorResponse {
            status: status.as_u16(),
            code,
            message,
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => {
                ApiError::Unauthorized("Please provide a token header.".to_string())
            }
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(format!("Invalid token: {}", msg)),
            AuthError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
            AuthError::IncompleteClaims(msg) => ApiError::IncompleteClaims(msg),
            AuthError::AccessDenied(msg) => ApiError::AccessDenied(msg),
            AuthError::Internal(msg) => ApiError::Internal(format!("Authentication error: {}", msg)),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::NotFound(format!("{} not found.", msg)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

fn request_url(uri: &Uri, host: Option<&str>) -> String {
    match host {
        Some(host) if uri.scheme().is_none() => format!("http://{}{}", host, uri),
        _ => uri.to_string(),
    }
}

/// Append the request URL to error messages produced by handlers and extractors.
pub async fn append_request_url(req: Request, next: Next) -> Response {
    let host = req
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    let url = request_url(req.uri(), host.as_deref());

    let response = next.run(req).await;

    match response.extensions().get::<ErrorResponse>().cloned() {
        Some(mut body) => {
            body.message = format!("{}: {}", body.message, url);
            (response.status(), Json(body)).into_response()
        }
        None => response,
    }
}

//! Token validation for incoming requests.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName};
use tracing::debug;

use super::config::ConfigValidationError;
use super::{AuthConfig, AuthError, Claims, TokenCodec};

/// Header carrying the token.
pub const TOKEN_HEADER: HeaderName = HeaderName::from_static("token");

/// Extract a Bearer token from an Authorization header value.
fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthError> {
    let malformed = || AuthError::InvalidToken("malformed authorization header".to_string());

    let mut parts = header_value.split_whitespace();
    let scheme = parts.next().ok_or_else(malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(malformed());
    }

    let token = parts.next().ok_or_else(malformed)?;
    if parts.next().is_some() {
        return Err(malformed());
    }

    Ok(token)
}

/// Find the raw token on a request: the `token` header, else `Authorization: Bearer`.
pub fn token_from_headers(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    if let Some(value) = headers.get(&TOKEN_HEADER) {
        let value = value
            .to_str()
            .map_err(|_| AuthError::InvalidToken("token header is not valid ASCII".to_string()))?;
        return Ok(Some(value));
    }

    match headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        Some(header) => bearer_token_from_header(header).map(Some),
        None => Ok(None),
    }
}

/// Authentication state shared across handlers.
#[derive(Debug, Clone)]
pub struct AuthState {
    config: Arc<AuthConfig>,
    codec: TokenCodec,
}

impl AuthState {
    /// Build auth state from a validated config.
    pub fn new(config: AuthConfig) -> Result<Self, ConfigValidationError> {
        let secret = config.validate()?;
        let codec = TokenCodec::new(&secret, config.token_ttl_secs);

        Ok(Self {
            config: Arc::new(config),
            codec,
        })
    }

    /// Allowed CORS origins from config.
    pub fn allowed_origins(&self) -> &[String] {
        &self.config.allowed_origins
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Issue a token for the claims.
    pub fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        self.codec.issue(claims)
    }

    /// Recover claims from a token header value.
    ///
    /// Only checks that the token is present and verifies. Endpoints then check
    /// for the specific claims they need.
    pub fn authorize(&self, header_value: Option<&str>) -> Result<Claims, AuthError> {
        let token = header_value
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.codec.parse(token)?;
        debug!(shape = %claims.shape(), "Token accepted");
        Ok(claims)
    }
}

/// Verified claims extracted from the request headers.
#[derive(Debug, Clone)]
pub struct Authorized(pub Claims);

impl<S> FromRequestParts<S> for Authorized
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        let token = token_from_headers(&parts.headers)?;
        auth.authorize(token).map(Authorized)
    }
}

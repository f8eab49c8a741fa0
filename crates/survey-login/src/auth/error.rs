//! Authorization errors.

use thiserror::Error;

/// Errors raised while issuing, validating or scoping tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No token header on the request.
    #[error("missing token")]
    MissingToken,

    /// Signature mismatch or malformed payload.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token is past its expiry.
    #[error("token expired")]
    TokenExpired,

    /// Token is valid but lacks a claim the endpoint needs.
    #[error("incomplete claims: {0}")]
    IncompleteClaims(String),

    /// Credential or unit not recognised.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Internal error.
    #[error("internal auth error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        assert_eq!(AuthError::MissingToken.to_string(), "missing token");
        assert_eq!(
            AuthError::InvalidToken("bad".to_string()).to_string(),
            "invalid token: bad"
        );
        assert_eq!(
            AuthError::IncompleteClaims("respondent_id".to_string()).to_string(),
            "incomplete claims: respondent_id"
        );
    }
}

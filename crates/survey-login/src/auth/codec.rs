//! Signed token encoding (HS256 JWT).

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{AuthError, Claims};

/// Wire payload: the claims mapping plus registered timing claims.
#[derive(Serialize)]
struct OutgoingPayload<'a> {
    #[serde(flatten)]
    claims: &'a Claims,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct IncomingPayload {
    #[serde(flatten)]
    claims: Claims,
}

/// Issues and parses tokens with a process-wide symmetric secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec for the given secret and token lifetime.
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// Token lifetime in seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for the claims, valid from now.
    pub fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        self.issue_at(claims, Utc::now().timestamp())
    }

    /// Issue a token as if at `issued_at` (Unix seconds).
    ///
    /// Identical claims and instant yield an identical token.
    pub fn issue_at(&self, claims: &Claims, issued_at: i64) -> Result<String, AuthError> {
        let exp = issued_at
            .checked_add(self.ttl_secs)
            .ok_or_else(|| AuthError::Internal("token expiry overflows".to_string()))?;
        let payload = OutgoingPayload {
            claims,
            iat: issued_at,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Verify a token and recover its claims.
    pub fn parse(&self, token: &str) -> Result<Claims, AuthError> {
        let data =
            decode::<IncomingPayload>(token, &self.decoding_key, &self.validation).map_err(|e| {
                warn!("Token validation failed: {:?}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken(e.to_string()),
                }
            })?;

        Ok(data.claims.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Subject, UnitGrant};
    use crate::store::{Questionnaire, Respondent};
    use serde_json::json;

    const SECRET: &str = "test-secret-for-unit-tests-minimum-32-chars-long";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, 3600)
    }

    #[test]
    fn test_issue_with_overflowing_expiry() {
        let codec = TokenCodec::new(SECRET, i64::MAX);
        let claims =
            Claims::for_respondent(&Respondent::new("101", "jane.doe@example.com", "Jane"));
        assert!(matches!(
            codec.issue(&claims),
            Err(AuthError::Internal(_))
        ));
        assert!(matches!(
            codec.issue_at(&claims, 1),
            Err(AuthError::Internal(_))
        ));
        assert!(codec.issue_at(&claims, 0).is_ok());
    }

    fn enriched_claims() -> Claims {
        let mut claims =
            Claims::for_respondent(&Respondent::new("102", "chief.boyce@example.com", "Boyce"));
        claims.respondent_units = Some(vec![UnitGrant {
            reference: "223".to_string(),
            name: "Pontypandy fire station.".to_string(),
            questionnaires: Some(vec![Questionnaire {
                response_id: "802".to_string(),
                name: "Monthly Business Survey".to_string(),
                survey_id: "023".to_string(),
                form_type: "0203".to_string(),
                period: "201605".to_string(),
                unit_reference: "223".to_string(),
            }]),
        }]);
        claims
    }

    fn tamper_signature(token: &str) -> String {
        let sig_start = token.rfind('.').unwrap() + 1;
        let mut bytes = token.as_bytes().to_vec();
        let idx = sig_start + 5;
        bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();
        for claims in [
            Claims::for_respondent(&Respondent::new("101", "f@example.com", "F")),
            Claims {
                subject: Subject::AccessCode {
                    code: "abc123".to_string(),
                    response_id: "801".to_string(),
                },
                respondent_units: None,
            },
            enriched_claims(),
        ] {
            let token = codec.issue(&claims).unwrap();
            assert_eq!(codec.parse(&token).unwrap(), claims);
        }
    }

    #[test]
    fn test_issue_is_deterministic_for_same_instant() {
        let codec = codec();
        let claims = enriched_claims();
        let a = codec.issue_at(&claims, 1_700_000_000).unwrap();
        let b = codec.issue_at(&claims, 1_700_000_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_payload_carries_timing_claims() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let token = codec.issue_at(&enriched_claims(), now).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let raw = decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &validation,
        )
        .unwrap()
        .claims;
        assert_eq!(raw["iat"], now);
        assert_eq!(raw["exp"], now + 3600);
        assert_eq!(raw["respondent_id"], "102");
        assert_eq!(raw["respondent_units"][0]["questionnaires"][0]["response_id"], "802");
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let codec = codec();
        let token = codec.issue(&enriched_claims()).unwrap();
        let tampered = tamper_signature(&token);
        assert_ne!(token, tampered);
        assert!(matches!(
            codec.parse(&tampered),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenCodec::new("another-secret-that-is-also-32-chars-long!", 3600)
            .issue(&enriched_claims())
            .unwrap();
        assert!(matches!(
            codec().parse(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let codec = codec();
        for token in ["", "not-a-token", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30"] {
            assert!(
                matches!(codec.parse(token), Err(AuthError::InvalidToken(_))),
                "{token} should be rejected"
            );
        }
    }

    #[test]
    fn test_malformed_claims_rejected() {
        let exp = Utc::now().timestamp() + 600;
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"user": "someone", "exp": exp}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            codec().parse(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let exp = Utc::now().timestamp() + 600;
        let token = encode(
            &Header::new(Algorithm::HS512),
            &json!({"respondent_id": "101", "exp": exp}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            codec().parse(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();
        let issued_long_ago = Utc::now().timestamp() - 3600 - 600;
        let token = codec.issue_at(&enriched_claims(), issued_long_ago).unwrap();
        assert_eq!(codec.parse(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn test_debug_hides_keys() {
        let rendered = format!("{:?}", codec());
        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("ttl_secs"));
    }
}

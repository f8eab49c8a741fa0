//! Token signing configuration.

use serde::{Deserialize, Serialize};

/// Placeholder written into fresh config files. Refused at startup.
pub const PLACEHOLDER_SECRET: &str = "change-me-before-deploying";

const MIN_SECRET_LEN: usize = 32;
/// Ten years.
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. `env:VAR_NAME` reads it from the environment.
    pub jwt_secret: Option<String>,

    /// Token lifetime in seconds.
    pub token_ttl_secs: i64,

    /// Allowed CORS origins. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: 60 * 60 * 24,
            allowed_origins: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Resolve the JWT secret, expanding `env:VAR_NAME` syntax.
    pub fn resolve_jwt_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        match &self.jwt_secret {
            None => Ok(None),
            Some(value) => {
                if let Some(var_name) = value.strip_prefix("env:") {
                    match std::env::var(var_name) {
                        Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                        Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                        Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                    }
                } else {
                    Ok(Some(value.clone()))
                }
            }
        }
    }

    /// Validate the configuration and return the usable secret.
    pub fn validate(&self) -> Result<String, ConfigValidationError> {
        let secret = self
            .resolve_jwt_secret()?
            .ok_or(ConfigValidationError::MissingJwtSecret)?;

        if secret == PLACEHOLDER_SECRET {
            return Err(ConfigValidationError::InsecureJwtSecret);
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigValidationError::JwtSecretTooShort);
        }
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&self.token_ttl_secs) {
            return Err(ConfigValidationError::InvalidTokenTtl(self.token_ttl_secs));
        }

        Ok(secret)
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// No JWT secret configured.
    MissingJwtSecret,
    /// JWT secret is the placeholder value.
    InsecureJwtSecret,
    /// JWT secret is shorter than 32 characters.
    JwtSecretTooShort,
    /// Token lifetime is not positive.
    InvalidTokenTtl(i64),
    /// Environment variable not found (for `env:VAR_NAME` syntax).
    EnvVarNotFound(String),
    /// Environment variable is empty (for `env:VAR_NAME` syntax).
    EnvVarEmpty(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingJwtSecret => write!(
                f,
                "JWT secret is required. Set auth.jwt_secret in config or SURVEY_LOGIN__AUTH__JWT_SECRET."
            ),
            Self::InsecureJwtSecret => write!(
                f,
                "JWT secret is still the placeholder value. Please configure a secure secret."
            ),
            Self::JwtSecretTooShort => write!(
                f,
                "JWT secret must be at least {} characters long.",
                MIN_SECRET_LEN
            ),
            Self::InvalidTokenTtl(ttl) => {
                write!(
                    f,
                    "Token lifetime must be between 1 and {} seconds, got {}.",
                    MAX_TOKEN_TTL_SECS, ttl
                )
            }
            Self::EnvVarNotFound(var) => write!(
                f,
                "Environment variable '{}' not found (referenced via env:{} in config).",
                var, var
            ),
            Self::EnvVarEmpty(var) => write!(
                f,
                "Environment variable '{}' is empty (referenced via env:{} in config).",
                var, var
            ),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_SECRET: &str = "a-perfectly-fine-secret-of-40-characters";

    fn config_with(secret: Option<&str>) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.map(str::to_string),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_default() {
        let config = AuthConfig::default();
        assert!(config.jwt_secret.is_none());
        assert_eq!(config.token_ttl_secs, 86400);
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn test_validate_ok() {
        assert_eq!(config_with(Some(GOOD_SECRET)).validate().unwrap(), GOOD_SECRET);
    }

    #[test]
    fn test_validate_missing() {
        assert_eq!(
            config_with(None).validate().unwrap_err(),
            ConfigValidationError::MissingJwtSecret
        );
    }

    #[test]
    fn test_validate_placeholder() {
        assert_eq!(
            config_with(Some(PLACEHOLDER_SECRET)).validate().unwrap_err(),
            ConfigValidationError::InsecureJwtSecret
        );
    }

    #[test]
    fn test_validate_too_short() {
        assert_eq!(
            config_with(Some("short")).validate().unwrap_err(),
            ConfigValidationError::JwtSecretTooShort
        );
    }

    #[test]
    fn test_validate_ttl() {
        let config = AuthConfig {
            token_ttl_secs: 0,
            ..config_with(Some(GOOD_SECRET))
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::InvalidTokenTtl(0)
        );

        let config = AuthConfig {
            token_ttl_secs: i64::MAX,
            ..config_with(Some(GOOD_SECRET))
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::InvalidTokenTtl(i64::MAX)
        );

        let config = AuthConfig {
            token_ttl_secs: MAX_TOKEN_TTL_SECS,
            ..config_with(Some(GOOD_SECRET))
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_secret() {
        // SAFETY: test-only variable name not read by any other test.
        unsafe {
            std::env::set_var("SURVEY_LOGIN_TEST_SECRET_7781", GOOD_SECRET);
        }
        let config = config_with(Some("env:SURVEY_LOGIN_TEST_SECRET_7781"));
        assert_eq!(config.validate().unwrap(), GOOD_SECRET);
        unsafe {
            std::env::remove_var("SURVEY_LOGIN_TEST_SECRET_7781");
        }
    }

    #[test]
    fn test_env_secret_missing() {
        let config = config_with(Some("env:SURVEY_LOGIN_TEST_SECRET_UNSET_4410"));
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::EnvVarNotFound("SURVEY_LOGIN_TEST_SECRET_UNSET_4410".to_string())
        );
    }
}

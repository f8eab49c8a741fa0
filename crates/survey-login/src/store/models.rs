//! Credential store records.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A respondent profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Respondent {
    pub respondent_id: String,
    pub email: String,
    pub name: String,
    /// bcrypt hash. Respondents without one may log in by email alone.
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
}

impl Respondent {
    pub fn new(
        respondent_id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            respondent_id: respondent_id.into(),
            email: email.into(),
            name: name.into(),
            password_hash: None,
        }
    }

    /// Attach a bcrypt password hash.
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    /// Check a login password.
    ///
    /// Without a stored hash any password (or none) is accepted.
    pub fn verify_password(&self, password: Option<&str>) -> bool {
        match (&self.password_hash, password) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(hash), Some(password)) => bcrypt::verify(password, hash).unwrap_or(false),
        }
    }
}

/// A passwordless access code tied to a single survey response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AccessGrant {
    pub code: String,
    pub response_id: String,
}

/// A respondent unit (the organisation a respondent answers for).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub reference: String,
    pub name: String,
    /// Member respondent IDs.
    #[serde(default)]
    pub respondents: Vec<String>,
}

impl Unit {
    pub fn has_member(&self, respondent_id: &str) -> bool {
        self.respondents.iter().any(|id| id == respondent_id)
    }
}

/// A questionnaire issued to a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Questionnaire {
    pub response_id: String,
    pub name: String,
    pub survey_id: String,
    pub form_type: String,
    pub period: String,
    pub unit_reference: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_not_serialized() {
        let respondent =
            Respondent::new("101", "a@example.com", "A").with_password_hash("$2b$04$hash");
        let json = serde_json::to_value(&respondent).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["respondent_id"], "101");
    }

    #[test]
    fn test_verify_password_without_hash() {
        let respondent = Respondent::new("101", "a@example.com", "A");
        assert!(respondent.verify_password(None));
        assert!(respondent.verify_password(Some("anything")));
    }

    #[test]
    fn test_verify_password_with_hash() {
        let hash = bcrypt::hash("s3cret", 4).unwrap();
        let respondent = Respondent::new("101", "a@example.com", "A").with_password_hash(hash);
        assert!(respondent.verify_password(Some("s3cret")));
        assert!(!respondent.verify_password(Some("wrong")));
        assert!(!respondent.verify_password(None));
    }

    #[test]
    fn test_unit_membership() {
        let unit = Unit {
            reference: "223".to_string(),
            name: "Pontypandy fire station.".to_string(),
            respondents: vec!["102".to_string(), "103".to_string()],
        };
        assert!(unit.has_member("103"));
        assert!(!unit.has_member("10"));
    }
}

//! Token claims.
//!
//! Claims serialize as a flat JSON mapping: the subject keys (`respondent_id`
//! or `code`) sit at the top level next to the optional `respondent_units`
//! list. Questionnaires nest under the unit grant they belong to.

use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::store::{AccessGrant, Questionnaire, Respondent, Unit};

/// Who the token was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    /// Logged in by email.
    Respondent {
        respondent_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
    },
    /// Exchanged an access code.
    AccessCode { code: String, response_id: String },
}

/// A unit the respondent was granted, with any questionnaires fetched for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitGrant {
    pub reference: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questionnaires: Option<Vec<Questionnaire>>,
}

impl From<&Unit> for UnitGrant {
    fn from(unit: &Unit) -> Self {
        Self {
            reference: unit.reference.clone(),
            name: unit.name.clone(),
            questionnaires: None,
        }
    }
}

/// How far a token's authorization context has been built up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimsShape {
    /// Subject only.
    Identity,
    /// Subject plus unit grants.
    WithUnits,
    /// At least one unit grant carries questionnaires.
    WithQuestionnaires,
}

impl std::fmt::Display for ClaimsShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimsShape::Identity => write!(f, "identity"),
            ClaimsShape::WithUnits => write!(f, "with_units"),
            ClaimsShape::WithQuestionnaires => write!(f, "with_questionnaires"),
        }
    }
}

/// Claims carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub subject: Subject,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respondent_units: Option<Vec<UnitGrant>>,
}

impl Claims {
    /// Claims for a respondent that logged in by email.
    pub fn for_respondent(respondent: &Respondent) -> Self {
        Self {
            subject: Subject::Respondent {
                respondent_id: respondent.respondent_id.clone(),
                email: Some(respondent.email.clone()),
            },
            respondent_units: None,
        }
    }

    /// Claims for an access-code exchange.
    pub fn for_access_code(grant: &AccessGrant) -> Self {
        Self {
            subject: Subject::AccessCode {
                code: grant.code.clone(),
                response_id: grant.response_id.clone(),
            },
            respondent_units: None,
        }
    }

    /// The respondent ID, if the subject is a respondent.
    pub fn respondent_id(&self) -> Option<&str> {
        match &self.subject {
            Subject::Respondent { respondent_id, .. } => Some(respondent_id),
            Subject::AccessCode { .. } => None,
        }
    }

    /// The respondent ID, or `IncompleteClaims`.
    pub fn require_respondent(&self) -> Result<&str, AuthError> {
        self.respondent_id().ok_or_else(|| {
            AuthError::IncompleteClaims(
                "Please provide a token header that includes a respondent_id.".to_string(),
            )
        })
    }

    /// The granted units, or `IncompleteClaims` if units were never fetched.
    pub fn require_units(&self) -> Result<&[UnitGrant], AuthError> {
        self.respondent_units.as_deref().ok_or_else(|| {
            AuthError::IncompleteClaims(
                "Please provide a token header that includes respondent_units.".to_string(),
            )
        })
    }

    pub fn shape(&self) -> ClaimsShape {
        match &self.respondent_units {
            None => ClaimsShape::Identity,
            Some(units) if units.iter().any(|u| u.questionnaires.is_some()) => {
                ClaimsShape::WithQuestionnaires
            }
            Some(_) => ClaimsShape::WithUnits,
        }
    }
}

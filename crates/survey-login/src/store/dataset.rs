//! Seed datasets for the credential store.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{StoreError, StoreResult};
use super::models::{AccessGrant, Questionnaire, Respondent, Unit};

/// A complete set of credential records.
///
/// Record order matters: lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub respondents: Vec<Respondent>,
    pub access_codes: Vec<AccessGrant>,
    pub units: Vec<Unit>,
    pub questionnaires: Vec<Questionnaire>,
}

impl Dataset {
    /// Load a dataset from a JSON file.
    pub fn from_json_file(path: &Path) -> StoreResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Seed(format!("reading {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| StoreError::Seed(format!("parsing {}: {}", path.display(), e)))
    }

    /// Demo records for local development.
    pub fn sample() -> Self {
        let respondents = vec![
            Respondent::new("101", "florence.nightingale@example.com", "Florence Nightingale"),
            Respondent::new("102", "chief.boyce@example.com", "Chief Fire Officer Boyce"),
            Respondent::new("103", "fireman.sam@example.com", "Fireman Sam"),
            Respondent::new("104", "rob.dabank@example.com", "Robert DaBank"),
        ];

        let access_codes = [
            ("abc123", "801"),
            ("def456", "802"),
            ("ghi789", "803"),
            ("jkl012", "804"),
            ("mno345", "805"),
            ("pqr678", "806"),
        ]
        .into_iter()
        .map(|(code, response_id)| AccessGrant {
            code: code.to_string(),
            response_id: response_id.to_string(),
        })
        .collect();

        let units = vec![
            unit("222", "Nursing Ltd.", &["101"]),
            unit("223", "Pontypandy fire station.", &["102", "103"]),
            unit("224", "Morgan Stanley", &["104"]),
        ];

        let questionnaires = vec![
            questionnaire("801", "Monthly Business Survey", "023", "0203", "201605", "222"),
            questionnaire("802", "Monthly Business Survey", "023", "0203", "201605", "223"),
            questionnaire("803", "Quarterly Fuels Survey", "024", "0102", "201602", "223"),
            questionnaire("804", "Monthly Business Survey", "023", "0205", "201605", "224"),
            questionnaire("805", "Retail Sales Inquiry", "009", "0106", "201606", "224"),
            questionnaire("806", "Quarterly Fuels Survey", "024", "0102", "201602", "222"),
        ];

        Self {
            respondents,
            access_codes,
            units,
            questionnaires,
        }
    }
}

fn unit(reference: &str, name: &str, members: &[&str]) -> Unit {
    Unit {
        reference: reference.to_string(),
        name: name.to_string(),
        respondents: members.iter().map(|m| m.to_string()).collect(),
    }
}

fn questionnaire(
    response_id: &str,
    name: &str,
    survey_id: &str,
    form_type: &str,
    period: &str,
    unit_reference: &str,
) -> Questionnaire {
    Questionnaire {
        response_id: response_id.to_string(),
        name: name.to_string(),
        survey_id: survey_id.to_string(),
        form_type: form_type.to_string(),
        period: period.to_string(),
        unit_reference: unit_reference.to_string(),
    }
}

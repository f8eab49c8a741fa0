//! Credential store trait definition.

use async_trait::async_trait;

use super::StoreResult;
use super::models::{AccessGrant, Questionnaire, Respondent, Unit};

/// Read access to identity records plus the single profile mutation.
///
/// All lookups are exact, case-sensitive matches. When several records share a
/// key, the first one in insertion order wins.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a respondent by email address.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Respondent>>;

    /// Find an access grant by code.
    async fn find_by_code(&self, code: &str) -> StoreResult<Option<AccessGrant>>;

    /// Find a respondent by ID.
    async fn find_by_id(&self, respondent_id: &str) -> StoreResult<Option<Respondent>>;

    /// Replace a respondent's name. Fails with `NotFound` for unknown IDs.
    async fn update_name(&self, respondent_id: &str, name: &str) -> StoreResult<Respondent>;

    /// Units the respondent is a member of.
    async fn units_for_respondent(&self, respondent_id: &str) -> StoreResult<Vec<Unit>>;

    /// Questionnaires issued to a unit.
    async fn questionnaires_for_unit(&self, reference: &str) -> StoreResult<Vec<Questionnaire>>;

    /// Find a unit by reference.
    async fn find_unit(&self, reference: &str) -> StoreResult<Option<Unit>>;

    /// Respondents that are members of a unit, in unit membership order.
    async fn members_of_unit(&self, reference: &str) -> StoreResult<Vec<Respondent>> {
        let Some(unit) = self.find_unit(reference).await? else {
            return Ok(Vec::new());
        };

        let mut members = Vec::with_capacity(unit.respondents.len());
        for id in &unit.respondents {
            if let Some(respondent) = self.find_by_id(id).await? {
                members.push(respondent);
            }
        }
        Ok(members)
    }
}

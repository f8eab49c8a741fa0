//! In-memory credential store.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::dataset::Dataset;
use super::error::{StoreError, StoreResult};
use super::models::{AccessGrant, Questionnaire, Respondent, Unit};
use super::traits::CredentialStore;

/// Credential store backed by a dataset held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Dataset>,
}

impl MemoryStore {
    /// Create a store over the given dataset.
    pub fn new(data: Dataset) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Copy of the current records.
    pub async fn snapshot(&self) -> Dataset {
        self.data.read().await.clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Respondent>> {
        let data = self.data.read().await;
        Ok(data.respondents.iter().find(|r| r.email == email).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_code(&self, code: &str) -> StoreResult<Option<AccessGrant>> {
        let data = self.data.read().await;
        Ok(data.access_codes.iter().find(|g| g.code == code).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, respondent_id: &str) -> StoreResult<Option<Respondent>> {
        let data = self.data.read().await;
        Ok(data
            .respondents
            .iter()
            .find(|r| r.respondent_id == respondent_id)
            .cloned())
    }

    #[instrument(skip(self, name))]
    async fn update_name(&self, respondent_id: &str, name: &str) -> StoreResult<Respondent> {
        let mut data = self.data.write().await;
        let respondent = data
            .respondents
            .iter_mut()
            .find(|r| r.respondent_id == respondent_id)
            .ok_or_else(|| StoreError::NotFound(format!("respondent {}", respondent_id)))?;

        debug!("Renaming respondent {}", respondent_id);
        respondent.name = name.to_string();
        Ok(respondent.clone())
    }

    #[instrument(skip(self))]
    async fn units_for_respondent(&self, respondent_id: &str) -> StoreResult<Vec<Unit>> {
        let data = self.data.read().await;
        Ok(data
            .units
            .iter()
            .filter(|u| u.has_member(respondent_id))
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn questionnaires_for_unit(&self, reference: &str) -> StoreResult<Vec<Questionnaire>> {
        let data = self.data.read().await;
        Ok(data
            .questionnaires
            .iter()
            .filter(|q| q.unit_reference == reference)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_unit(&self, reference: &str) -> StoreResult<Option<Unit>> {
        let data = self.data.read().await;
        Ok(data.units.iter().find(|u| u.reference == reference).cloned())
    }
}

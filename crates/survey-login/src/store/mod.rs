//! Credential store abstraction.
//!
//! Provides a trait-based store with implementations for:
//! - In-memory datasets (development, tests)
//! - SQLite tables (persisted deployments)

mod dataset;
mod error;
mod memory;
mod models;
mod sqlite;
mod traits;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::Database;

pub use dataset::Dataset;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use models::{AccessGrant, Questionnaire, Respondent, Unit};
pub use sqlite::SqliteStore;
pub use traits::CredentialStore;

/// Which backing holds the credential records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Credential store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backing store type.
    pub backend: StoreBackend,
    /// SQLite connection string. Defaults to a file in the data directory.
    pub database_url: Option<String>,
    /// JSON dataset to load at startup.
    pub seed_file: Option<String>,
    /// Load the built-in demo records when no seed file is given.
    pub seed_sample: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            seed_file: None,
            seed_sample: true,
        }
    }
}

impl StoreConfig {
    /// The dataset to seed with, if any.
    pub fn seed_dataset(&self) -> StoreResult<Option<Dataset>> {
        match &self.seed_file {
            Some(path) => Dataset::from_json_file(&PathBuf::from(path)).map(Some),
            None if self.seed_sample => Ok(Some(Dataset::sample())),
            None => Ok(None),
        }
    }
}

/// Open the configured credential store and seed it.
pub async fn open_store(config: &StoreConfig, data_dir: &Path) -> Result<Arc<dyn CredentialStore>> {
    let seed = config.seed_dataset().context("loading seed dataset")?;

    match config.backend {
        StoreBackend::Memory => {
            let data = seed.unwrap_or_default();
            info!(
                "Using in-memory credential store ({} respondents)",
                data.respondents.len()
            );
            Ok(Arc::new(MemoryStore::new(data)))
        }
        StoreBackend::Sqlite => {
            let database = match &config.database_url {
                Some(url) => {
                    info!("Using SQLite credential store at {}", url);
                    Database::connect(url).await?
                }
                None => {
                    let path = data_dir.join("survey-login.db");
                    info!("Using SQLite credential store at {}", path.display());
                    Database::new(&path).await?
                }
            };

            let store = SqliteStore::new(database.pool().clone());
            if let Some(data) = seed {
                store.seed(&data).await.context("seeding credential store")?;
            }
            Ok(Arc::new(store))
        }
    }
}

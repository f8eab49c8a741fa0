//! SQLite-backed credential store.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use super::dataset::Dataset;
use super::error::{StoreError, StoreResult};
use super::models::{AccessGrant, Questionnaire, Respondent, Unit};
use super::traits::CredentialStore;

/// Credential store over the tables created by the embedded migrations.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a dataset if the store holds no respondents yet.
    ///
    /// Returns whether anything was written.
    #[instrument(skip(self, data))]
    pub async fn seed(&self, data: &Dataset) -> StoreResult<bool> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM respondents")
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            debug!("Store already holds {} respondents, skipping seed", existing);
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;

        for r in &data.respondents {
            sqlx::query(
                "INSERT INTO respondents (respondent_id, email, name, password_hash) VALUES (?, ?, ?, ?)",
            )
            .bind(&r.respondent_id)
            .bind(&r.email)
            .bind(&r.name)
            .bind(&r.password_hash)
            .execute(&mut *tx)
            .await?;
        }

        for g in &data.access_codes {
            sqlx::query("INSERT INTO access_codes (code, response_id) VALUES (?, ?)")
                .bind(&g.code)
                .bind(&g.response_id)
                .execute(&mut *tx)
                .await?;
        }

        for u in &data.units {
            let unit_id = sqlx::query("INSERT INTO units (reference, name) VALUES (?, ?)")
                .bind(&u.reference)
                .bind(&u.name)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();

            for (position, member) in u.respondents.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO unit_members (unit_id, respondent_id, position) VALUES (?, ?, ?)",
                )
                .bind(unit_id)
                .bind(member)
                .bind(position as i64)
                .execute(&mut *tx)
                .await?;
            }
        }

        for q in &data.questionnaires {
            sqlx::query(
                r#"
                INSERT INTO questionnaires (response_id, name, survey_id, form_type, period, unit_reference)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&q.response_id)
            .bind(&q.name)
            .bind(&q.survey_id)
            .bind(&q.form_type)
            .bind(&q.period)
            .bind(&q.unit_reference)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            respondents = data.respondents.len(),
            access_codes = data.access_codes.len(),
            units = data.units.len(),
            questionnaires = data.questionnaires.len(),
            "Seeded credential store"
        );
        Ok(true)
    }

    async fn unit_members(&self, unit_id: i64) -> StoreResult<Vec<String>> {
        let members = sqlx::query_scalar::<_, String>(
            "SELECT respondent_id FROM unit_members WHERE unit_id = ? ORDER BY position, rowid",
        )
        .bind(unit_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn hydrate_units(&self, rows: Vec<(i64, String, String)>) -> StoreResult<Vec<Unit>> {
        let mut units = Vec::with_capacity(rows.len());
        for (unit_id, reference, name) in rows {
            let respondents = self.unit_members(unit_id).await?;
            units.push(Unit {
                reference,
                name,
                respondents,
            });
        }
        Ok(units)
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Respondent>> {
        let respondent = sqlx::query_as::<_, Respondent>(
            r#"
            SELECT respondent_id, email, name, password_hash
            FROM respondents
            WHERE email = ?
            ORDER BY rowid
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(respondent)
    }

    #[instrument(skip(self))]
    async fn find_by_code(&self, code: &str) -> StoreResult<Option<AccessGrant>> {
        let grant = sqlx::query_as::<_, AccessGrant>(
            "SELECT code, response_id FROM access_codes WHERE code = ? ORDER BY rowid LIMIT 1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(grant)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, respondent_id: &str) -> StoreResult<Option<Respondent>> {
        let respondent = sqlx::query_as::<_, Respondent>(
            r#"
            SELECT respondent_id, email, name, password_hash
            FROM respondents
            WHERE respondent_id = ?
            ORDER BY rowid
            LIMIT 1
            "#,
        )
        .bind(respondent_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(respondent)
    }

    #[instrument(skip(self, name))]
    async fn update_name(&self, respondent_id: &str, name: &str) -> StoreResult<Respondent> {
        // The returned row is the one this statement wrote.
        let respondent = sqlx::query_as::<_, Respondent>(
            r#"
            UPDATE respondents
            SET name = ?
            WHERE rowid = (
                SELECT rowid FROM respondents WHERE respondent_id = ? ORDER BY rowid LIMIT 1
            )
            RETURNING respondent_id, email, name, password_hash
            "#,
        )
        .bind(name)
        .bind(respondent_id)
        .fetch_optional(&self.pool)
        .await?;

        respondent
            .ok_or_else(|| StoreError::NotFound(format!("respondent {}", respondent_id)))
    }

    #[instrument(skip(self))]
    async fn units_for_respondent(&self, respondent_id: &str) -> StoreResult<Vec<Unit>> {
        let rows = sqlx::query_as::<_, (i64, String, String)>(
            r#"
            SELECT u.unit_id, u.reference, u.name
            FROM units u
            WHERE EXISTS (
                SELECT 1 FROM unit_members m
                WHERE m.unit_id = u.unit_id AND m.respondent_id = ?
            )
            ORDER BY u.unit_id
            "#,
        )
        .bind(respondent_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_units(rows).await
    }

    #[instrument(skip(self))]
    async fn questionnaires_for_unit(&self, reference: &str) -> StoreResult<Vec<Questionnaire>> {
        let questionnaires = sqlx::query_as::<_, Questionnaire>(
            r#"
            SELECT response_id, name, survey_id, form_type, period, unit_reference
            FROM questionnaires
            WHERE unit_reference = ?
            ORDER BY rowid
            "#,
        )
        .bind(reference)
        .fetch_all(&self.pool)
        .await?;

        Ok(questionnaires)
    }

    #[instrument(skip(self))]
    async fn find_unit(&self, reference: &str) -> StoreResult<Option<Unit>> {
        let row = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT unit_id, reference, name FROM units WHERE reference = ? ORDER BY unit_id LIMIT 1",
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate_units(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

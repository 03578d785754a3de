use async_trait::async_trait;
use uuid::Uuid;

use super::PgStore;
use crate::error::Result;
use crate::models::candidature::{Candidature, NewCandidature};

const CANDIDATURE_COLUMNS: &str =
    "id, full_name, email, phone, hiring_request_id, status, created_at, updated_at";

#[async_trait]
pub trait CandidatureRepository: Send + Sync {
    async fn create_candidature(&self, candidature: NewCandidature) -> Result<Candidature>;

    async fn get_candidature(&self, id: Uuid) -> Result<Option<Candidature>>;

    async fn list_candidatures(&self) -> Result<Vec<Candidature>>;

    /// Sets or clears the hiring request link. Many candidatures may share one request.
    async fn assign_candidature(
        &self,
        id: Uuid,
        hiring_request_id: Option<Uuid>,
    ) -> Result<Candidature>;

    async fn list_for_request(&self, hiring_request_id: Uuid) -> Result<Vec<Candidature>>;
}

#[async_trait]
impl CandidatureRepository for PgStore {
    async fn create_candidature(&self, candidature: NewCandidature) -> Result<Candidature> {
        let query = format!(
            "INSERT INTO candidatures (full_name, email, phone, hiring_request_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            CANDIDATURE_COLUMNS
        );
        let row = sqlx::query_as::<_, Candidature>(&query)
            .bind(&candidature.full_name)
            .bind(&candidature.email)
            .bind(&candidature.phone)
            .bind(candidature.hiring_request_id)
            .fetch_one(self.pool())
            .await?;
        Ok(row)
    }

    async fn get_candidature(&self, id: Uuid) -> Result<Option<Candidature>> {
        let query = format!("SELECT {} FROM candidatures WHERE id = $1", CANDIDATURE_COLUMNS);
        let row = sqlx::query_as::<_, Candidature>(&query)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    async fn list_candidatures(&self) -> Result<Vec<Candidature>> {
        let query = format!(
            "SELECT {} FROM candidatures ORDER BY created_at DESC",
            CANDIDATURE_COLUMNS
        );
        let rows = sqlx::query_as::<_, Candidature>(&query)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    async fn assign_candidature(
        &self,
        id: Uuid,
        hiring_request_id: Option<Uuid>,
    ) -> Result<Candidature> {
        let query = format!(
            "UPDATE candidatures SET hiring_request_id = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            CANDIDATURE_COLUMNS
        );
        let row = sqlx::query_as::<_, Candidature>(&query)
            .bind(id)
            .bind(hiring_request_id)
            .fetch_one(self.pool())
            .await?;
        Ok(row)
    }

    async fn list_for_request(&self, hiring_request_id: Uuid) -> Result<Vec<Candidature>> {
        let query = format!(
            "SELECT {} FROM candidatures WHERE hiring_request_id = $1 ORDER BY created_at DESC",
            CANDIDATURE_COLUMNS
        );
        let rows = sqlx::query_as::<_, Candidature>(&query)
            .bind(hiring_request_id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }
}

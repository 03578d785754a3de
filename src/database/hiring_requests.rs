use async_trait::async_trait;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{PageRequest, PgStore};
use crate::error::{Error, Result};
use crate::models::hiring_request::{
    HiringRequest, HiringRequestChanges, HiringRequestFilter, HiringRequestList,
    HiringRequestStats, NewHiringRequest,
};
use crate::models::transition_log::TransitionLog;
use crate::workflow::{validator, RequestStatus, Role, StatusWrite, WorkflowAction, WorkflowError};

pub(crate) const HIRING_REQUEST_COLUMNS: &str = "id, title, description, requirements, \
    department_id, category, status, requester_id, approver_id, rejection_reason, \
    contract_type, priority, created_at, updated_at, approved_at";

const TRANSITION_COLUMNS: &str = "id, hiring_request_id, actor_id, actor_role, action, \
    from_status, to_status, reason, created_at";

/// A validated status change together with the trail entry it produces.
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    pub write: StatusWrite,
    pub action: WorkflowAction,
    pub actor_role: Role,
}

#[async_trait]
pub trait HiringRequestRepository: Send + Sync {
    async fn create_request(&self, request: NewHiringRequest) -> Result<HiringRequest>;

    async fn get_request(&self, id: Uuid) -> Result<Option<HiringRequest>>;

    async fn list_requests(
        &self,
        filter: HiringRequestFilter,
        page: PageRequest,
    ) -> Result<HiringRequestList>;

    /// Descriptive edit; never touches workflow columns.
    async fn update_details(&self, id: Uuid, changes: HiringRequestChanges)
        -> Result<HiringRequest>;

    /// Atomically applies `record.write` if the stored status still equals
    /// `record.write.from`, and appends the trail entry.
    ///
    /// Fails with [`WorkflowError::Conflict`] when the stored status moved.
    async fn apply_transition(
        &self,
        id: Uuid,
        record: TransitionRecord,
    ) -> Result<(HiringRequest, TransitionLog)>;

    async fn last_transition(&self, id: Uuid) -> Result<Option<TransitionLog>>;

    async fn list_transitions(&self, id: Uuid) -> Result<Vec<TransitionLog>>;

    /// Refused with [`Error::Conflict`] while candidatures reference the request.
    async fn delete_request(&self, id: Uuid) -> Result<()>;

    async fn stats(&self) -> Result<HiringRequestStats>;
}

#[async_trait]
impl HiringRequestRepository for PgStore {
    async fn create_request(&self, request: NewHiringRequest) -> Result<HiringRequest> {
        let query = format!(
            "INSERT INTO hiring_requests (
                title, description, requirements, department_id, category,
                status, requester_id, contract_type, priority
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}",
            HIRING_REQUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, HiringRequest>(&query)
            .bind(&request.title)
            .bind(&request.description)
            .bind(&request.requirements)
            .bind(request.department_id)
            .bind(request.category.as_str())
            .bind(RequestStatus::INITIAL.as_str())
            .bind(request.requester_id)
            .bind(request.contract_type.as_str())
            .bind(request.priority.as_str())
            .fetch_one(self.pool())
            .await?;
        Ok(row)
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<HiringRequest>> {
        let query = format!(
            "SELECT {} FROM hiring_requests WHERE id = $1",
            HIRING_REQUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, HiringRequest>(&query)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    async fn list_requests(
        &self,
        filter: HiringRequestFilter,
        page: PageRequest,
    ) -> Result<HiringRequestList> {
        let mut filters = Vec::new();
        let mut args: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            filters.push(format!("status = ${}", args.len() + 1));
            args.push(status.as_str().to_string());
        }
        if let Some(category) = filter.category {
            filters.push(format!("category = ${}", args.len() + 1));
            args.push(category.as_str().to_string());
        }
        if let Some(priority) = filter.priority {
            filters.push(format!("priority = ${}", args.len() + 1));
            args.push(priority.as_str().to_string());
        }
        if let Some(department_id) = filter.department_id {
            filters.push(format!("department_id::text = ${}", args.len() + 1));
            args.push(department_id.to_string());
        }
        if let Some(requester_id) = filter.requester_id {
            filters.push(format!("requester_id::text = ${}", args.len() + 1));
            args.push(requester_id.to_string());
        }
        if let Some(search) = filter.search {
            filters.push(format!("title ILIKE ${}", args.len() + 1));
            args.push(format!("%{}%", search));
        }

        let where_clause = if filters.is_empty() {
            "".to_string()
        } else {
            format!("WHERE {}", filters.join(" AND "))
        };

        let items_query = format!(
            "SELECT {} FROM hiring_requests {} ORDER BY created_at DESC, id LIMIT ${} OFFSET ${}",
            HIRING_REQUEST_COLUMNS,
            where_clause,
            args.len() + 1,
            args.len() + 2
        );
        let total_query = format!("SELECT COUNT(*) FROM hiring_requests {}", where_clause);

        let mut items_statement = sqlx::query_as::<_, HiringRequest>(&items_query);
        for value in &args {
            items_statement = items_statement.bind(value);
        }
        let items = items_statement
            .bind(page.per_page)
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;

        let mut total_statement = sqlx::query_scalar::<_, i64>(&total_query);
        for value in &args {
            total_statement = total_statement.bind(value);
        }
        let total = total_statement.fetch_one(self.pool()).await?;

        Ok(HiringRequestList {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages(total),
        })
    }

    async fn update_details(
        &self,
        id: Uuid,
        changes: HiringRequestChanges,
    ) -> Result<HiringRequest> {
        let query = format!(
            "UPDATE hiring_requests
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                requirements = COALESCE($4, requirements),
                department_id = COALESCE($5, department_id),
                category = COALESCE($6, category),
                contract_type = COALESCE($7, contract_type),
                priority = COALESCE($8, priority),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}",
            HIRING_REQUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, HiringRequest>(&query)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(&changes.requirements)
            .bind(changes.department_id)
            .bind(changes.category.map(|c| c.as_str()))
            .bind(changes.contract_type.map(|c| c.as_str()))
            .bind(changes.priority.map(|p| p.as_str()))
            .fetch_one(self.pool())
            .await?;
        Ok(row)
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        record: TransitionRecord,
    ) -> Result<(HiringRequest, TransitionLog)> {
        let write = &record.write;
        validator::check_status_write(write)?;

        let mut tx = self.pool().begin().await?;

        let update = format!(
            "UPDATE hiring_requests
            SET
                status = $3,
                approver_id = $4,
                rejection_reason = $5,
                approved_at = COALESCE(approved_at, $6),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}",
            HIRING_REQUEST_COLUMNS
        );
        let updated = sqlx::query_as::<_, HiringRequest>(&update)
            .bind(id)
            .bind(write.from.as_str())
            .bind(write.to.as_str())
            .bind(write.approver_id)
            .bind(&write.rejection_reason)
            .bind(write.approved_at)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(updated) = updated else {
            let stored: Option<String> =
                sqlx::query_scalar("SELECT status FROM hiring_requests WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;
            return match stored {
                None => Err(Error::NotFound(format!("Hiring request {} not found", id))),
                Some(raw) => {
                    let actual = raw
                        .parse::<RequestStatus>()
                        .map_err(|e| Error::Internal(e.to_string()))?;
                    Err(WorkflowError::Conflict {
                        expected: write.from,
                        actual,
                    }
                    .into())
                }
            };
        };

        let insert = format!(
            "INSERT INTO hiring_request_transitions
                (hiring_request_id, actor_id, actor_role, action, from_status, to_status, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}",
            TRANSITION_COLUMNS
        );
        let log = sqlx::query_as::<_, TransitionLog>(&insert)
            .bind(id)
            .bind(write.approver_id)
            .bind(record.actor_role.as_str())
            .bind(record.action.as_str())
            .bind(write.from.as_str())
            .bind(write.to.as_str())
            .bind(&write.rejection_reason)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((updated, log))
    }

    async fn last_transition(&self, id: Uuid) -> Result<Option<TransitionLog>> {
        let query = format!(
            "SELECT {} FROM hiring_request_transitions
             WHERE hiring_request_id = $1
             ORDER BY created_at DESC
             LIMIT 1",
            TRANSITION_COLUMNS
        );
        let row = sqlx::query_as::<_, TransitionLog>(&query)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    async fn list_transitions(&self, id: Uuid) -> Result<Vec<TransitionLog>> {
        let query = format!(
            "SELECT {} FROM hiring_request_transitions
             WHERE hiring_request_id = $1
             ORDER BY created_at ASC",
            TRANSITION_COLUMNS
        );
        let rows = sqlx::query_as::<_, TransitionLog>(&query)
            .bind(id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    async fn delete_request(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM hiring_requests WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(Error::NotFound(format!("Hiring request {} not found", id)));
        }

        let assigned: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM candidatures WHERE hiring_request_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if assigned > 0 {
            return Err(Error::Conflict(format!(
                "Hiring request {} still has {} assigned candidature(s)",
                id, assigned
            )));
        }

        sqlx::query("DELETE FROM hiring_requests WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn stats(&self) -> Result<HiringRequestStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hiring_requests")
            .fetch_one(self.pool())
            .await?;

        let mut stats = HiringRequestStats {
            total,
            ..Default::default()
        };
        for (column, target) in [
            ("status", &mut stats.by_status),
            ("category", &mut stats.by_category),
            ("priority", &mut stats.by_priority),
        ] {
            let query = format!(
                "SELECT {0}, COUNT(*) FROM hiring_requests GROUP BY {0}",
                column
            );
            let rows = sqlx::query_as::<_, (String, i64)>(&query)
                .fetch_all(self.pool())
                .await?;
            *target = rows.into_iter().collect::<BTreeMap<_, _>>();
        }
        Ok(stats)
    }
}

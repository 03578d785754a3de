use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::database::{
    CandidatureRepository, DirectoryRepository, HiringRequestRepository, PageRequest,
};
use crate::dto::hiring_request_dto::{CreateHiringRequestPayload, UpdateHiringRequestPayload};
use crate::error::{Error, Result};
use crate::models::candidature::Candidature;
use crate::models::hiring_request::{
    HiringRequest, HiringRequestChanges, HiringRequestFilter, HiringRequestList,
    HiringRequestStats, NewHiringRequest,
};
use crate::workflow::{validator as workflow_validator, RequestStatus, Role};

/// Intake, descriptive edits and administrative deletion. Status changes go
/// through [`super::workflow_service::WorkflowService`] only.
#[derive(Clone)]
pub struct HiringRequestService {
    requests: Arc<dyn HiringRequestRepository>,
    directory: Arc<dyn DirectoryRepository>,
    candidatures: Arc<dyn CandidatureRepository>,
}

impl HiringRequestService {
    pub fn new(
        requests: Arc<dyn HiringRequestRepository>,
        directory: Arc<dyn DirectoryRepository>,
        candidatures: Arc<dyn CandidatureRepository>,
    ) -> Self {
        Self {
            requests,
            directory,
            candidatures,
        }
    }

    /// Roles allowed to administer any request, regardless of who raised it.
    fn is_hr(role: &Role) -> bool {
        matches!(role, Role::HrManager | Role::HrDirector)
    }

    async fn actor_role(&self, actor_id: Uuid) -> Result<Role> {
        self.directory.actor_role(actor_id).await?.ok_or_else(|| {
            Error::Forbidden(format!("User {} is not an active directory member", actor_id))
        })
    }

    async fn ensure_department(&self, department_id: Uuid) -> Result<()> {
        match self.directory.get_department(department_id).await? {
            Some(_) => Ok(()),
            None => Err(Error::BadRequest(format!(
                "Department {} does not exist",
                department_id
            ))),
        }
    }

    pub async fn create(
        &self,
        requester_id: Uuid,
        payload: CreateHiringRequestPayload,
    ) -> Result<HiringRequest> {
        payload.validate()?;
        let title = payload.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::BadRequest("title must not be blank".to_string()));
        }

        let requester_active = self
            .directory
            .get_user(requester_id)
            .await?
            .map_or(false, |u| u.is_active);
        workflow_validator::check_new_request(
            payload.status.unwrap_or(RequestStatus::INITIAL),
            requester_id,
            requester_active,
        )?;
        self.ensure_department(payload.department_id).await?;

        let created = self
            .requests
            .create_request(NewHiringRequest {
                title,
                description: payload.description,
                requirements: payload.requirements,
                department_id: payload.department_id,
                category: payload.category,
                requester_id,
                contract_type: payload.contract_type,
                priority: payload.priority,
            })
            .await?;

        info!(
            hiring_request_id = %created.id,
            requester_id = %requester_id,
            "hiring request created"
        );
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<HiringRequest> {
        self.requests
            .get_request(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Hiring request {} not found", id)))
    }

    pub async fn list(
        &self,
        filter: HiringRequestFilter,
        page: PageRequest,
    ) -> Result<HiringRequestList> {
        self.requests.list_requests(filter, page).await
    }

    /// Descriptive edit. Open to the request's requester and to HR.
    pub async fn update(
        &self,
        id: Uuid,
        actor_id: Uuid,
        payload: UpdateHiringRequestPayload,
    ) -> Result<HiringRequest> {
        let workflow_fields = payload.workflow_fields();
        if !workflow_fields.is_empty() {
            return Err(Error::BadRequest(format!(
                "{} can only change through a workflow transition",
                workflow_fields.join(", ")
            )));
        }
        payload.validate()?;

        let changes = HiringRequestChanges::from(payload);
        if changes.title.as_deref().is_some_and(str::is_empty) {
            return Err(Error::BadRequest("title must not be blank".to_string()));
        }
        if changes.is_empty() {
            return Err(Error::BadRequest("No fields to update".to_string()));
        }

        let role = self.actor_role(actor_id).await?;
        let current = self.get(id).await?;
        if current.requester_id != actor_id && !Self::is_hr(&role) {
            return Err(Error::Forbidden(format!(
                "Only the requester or HR may edit hiring request {}",
                id
            )));
        }
        if let Some(department_id) = changes.department_id {
            self.ensure_department(department_id).await?;
        }

        let updated = self.requests.update_details(id, changes).await?;
        info!(hiring_request_id = %id, "hiring request details updated");
        Ok(updated)
    }

    /// Administrative deletion, reserved to HR.
    pub async fn delete(&self, id: Uuid, actor_id: Uuid) -> Result<()> {
        let role = self.actor_role(actor_id).await?;
        if !Self::is_hr(&role) {
            return Err(Error::Forbidden(format!(
                "Role {} may not delete hiring requests",
                role
            )));
        }
        self.requests.delete_request(id).await?;
        info!(hiring_request_id = %id, actor_id = %actor_id, "hiring request deleted");
        Ok(())
    }

    pub async fn stats(&self) -> Result<HiringRequestStats> {
        self.requests.stats().await
    }

    pub async fn candidatures_for(&self, id: Uuid) -> Result<Vec<Candidature>> {
        self.get(id).await?;
        self.candidatures.list_for_request(id).await
    }
}

//! Process-local store.
//!
//! Mirrors the Postgres constraints the services rely on: foreign keys,
//! unique e-mails and department names, the conditional status update and
//! the candidature guard on deletion.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{
    CandidatureRepository, DirectoryRepository, HiringRequestRepository, NotificationRepository,
    NotificationSink, PageRequest, TransitionRecord,
};
use crate::error::{Error, Result};
use crate::models::candidature::{Candidature, NewCandidature};
use crate::models::department::Department;
use crate::models::hiring_request::{
    HiringRequest, HiringRequestChanges, HiringRequestFilter, HiringRequestList,
    HiringRequestStats, NewHiringRequest,
};
use crate::models::notification::{Notification, NotificationEvent};
use crate::models::transition_log::TransitionLog;
use crate::models::user::{NewUser, User};
use crate::utils::time::now;
use crate::workflow::{validator, RequestStatus, WorkflowError};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    departments: HashMap<Uuid, Department>,
    requests: HashMap<Uuid, HiringRequest>,
    transitions: Vec<TransitionLog>,
    candidatures: HashMap<Uuid, Candidature>,
    notifications: Vec<Notification>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }
}

fn missing_reference() -> Error {
    Error::BadRequest("Referenced resource does not exist".to_string())
}

fn not_found(what: &str, id: Uuid) -> Error {
    Error::NotFound(format!("{} {} not found", what, id))
}

#[async_trait]
impl HiringRequestRepository for MemoryStore {
    async fn create_request(&self, request: NewHiringRequest) -> Result<HiringRequest> {
        let mut state = self.lock()?;
        if !state.departments.contains_key(&request.department_id)
            || !state.users.contains_key(&request.requester_id)
        {
            return Err(missing_reference());
        }

        let created_at = now();
        let record = HiringRequest {
            id: Uuid::new_v4(),
            title: request.title,
            description: request.description,
            requirements: request.requirements,
            department_id: request.department_id,
            category: request.category,
            status: RequestStatus::INITIAL,
            requester_id: request.requester_id,
            approver_id: None,
            rejection_reason: None,
            contract_type: request.contract_type,
            priority: request.priority,
            created_at,
            updated_at: created_at,
            approved_at: None,
        };
        state.requests.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<HiringRequest>> {
        Ok(self.lock()?.requests.get(&id).cloned())
    }

    async fn list_requests(
        &self,
        filter: HiringRequestFilter,
        page: PageRequest,
    ) -> Result<HiringRequestList> {
        let state = self.lock()?;
        let mut matching: Vec<HiringRequest> = state
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect();

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
        let mut state = self.lock()?;
        if let Some(department_id) = changes.department_id {
            if !state.departments.contains_key(&department_id) {
                return Err(missing_reference());
            }
        }
        let request = state
            .requests
            .get_mut(&id)
            .ok_or_else(|| not_found("Hiring request", id))?;
        changes.apply_to(request);
        request.updated_at = now();
        Ok(request.clone())
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        record: TransitionRecord,
    ) -> Result<(HiringRequest, TransitionLog)> {
        let write = &record.write;
        validator::check_status_write(write)?;

        let mut state = self.lock()?;
        let request = state
            .requests
            .get_mut(&id)
            .ok_or_else(|| not_found("Hiring request", id))?;
        if request.status != write.from {
            return Err(WorkflowError::Conflict {
                expected: write.from,
                actual: request.status,
            }
            .into());
        }

        let applied_at = now();
        request.status = write.to;
        request.approver_id = Some(write.approver_id);
        request.rejection_reason = write.rejection_reason.clone();
        if request.approved_at.is_none() {
            request.approved_at = write.approved_at;
        }
        request.updated_at = applied_at;
        let updated = request.clone();

        let log = TransitionLog {
            id: Uuid::new_v4(),
            hiring_request_id: id,
            actor_id: write.approver_id,
            actor_role: record.actor_role.as_str().to_string(),
            action: record.action,
            from_status: write.from,
            to_status: write.to,
            reason: write.rejection_reason.clone(),
            created_at: applied_at,
        };
        state.transitions.push(log.clone());
        Ok((updated, log))
    }

    async fn last_transition(&self, id: Uuid) -> Result<Option<TransitionLog>> {
        let state = self.lock()?;
        Ok(state
            .transitions
            .iter()
            .rev()
            .find(|t| t.hiring_request_id == id)
            .cloned())
    }

    async fn list_transitions(&self, id: Uuid) -> Result<Vec<TransitionLog>> {
        let state = self.lock()?;
        Ok(state
            .transitions
            .iter()
            .filter(|t| t.hiring_request_id == id)
            .cloned()
            .collect())
    }

    async fn delete_request(&self, id: Uuid) -> Result<()> {
        let mut state = self.lock()?;
        if !state.requests.contains_key(&id) {
            return Err(not_found("Hiring request", id));
        }
        let assigned = state
            .candidatures
            .values()
            .filter(|c| c.hiring_request_id == Some(id))
            .count();
        if assigned > 0 {
            return Err(Error::Conflict(format!(
                "Hiring request {} still has {} assigned candidature(s)",
                id, assigned
            )));
        }
        state.requests.remove(&id);
        state.transitions.retain(|t| t.hiring_request_id != id);
        for notification in state.notifications.iter_mut() {
            if notification.hiring_request_id == Some(id) {
                notification.hiring_request_id = None;
            }
        }
        Ok(())
    }

    async fn stats(&self) -> Result<HiringRequestStats> {
        let state = self.lock()?;
        let mut stats = HiringRequestStats {
            total: state.requests.len() as i64,
            ..Default::default()
        };
        for request in state.requests.values() {
            bump(&mut stats.by_status, request.status.as_str());
            bump(&mut stats.by_category, request.category.as_str());
            bump(&mut stats.by_priority, request.priority.as_str());
        }
        Ok(stats)
    }
}

fn bump(counts: &mut BTreeMap<String, i64>, key: &str) {
    *counts.entry(key.to_string()).or_insert(0) += 1;
}

#[async_trait]
impl DirectoryRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.lock()?;
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(Error::Conflict("Resource already exists".to_string()));
        }
        let created_at = now();
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            role: user.role,
            is_active: true,
            created_at,
            updated_at: created_at,
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.lock()?.users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn create_department(&self, name: String) -> Result<Department> {
        let mut state = self.lock()?;
        if state.departments.values().any(|d| d.name == name) {
            return Err(Error::Conflict("Resource already exists".to_string()));
        }
        let record = Department {
            id: Uuid::new_v4(),
            name,
            created_at: now(),
        };
        state.departments.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_department(&self, id: Uuid) -> Result<Option<Department>> {
        Ok(self.lock()?.departments.get(&id).cloned())
    }

    async fn list_departments(&self) -> Result<Vec<Department>> {
        let mut departments: Vec<Department> =
            self.lock()?.departments.values().cloned().collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(departments)
    }
}

#[async_trait]
impl CandidatureRepository for MemoryStore {
    async fn create_candidature(&self, candidature: NewCandidature) -> Result<Candidature> {
        let mut state = self.lock()?;
        if let Some(request_id) = candidature.hiring_request_id {
            if !state.requests.contains_key(&request_id) {
                return Err(missing_reference());
            }
        }
        let created_at = now();
        let record = Candidature {
            id: Uuid::new_v4(),
            full_name: candidature.full_name,
            email: candidature.email,
            phone: candidature.phone,
            hiring_request_id: candidature.hiring_request_id,
            status: "new".to_string(),
            created_at,
            updated_at: created_at,
        };
        state.candidatures.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_candidature(&self, id: Uuid) -> Result<Option<Candidature>> {
        Ok(self.lock()?.candidatures.get(&id).cloned())
    }

    async fn list_candidatures(&self) -> Result<Vec<Candidature>> {
        let mut items: Vec<Candidature> = self.lock()?.candidatures.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn assign_candidature(
        &self,
        id: Uuid,
        hiring_request_id: Option<Uuid>,
    ) -> Result<Candidature> {
        let mut state = self.lock()?;
        if let Some(request_id) = hiring_request_id {
            if !state.requests.contains_key(&request_id) {
                return Err(missing_reference());
            }
        }
        let candidature = state
            .candidatures
            .get_mut(&id)
            .ok_or_else(|| not_found("Candidature", id))?;
        candidature.hiring_request_id = hiring_request_id;
        candidature.updated_at = now();
        Ok(candidature.clone())
    }

    async fn list_for_request(&self, hiring_request_id: Uuid) -> Result<Vec<Candidature>> {
        let mut items: Vec<Candidature> = self
            .lock()?
            .candidatures
            .values()
            .filter(|c| c.hiring_request_id == Some(hiring_request_id))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }
}

#[async_trait]
impl NotificationSink for MemoryStore {
    async fn emit(&self, event: NotificationEvent) -> Result<()> {
        let mut state = self.lock()?;
        state.notifications.push(Notification {
            id: Uuid::new_v4(),
            sender_id: event.sender_id,
            receiver_id: event.receiver_id,
            hiring_request_id: Some(event.hiring_request_id),
            message: event.message,
            read_at: None,
            created_at: now(),
        });
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn list_notifications(
        &self,
        receiver_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>> {
        let state = self.lock()?;
        Ok(state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.receiver_id == receiver_id && (!unread_only || n.read_at.is_none()))
            .cloned()
            .collect())
    }

    async fn unread_count(&self, receiver_id: Uuid) -> Result<i64> {
        let state = self.lock()?;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.receiver_id == receiver_id && n.read_at.is_none())
            .count() as i64)
    }

    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> Result<Notification> {
        let mut state = self.lock()?;
        let notification = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.receiver_id == receiver_id)
            .ok_or_else(|| not_found("Notification", id))?;
        if notification.read_at.is_none() {
            notification.read_at = Some(now());
        }
        Ok(notification.clone())
    }
}

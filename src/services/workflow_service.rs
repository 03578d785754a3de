use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{
    DirectoryRepository, HiringRequestRepository, NotificationSink, TransitionRecord,
};
use crate::error::{Error, Result};
use crate::models::hiring_request::HiringRequest;
use crate::models::notification::NotificationEvent;
use crate::models::transition_log::TransitionLog;
use crate::utils::time::now;
use crate::workflow::{
    resolver, RequestStatus, Role, StatusWrite, WorkflowAction, WorkflowError,
};

#[derive(Debug, Clone)]
pub struct TransitionCommand {
    pub action: WorkflowAction,
    pub reason: Option<String>,
    /// Status the caller based its decision on. The write only lands while
    /// the stored status still equals it.
    pub expected_status: RequestStatus,
}

#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub request: HiringRequest,
    pub transition: TransitionLog,
    /// The same write had already been applied; nothing was written or sent.
    pub replayed: bool,
}

/// Applies approve/reject decisions to hiring requests.
#[derive(Clone)]
pub struct WorkflowService {
    requests: Arc<dyn HiringRequestRepository>,
    directory: Arc<dyn DirectoryRepository>,
    notifier: Arc<dyn NotificationSink>,
}

impl WorkflowService {
    pub fn new(
        requests: Arc<dyn HiringRequestRepository>,
        directory: Arc<dyn DirectoryRepository>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            requests,
            directory,
            notifier,
        }
    }

    async fn actor_role(&self, actor_id: Uuid) -> Result<Role> {
        self.directory.actor_role(actor_id).await?.ok_or_else(|| {
            Error::Forbidden(format!("User {} is not an active directory member", actor_id))
        })
    }

    async fn load(&self, id: Uuid) -> Result<HiringRequest> {
        self.requests
            .get_request(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Hiring request {} not found", id)))
    }

    pub async fn allowed_actions(
        &self,
        request: &HiringRequest,
        actor_id: Uuid,
    ) -> Result<Vec<WorkflowAction>> {
        let role = self.directory.actor_role(actor_id).await?;
        Ok(role
            .map(|role| resolver::allowed_actions(request.status, &role))
            .unwrap_or_default())
    }

    pub async fn history(&self, id: Uuid) -> Result<Vec<TransitionLog>> {
        self.load(id).await?;
        self.requests.list_transitions(id).await
    }

    pub async fn transition(
        &self,
        id: Uuid,
        actor_id: Uuid,
        command: TransitionCommand,
    ) -> Result<TransitionOutcome> {
        let role = self.actor_role(actor_id).await?;
        let current = self.load(id).await?;
        resolver::check_approver(current.status, &role, command.action)?;
        let observed = command.expected_status;

        if observed != current.status {
            return self
                .replay_or_conflict(&current, actor_id, &role, &command, observed)
                .await;
        }

        let decision = resolver::resolve(
            current.status,
            &role,
            command.action,
            command.reason.as_deref(),
        )?;
        let record = TransitionRecord {
            write: StatusWrite::from_decision(&decision, actor_id, now()),
            action: command.action,
            actor_role: role.clone(),
        };

        let (updated, log) = match self.requests.apply_transition(id, record).await {
            Ok(applied) => applied,
            Err(Error::Workflow(WorkflowError::Conflict { .. })) => {
                let latest = self.load(id).await?;
                return self
                    .replay_or_conflict(&latest, actor_id, &role, &command, observed)
                    .await;
            }
            Err(err) => return Err(err),
        };

        info!(
            hiring_request_id = %id,
            actor_id = %actor_id,
            role = %role,
            action = %command.action,
            from = %log.from_status,
            to = %log.to_status,
            "hiring request transition applied"
        );

        self.notify(&updated, &log, &role).await;

        Ok(TransitionOutcome {
            request: updated,
            transition: log,
            replayed: false,
        })
    }

    /// The stored status differs from what the caller decided on. Either the
    /// caller's own write already landed (a retry), or someone else moved it.
    async fn replay_or_conflict(
        &self,
        current: &HiringRequest,
        actor_id: Uuid,
        role: &Role,
        command: &TransitionCommand,
        observed: RequestStatus,
    ) -> Result<TransitionOutcome> {
        let conflict = || -> Error {
            WorkflowError::Conflict {
                expected: observed,
                actual: current.status,
            }
            .into()
        };

        let Ok(decision) =
            resolver::resolve(observed, role, command.action, command.reason.as_deref())
        else {
            return Err(conflict());
        };

        match self.requests.last_transition(current.id).await? {
            Some(last)
                if current.status == decision.to
                    && last.is_same_write(actor_id, command.action, decision.from, decision.to) =>
            {
                info!(
                    hiring_request_id = %current.id,
                    actor_id = %actor_id,
                    to = %decision.to,
                    "replayed hiring request transition"
                );
                Ok(TransitionOutcome {
                    request: current.clone(),
                    transition: last,
                    replayed: true,
                })
            }
            _ => {
                warn!(
                    hiring_request_id = %current.id,
                    actor_id = %actor_id,
                    expected = %observed,
                    actual = %current.status,
                    "stale hiring request transition refused"
                );
                Err(conflict())
            }
        }
    }

    async fn notify(&self, request: &HiringRequest, log: &TransitionLog, role: &Role) {
        let event = NotificationEvent {
            sender_id: log.actor_id,
            receiver_id: request.requester_id,
            hiring_request_id: request.id,
            message: describe_transition(request, log, role),
        };
        if let Err(err) = self.notifier.emit(event).await {
            warn!(
                error = %err,
                hiring_request_id = %request.id,
                "failed to emit hiring request notification"
            );
        }
    }
}

pub fn describe_transition(request: &HiringRequest, log: &TransitionLog, role: &Role) -> String {
    match log.to_status {
        RequestStatus::Rejected => format!(
            "Hiring request \"{}\" was rejected by {}: {}",
            request.title,
            role,
            log.reason.as_deref().unwrap_or_default()
        ),
        RequestStatus::Approved => format!(
            "Hiring request \"{}\" received final approval from {}",
            request.title, role
        ),
        next => format!(
            "Hiring request \"{}\" was approved by {} and is now {}",
            request.title, role, next
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::notifications::MockNotificationSink;
    use crate::database::MemoryStore;
    use crate::models::hiring_request::{Category, ContractType, NewHiringRequest, Priority};
    use crate::models::user::NewUser;
    use crate::database::NotificationRepository;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: WorkflowService,
        requester: Uuid,
        request: HiringRequest,
    }

    async fn user(store: &MemoryStore, name: &str, role: &str) -> Uuid {
        store
            .create_user(NewUser {
                name: name.into(),
                email: format!("{}@example.com", name.to_lowercase()),
                role: role.into(),
            })
            .await
            .unwrap()
            .id
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let requester = user(&store, "Amine", "DEMANDEUR").await;
        let department = store.create_department("Maintenance".into()).await.unwrap();
        let request = store
            .create_request(NewHiringRequest {
                title: "Electrician".into(),
                description: None,
                requirements: None,
                department_id: department.id,
                category: Category::Moi,
                requester_id: requester,
                contract_type: ContractType::Cdi,
                priority: Priority::High,
            })
            .await
            .unwrap();
        let service = WorkflowService::new(store.clone(), store.clone(), store.clone());
        Fixture {
            store,
            service,
            requester,
            request,
        }
    }

    fn approve(seen: RequestStatus) -> TransitionCommand {
        TransitionCommand {
            action: WorkflowAction::Approve,
            reason: None,
            expected_status: seen,
        }
    }

    #[tokio::test]
    async fn full_approval_path_stamps_approver_and_date() {
        let f = fixture().await;
        let hr = user(&f.store, "Rim", "HR_MANAGER").await;
        let plant = user(&f.store, "Karim", "PLANT_MANAGER").await;
        let outsider = user(&f.store, "Nour", "DEMANDEUR").await;

        let first = f
            .service
            .transition(f.request.id, hr, approve(RequestStatus::PendingResponsableRh))
            .await
            .unwrap();
        assert_eq!(first.request.status, RequestStatus::PendingPlantManager);
        assert_eq!(first.request.approver_id, Some(hr));
        assert_eq!(first.request.rejection_reason, None);
        assert!(first.request.approved_at.is_none());

        let second = f
            .service
            .transition(f.request.id, plant, approve(RequestStatus::PendingPlantManager))
            .await
            .unwrap();
        assert_eq!(second.request.status, RequestStatus::Approved);
        assert_eq!(second.request.approver_id, Some(plant));
        assert!(second.request.approved_at.is_some());

        let err = f
            .service
            .transition(f.request.id, outsider, approve(RequestStatus::Approved))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Workflow(WorkflowError::Forbidden { .. })));
        let stored = f.store.get_request(f.request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Approved);

        let inbox = f.store.list_notifications(f.requester, false).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert!(inbox.iter().all(|n| n.receiver_id == f.requester));
    }

    #[tokio::test]
    async fn rejection_is_terminal() {
        let f = fixture().await;
        let hr = user(&f.store, "Rim", "Responsable RH").await;
        let plant = user(&f.store, "Karim", "Plant Manager (TTG)").await;
        f.service
            .transition(f.request.id, hr, approve(RequestStatus::PendingResponsableRh))
            .await
            .unwrap();

        let rejected = f
            .service
            .transition(
                f.request.id,
                plant,
                TransitionCommand {
                    action: WorkflowAction::Reject,
                    reason: Some("Budget freeze".into()),
                    expected_status: RequestStatus::PendingPlantManager,
                },
            )
            .await
            .unwrap();
        assert_eq!(rejected.request.status, RequestStatus::Rejected);
        assert_eq!(rejected.request.rejection_reason.as_deref(), Some("Budget freeze"));

        let err = f
            .service
            .transition(f.request.id, plant, approve(RequestStatus::Rejected))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Workflow(WorkflowError::TerminalStatus(RequestStatus::Rejected))
        ));
        let stored = f.store.get_request(f.request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Rejected);
        assert_eq!(stored.approver_id, Some(plant));
    }

    #[tokio::test]
    async fn reject_without_reason_changes_nothing() {
        let f = fixture().await;
        let hr = user(&f.store, "Rim", "HR_MANAGER").await;
        let err = f
            .service
            .transition(
                f.request.id,
                hr,
                TransitionCommand {
                    action: WorkflowAction::Reject,
                    reason: Some("  ".into()),
                    expected_status: RequestStatus::PendingResponsableRh,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Workflow(WorkflowError::MissingRejectionReason)));
        let stored = f.store.get_request(f.request.id).await.unwrap().unwrap();
        assert_eq!(stored, f.request);
    }

    #[tokio::test]
    async fn retried_transition_is_replayed_once() {
        let f = fixture().await;
        let hr = user(&f.store, "Rim", "HR_MANAGER").await;
        let command = approve(RequestStatus::PendingResponsableRh);

        let first = f.service.transition(f.request.id, hr, command.clone()).await.unwrap();
        let retry = f.service.transition(f.request.id, hr, command).await.unwrap();

        assert!(!first.replayed);
        assert!(retry.replayed);
        assert_eq!(retry.request.approver_id, first.request.approver_id);
        assert_eq!(retry.transition.id, first.transition.id);
        assert_eq!(f.store.list_transitions(f.request.id).await.unwrap().len(), 1);
        assert_eq!(f.store.unread_count(f.requester).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stale_decision_from_another_actor_conflicts() {
        let f = fixture().await;
        let first_hr = user(&f.store, "Rim", "HR_MANAGER").await;
        let second_hr = user(&f.store, "Sana", "Responsable RH (TTG)").await;
        let command = approve(RequestStatus::PendingResponsableRh);

        let a = f.service.clone();
        let b = f.service.clone();
        let (ra, rb) = tokio::join!(
            a.transition(f.request.id, first_hr, command.clone()),
            b.transition(f.request.id, second_hr, command)
        );

        let outcomes = [ra, rb];
        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(loser, Error::Workflow(WorkflowError::Conflict { .. })));

        let trail = f.store.list_transitions(f.request.id).await.unwrap();
        assert_eq!(trail.len(), 1);
        let stored = f.store.get_request(f.request.id).await.unwrap().unwrap();
        assert_eq!(stored.approver_id, Some(trail[0].actor_id));
    }

    #[tokio::test]
    async fn second_approver_working_from_the_same_view_conflicts() {
        let f = fixture().await;
        let first_hr = user(&f.store, "Rim", "HR_MANAGER").await;
        let second_hr = user(&f.store, "Sana", "Responsable RH").await;
        let seen = RequestStatus::PendingResponsableRh;

        f.service
            .transition(f.request.id, first_hr, approve(seen))
            .await
            .unwrap();
        let err = f
            .service
            .transition(f.request.id, second_hr, approve(seen))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Workflow(WorkflowError::Conflict {
                expected: RequestStatus::PendingResponsableRh,
                actual: RequestStatus::PendingPlantManager,
            })
        ));
    }

    #[tokio::test]
    async fn non_approver_with_stale_view_is_forbidden_not_conflicting() {
        let f = fixture().await;
        let hr = user(&f.store, "Rim", "HR_MANAGER").await;
        let seen = RequestStatus::PendingResponsableRh;
        f.service
            .transition(f.request.id, hr, approve(seen))
            .await
            .unwrap();

        let err = f
            .service
            .transition(f.request.id, f.requester, approve(seen))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Workflow(WorkflowError::Forbidden { .. })));
        assert_eq!(f.store.list_transitions(f.request.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn notification_failure_keeps_the_transition() {
        let f = fixture().await;
        let hr = user(&f.store, "Rim", "HR_MANAGER").await;

        let mut sink = MockNotificationSink::new();
        sink.expect_emit()
            .times(1)
            .returning(|_| Err(Error::Internal("sink offline".into())));
        let service = WorkflowService::new(f.store.clone(), f.store.clone(), Arc::new(sink));

        let outcome = service
            .transition(f.request.id, hr, approve(RequestStatus::PendingResponsableRh))
            .await
            .unwrap();
        assert_eq!(outcome.request.status, RequestStatus::PendingPlantManager);
        let stored = f.store.get_request(f.request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::PendingPlantManager);
    }

    #[tokio::test]
    async fn inactive_or_unknown_actor_is_forbidden() {
        let f = fixture().await;
        let err = f
            .service
            .transition(f.request.id, Uuid::new_v4(), approve(RequestStatus::PendingResponsableRh))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn allowed_actions_reflect_actor_role() {
        let f = fixture().await;
        let hr = user(&f.store, "Rim", "HR_MANAGER").await;
        let actions = f.service.allowed_actions(&f.request, hr).await.unwrap();
        assert_eq!(actions, vec![WorkflowAction::Approve, WorkflowAction::Reject]);
        let none = f.service.allowed_actions(&f.request, f.requester).await.unwrap();
        assert!(none.is_empty());
    }
}

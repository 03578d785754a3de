use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use crate::database::PageRequest;
use crate::models::hiring_request::{
    Category, ContractType, HiringRequest, HiringRequestChanges, HiringRequestFilter,
    HiringRequestList, Priority,
};
use crate::models::transition_log::TransitionLog;
use crate::services::workflow_service::{TransitionCommand, TransitionOutcome};
use crate::workflow::{resolver, RequestStatus, Role, TransitionRule, WorkflowAction};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateHiringRequestPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub department_id: Uuid,
    pub category: Category,
    pub contract_type: ContractType,
    #[serde(default)]
    pub priority: Priority,
    /// Accepted only when equal to the initial status.
    pub status: Option<RequestStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateHiringRequestPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub department_id: Option<Uuid>,
    pub category: Option<Category>,
    pub contract_type: Option<ContractType>,
    pub priority: Option<Priority>,

    // Workflow columns. Captured only so an edit that names them can be refused.
    #[serde(default, skip_serializing)]
    pub status: Option<JsonValue>,
    #[serde(default, skip_serializing)]
    pub approver_id: Option<JsonValue>,
    #[serde(default, skip_serializing)]
    pub rejection_reason: Option<JsonValue>,
    #[serde(default, skip_serializing)]
    pub approved_at: Option<JsonValue>,
}

impl UpdateHiringRequestPayload {
    pub fn workflow_fields(&self) -> Vec<&'static str> {
        [
            ("status", self.status.is_some()),
            ("approver_id", self.approver_id.is_some()),
            ("rejection_reason", self.rejection_reason.is_some()),
            ("approved_at", self.approved_at.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

impl From<UpdateHiringRequestPayload> for HiringRequestChanges {
    fn from(value: UpdateHiringRequestPayload) -> Self {
        Self {
            title: value.title.map(|t| t.trim().to_string()),
            description: value.description,
            requirements: value.requirements,
            department_id: value.department_id,
            category: value.category,
            contract_type: value.contract_type,
            priority: value.priority,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransitionPayload {
    pub action: WorkflowAction,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
    /// Status the client based its decision on. Required: a decision made
    /// on a view that has since moved is refused with a conflict.
    pub expected_status: RequestStatus,
}

impl From<TransitionPayload> for TransitionCommand {
    fn from(value: TransitionPayload) -> Self {
        Self {
            action: value.action,
            reason: value.reason,
            expected_status: value.expected_status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HiringRequestListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<RequestStatus>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub department_id: Option<Uuid>,
    pub requester_id: Option<Uuid>,
    pub search: Option<String>,
}

impl HiringRequestListQuery {
    pub fn into_parts(self) -> (HiringRequestFilter, PageRequest) {
        let page = PageRequest::new(self.page, self.per_page);
        let filter = HiringRequestFilter {
            status: self.status,
            category: self.category,
            priority: self.priority,
            department_id: self.department_id,
            requester_id: self.requester_id,
            search: self.search.filter(|s| !s.trim().is_empty()),
        };
        (filter, page)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiringRequestListResponse {
    pub items: Vec<HiringRequest>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl From<HiringRequestList> for HiringRequestListResponse {
    fn from(value: HiringRequestList) -> Self {
        Self {
            items: value.items,
            total: value.total,
            page: value.page,
            per_page: value.per_page,
            total_pages: value.total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HiringRequestDetailResponse {
    #[serde(flatten)]
    pub request: HiringRequest,
    /// Actions the calling user may take right now.
    pub allowed_actions: Vec<WorkflowAction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionResponse {
    pub request: HiringRequest,
    pub transition: TransitionLog,
    pub replayed: bool,
}

impl From<TransitionOutcome> for TransitionResponse {
    fn from(value: TransitionOutcome) -> Self {
        Self {
            request: value.request,
            transition: value.transition,
            replayed: value.replayed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowRulesResponse {
    pub initial_status: RequestStatus,
    pub terminal_statuses: Vec<RequestStatus>,
    pub rules: &'static [TransitionRule],
    /// Canonical role → accepted directory spellings.
    pub role_aliases: BTreeMap<String, &'static [&'static str]>,
}

impl WorkflowRulesResponse {
    pub fn current() -> Self {
        let role_aliases = resolver::approver_roles()
            .into_iter()
            .chain(std::iter::once(Role::Requester))
            .map(|role| (role.as_str().to_string(), role.aliases()))
            .collect();
        Self {
            initial_status: RequestStatus::INITIAL,
            terminal_statuses: RequestStatus::ALL
                .into_iter()
                .filter(RequestStatus::is_terminal)
                .collect(),
            rules: resolver::rules(),
            role_aliases,
        }
    }
}

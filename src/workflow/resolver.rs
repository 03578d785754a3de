//! Transition resolver.
//!
//! The permitted transitions live in [`RULES`] as plain data. Every call
//! site that needs to know "what happens if this actor clicks approve"
//! goes through [`resolve`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::WorkflowError;
use super::role::Role;
use super::status::RequestStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Approve,
    Reject,
}

impl WorkflowAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject => "reject",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(WorkflowAction::Approve),
            "reject" => Ok(WorkflowAction::Reject),
            other => Err(format!("unknown workflow action: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionRule {
    pub from: RequestStatus,
    pub action: WorkflowAction,
    pub roles: &'static [Role],
    pub to: RequestStatus,
}

pub const RULES: &[TransitionRule] = &[
    TransitionRule {
        from: RequestStatus::PendingResponsableRh,
        action: WorkflowAction::Approve,
        roles: &[Role::HrManager],
        to: RequestStatus::PendingPlantManager,
    },
    TransitionRule {
        from: RequestStatus::PendingHrDirector,
        action: WorkflowAction::Approve,
        roles: &[Role::HrDirector],
        to: RequestStatus::PendingPlantManager,
    },
    TransitionRule {
        from: RequestStatus::PendingPlantManager,
        action: WorkflowAction::Approve,
        roles: &[Role::PlantManager],
        to: RequestStatus::Approved,
    },
    TransitionRule {
        from: RequestStatus::PendingResponsableRh,
        action: WorkflowAction::Reject,
        roles: &[Role::HrManager],
        to: RequestStatus::Rejected,
    },
    TransitionRule {
        from: RequestStatus::PendingHrDirector,
        action: WorkflowAction::Reject,
        roles: &[Role::HrDirector],
        to: RequestStatus::Rejected,
    },
    TransitionRule {
        from: RequestStatus::PendingPlantManager,
        action: WorkflowAction::Reject,
        roles: &[Role::PlantManager],
        to: RequestStatus::Rejected,
    },
];

/// Outcome of a permitted transition, ready to be handed to the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub action: WorkflowAction,
    pub rejection_reason: Option<String>,
}

pub fn rules() -> &'static [TransitionRule] {
    RULES
}

pub fn rule_for(status: RequestStatus, action: WorkflowAction) -> Option<&'static TransitionRule> {
    RULES
        .iter()
        .find(|rule| rule.from == status && rule.action == action)
}

pub fn required_roles(status: RequestStatus, action: WorkflowAction) -> Vec<Role> {
    rule_for(status, action)
        .map(|rule| rule.roles.to_vec())
        .unwrap_or_default()
}

/// Every role that may act at some stage, in table order.
pub fn approver_roles() -> Vec<Role> {
    let mut roles: Vec<Role> = Vec::new();
    for role in RULES.iter().flat_map(|rule| rule.roles.iter()) {
        if !roles.contains(role) {
            roles.push(role.clone());
        }
    }
    roles
}

pub fn allowed_actions(status: RequestStatus, role: &Role) -> Vec<WorkflowAction> {
    RULES
        .iter()
        .filter(|rule| rule.from == status && rule.roles.contains(role))
        .map(|rule| rule.action)
        .collect()
}

/// Refuses roles that hold no approval right at any stage. Independent of
/// whether the caller's view of `current` is up to date.
pub fn check_approver(
    current: RequestStatus,
    role: &Role,
    action: WorkflowAction,
) -> Result<(), WorkflowError> {
    let approvers = approver_roles();
    if approvers.contains(role) {
        return Ok(());
    }
    let required = if current.is_terminal() {
        approvers
    } else {
        required_roles(current, action)
    };
    Err(WorkflowError::Forbidden {
        role: role.to_string(),
        action: action.as_str(),
        status: current,
        required,
    })
}

pub fn resolve(
    current: RequestStatus,
    role: &Role,
    action: WorkflowAction,
    reason: Option<&str>,
) -> Result<Decision, WorkflowError> {
    check_approver(current, role, action)?;

    if current.is_terminal() {
        return Err(WorkflowError::TerminalStatus(current));
    }

    let rule = rule_for(current, action).ok_or(WorkflowError::TerminalStatus(current))?;
    if !rule.roles.contains(role) {
        return Err(WorkflowError::Forbidden {
            role: role.to_string(),
            action: action.as_str(),
            status: current,
            required: rule.roles.to_vec(),
        });
    }

    let rejection_reason = match action {
        WorkflowAction::Approve => None,
        WorkflowAction::Reject => {
            let reason = reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or(WorkflowError::MissingRejectionReason)?;
            Some(reason.to_string())
        }
    };

    Ok(Decision {
        from: current,
        to: rule.to,
        action,
        rejection_reason,
    })
}

//! Write-time checks for workflow fields.
//!
//! Repository implementations call [`check_status_write`] right before they
//! persist a status change, against the status they are about to overwrite.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::WorkflowError;
use super::resolver::{Decision, RULES};
use super::status::RequestStatus;

/// Everything a status change writes to a hiring request row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusWrite {
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub approver_id: Uuid,
    pub rejection_reason: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl StatusWrite {
    pub fn from_decision(decision: &Decision, approver_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            from: decision.from,
            to: decision.to,
            approver_id,
            rejection_reason: decision.rejection_reason.clone(),
            approved_at: (decision.to == RequestStatus::Approved).then_some(now),
        }
    }
}

/// One edge of the transition graph, regardless of who may take it.
pub fn is_reachable(from: RequestStatus, to: RequestStatus) -> bool {
    RULES.iter().any(|rule| rule.from == from && rule.to == to)
}

pub fn check_status_write(write: &StatusWrite) -> Result<(), WorkflowError> {
    if write.from.is_terminal() {
        return Err(WorkflowError::TerminalStatus(write.from));
    }
    if !is_reachable(write.from, write.to) {
        return Err(WorkflowError::Unreachable {
            from: write.from,
            to: write.to,
        });
    }

    let has_reason = write
        .rejection_reason
        .as_deref()
        .is_some_and(|r| !r.trim().is_empty());
    match write.to {
        RequestStatus::Rejected if !has_reason => {
            return Err(WorkflowError::MissingRejectionReason)
        }
        RequestStatus::Rejected => {}
        _ if write.rejection_reason.is_some() => {
            return Err(WorkflowError::UnexpectedRejectionReason)
        }
        _ => {}
    }

    if (write.to == RequestStatus::Approved) != write.approved_at.is_some() {
        return Err(WorkflowError::ApprovalStamp);
    }
    Ok(())
}

/// Creation-time check. `requester_active` is the directory's answer for
/// the requester id.
pub fn check_new_request(
    status: RequestStatus,
    requester_id: Uuid,
    requester_active: bool,
) -> Result<(), WorkflowError> {
    if status != RequestStatus::INITIAL {
        return Err(WorkflowError::InvalidInitialStatus(status));
    }
    if !requester_active {
        return Err(WorkflowError::UnknownRequester(requester_id));
    }
    Ok(())
}

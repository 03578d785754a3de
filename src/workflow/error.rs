use super::role::Role;
use super::status::RequestStatus;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("role {role} may not {action} a request at \"{status}\"; required role(s): {}", join_roles(.required))]
    Forbidden {
        role: String,
        action: &'static str,
        status: RequestStatus,
        required: Vec<Role>,
    },

    #[error("a rejection reason is required")]
    MissingRejectionReason,

    #[error("hiring request is already \"{0}\"; no further transition is possible")]
    TerminalStatus(RequestStatus),

    #[error("status \"{to}\" is not reachable from \"{from}\"")]
    Unreachable {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("a rejection reason may only be recorded when rejecting")]
    UnexpectedRejectionReason,

    #[error("approval date must be set exactly when a request becomes approved")]
    ApprovalStamp,

    #[error("new hiring requests must start at \"Pending Responsable RH\", got \"{0}\"")]
    InvalidInitialStatus(RequestStatus),

    #[error("requester {0} does not reference an active user")]
    UnknownRequester(uuid::Uuid),

    #[error("hiring request moved from \"{expected}\" to \"{actual}\" since it was read")]
    Conflict {
        expected: RequestStatus,
        actual: RequestStatus,
    },
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

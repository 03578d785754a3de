use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Approval stage of a hiring request.
///
/// The serialized form is the label stored in the `status` column and shown
/// to users, e.g. `"Pending Plant Manager"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequestStatus {
    #[serde(rename = "Pending Responsable RH")]
    PendingResponsableRh,
    #[serde(rename = "Pending HR Director")]
    PendingHrDirector,
    #[serde(rename = "Pending Plant Manager")]
    PendingPlantManager,
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "Rejected")]
    Rejected,
}

impl RequestStatus {
    pub const INITIAL: RequestStatus = RequestStatus::PendingResponsableRh;

    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::PendingResponsableRh,
        RequestStatus::PendingHrDirector,
        RequestStatus::PendingPlantManager,
        RequestStatus::Approved,
        RequestStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::PendingResponsableRh => "Pending Responsable RH",
            RequestStatus::PendingHrDirector => "Pending HR Director",
            RequestStatus::PendingPlantManager => "Pending Plant Manager",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hiring request status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for RequestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

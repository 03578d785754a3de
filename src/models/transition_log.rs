use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use super::decode_text;
use crate::workflow::{RequestStatus, WorkflowAction};

/// One applied workflow transition: the approval trail of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionLog {
    pub id: Uuid,
    pub hiring_request_id: Uuid,
    pub actor_id: Uuid,
    pub actor_role: String,
    pub action: WorkflowAction,
    pub from_status: RequestStatus,
    pub to_status: RequestStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransitionLog {
    /// True when this row records the same write a retried call would make.
    pub fn is_same_write(
        &self,
        actor_id: Uuid,
        action: WorkflowAction,
        from: RequestStatus,
        to: RequestStatus,
    ) -> bool {
        self.actor_id == actor_id
            && self.action == action
            && self.from_status == from
            && self.to_status == to
    }
}

impl<'r> FromRow<'r, PgRow> for TransitionLog {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            hiring_request_id: row.try_get("hiring_request_id")?,
            actor_id: row.try_get("actor_id")?,
            actor_role: row.try_get("actor_role")?,
            action: decode_text(row, "action")?,
            from_status: decode_text(row, "from_status")?,
            to_status: decode_text(row, "to_status")?,
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

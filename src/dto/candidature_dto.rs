use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::candidature::NewCandidature;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCandidaturePayload {
    #[validate(length(min = 1, max = 160))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    pub hiring_request_id: Option<Uuid>,
}

impl From<CreateCandidaturePayload> for NewCandidature {
    fn from(value: CreateCandidaturePayload) -> Self {
        Self {
            full_name: value.full_name.trim().to_string(),
            email: value.email.trim().to_lowercase(),
            phone: value.phone.filter(|p| !p.trim().is_empty()),
            hiring_request_id: value.hiring_request_id,
        }
    }
}

/// `null` clears the link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignCandidaturePayload {
    pub hiring_request_id: Option<Uuid>,
}

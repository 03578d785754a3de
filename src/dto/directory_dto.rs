use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{NewUser, User};
use crate::workflow::Role;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserPayload {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 80))]
    pub role: String,
}

impl From<CreateUserPayload> for NewUser {
    fn from(value: CreateUserPayload) -> Self {
        Self {
            name: value.name.trim().to_string(),
            email: value.email.trim().to_lowercase(),
            role: value.role.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: User,
    /// Role after alias folding, as the workflow sees it.
    pub workflow_role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let workflow_role = user.workflow_role();
        Self {
            user,
            workflow_role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDepartmentPayload {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
}

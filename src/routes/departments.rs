use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use super::extract::{AppJson};
use crate::{dto::directory_dto::CreateDepartmentPayload, error::Result, AppState};

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartmentPayload,
    responses(
        (status = 201, description = "Department created", body = Json<Department>),
        (status = 409, description = "Department name already used")
    )
)]
#[axum::debug_handler]
pub async fn create_department(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateDepartmentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let department = state
        .directory
        .create_department(payload.name.trim().to_string())
        .await?;
    Ok((StatusCode::CREATED, Json(department)))
}

#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "Departments by name", body = Json<Vec<Department>>)
    )
)]
#[axum::debug_handler]
pub async fn list_departments(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let departments = state.directory.list_departments().await?;
    Ok(Json(departments))
}

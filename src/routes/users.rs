use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use super::extract::{AppJson, AppPath};
use crate::{
    dto::directory_dto::{CreateUserPayload, UserResponse},
    error::{Error, Result},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "User created", body = Json<UserResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "E-mail already registered")
    )
)]
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.directory.create_user(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Directory users", body = Json<Vec<UserResponse>>)
    )
)]
#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let users = state.directory.list_users().await?;
    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User with folded workflow role", body = Json<UserResponse>),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state
        .directory
        .get_user(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {} not found", id)))?;
    Ok(Json(UserResponse::from(user)))
}

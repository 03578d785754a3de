use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use super::extract::{AppJson, AppPath};
use crate::{
    dto::candidature_dto::{AssignCandidaturePayload, CreateCandidaturePayload},
    error::{Error, Result},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/candidatures",
    request_body = CreateCandidaturePayload,
    responses(
        (status = 201, description = "Candidature created", body = Json<Candidature>),
        (status = 400, description = "Invalid payload or unknown hiring request")
    )
)]
#[axum::debug_handler]
pub async fn create_candidature(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCandidaturePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let candidature = state.candidatures.create_candidature(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(candidature)))
}

#[utoipa::path(
    get,
    path = "/api/candidatures",
    responses(
        (status = 200, description = "All candidatures, newest first", body = Json<Vec<Candidature>>)
    )
)]
#[axum::debug_handler]
pub async fn list_candidatures(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let items = state.candidatures.list_candidatures().await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/candidatures/{id}",
    params(
        ("id" = Uuid, Path, description = "Candidature ID")
    ),
    responses(
        (status = 200, description = "Candidature", body = Json<Candidature>),
        (status = 404, description = "Candidature not found")
    )
)]
#[axum::debug_handler]
pub async fn get_candidature(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let candidature = state
        .candidatures
        .get_candidature(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Candidature {} not found", id)))?;
    Ok(Json(candidature))
}

#[utoipa::path(
    put,
    path = "/api/candidatures/{id}/hiring-request",
    params(
        ("id" = Uuid, Path, description = "Candidature ID")
    ),
    request_body = AssignCandidaturePayload,
    responses(
        (status = 200, description = "Assignment updated", body = Json<Candidature>),
        (status = 400, description = "Unknown hiring request"),
        (status = 404, description = "Candidature not found")
    )
)]
#[axum::debug_handler]
pub async fn assign_candidature(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<AssignCandidaturePayload>,
) -> Result<impl IntoResponse> {
    let candidature = state
        .candidatures
        .assign_candidature(id, payload.hiring_request_id)
        .await?;
    Ok(Json(candidature))
}

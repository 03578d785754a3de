use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use super::extract::{AppJson, AppPath, AppQuery};
use crate::{
    dto::hiring_request_dto::{
        CreateHiringRequestPayload, HiringRequestDetailResponse, HiringRequestListQuery,
        HiringRequestListResponse, TransitionPayload, TransitionResponse,
        UpdateHiringRequestPayload, WorkflowRulesResponse,
    },
    error::Result,
    middleware::auth::Actor,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/hiring-requests",
    request_body = CreateHiringRequestPayload,
    responses(
        (status = 201, description = "Hiring request created", body = Json<HiringRequest>),
        (status = 400, description = "Invalid payload or non-initial status")
    )
)]
#[axum::debug_handler]
pub async fn create_hiring_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppJson(payload): AppJson<CreateHiringRequestPayload>,
) -> Result<impl IntoResponse> {
    let request = state
        .hiring_request_service
        .create(actor.id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/hiring-requests",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("status" = Option<String>, Query, description = "Status label"),
        ("category" = Option<String>, Query, description = "MOI, MOS or MOD"),
        ("priority" = Option<String>, Query, description = "Priority"),
        ("department_id" = Option<Uuid>, Query, description = "Department"),
        ("requester_id" = Option<Uuid>, Query, description = "Requester"),
        ("search" = Option<String>, Query, description = "Title contains")
    ),
    responses(
        (status = 200, description = "Paginated hiring requests", body = Json<HiringRequestListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_hiring_requests(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<HiringRequestListQuery>,
) -> Result<impl IntoResponse> {
    let (filter, page) = query.into_parts();
    let list = state.hiring_request_service.list(filter, page).await?;
    Ok(Json(HiringRequestListResponse::from(list)))
}

#[utoipa::path(
    get,
    path = "/api/hiring-requests/stats",
    responses(
        (status = 200, description = "Counts by status, category and priority", body = Json<HiringRequestStats>)
    )
)]
#[axum::debug_handler]
pub async fn hiring_request_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.hiring_request_service.stats().await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/hiring-requests/workflow",
    responses(
        (status = 200, description = "Transition table and role aliases", body = Json<WorkflowRulesResponse>)
    )
)]
#[axum::debug_handler]
pub async fn workflow_rules() -> impl IntoResponse {
    Json(WorkflowRulesResponse::current())
}

#[utoipa::path(
    get,
    path = "/api/hiring-requests/{id}",
    params(
        ("id" = Uuid, Path, description = "Hiring request ID")
    ),
    responses(
        (status = 200, description = "Hiring request with the caller's allowed actions", body = Json<HiringRequestDetailResponse>),
        (status = 404, description = "Hiring request not found")
    )
)]
#[axum::debug_handler]
pub async fn get_hiring_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let request = state.hiring_request_service.get(id).await?;
    let allowed_actions = state
        .workflow_service
        .allowed_actions(&request, actor.id)
        .await?;
    Ok(Json(HiringRequestDetailResponse {
        request,
        allowed_actions,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/hiring-requests/{id}",
    params(
        ("id" = Uuid, Path, description = "Hiring request ID")
    ),
    request_body = UpdateHiringRequestPayload,
    responses(
        (status = 200, description = "Hiring request updated", body = Json<HiringRequest>),
        (status = 400, description = "Invalid payload or workflow field present"),
        (status = 403, description = "Caller is neither the requester nor HR"),
        (status = 404, description = "Hiring request not found")
    )
)]
#[axum::debug_handler]
pub async fn update_hiring_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateHiringRequestPayload>,
) -> Result<impl IntoResponse> {
    let request = state
        .hiring_request_service
        .update(id, actor.id, payload)
        .await?;
    Ok(Json(request))
}

#[utoipa::path(
    delete,
    path = "/api/hiring-requests/{id}",
    params(
        ("id" = Uuid, Path, description = "Hiring request ID")
    ),
    responses(
        (status = 204, description = "Hiring request deleted"),
        (status = 403, description = "Caller holds no HR role"),
        (status = 404, description = "Hiring request not found"),
        (status = 409, description = "Candidatures are still assigned")
    )
)]
#[axum::debug_handler]
pub async fn delete_hiring_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    state.hiring_request_service.delete(id, actor.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/hiring-requests/{id}/transitions",
    params(
        ("id" = Uuid, Path, description = "Hiring request ID")
    ),
    request_body = TransitionPayload,
    responses(
        (status = 200, description = "Transition applied or replayed", body = Json<TransitionResponse>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Role not permitted at this stage"),
        (status = 404, description = "Hiring request not found"),
        (status = 409, description = "Status changed since it was read")
    )
)]
#[axum::debug_handler]
pub async fn apply_transition(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<TransitionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .workflow_service
        .transition(id, actor.id, payload.into())
        .await?;
    Ok(Json(TransitionResponse::from(outcome)))
}

#[utoipa::path(
    get,
    path = "/api/hiring-requests/{id}/transitions",
    params(
        ("id" = Uuid, Path, description = "Hiring request ID")
    ),
    responses(
        (status = 200, description = "Approval trail, oldest first", body = Json<Vec<TransitionLog>>),
        (status = 404, description = "Hiring request not found")
    )
)]
#[axum::debug_handler]
pub async fn list_transitions(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let trail = state.workflow_service.history(id).await?;
    Ok(Json(trail))
}

#[utoipa::path(
    get,
    path = "/api/hiring-requests/{id}/candidatures",
    params(
        ("id" = Uuid, Path, description = "Hiring request ID")
    ),
    responses(
        (status = 200, description = "Candidatures assigned to the request", body = Json<Vec<Candidature>>),
        (status = 404, description = "Hiring request not found")
    )
)]
#[axum::debug_handler]
pub async fn list_request_candidatures(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let items = state.hiring_request_service.candidatures_for(id).await?;
    Ok(Json(items))
}

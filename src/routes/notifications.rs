use axum::{
    extract::{Extension, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use super::extract::{AppPath, AppQuery};
use crate::{
    dto::notification_dto::{NotificationListQuery, UnreadCountResponse},
    error::Result,
    middleware::auth::Actor,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("unread_only" = Option<bool>, Query, description = "Only unread notifications")
    ),
    responses(
        (status = 200, description = "Caller's notifications, newest first", body = Json<Vec<Notification>>)
    )
)]
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppQuery(query): AppQuery<NotificationListQuery>,
) -> Result<impl IntoResponse> {
    let items = state
        .notifications
        .list_notifications(actor.id, query.unread_only.unwrap_or(false))
        .await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Unread notifications for the caller", body = Json<UnreadCountResponse>)
    )
)]
#[axum::debug_handler]
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let unread = state.notifications.unread_count(actor.id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked as read", body = Json<Notification>),
        (status = 404, description = "No such notification for the caller")
    )
)]
#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let notification = state.notifications.mark_read(id, actor.id).await?;
    Ok(Json(notification))
}

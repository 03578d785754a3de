pub mod candidatures;
pub mod departments;
pub mod extract;
pub mod health;
pub mod hiring_requests;
pub mod notifications;
pub mod users;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::middleware::{auth::require_bearer_auth, rate_limit};
use crate::AppState;

/// Every route of the service. Everything except `/health` requires a
/// bearer token and is rate limited per credential.
pub fn api_router(state: AppState, rps: u32) -> Router {
    let base_routes = Router::new().route("/health", get(health::health));

    let api = Router::new()
        .route(
            "/api/hiring-requests",
            get(hiring_requests::list_hiring_requests).post(hiring_requests::create_hiring_request),
        )
        .route(
            "/api/hiring-requests/stats",
            get(hiring_requests::hiring_request_stats),
        )
        .route(
            "/api/hiring-requests/workflow",
            get(hiring_requests::workflow_rules),
        )
        .route(
            "/api/hiring-requests/:id",
            get(hiring_requests::get_hiring_request)
                .patch(hiring_requests::update_hiring_request)
                .delete(hiring_requests::delete_hiring_request),
        )
        .route(
            "/api/hiring-requests/:id/transitions",
            get(hiring_requests::list_transitions).post(hiring_requests::apply_transition),
        )
        .route(
            "/api/hiring-requests/:id/candidatures",
            get(hiring_requests::list_request_candidatures),
        )
        .route(
            "/api/candidatures",
            get(candidatures::list_candidatures).post(candidatures::create_candidature),
        )
        .route("/api/candidatures/:id", get(candidatures::get_candidature))
        .route(
            "/api/candidatures/:id/hiring-request",
            put(candidatures::assign_candidature),
        )
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/:id", get(users::get_user))
        .route(
            "/api/departments",
            get(departments::list_departments).post(departments::create_department),
        )
        .route(
            "/api/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/api/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/api/notifications/:id/read",
            post(notifications::mark_read),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_bearer_auth,
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state(rps),
            rate_limit::rps_middleware,
        ));

    base_routes.merge(api).with_state(state)
}

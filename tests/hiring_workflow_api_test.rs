use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use hiring_backend::{
    database::{CandidatureRepository, DirectoryRepository, MemoryStore},
    middleware::auth::Claims,
    models::{candidature::NewCandidature, user::NewUser},
    routes, AppState,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test_secret_key";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    department_id: Uuid,
}

impl TestApp {
    async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let department = store
            .create_department("Production".into())
            .await
            .expect("seed department");
        let state = AppState::with_store(store.clone(), SECRET);
        Self {
            router: routes::api_router(state, 1_000),
            store,
            department_id: department.id,
        }
    }

    async fn user(&self, name: &str, role: &str) -> Uuid {
        self.store
            .create_user(NewUser {
                name: name.into(),
                email: format!("{}@example.com", name.to_lowercase()),
                role: role.into(),
            })
            .await
            .expect("seed user")
            .id
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        actor: Option<Uuid>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(actor)));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    async fn create_request(&self, requester: Uuid) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/hiring-requests",
                Some(requester),
                Some(json!({
                    "title": "Maintenance technician",
                    "department_id": self.department_id,
                    "category": "MOI",
                    "contract_type": "CDI",
                    "priority": "High"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["status"], "Pending Responsable RH");
        body["id"].as_str().expect("id").to_string()
    }
}

fn token(sub: Uuid) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        role: None,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("token")
}

#[tokio::test]
async fn approval_path_end_to_end() {
    let app = TestApp::new().await;
    let requester = app.user("Amine", "DEMANDEUR").await;
    let hr = app.user("Rim", "Responsable RH (TTG)").await;
    let plant = app.user("Karim", "PLANT_MANAGER").await;
    let id = app.create_request(requester).await;

    let (status, detail) = app
        .call("GET", &format!("/api/hiring-requests/{}", id), Some(hr), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["allowed_actions"], json!(["approve", "reject"]));

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/hiring-requests/{}/transitions", id),
            Some(hr),
            Some(json!({ "action": "approve", "expected_status": "Pending Responsable RH" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["request"]["status"], "Pending Plant Manager");
    assert_eq!(body["request"]["approver_id"], hr.to_string());
    assert_eq!(body["replayed"], false);

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/hiring-requests/{}/transitions", id),
            Some(plant),
            Some(json!({ "action": "approve", "expected_status": "Pending Plant Manager" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["request"]["status"], "Approved");
    assert!(body["request"]["approved_at"].is_string());

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/hiring-requests/{}/transitions", id),
            Some(requester),
            Some(json!({ "action": "approve", "expected_status": "Approved" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);

    let (_, trail) = app
        .call(
            "GET",
            &format!("/api/hiring-requests/{}/transitions", id),
            Some(requester),
            None,
        )
        .await;
    let trail = trail.as_array().expect("trail");
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0]["actor_role"], "HR_MANAGER");
    assert_eq!(trail[1]["to_status"], "Approved");

    let (_, count) = app
        .call("GET", "/api/notifications/unread-count", Some(requester), None)
        .await;
    assert_eq!(count["unread"], 2);
}

#[tokio::test]
async fn rejection_requires_reason_and_is_final() {
    let app = TestApp::new().await;
    let requester = app.user("Amine", "DEMANDEUR").await;
    let hr = app.user("Rim", "HR_MANAGER").await;
    let plant = app.user("Karim", "Direction").await;
    let id = app.create_request(requester).await;
    let uri = format!("/api/hiring-requests/{}/transitions", id);

    app.call(
        "POST",
        &uri,
        Some(hr),
        Some(json!({ "action": "approve", "expected_status": "Pending Responsable RH" })),
    )
    .await;

    let (status, _) = app
        .call(
            "POST",
            &uri,
            Some(plant),
            Some(json!({ "action": "reject", "expected_status": "Pending Plant Manager" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            "POST",
            &uri,
            Some(plant),
            Some(json!({
                "action": "reject",
                "reason": "Budget freeze",
                "expected_status": "Pending Plant Manager"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["request"]["status"], "Rejected");
    assert_eq!(body["request"]["rejection_reason"], "Budget freeze");

    let (status, body) = app
        .call(
            "POST",
            &uri,
            Some(plant),
            Some(json!({ "action": "approve", "expected_status": "Rejected" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (_, stored) = app
        .call("GET", &format!("/api/hiring-requests/{}", id), Some(plant), None)
        .await;
    assert_eq!(stored["status"], "Rejected");
    assert_eq!(stored["allowed_actions"], json!([]));
}

#[tokio::test]
async fn stale_expected_status_conflicts() {
    let app = TestApp::new().await;
    let requester = app.user("Amine", "DEMANDEUR").await;
    let first = app.user("Rim", "HR_MANAGER").await;
    let second = app.user("Sana", "Responsable RH").await;
    let id = app.create_request(requester).await;
    let uri = format!("/api/hiring-requests/{}/transitions", id);
    let decision = json!({ "action": "approve", "expected_status": "Pending Responsable RH" });

    let (status, _) = app
        .call("POST", &uri, Some(first), Some(decision.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, replay) = app
        .call("POST", &uri, Some(first), Some(decision.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replay["replayed"], true);

    let (status, body) = app
        .call("POST", &uri, Some(second), Some(decision.clone()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);

    let (status, body) = app.call("POST", &uri, Some(requester), Some(decision)).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);

    let (_, count) = app
        .call("GET", "/api/notifications/unread-count", Some(requester), None)
        .await;
    assert_eq!(count["unread"], 1);
}

#[tokio::test]
async fn descriptive_edit_cannot_touch_workflow_fields() {
    let app = TestApp::new().await;
    let requester = app.user("Amine", "DEMANDEUR").await;
    let id = app.create_request(requester).await;
    let uri = format!("/api/hiring-requests/{}", id);

    let (status, _) = app
        .call(
            "PATCH",
            &uri,
            Some(requester),
            Some(json!({ "title": "Senior technician", "status": "Approved" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            "PATCH",
            &uri,
            Some(requester),
            Some(json!({ "title": "Senior technician" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["title"], "Senior technician");
    assert_eq!(body["status"], "Pending Responsable RH");

    let colleague = app.user("Salma", "DEMANDEUR").await;
    let (status, body) = app
        .call(
            "PATCH",
            &uri,
            Some(colleague),
            Some(json!({ "priority": "Low" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);
}

#[tokio::test]
async fn creation_with_non_initial_status_is_refused() {
    let app = TestApp::new().await;
    let requester = app.user("Amine", "DEMANDEUR").await;
    let (status, _) = app
        .call(
            "POST",
            "/api/hiring-requests",
            Some(requester),
            Some(json!({
                "title": "Buyer",
                "department_id": app.department_id,
                "category": "MOS",
                "contract_type": "CDD",
                "status": "Approved"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            "POST",
            "/api/hiring-requests",
            Some(requester),
            Some(json!({
                "title": "Buyer",
                "department_id": app.department_id,
                "category": "MOS",
                "contract_type": "CDD",
                "status": "Pending HR"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert!(body["error"].is_string(), "{}", body);

    let (status, body) = app
        .call(
            "POST",
            "/api/hiring-requests",
            Some(requester),
            Some(json!({
                "title": "Buyer",
                "department_id": Uuid::new_v4(),
                "category": "MOS",
                "contract_type": "CDD"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("Department")));
}

#[tokio::test]
async fn malformed_input_gets_a_json_bad_request() {
    let app = TestApp::new().await;
    let requester = app.user("Amine", "DEMANDEUR").await;
    let hr = app.user("Rim", "HR_MANAGER").await;
    let id = app.create_request(requester).await;

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/hiring-requests/{}/transitions", id),
            Some(hr),
            Some(json!({ "action": "approve" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert!(body["error"].is_string(), "{}", body);

    let (status, body) = app
        .call("GET", "/api/hiring-requests/not-a-uuid", Some(hr), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert!(body["error"].is_string(), "{}", body);

    let (status, body) = app
        .call("GET", "/api/hiring-requests?status=Pending%20HR", Some(hr), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert!(body["error"].is_string(), "{}", body);

    let (_, stored) = app
        .call("GET", &format!("/api/hiring-requests/{}", id), Some(hr), None)
        .await;
    assert_eq!(stored["status"], "Pending Responsable RH");
}

#[tokio::test]
async fn deletion_is_blocked_while_candidatures_are_assigned() {
    let app = TestApp::new().await;
    let requester = app.user("Amine", "DEMANDEUR").await;
    let hr = app.user("Rim", "Directeur RH").await;
    let id = app.create_request(requester).await;
    let request_id = Uuid::parse_str(&id).expect("uuid");
    let candidature = app
        .store
        .create_candidature(NewCandidature {
            full_name: "Sami Ben Ali".into(),
            email: "sami@example.com".into(),
            phone: None,
            hiring_request_id: Some(request_id),
        })
        .await
        .expect("seed candidature");

    let uri = format!("/api/hiring-requests/{}", id);
    let (status, _) = app.call("DELETE", &uri, Some(hr), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call(
            "PUT",
            &format!("/api/candidatures/{}/hiring-request", candidature.id),
            Some(requester),
            Some(json!({ "hiring_request_id": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call("DELETE", &uri, Some(requester), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);

    let (status, _) = app.call("DELETE", &uri, Some(hr), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call("GET", &uri, Some(requester), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notifications_can_be_marked_read_by_their_receiver_only() {
    let app = TestApp::new().await;
    let requester = app.user("Amine", "DEMANDEUR").await;
    let hr = app.user("Rim", "HR_MANAGER").await;
    let id = app.create_request(requester).await;
    app.call(
        "POST",
        &format!("/api/hiring-requests/{}/transitions", id),
        Some(hr),
        Some(json!({ "action": "approve", "expected_status": "Pending Responsable RH" })),
    )
    .await;

    let (_, inbox) = app
        .call("GET", "/api/notifications?unread_only=true", Some(requester), None)
        .await;
    let inbox = inbox.as_array().expect("inbox").clone();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0]["sender_id"], hr.to_string());
    let notification_id = inbox[0]["id"].as_str().expect("id").to_string();
    let uri = format!("/api/notifications/{}/read", notification_id);

    let (status, _) = app.call("POST", &uri, Some(hr), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.call("POST", &uri, Some(requester), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["read_at"].is_string());

    let (_, count) = app
        .call("GET", "/api/notifications/unread-count", Some(requester), None)
        .await;
    assert_eq!(count["unread"], 0);
}

#[tokio::test]
async fn directory_endpoints_fold_role_aliases() {
    let app = TestApp::new().await;
    let admin = app.user("Admin", "ADMIN").await;
    let (status, body) = app
        .call(
            "POST",
            "/api/users",
            Some(admin),
            Some(json!({ "name": "Leila", "email": "Leila@Example.com", "role": " DRH (TTG) " })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["email"], "leila@example.com");
    assert_eq!(body["role"], "DRH (TTG)");
    assert_eq!(body["workflow_role"], "HR_DIRECTOR");

    let (status, _) = app
        .call(
            "POST",
            "/api/users",
            Some(admin),
            Some(json!({ "name": "Leila 2", "email": "leila@example.com", "role": "DRH" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn requests_without_valid_token_are_unauthorized() {
    let app = TestApp::new().await;
    let (status, body) = app.call("GET", "/api/hiring-requests", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_authorization");

    let request = Request::builder()
        .uri("/api/hiring-requests")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .expect("request");
    let response = app.router.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn list_filters_and_stats() {
    let app = TestApp::new().await;
    let requester = app.user("Amine", "DEMANDEUR").await;
    let hr = app.user("Rim", "HR_MANAGER").await;
    let first = app.create_request(requester).await;
    app.create_request(requester).await;
    app.call(
        "POST",
        &format!("/api/hiring-requests/{}/transitions", first),
        Some(hr),
        Some(json!({ "action": "approve", "expected_status": "Pending Responsable RH" })),
    )
    .await;

    let (status, list) = app
        .call(
            "GET",
            "/api/hiring-requests?status=Pending%20Plant%20Manager&per_page=5",
            Some(hr),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", list);
    assert_eq!(list["total"], 1);
    assert_eq!(list["per_page"], 5);
    assert_eq!(list["items"][0]["id"], first);

    let (_, stats) = app
        .call("GET", "/api/hiring-requests/stats", Some(hr), None)
        .await;
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["by_status"]["Pending Responsable RH"], 1);
    assert_eq!(stats["by_status"]["Pending Plant Manager"], 1);
    assert_eq!(stats["by_category"]["MOI"], 2);

    let (_, workflow) = app
        .call("GET", "/api/hiring-requests/workflow", Some(hr), None)
        .await;
    assert_eq!(workflow["initial_status"], "Pending Responsable RH");
    assert_eq!(workflow["rules"].as_array().map(Vec::len), Some(6));
}

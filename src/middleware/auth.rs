use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    /// Informational only; workflow roles are read from the directory.
    pub role: Option<String>,
}

/// The authenticated caller, inserted into request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
}

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

pub fn decode_actor(token: &str, secret: &str) -> Option<Actor> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()?;
    let id = Uuid::parse_str(&data.claims.sub).ok()?;
    Some(Actor { id })
}

pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return unauthorized("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("unsupported_scheme");
    };

    match decode_actor(token.trim(), &state.jwt_secret) {
        Some(actor) => {
            req.extensions_mut().insert(actor);
            next.run(req).await
        }
        None => unauthorized("invalid_token"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(sub: &str, exp: usize, secret: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp,
            role: None,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_an_hour() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn decodes_user_id_from_subject() {
        let id = Uuid::new_v4();
        let actor = decode_actor(&token(&id.to_string(), in_an_hour(), "s3cret"), "s3cret");
        assert_eq!(actor, Some(Actor { id }));
    }

    #[test]
    fn rejects_wrong_secret_expired_and_non_uuid_subjects() {
        let id = Uuid::new_v4().to_string();
        assert!(decode_actor(&token(&id, in_an_hour(), "other"), "s3cret").is_none());
        assert!(decode_actor(&token(&id, 1_000, "s3cret"), "s3cret").is_none());
        assert!(decode_actor(&token("alice", in_an_hour(), "s3cret"), "s3cret").is_none());
    }
}

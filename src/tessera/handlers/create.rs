use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::{AuthError, AuthService};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateResponse {
    pub username: String,
    pub email: String,
    #[serde(rename = "jwtToken")]
    pub jwt_token: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/create",
    request_body = CreateRequest,
    responses(
        (status = 201, description = "Identity registered, first token issued", body = CreateResponse),
        (status = 400, description = "Malformed or missing input", body = String),
        (status = 409, description = "Username or email already taken", body = String),
    ),
    tag = "auth"
)]
pub async fn create(
    auth: Extension<Arc<AuthService>>,
    payload: Option<Json<CreateRequest>>,
) -> impl IntoResponse {
    let request: CreateRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "err": "Missing payload" })),
            )
                .into_response()
        }
    };

    match auth
        .register(&request.username, &request.email, &request.password)
        .await
    {
        Ok(registration) => (
            StatusCode::CREATED,
            Json(CreateResponse {
                username: registration.username,
                email: registration.email,
                jwt_token: registration.token,
            }),
        )
            .into_response(),
        Err(err @ AuthError::Validation { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "err": err.to_string() })),
        )
            .into_response(),
        Err(err @ AuthError::Duplicate) => (
            StatusCode::CONFLICT,
            Json(json!({ "err": err.to_string() })),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to register identity: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "err": "internal error" })),
            )
                .into_response()
        }
    }
}

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::extract_bearer_token;
use crate::auth::{AuthError, AuthService};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct InfoResponse {
    pub username: String,
    pub email: String,
}

#[utoipa::path(
    get,
    path = "/api/auth/info",
    responses(
        (status = 200, description = "Identity behind the presented token", body = InfoResponse),
        (status = 401, description = "Missing, invalid or unresolvable token", body = String),
    ),
    tag = "auth"
)]
pub async fn info(headers: HeaderMap, auth: Extension<Arc<AuthService>>) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "err": true }))).into_response();
    };

    match auth.whoami(&token).await {
        Ok(profile) => Json(InfoResponse {
            username: profile.username,
            email: profile.email,
        })
        .into_response(),
        Err(AuthError::Unauthenticated) => {
            (StatusCode::UNAUTHORIZED, Json(json!({ "err": true }))).into_response()
        }
        Err(err) => {
            error!("Failed to resolve token: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "err": true })),
            )
                .into_response()
        }
    }
}

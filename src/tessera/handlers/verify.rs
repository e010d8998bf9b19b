use axum::{
    extract::{ConnectInfo, Extension},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::client_key;
use crate::auth::{AuthError, AuthService, Login};

// Wire messages kept compatible with existing clients.
const MALFORMED_INPUT: &str = "please enter correct values";
const RATE_LIMITED: &str = "Too many Request";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyRequest {
    /// Username or email; anything containing `@` is looked up as an email.
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(rename = "jwtToken", skip_serializing_if = "Option::is_none")]
    pub jwt_token: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Verification outcome; a token only on a match", body = VerifyResponse),
        (status = 400, description = "Malformed or missing input", body = String),
        (status = 429, description = "Attempt ceiling exceeded for this client", body = String),
    ),
    tag = "auth"
)]
pub async fn verify(
    headers: HeaderMap,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    auth: Extension<Arc<AuthService>>,
    payload: Option<Json<VerifyRequest>>,
) -> impl IntoResponse {
    let request: VerifyRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "err": MALFORMED_INPUT })))
                .into_response()
        }
    };

    let client_key = client_key(&headers, peer);

    match auth
        .login(&request.username, &request.password, &client_key)
        .await
    {
        Ok(Login::Valid { token }) => Json(VerifyResponse {
            valid: true,
            jwt_token: Some(token),
        })
        .into_response(),
        Ok(Login::Invalid) => Json(VerifyResponse {
            valid: false,
            jwt_token: None,
        })
        .into_response(),
        Err(AuthError::RateLimited) => {
            (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED.to_string()).into_response()
        }
        Err(AuthError::Validation { .. }) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "err": MALFORMED_INPUT }))).into_response()
        }
        Err(err) => {
            error!("Failed to verify credentials: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "err": "internal error" })),
            )
                .into_response()
        }
    }
}
